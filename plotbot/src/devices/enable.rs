use arduino_hal::port::{mode::Output, Pin, D8};

/// Enable line shared by both stepper drivers.
///
/// The line is active-low: driving it low energizes the motors.
pub struct EnablePin {
    pin: Pin<Output, D8>,
}

impl EnablePin {
    pub fn new(pin: Pin<Output, D8>) -> Self {
        Self { pin }
    }
}

impl corexy::DriverEnable for EnablePin {
    fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
    }
}
