use arduino_hal::pac::TC1;
use arduino_hal::port::{mode::Output, Pin, D9};

/// Pen servo on OC1A (digital pin 9).
///
/// TC1 runs fast PWM with ICR1 as TOP: prescaler 8 gives a 0.5 us tick,
/// so a TOP of 39999 produces the standard 20 ms servo frame. Angles map
/// onto 544-2400 us pulses, the range hobby servos expect.
pub struct Servo {
    tc1: TC1,
    _pin: Pin<Output, D9>,
}

impl Servo {
    const MIN_PULSE_US: u32 = 544;
    const MAX_PULSE_US: u32 = 2400;
    /// Timer ticks per microsecond at 16 MHz / prescale 8.
    const TICKS_PER_US: u32 = 2;
    /// TOP for a 20 ms PWM frame.
    const FRAME_TOP: u16 = 39_999;

    /// Takes ownership of TC1 and the output pin, and starts the PWM
    /// frame with the pulse width at its minimum.
    pub fn new(tc1: TC1, pin: Pin<Output, D9>) -> Self {
        tc1.icr1.write(|w| unsafe { w.bits(Self::FRAME_TOP) });
        tc1.tccr1a
            .write(|w| unsafe { w.wgm1().bits(0b10) }.com1a().match_clear());
        tc1.tccr1b
            .write(|w| unsafe { w.wgm1().bits(0b11) }.cs1().prescale_8());
        tc1.ocr1a
            .write(|w| unsafe { w.bits((Self::MIN_PULSE_US * Self::TICKS_PER_US) as u16) });

        Self { tc1, _pin: pin }
    }
}

impl corexy::Servo for Servo {
    fn write_angle(&mut self, degrees: i32) {
        let clamped = degrees.clamp(0, 180) as u32;
        let pulse_us = Self::MIN_PULSE_US
            + clamped * (Self::MAX_PULSE_US - Self::MIN_PULSE_US) / 180;
        self.tc1
            .ocr1a
            .write(|w| unsafe { w.bits((pulse_us * Self::TICKS_PER_US) as u16) });
    }
}
