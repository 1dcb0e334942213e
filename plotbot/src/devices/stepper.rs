use arduino_hal::{
    delay_us,
    port::{mode::Output, Pin, PinOps},
    prelude::_unwrap_infallible_UnwrapInfallible,
};
use corexy::Direction;
use embedded_hal::digital::{OutputPin, PinState};

/// Step/dir driver for one motor of the CoreXY pair.
///
/// # Type Parameters
///
/// - `P`: pulse pin
/// - `D`: direction pin
pub struct Stepper<P, D> {
    pin_pulse: Pin<Output, P>,
    pin_direction: Pin<Output, D>,
    direction: Direction,
}

impl<P: PinOps, D: PinOps> Stepper<P, D> {
    /// Step pulse width, and the setup time after a direction change.
    const PULSE_DELAY_US: u32 = 1;

    /// Creates a new `Stepper`.
    ///
    /// # Parameters
    ///
    /// - `pin_pulse`: Pin to use for pulse signals.
    /// - `pin_direction`: Pin to use for direction signals.
    pub fn new(pin_pulse: Pin<Output, P>, pin_direction: Pin<Output, D>) -> Self {
        let direction = Direction::Negative;
        let mut stepper = Self {
            pin_pulse,
            pin_direction,
            direction,
        };

        // Ensure that the direction we think we have is really what's set
        // on the pin.
        stepper.force_set_direction(direction);

        stepper
    }

    /// Execute a step: one pulse, with the direction pin settled first.
    fn do_step(&mut self, direction: Direction) {
        self.set_direction(direction);
        self.pin_pulse.set_high();
        delay_us(Self::PULSE_DELAY_US);
        self.pin_pulse.set_low();
    }

    /// Set the direction, but only if it needs changing.
    fn set_direction(&mut self, direction: Direction) {
        if direction != self.direction {
            self.force_set_direction(direction);
        }
    }

    /// Force set the direction pin, with its setup delay.
    fn force_set_direction(&mut self, direction: Direction) {
        let state = match direction {
            Direction::Positive => PinState::High,
            Direction::Negative => PinState::Low,
        };
        self.pin_direction.set_state(state).unwrap_infallible();
        delay_us(Self::PULSE_DELAY_US);
        self.direction = direction;
    }
}

impl<P: PinOps, D: PinOps> corexy::Stepper for Stepper<P, D> {
    fn step(&mut self, direction: Direction) {
        self.do_step(direction);
    }
}
