#![cfg_attr(not(test), no_std)]

mod clock;
mod command;
mod cursor;
mod driver;
mod envelope;
mod motion;
mod pen;
mod point;
mod queue;
mod servo;
mod stepper;

pub use clock::Clock;
pub use command::Command;
pub use command::ParseError;
pub use cursor::Cursor;
pub use cursor::Saved;
pub use cursor::StepOutcome;
pub use cursor::DEFAULT_DELAY_US;
pub use driver::DriverEnable;
pub use envelope::Envelope;
pub use envelope::WORK_AREA;
pub use motion::Advance;
pub use motion::Move;
pub use motion::DEFAULT_SPEED;
pub use motion::MOVE_SPEED;
pub use motion::NPT;
pub use pen::Pen;
pub use pen::PenMode;
pub use point::Point;
pub use queue::MoveQueue;
pub use queue::QUEUE_CAPACITY;
pub use servo::Servo;
pub use stepper::Direction;
pub use stepper::Stepper;

#[cfg(test)]
pub use clock::test::TestClock;
#[cfg(test)]
pub use driver::test::TestDriverEnable;
#[cfg(test)]
pub use servo::test::TestServo;
#[cfg(test)]
pub use stepper::test::TestStepper;
