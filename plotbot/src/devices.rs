pub mod clock;
pub mod enable;
pub mod servo;
pub mod stepper;
