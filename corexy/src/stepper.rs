/// Direction for a single motor step.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Direction {
    /// Positive direction is associated with a "high" direction signal.
    Positive,
    /// Negative direction is associated with a "low" direction signal.
    Negative,
}

/// Stepper motor.
///
/// One call emits exactly one pulse. In CoreXY terms each pulse moves the
/// head half a logical step along a 45-degree diagonal; the caller decides
/// which motor to pulse from the raw-space step vector.
pub trait Stepper {
    /// Takes a single step in the supplied direction.
    ///
    /// # Parameters
    ///
    /// - `direction`: Direction in which to take the step.
    fn step(&mut self, direction: Direction);
}
