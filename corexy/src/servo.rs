/// Pen-lift servo.
pub trait Servo {
    /// Drives the servo toward an absolute angle.
    ///
    /// # Parameters
    ///
    /// - `degrees`: Target angle; implementations clamp to their usable
    ///   range (0-180 for a hobby servo).
    fn write_angle(&mut self, degrees: i32);
}
