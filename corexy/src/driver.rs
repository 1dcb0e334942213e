/// Shared enable line for the stepper drivers.
///
/// The physical line is active-low; implementations hide the polarity and
/// expose plain enabled/disabled.
pub trait DriverEnable {
    /// Energizes or releases the motor drivers.
    ///
    /// # Parameters
    ///
    /// - `enabled`: `true` to hold the motors, `false` to release them.
    fn set_enabled(&mut self, enabled: bool);
}

#[cfg(test)]
pub mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Driver-enable line that records its state for testing.
    ///
    /// Clones share the underlying state, so a test can keep an observer
    /// while the cursor owns the line.
    #[derive(Clone)]
    pub struct TestDriverEnable {
        enabled: Arc<Mutex<bool>>,
    }

    impl TestDriverEnable {
        /// Creates a new, released line.
        pub fn new() -> Self {
            Self {
                enabled: Arc::new(Mutex::new(false)),
            }
        }

        /// Returns the last commanded state.
        pub fn is_enabled(&self) -> bool {
            *self.enabled.lock().unwrap()
        }
    }

    impl DriverEnable for TestDriverEnable {
        fn set_enabled(&mut self, enabled: bool) {
            *self.enabled.lock().unwrap() = enabled;
        }
    }
}
