use crate::{Clock, Servo};

/// Logical pen mode.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PenMode {
    /// Pen lifted off the paper.
    Up,
    /// Pen resting on the paper.
    Down,
    /// Pen at a host-commanded raw angle.
    Custom,
}

/// Pen-lift actuator.
///
/// Every mode change starts a cubic ease-out from the current live angle
/// to the new target. Motion is gated until the ease plus a mechanical
/// settle window has elapsed, so ink is never dragged while the pen is
/// still travelling.
pub struct Pen<S> {
    servo: S,
    mode: PenMode,
    changed_at_ms: u32,
    can_move: bool,
    start: i32,
    delta: i32,
    live: i32,
}

impl<S: Servo> Pen<S> {
    /// Angle of the lifted pen, in degrees.
    pub const UP_ANGLE: i32 = 15;
    /// Angle of the lowered pen, in degrees.
    pub const DOWN_ANGLE: i32 = 76;
    /// Duration of the ease-out trajectory.
    const EASE_MS: u32 = 500;
    /// Extra settle time after the ease before motion may resume.
    const SETTLE_MS: u32 = 100;

    /// Creates a new pen and parks the servo at zero degrees.
    ///
    /// The pen starts in [PenMode::Custom]; callers normally issue an
    /// immediate [Pen::up].
    pub fn new(mut servo: S) -> Self {
        servo.write_angle(0);
        Self {
            servo,
            mode: PenMode::Custom,
            changed_at_ms: 0,
            can_move: false,
            start: 0,
            delta: 0,
            live: 0,
        }
    }

    /// Lifts the pen.
    ///
    /// A no-op when the pen is already up; the ease is not restarted.
    ///
    /// # Returns
    ///
    /// `true` if the mode changed.
    pub fn up<C: Clock>(&mut self, clock: &C) -> bool {
        if self.mode == PenMode::Up {
            return false;
        }
        self.set_target(clock, Self::UP_ANGLE);
        self.mode = PenMode::Up;
        true
    }

    /// Lowers the pen.
    ///
    /// A no-op when the pen is already down; the ease is not restarted.
    ///
    /// # Returns
    ///
    /// `true` if the mode changed.
    pub fn down<C: Clock>(&mut self, clock: &C) -> bool {
        if self.mode == PenMode::Down {
            return false;
        }
        self.set_target(clock, Self::DOWN_ANGLE);
        self.mode = PenMode::Down;
        true
    }

    /// Drives the pen to a raw angle, overriding up/down.
    pub fn set<C: Clock>(&mut self, clock: &C, degrees: i32) {
        self.set_target(clock, degrees);
        self.mode = PenMode::Custom;
    }

    /// Returns the current logical mode.
    pub fn mode(&self) -> PenMode {
        self.mode
    }

    /// Whether the pen is logically down.
    pub fn is_down(&self) -> bool {
        self.mode == PenMode::Down
    }

    /// Reports whether the head may move, re-emitting the eased angle.
    ///
    /// This must be called every loop iteration while a transition is in
    /// flight: the call itself drives the servo along the ease
    /// trajectory. Returns `true` once the ease and settle windows have
    /// both elapsed.
    pub fn ready_to_move<C: Clock>(&mut self, clock: &C) -> bool {
        if !self.can_move {
            let elapsed = clock.millis().wrapping_sub(self.changed_at_ms);
            let angle = self.ease_angle(elapsed);
            self.servo.write_angle(angle);
            self.live = angle;
            if elapsed >= Self::EASE_MS + Self::SETTLE_MS {
                self.can_move = true;
            }
        }
        self.can_move
    }

    /// Starts a new ease from the live angle toward `degrees`.
    fn set_target<C: Clock>(&mut self, clock: &C, degrees: i32) {
        self.start = self.live;
        self.delta = degrees - self.live;
        self.changed_at_ms = clock.millis();
        self.can_move = false;
    }

    /// Angle `elapsed_ms` into the ease: cubic ease-out from `start` over
    /// [Pen::EASE_MS], holding the target thereafter.
    fn ease_angle(&self, elapsed_ms: u32) -> i32 {
        if elapsed_ms >= Self::EASE_MS {
            return self.start + self.delta;
        }
        let remaining = (Self::EASE_MS - elapsed_ms) as i64;
        let den = (Self::EASE_MS as i64).pow(3);
        let coeff = den - remaining * remaining * remaining;
        self.start + ((coeff * self.delta as i64) / den) as i32
    }
}
