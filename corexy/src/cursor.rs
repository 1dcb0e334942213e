use crate::{Clock, DriverEnable, Point, WORK_AREA};

/// Microseconds between pulses when no speed has been commanded.
pub const DEFAULT_DELAY_US: u32 = 10_000;

/// Snapshot of an in-flight sub-segment, captured when a move is paused.
///
/// [Cursor::init_from] recreates the sub-segment from the snapshot so a
/// resumed move continues at the same pace toward the same target.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Saved {
    pub cur: Point,
    pub to: Point,
    pub us: u32,
}

/// Outcome of a single stepping decision.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum StepOutcome {
    /// Nothing to emit this cycle.
    Hold,
    /// One raw-space unit step; exactly one component is nonzero, and its
    /// sign selects the pulse direction for that motor.
    Step(Point),
    /// The step would have left the work envelope. Motion has been halted
    /// at the current logical position.
    OutOfBounds,
}

/// Raw-space quadrant of the commanded direction vector.
enum Quadrant {
    PosPos,
    NegPos,
    NegNeg,
    PosNeg,
}

impl Quadrant {
    fn of(diff: Point) -> Self {
        if diff.x > 0 {
            if diff.y > 0 {
                Quadrant::PosPos
            } else {
                Quadrant::PosNeg
            }
        } else if diff.y > 0 {
            Quadrant::NegPos
        } else {
            Quadrant::NegNeg
        }
    }
}

/// The kinematics core.
///
/// Owns the logical position, the raw CoreXY accumulator, the current
/// sub-segment, the inter-pulse pacing and the driver-enable line. The
/// logical position is the half-sum/half-difference of the raw
/// coordinates:
///
/// ```text
/// cur = ((true_cur.x + true_cur.y) / 2, (true_cur.y - true_cur.x) / 2)
/// ```
///
/// and is refreshed only when `true_cur.x + true_cur.y` is even, i.e. on
/// every other raw step.
pub struct Cursor<E> {
    from: Point,
    true_from: Point,
    to: Point,
    cur: Point,
    true_cur: Point,
    diff: Point,
    us: u32,
    last_step: u32,
    enable: E,
    moving: bool,
    should_lock: bool,
}

impl<E: DriverEnable> Cursor<E> {
    /// Creates a cursor at the origin, owning the driver-enable line.
    ///
    /// Callers normally follow up with `init(origin, 0)` to park the
    /// drivers in a known state.
    pub fn new(enable: E) -> Self {
        Self {
            from: Point::default(),
            true_from: Point::default(),
            to: Point::default(),
            cur: Point::default(),
            true_cur: Point::default(),
            diff: Point::default(),
            us: DEFAULT_DELAY_US,
            last_step: 0,
            enable,
            moving: true,
            should_lock: false,
        }
    }

    /// Current logical position.
    pub fn cur(&self) -> Point {
        self.cur
    }

    /// Logical position at the start of the current sub-segment.
    pub fn from(&self) -> Point {
        self.from
    }

    /// Target of the current sub-segment (already clamped).
    pub fn to(&self) -> Point {
        self.to
    }

    /// Microseconds between pulses for the current sub-segment.
    pub fn us(&self) -> u32 {
        self.us
    }

    /// Whether the current sub-segment has been fully stepped.
    pub fn at_target(&self) -> bool {
        self.cur == self.to
    }

    /// Commits a new sub-segment toward `target`.
    ///
    /// The target is clamped into the work envelope. A `speed` of zero
    /// halts: the drivers are released (unless locked) and pacing drops
    /// to [DEFAULT_DELAY_US]. Otherwise the inter-pulse delay is solved
    /// so that the logical speed along the segment is `speed` steps per
    /// second even though pulses land on the raw Manhattan path.
    pub fn init(&mut self, target: Point, speed: i32) {
        self.from = self.cur;
        self.true_from = self.true_cur;
        self.to = WORK_AREA.clamp(target);

        if speed == 0 {
            self.set_moving(false);
            self.us = DEFAULT_DELAY_US;
            return;
        }

        if self.cur == self.to {
            // Degenerate zero-length segment: keep pacing, nothing to
            // step.
            self.us = (1_000_000 / speed as i64) as u32;
            return;
        }

        self.set_moving(true);

        self.diff =
            Point::new(self.to.x - self.to.y, self.to.x + self.to.y) - self.true_cur;

        // The Euclidean traverse of the logical segment must take as long
        // as the Manhattan traverse of the raw vector: find
        // k = ceil(sqrt(len^2)) by binary search, then spread k logical
        // steps' worth of time over the raw step count.
        let dx = (self.to.x - self.cur.x) as i64;
        let dy = (self.to.y - self.cur.y) as i64;
        let step_len_sq = dx * dx + dy * dy;
        let manhattan =
            self.diff.x.unsigned_abs() as i64 + self.diff.y.unsigned_abs() as i64;

        let mut lo: i64 = 1;
        let mut hi: i64 = manhattan;
        while lo < hi {
            let mid = (lo + hi) / 2;
            if mid * mid < step_len_sq {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        self.us = ((1_000_000 * lo) / (manhattan * speed as i64)) as u32;
    }

    /// Halts at the current position: `init(cur, 0)`.
    pub fn halt(&mut self) {
        self.init(self.cur, 0);
    }

    /// Restarts a previously saved sub-segment.
    ///
    /// The pace and target come from the snapshot; the start is wherever
    /// the cursor is now.
    pub fn init_from(&mut self, saved: &Saved) {
        self.from = self.cur;
        self.true_from = self.true_cur;
        self.to = saved.to;
        self.us = saved.us;
        self.diff =
            Point::new(self.to.x - self.to.y, self.to.x + self.to.y) - self.true_cur;
        self.set_moving(true);
    }

    /// Snapshots the current sub-segment for a later [Cursor::init_from].
    pub fn save(&self) -> Saved {
        Saved {
            cur: self.cur,
            to: self.to,
            us: self.us,
        }
    }

    /// Redefines the current physical position as the origin.
    ///
    /// No motion is commanded: the caller contract is that the head has
    /// already been parked at the desired origin.
    pub fn reset(&mut self) {
        self.cur = Point::default();
        self.true_cur = Point::default();
        self.to = Point::default();
        self.set_moving(false);
        self.us = DEFAULT_DELAY_US;
    }

    /// Requests that the drivers stay energized even at rest.
    pub fn lock(&mut self) {
        if !self.should_lock && !self.moving {
            self.enable.set_enabled(true);
        }
        self.should_lock = true;
    }

    /// Clears the hold request; at rest the drivers are released.
    pub fn unlock(&mut self) {
        if !self.moving && self.should_lock {
            self.enable.set_enabled(false);
        }
        self.should_lock = false;
    }

    /// Busy-waits until the next pulse is due, then stamps the deadline.
    pub fn delay<C: Clock>(&mut self, clock: &C) {
        while clock.micros().wrapping_sub(self.last_step) < self.us {}
        self.last_step = clock.micros();
    }

    /// Decides and applies one raw step toward the sub-segment target.
    ///
    /// Holds while the pen is still settling or the target has been
    /// reached. Off-axis segments pick between the two candidate raw unit
    /// steps with a Bresenham-style sidedness test so the accumulator
    /// tracks the ideal raw-space line.
    ///
    /// # Parameters
    ///
    /// - `pen_ready`: gate from [crate::Pen::ready_to_move].
    pub fn step_dir(&mut self, pen_ready: bool) -> StepOutcome {
        if self.cur == self.to || !pen_ready {
            return StepOutcome::Hold;
        }

        let step = if self.diff.x == 0 {
            Point::new(0, self.diff.y.signum())
        } else if self.diff.y == 0 {
            Point::new(self.diff.x.signum(), 0)
        } else {
            let cd = self.true_cur - self.true_from;
            let left = (self.diff.x as i64) * (cd.y as i64)
                >= (self.diff.y as i64) * (cd.x as i64);
            match (left, Quadrant::of(self.diff)) {
                (true, Quadrant::PosPos) => Point::new(1, 0),
                (true, Quadrant::NegPos) => Point::new(0, 1),
                (true, Quadrant::NegNeg) => Point::new(-1, 0),
                (true, Quadrant::PosNeg) => Point::new(0, -1),
                (false, Quadrant::PosPos) => Point::new(0, 1),
                (false, Quadrant::NegPos) => Point::new(-1, 0),
                (false, Quadrant::NegNeg) => Point::new(0, -1),
                (false, Quadrant::PosNeg) => Point::new(1, 0),
            }
        };

        self.true_cur = self.true_cur + step;
        let midpoint = Point::new(
            (self.true_cur.x + self.true_cur.y) / 2,
            (self.true_cur.y - self.true_cur.x) / 2,
        );
        if (self.true_cur.x + self.true_cur.y) % 2 == 0 {
            self.cur = midpoint;
        }

        // The raw accumulator is allowed to overshoot by half a step; the
        // midpoint is not.
        if !WORK_AREA.contains(midpoint) {
            self.halt();
            return StepOutcome::OutOfBounds;
        }

        StepOutcome::Step(step)
    }

    /// Updates the enable line; the drivers are held while moving or
    /// locked.
    fn set_moving(&mut self, moving: bool) {
        if self.moving != moving {
            self.enable.set_enabled(moving || self.should_lock);
            self.moving = moving;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{TestClock, TestDriverEnable};
    use proptest::prelude::*;

    fn cursor() -> (Cursor<TestDriverEnable>, TestDriverEnable) {
        let enable = TestDriverEnable::new();
        let observer = enable.clone();
        let mut cursor = Cursor::new(enable);
        cursor.init(Point::default(), 0);
        (cursor, observer)
    }

    /// Steps the cursor until the sub-segment completes, checking the raw
    /// parity and envelope invariants on the way. Returns the emitted raw
    /// steps.
    fn drive(cursor: &mut Cursor<TestDriverEnable>) -> Vec<Point> {
        let mut steps = Vec::new();
        let mut parity = (cursor.true_cur.x + cursor.true_cur.y) % 2;
        for _ in 0..1_000_000 {
            if cursor.at_target() {
                return steps;
            }
            match cursor.step_dir(true) {
                StepOutcome::Hold => panic!("held before reaching target"),
                StepOutcome::OutOfBounds => panic!("left the envelope"),
                StepOutcome::Step(step) => {
                    assert_eq!(1, step.x.abs() + step.y.abs());
                    let new_parity = (cursor.true_cur.x + cursor.true_cur.y) % 2;
                    assert_ne!(parity, new_parity, "raw parity failed to toggle");
                    parity = new_parity;
                    assert!(WORK_AREA.contains(cursor.cur()));
                    steps.push(step);
                }
            }
        }
        panic!("did not converge");
    }

    #[test]
    fn test_pacing_solve() {
        let (mut cursor, _) = cursor();
        // Logical (0,0) -> (100,0): raw vector (100,100), Manhattan 200,
        // Euclidean 100. 1e6 * 100 / (200 * 2400) = 208.
        cursor.init(Point::new(100, 0), 2400);
        assert_eq!(208, cursor.us());
    }

    #[test]
    fn test_halt_releases_driver() {
        let (mut cursor, enable) = cursor();
        cursor.init(Point::new(10, 10), 2400);
        assert!(enable.is_enabled());

        cursor.halt();
        assert!(!enable.is_enabled());
        assert_eq!(DEFAULT_DELAY_US, cursor.us());
        assert!(cursor.at_target());
    }

    #[test]
    fn test_zero_length_segment_keeps_pacing() {
        let (mut cursor, enable) = cursor();
        cursor.init(Point::default(), 2400);
        assert_eq!(416, cursor.us());
        // No enable transition for a segment that is already complete.
        assert!(!enable.is_enabled());
    }

    #[test]
    fn test_clamps_target() {
        let (mut cursor, _) = cursor();
        cursor.init(Point::new(40_000, -5), 3200);
        assert_eq!(Point::new(29_875, 0), cursor.to());
    }

    #[test]
    fn test_reaches_axis_aligned_target() {
        let (mut cursor, _) = cursor();
        cursor.init(Point::new(100, 0), 2400);
        let steps = drive(&mut cursor);
        // A logical x move needs equal amounts of both raw directions.
        assert_eq!(Point::new(100, 0), cursor.cur());
        assert_eq!(200, steps.len());
        assert_eq!(100, steps.iter().filter(|s| s.x != 0).count());
        assert_eq!(100, steps.iter().filter(|s| s.y != 0).count());
    }

    #[test]
    fn test_diagonal_is_pure_raw_y() {
        let (mut cursor, _) = cursor();
        cursor.init(Point::new(1000, 1000), 2400);
        let steps = drive(&mut cursor);
        assert_eq!(Point::new(1000, 1000), cursor.cur());
        assert_eq!(2000, steps.len());
        assert!(steps.iter().all(|s| *s == Point::new(0, 1)));
    }

    #[test]
    fn test_diagonal_pulses_only_y_motor() {
        use crate::{Direction, Stepper, TestStepper};

        let (mut cursor, _) = cursor();
        cursor.init(Point::new(1000, 1000), 2400);

        // Route raw steps to motors the way the firmware loop does.
        let mut x_motor = TestStepper::new(0);
        let mut y_motor = TestStepper::new(0);
        let x_observer = x_motor.clone();
        let y_observer = y_motor.clone();
        while !cursor.at_target() {
            if let StepOutcome::Step(step) = cursor.step_dir(true) {
                let (motor, sign) = if step.x != 0 {
                    (&mut x_motor, step.x)
                } else {
                    (&mut y_motor, step.y)
                };
                motor.step(if sign > 0 {
                    Direction::Positive
                } else {
                    Direction::Negative
                });
            }
        }

        assert_eq!(0, x_observer.get_position());
        assert_eq!(2000, y_observer.get_position());
    }

    #[test]
    fn test_pen_gate_holds() {
        let (mut cursor, _) = cursor();
        cursor.init(Point::new(10, 0), 2400);
        assert_eq!(StepOutcome::Hold, cursor.step_dir(false));
        assert_eq!(Point::default(), cursor.cur());
    }

    #[test]
    fn test_out_of_bounds_halts() {
        let (mut cursor, enable) = cursor();
        // A snapshot is trusted verbatim, so a target below the envelope
        // walks the accumulator out.
        cursor.init_from(&Saved {
            cur: Point::default(),
            to: Point::new(0, -10),
            us: 100,
        });
        let mut outcome = cursor.step_dir(true);
        while let StepOutcome::Step(_) = outcome {
            outcome = cursor.step_dir(true);
        }
        assert_eq!(StepOutcome::OutOfBounds, outcome);
        assert_eq!(DEFAULT_DELAY_US, cursor.us());
        assert!(!enable.is_enabled());
    }

    #[test]
    fn test_lock_unlock_round_trip_at_rest() {
        let (mut cursor, enable) = cursor();
        assert!(!enable.is_enabled());

        cursor.lock();
        assert!(enable.is_enabled());
        cursor.unlock();
        assert!(!enable.is_enabled());
    }

    #[test]
    fn test_lock_holds_driver_after_motion() {
        let (mut cursor, enable) = cursor();
        cursor.lock();
        cursor.init(Point::new(10, 0), 2400);
        drive(&mut cursor);
        cursor.halt();
        // Still locked: halting does not release the line.
        assert!(enable.is_enabled());
        cursor.unlock();
        assert!(!enable.is_enabled());
    }

    #[test]
    fn test_save_restores_pace_and_target() {
        let (mut cursor, _) = cursor();
        cursor.init(Point::new(40, 20), 2400);
        let us = cursor.us();

        for _ in 0..30 {
            cursor.step_dir(true);
        }
        let saved = cursor.save();
        cursor.halt();
        assert_eq!(DEFAULT_DELAY_US, cursor.us());

        cursor.init_from(&saved);
        assert_eq!(us, cursor.us());
        assert_eq!(Point::new(40, 20), cursor.to());
        drive(&mut cursor);
        assert_eq!(Point::new(40, 20), cursor.cur());
    }

    #[test]
    fn test_reset_zeroes_without_motion() {
        let (mut cursor, enable) = cursor();
        cursor.init(Point::new(30, 10), 2400);
        drive(&mut cursor);

        cursor.reset();
        assert_eq!(Point::default(), cursor.cur());
        assert!(cursor.at_target());
        assert!(!enable.is_enabled());
    }

    #[test]
    fn test_delay_paces_pulses() {
        let (mut cursor, _) = cursor();
        cursor.init(Point::new(100, 0), 2400);

        let clock = TestClock::ticking(50);
        cursor.delay(&clock);
        let first = clock.micros();
        cursor.delay(&clock);
        let second = clock.micros();
        assert!(second.wrapping_sub(first) >= cursor.us());
    }

    #[test]
    fn test_delay_survives_micros_wrap() {
        let (mut cursor, _) = cursor();
        cursor.init(Point::new(100, 0), 2400);

        let clock = TestClock::ticking(50);
        clock.set_us(u32::MAX - 100);
        cursor.delay(&clock);
        // Another pacing wait across the wrap boundary must terminate.
        cursor.delay(&clock);
    }

    proptest! {
        #[test]
        fn test_arrives_at_any_envelope_target(
            x in 0i32..2000,
            y in 0i32..2000,
        ) {
            let (mut cursor, _) = cursor();
            cursor.init(Point::new(x, y), 2400);
            drive(&mut cursor);
            assert_eq!(Point::new(x, y), cursor.cur());
        }
    }

    proptest! {
        #[test]
        fn test_arrives_from_interior_start(
            sx in 0i32..500,
            sy in 0i32..500,
            tx in 0i32..500,
            ty in 0i32..500,
        ) {
            let (mut cursor, _) = cursor();
            cursor.init(Point::new(sx, sy), 3200);
            drive(&mut cursor);
            cursor.init(Point::new(tx, ty), 2400);
            drive(&mut cursor);
            assert_eq!(Point::new(tx, ty), cursor.cur());
        }
    }
}
