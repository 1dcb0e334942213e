use crate::{Cursor, DriverEnable, Point, Saved, WORK_AREA};

/// Number of samples taken along an interpolated curve.
pub const NPT: i32 = 300;
/// Drawing speed, in logical steps per second.
pub const DEFAULT_SPEED: i32 = 2400;
/// Pen-up travel speed, in logical steps per second.
pub const MOVE_SPEED: i32 = 3200;

/// Shape of a move.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Path {
    /// Straight segment from `from` to `to`.
    Linear,
    /// Cubic Bezier with two interior control points.
    Bezier { ctrl1: Point, ctrl2: Point },
}

/// Action requested by [Move::next].
///
/// The interpolator owns the geometry; the caller owns the pen and the
/// serial port, and applies the pen transition (and completion report)
/// that each advancement implies.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Advance {
    /// A pen-up rapid toward the segment start is in flight.
    Approach,
    /// A drawing sub-target was committed; the pen belongs on the paper.
    Draw,
    /// The move has completed and should be discarded.
    Done { stay_down: bool },
}

/// One commanded move, from creation in the parser to completion.
///
/// A move interpolates its path into a chain of straight sub-segments,
/// committing each one to the kinematics core and waiting for arrival
/// before committing the next.
#[derive(Debug, PartialEq, Clone)]
pub struct Move {
    path: Path,
    from: Point,
    to: Point,
    speed: i32,
    t: i32,
    started: bool,
    stay_down: bool,
    is_paused: bool,
    saved: Option<Saved>,
}

impl Move {
    /// Creates a straight move.
    pub fn linear(from: Point, to: Point, speed: i32, stay_down: bool) -> Self {
        Self::new(Path::Linear, from, to, speed, stay_down)
    }

    /// Creates a cubic Bezier move.
    pub fn bezier(
        from: Point,
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
        speed: i32,
        stay_down: bool,
    ) -> Self {
        Self::new(Path::Bezier { ctrl1, ctrl2 }, from, to, speed, stay_down)
    }

    fn new(path: Path, from: Point, to: Point, speed: i32, stay_down: bool) -> Self {
        Self {
            path,
            from,
            to,
            speed,
            t: 0,
            started: false,
            stay_down,
            is_paused: false,
            saved: None,
        }
    }

    /// Whether the move is paused.
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    /// Advances the move by one sub-segment.
    ///
    /// Call whenever the cursor has reached its sub-target and the move is
    /// active and not paused. The pen is always lifted for the approach to
    /// the start point and lowered only once drawing proceeds.
    pub fn next<E: DriverEnable>(&mut self, cursor: &mut Cursor<E>) -> Advance {
        if let Some(saved) = self.saved.take() {
            // First advancement after a resume: replay the interrupted
            // sub-segment exactly.
            cursor.init_from(&saved);
            return Advance::Draw;
        }

        if !self.started {
            if cursor.cur() != WORK_AREA.clamp(self.from) {
                cursor.init(self.from, MOVE_SPEED);
                return Advance::Approach;
            }
            self.started = true;
        }

        match self.path {
            Path::Bezier { ctrl1, ctrl2 } => self.bezier_next(cursor, ctrl1, ctrl2),
            Path::Linear => {
                if cursor.cur() != WORK_AREA.clamp(self.to) {
                    cursor.init(self.to, self.speed);
                }
            }
        }

        let exhausted = match self.path {
            Path::Linear => true,
            Path::Bezier { .. } => self.t >= NPT,
        };
        if exhausted && cursor.at_target() {
            Advance::Done {
                stay_down: self.stay_down,
            }
        } else {
            Advance::Draw
        }
    }

    /// Commits the next curve sample that actually differs from the
    /// current position; the exact endpoint once the ticker is exhausted.
    fn bezier_next<E: DriverEnable>(
        &mut self,
        cursor: &mut Cursor<E>,
        ctrl1: Point,
        ctrl2: Point,
    ) {
        let sample = loop {
            if self.t >= NPT {
                break self.to;
            }
            self.t += 1;
            let sample = bezier_point(self.from, ctrl1, ctrl2, self.to, self.t);
            if sample != cursor.cur() {
                break sample;
            }
        };
        cursor.init(sample, self.speed);
    }

    /// Freezes the move mid-flight.
    ///
    /// An unfinished drawing sub-segment is snapshotted so resume can
    /// replay it. Idempotent; always halts the cursor.
    pub fn pause<E: DriverEnable>(&mut self, cursor: &mut Cursor<E>) {
        if !self.is_paused && self.started && !cursor.at_target() {
            self.saved = Some(cursor.save());
        }
        self.is_paused = true;
        cursor.halt();
    }

    /// Resumes a paused move.
    ///
    /// If the head was jogged during the pause, a segment back to the
    /// saved point is commanded first and the snapshot is replayed on
    /// arrival (through [Move::next]). Otherwise the interrupted
    /// sub-segment restarts immediately.
    ///
    /// # Returns
    ///
    /// The advancement to apply, or `None` when the move was not paused
    /// or a drive-back is in flight.
    pub fn resume<E: DriverEnable>(&mut self, cursor: &mut Cursor<E>) -> Option<Advance> {
        if !self.is_paused {
            return None;
        }
        self.is_paused = false;

        if let Some(saved) = self.saved {
            if saved.cur != cursor.cur() {
                cursor.init(saved.cur, self.speed);
                return None;
            }
            self.saved = None;
            cursor.init_from(&saved);
            return Some(Advance::Draw);
        }

        Some(self.next(cursor))
    }
}

/// Integer cubic Bezier sample at ticker position `t` of [NPT].
///
/// The products reach `NPT^3` times a coordinate, so the evaluation runs
/// in 64-bit arithmetic.
fn bezier_point(from: Point, ctrl1: Point, ctrl2: Point, to: Point, t: i32) -> Point {
    let s = (NPT - t) as i64;
    let t = t as i64;
    let den = (NPT as i64) * (NPT as i64) * (NPT as i64);

    let x = from.x as i64 * s * s * s
        + 3 * ctrl1.x as i64 * s * s * t
        + 3 * ctrl2.x as i64 * s * t * t
        + to.x as i64 * t * t * t;
    let y = from.y as i64 * s * s * s
        + 3 * ctrl1.y as i64 * s * s * t
        + 3 * ctrl2.y as i64 * s * t * t
        + to.y as i64 * t * t * t;

    Point::new((x / den) as i32, (y / den) as i32)
}
