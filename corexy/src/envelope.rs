use crate::Point;

/// The rectangular work area reachable by the pen.
///
/// Logical positions are valid in `[0, max.x] x [0, max.y]`. Targets are
/// clamped into the envelope when a sub-segment is committed; the raw
/// accumulator may transiently overshoot the boundary by half a step.
pub struct Envelope {
    max: Point,
}

/// Work envelope of the machine, in logical units.
pub const WORK_AREA: Envelope = Envelope::new(Point::new(29875, 24421));

impl Envelope {
    /// Creates a new envelope spanning `[0, max.x] x [0, max.y]`.
    pub const fn new(max: Point) -> Self {
        Self { max }
    }

    /// Clamps a point componentwise into the envelope.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(0, self.max.x), p.y.clamp(0, self.max.y))
    }

    /// Checks whether a point lies inside the envelope.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.x <= self.max.x && p.y >= 0 && p.y <= self.max.y
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp() {
        assert_eq!(Point::new(0, 0), WORK_AREA.clamp(Point::new(-5, -1)));
        assert_eq!(Point::new(29875, 0), WORK_AREA.clamp(Point::new(40000, 0)));
        assert_eq!(
            Point::new(100, 24421),
            WORK_AREA.clamp(Point::new(100, 30000))
        );
        assert_eq!(Point::new(17, 23), WORK_AREA.clamp(Point::new(17, 23)));
    }

    #[test]
    fn test_contains_edges() {
        assert!(WORK_AREA.contains(Point::new(0, 0)));
        assert!(WORK_AREA.contains(Point::new(29875, 24421)));
        assert!(!WORK_AREA.contains(Point::new(-1, 0)));
        assert!(!WORK_AREA.contains(Point::new(0, -1)));
        assert!(!WORK_AREA.contains(Point::new(29876, 0)));
        assert!(!WORK_AREA.contains(Point::new(0, 24422)));
    }

    proptest! {
        #[test]
        fn test_clamped_is_contained(x in -100_000i32..100_000, y in -100_000i32..100_000) {
            assert!(WORK_AREA.contains(WORK_AREA.clamp(Point::new(x, y))));
        }
    }
}
