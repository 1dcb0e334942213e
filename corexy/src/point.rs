use core::ops::{Add, Sub};

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

/// A 2-D integer position.
///
/// The same type is used for logical positions (the half-stepped output
/// space the host commands in) and for raw CoreXY accumulator positions,
/// which run at twice the resolution.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl uDisplay for Point {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        uwrite!(f, "({},{})", self.x, self.y)
    }
}
