//! Point types in image pixel space.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 2D coordinate in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    /// Column coordinate.
    pub x: f64,
    /// Row coordinate.
    pub y: f64,
}

/// An unordered collection of points.
///
/// Order carries no meaning for any downstream metric.
pub type PointSet = Vec<Point>;

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Returns true if the point lies inside a `width` x `height` image.
    #[must_use]
    pub fn within(&self, width: u32, height: u32) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x < f64::from(width) && self.y < f64::from(height)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self {
            x: f64::from(x),
            y: f64::from(y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.distance_sq(&b), 25.0);
        assert_relative_eq!(b.distance(&a), 5.0);
    }

    #[test]
    fn test_within_bounds() {
        assert!(Point::new(0.0, 0.0).within(10, 10));
        assert!(Point::new(9.5, 9.9).within(10, 10));
        assert!(!Point::new(10.0, 0.0).within(10, 10));
        assert!(!Point::new(-0.5, 3.0).within(10, 10));
    }

    #[test]
    fn test_from_integer_tuple() {
        let p = Point::from((12, 7));
        assert_relative_eq!(p.x, 12.0);
        assert_relative_eq!(p.y, 7.0);
    }
}
