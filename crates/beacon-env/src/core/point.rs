use serde::{Deserialize, Serialize};

/// A cell position on the screen, `x` growing rightwards and `y` downwards.
///
/// Coordinates are signed so that distances to points off the screen can be
/// expressed; the environment itself only ever produces on-screen points.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[display("({x}, {y})")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance between two points.
    ///
    /// ```
    /// use beacon_env::Point;
    ///
    /// assert_eq!(Point::new(0, 0).distance_to(Point::new(3, 4)), 5.0);
    /// ```
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        let dx = f64::from(other.x) - f64::from(self.x);
        let dy = f64::from(other.y) - f64::from(self.y);
        dx.hypot(dy) as f32
    }

    /// Chebyshev (king-move) distance between two points.
    #[must_use]
    pub fn chebyshev_distance_to(self, other: Self) -> u32 {
        u32::max(self.x.abs_diff(other.x), self.y.abs_diff(other.y))
    }

    /// Moves towards `target` by at most `speed` cells on each axis.
    #[must_use]
    pub fn step_toward(self, target: Self, speed: i32) -> Self {
        let step = |from: i32, to: i32| from + (to - from).clamp(-speed, speed);
        Self {
            x: step(self.x, target.x),
            y: step(self.y, target.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_symmetric() {
        let a = Point::new(-10, 0);
        let b = Point::new(10, 0);
        assert_eq!(a.distance_to(b), 20.0);
        assert_eq!(b.distance_to(a), 20.0);
        assert_eq!(a.distance_to(a), 0.0);
    }

    #[test]
    fn test_step_toward_stops_at_target() {
        let mut p = Point::new(0, 0);
        let target = Point::new(3, -2);
        p = p.step_toward(target, 1);
        assert_eq!(p, Point::new(1, -1));
        p = p.step_toward(target, 1);
        assert_eq!(p, Point::new(2, -2));
        p = p.step_toward(target, 1);
        assert_eq!(p, target);
        p = p.step_toward(target, 1);
        assert_eq!(p, target);
    }

    #[test]
    fn test_chebyshev_distance() {
        assert_eq!(Point::new(1, 1).chebyshev_distance_to(Point::new(4, -1)), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(Point::new(5, 7).to_string(), "(5, 7)");
    }
}
