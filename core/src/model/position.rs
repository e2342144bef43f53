use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Diagram coordinates of a detected element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn within(&self, other: &Position, tolerance: f64) -> bool {
        self.distance(other) <= tolerance
    }

    /// Arithmetic mean of the given positions; `None` for an empty slice.
    pub fn centroid(positions: &[Position]) -> Option<Position> {
        if positions.is_empty() {
            return None;
        }
        let n = positions.len() as f64;
        let (sx, sy) = positions
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Position::new(sx / n, sy / n))
    }

    /// Total order used for deterministic sorting (x first, then y).
    pub fn total_cmp(&self, other: &Position) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_two_points() {
        let c = Position::centroid(&[Position::new(0.0, 0.0), Position::new(10.0, 4.0)]).unwrap();
        assert_eq!(c, Position::new(5.0, 2.0));
        assert!(Position::centroid(&[]).is_none());
    }

    #[test]
    fn within_is_inclusive() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!(a.within(&b, 5.0));
        assert!(!a.within(&b, 4.99));
    }
}
