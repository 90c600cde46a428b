//! Corner resize handles of the selected pile.

use crate::geometry::Corner;
use crate::pile::Pile;
use kurbo::Point;

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 8.0;
/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 6.0;

/// A resize handle with its position and corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in document coordinates.
    pub position: Point,
    pub corner: Corner,
}

impl Handle {
    pub fn new(position: Point, corner: Corner) -> Self {
        Self { position, corner }
    }

    /// Check if a point (in document coordinates) hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point.x - self.position.x).abs() <= tolerance && (point.y - self.position.y).abs() <= tolerance
    }
}

/// The four corner handles of a pile's box.
pub fn get_handles(pile: &Pile) -> [Handle; 4] {
    let bounds = pile.bounds();
    Corner::ALL.map(|corner| Handle::new(bounds.corner(corner), corner))
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(pile: &Pile, point: Point, tolerance: f64) -> Option<Corner> {
    get_handles(pile)
        .into_iter()
        .find(|handle| handle.hit_test(point, tolerance))
        .map(|handle| handle.corner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pile::Scheme;

    #[test]
    fn test_handles_at_box_corners() {
        let pile = Pile::new("a", Point::new(100.0, 100.0), 40.0, Scheme::default());
        let handles = get_handles(&pile);
        assert_eq!(handles[0].position, Point::new(80.0, 80.0));
        assert_eq!(handles[3].position, Point::new(120.0, 120.0));
    }

    #[test]
    fn test_hit_test_handles() {
        let pile = Pile::new("a", Point::new(100.0, 100.0), 40.0, Scheme::default());
        assert_eq!(
            hit_test_handles(&pile, Point::new(118.0, 82.0), HANDLE_HIT_TOLERANCE),
            Some(Corner::TopRight)
        );
        assert_eq!(hit_test_handles(&pile, Point::new(100.0, 100.0), HANDLE_HIT_TOLERANCE), None);
    }
}
