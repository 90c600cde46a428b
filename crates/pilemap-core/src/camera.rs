//! Camera module for panning the document under the viewport.

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Canvas offset used in design mode once the background has loaded.
pub const DESIGN_CANVAS_ORIGIN: Vec2 = Vec2::new(30.0, 80.0);

/// Camera manages the view translation for the canvas.
///
/// There is no zoom: one document unit is one screen pixel, so pointer
/// deltas apply to piles and to the camera unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Screen position of the document origin.
    pub offset: Vec2,
    /// Size of the visible canvas area.
    pub viewport: Size,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            viewport: Size::new(800.0, 600.0),
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a screen point to document coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        screen_point - self.offset
    }

    /// Convert a document point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        world_point + self.offset
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Center of the visible canvas, in screen coordinates.
    pub fn viewport_center(&self) -> Point {
        Point::new(self.viewport.width / 2.0, self.viewport.height / 2.0)
    }

    /// Move the camera so that `world_point` sits at the viewport center.
    pub fn center_on(&mut self, world_point: Point) {
        self.offset = self.viewport_center() - world_point;
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset, Vec2::ZERO);
    }

    #[test]
    fn test_screen_to_world_with_offset() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(50.0, 100.0);
        let world = camera.screen_to_world(Point::new(100.0, 200.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(30.0, -20.0);

        let original = Point::new(123.0, 456.0);
        let back = camera.world_to_screen(camera.screen_to_world(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_pan() {
        let mut camera = Camera::new();
        camera.pan(Vec2::new(10.0, 20.0));
        assert!((camera.offset.x - 10.0).abs() < f64::EPSILON);
        assert!((camera.offset.y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_center_on() {
        let mut camera = Camera::new();
        camera.set_viewport(Size::new(400.0, 300.0));
        camera.center_on(Point::new(500.0, 100.0));
        assert_eq!(camera.offset, Vec2::new(-300.0, 50.0));
        assert_eq!(camera.world_to_screen(Point::new(500.0, 100.0)), camera.viewport_center());
    }
}
