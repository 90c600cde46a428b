//! Pure geometry for circular piles.
//!
//! Everything here is a function of a pile's center and diameter. Piles are
//! always circles, so every box is square and every resize has a single
//! degree of freedom.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest diameter a pile may have once a gesture ends.
pub const MIN_PILE_SIZE: f64 = 14.0;

/// Font size of the label for a pile of the given diameter.
pub fn font_size(diameter: f64) -> f64 {
    diameter / 5.0
}

/// Line height of the label for a pile of the given diameter.
pub fn line_height(diameter: f64) -> f64 {
    diameter - font_size(diameter) / 2.0
}

/// Diameter of a pile being drawn from `press` out to `pointer`.
pub fn draw_diameter(press: Point, pointer: Point) -> f64 {
    2.0 * press.distance(pointer)
}

/// Whether `point` lies inside (or on) the circle.
pub fn circle_contains(center: Point, diameter: f64, point: Point) -> bool {
    center.distance(point) <= diameter / 2.0
}

/// Square pixel box of a circular pile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PileBox {
    pub left: f64,
    pub top: f64,
    /// Width and height (always equal).
    pub size: f64,
}

impl PileBox {
    /// Box of a pile from its center and diameter.
    pub fn from_center(center: Point, diameter: f64) -> Self {
        let half = diameter / 2.0;
        Self {
            left: center.x - half,
            top: center.y - half,
            size: diameter,
        }
    }

    pub fn width(&self) -> f64 {
        self.size
    }

    pub fn height(&self) -> f64 {
        self.size
    }

    /// Corner radius that keeps the box circular.
    pub fn border_radius(&self) -> f64 {
        self.size / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.size / 2.0, self.top + self.size / 2.0)
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.left + self.size, self.top + self.size)
    }

    /// Position of one of the four corners.
    pub fn corner(&self, corner: Corner) -> Point {
        let right = self.left + self.size;
        let bottom = self.top + self.size;
        match corner {
            Corner::TopLeft => Point::new(self.left, self.top),
            Corner::TopRight => Point::new(right, self.top),
            Corner::BottomLeft => Point::new(self.left, bottom),
            Corner::BottomRight => Point::new(right, bottom),
        }
    }
}

/// Corner positions of a pile's box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    fn is_left(self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }

    fn is_top(self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }

    /// The diagonally opposite corner, which stays fixed while resizing.
    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// Resize a box by dragging one of its corners.
///
/// Only the horizontal pointer motion counts; it is negated for the left
/// handles so that dragging outwards always grows the pile. Returns `None`
/// when the result would fall below [`MIN_PILE_SIZE`], in which case the
/// caller keeps the last valid frame.
pub fn resize_from_corner(original: PileBox, corner: Corner, pointer_delta: Vec2) -> Option<PileBox> {
    let delta = if corner.is_left() {
        -pointer_delta.x
    } else {
        pointer_delta.x
    };
    let size = original.size + delta;
    if size < MIN_PILE_SIZE {
        return None;
    }

    let mut resized = PileBox { size, ..original };
    if corner.is_left() {
        resized.left = original.left - delta;
    }
    if corner.is_top() {
        resized.top = original.top - delta;
    }
    Some(resized)
}

/// Grow or shrink a diameter in place, never going below [`MIN_PILE_SIZE`].
pub fn inch_diameter(diameter: f64, step: f64) -> f64 {
    (diameter + step).max(MIN_PILE_SIZE.min(diameter))
}
