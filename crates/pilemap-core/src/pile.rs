//! The pile record and its serializable geometry payload.

use crate::geometry::{self, PileBox};
use kurbo::{Point, Vec2};
use peniko::Color;
use peniko::color::{Srgb, parse_color};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, stable identifier of a pile.
///
/// Fresh ids are generated from UUIDs; ids loaded from a document are kept
/// verbatim so the backend can match them up again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PileId(String);

impl PileId {
    /// Generate a fresh unique id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PileId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PileId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializable color, stored as RGBA8 and written as a CSS color string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse any CSS color string (`#rgb`, `#rrggbb`, `rgb(...)`, named colors).
    pub fn parse(text: &str) -> Result<Self, String> {
        let color = parse_color(text.trim()).map_err(|e| format!("invalid color {text:?}: {e:?}"))?;
        Ok(color.to_alpha_color::<Srgb>().into())
    }

    /// CSS representation: `#rrggbb` when opaque, `rgba(...)` otherwise.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.3})",
                self.r,
                self.g,
                self.b,
                self.a as f64 / 255.0
            )
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

impl From<SerializableColor> for String {
    fn from(color: SerializableColor) -> Self {
        color.to_css()
    }
}

impl TryFrom<String> for SerializableColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Fill and border colors of a pile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    #[serde(rename = "bgColor")]
    pub fill: SerializableColor,
    #[serde(rename = "borderColor")]
    pub border: SerializableColor,
}

impl Scheme {
    pub const fn new(fill: SerializableColor, border: SerializableColor) -> Self {
        Self { fill, border }
    }

    /// Scheme used for piles dimmed out by a highlight filter.
    pub const fn muted() -> Self {
        Self::new(
            SerializableColor::rgb(0xcc, 0xcc, 0xcc),
            SerializableColor::rgb(0x99, 0x99, 0x99),
        )
    }

    /// Built-in scheme for the category at `index` in configuration order.
    pub fn palette(index: usize) -> Self {
        PALETTE[index % PALETTE.len()]
    }

    pub fn fill_color(&self) -> Color {
        self.fill.into()
    }

    pub fn border_color(&self) -> Color {
        self.border.into()
    }
}

impl Default for Scheme {
    fn default() -> Self {
        Self::palette(0)
    }
}

const PALETTE: [Scheme; 6] = [
    Scheme::new(SerializableColor::rgb(0xff, 0xd5, 0x4f), SerializableColor::rgb(0xf5, 0x7f, 0x17)),
    Scheme::new(SerializableColor::rgb(0x81, 0xd4, 0xfa), SerializableColor::rgb(0x02, 0x77, 0xbd)),
    Scheme::new(SerializableColor::rgb(0xa5, 0xd6, 0xa7), SerializableColor::rgb(0x2e, 0x7d, 0x32)),
    Scheme::new(SerializableColor::rgb(0xef, 0x9a, 0x9a), SerializableColor::rgb(0xc6, 0x28, 0x28)),
    Scheme::new(SerializableColor::rgb(0xce, 0x93, 0xd8), SerializableColor::rgb(0x6a, 0x1b, 0x9a)),
    Scheme::new(SerializableColor::rgb(0xff, 0xcc, 0xbc), SerializableColor::rgb(0xd8, 0x43, 0x15)),
];

/// A placed circular marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Pile {
    pub(crate) id: PileId,
    /// Center in document coordinates.
    pub center: Point,
    /// Diameter; zero while a draw gesture is starting.
    pub diameter: f64,
    pub(crate) category: String,
    /// Trimmed label text.
    pub(crate) label: String,
    /// Colors, copied from the category at creation time.
    pub scheme: Scheme,
}

impl Pile {
    /// Create a new unlabeled pile with a fresh id.
    pub fn new(category: impl Into<String>, center: Point, diameter: f64, scheme: Scheme) -> Self {
        Self {
            id: PileId::generate(),
            center,
            diameter,
            category: category.into(),
            label: String::new(),
            scheme,
        }
    }

    /// Reconstruct a pile with a specific id (for loading).
    pub(crate) fn reconstruct(id: PileId, category: String, label: String, geometry: PileGeometry) -> Self {
        Self {
            id,
            center: geometry.center,
            diameter: geometry.size,
            category,
            label: label.trim().to_string(),
            scheme: geometry.scheme,
        }
    }

    pub fn id(&self) -> &PileId {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn set_label(&mut self, text: &str) {
        self.label = text.trim().to_string();
    }

    pub fn bounds(&self) -> PileBox {
        PileBox::from_center(self.center, self.diameter)
    }

    pub fn hit_test(&self, point: Point) -> bool {
        geometry::circle_contains(self.center, self.diameter, point)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }

    /// Geometry snapshot for persistence.
    pub fn geometry(&self) -> PileGeometry {
        PileGeometry {
            center: self.center,
            size: self.diameter,
            scheme: self.scheme,
        }
    }

    /// Copy with a fresh id and the next label in sequence.
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            id: PileId::generate(),
            label: next_label(&self.label),
            ..self.clone()
        }
    }
}

/// Geometry payload stored as JSON text alongside each exported pile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PileGeometry {
    pub center: Point,
    pub size: f64,
    pub scheme: Scheme,
}

impl PileGeometry {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Next label in a numbered sequence.
///
/// A label made of a non-digit prefix, one run of digits and a non-digit
/// suffix gets its number incremented and zero-padded back to the original
/// width (`P-007-A` -> `P-008-A`, `P-099` -> `P-100`, `9` -> `10`). Any other
/// label is returned unchanged.
pub fn next_label(label: &str) -> String {
    let Some(start) = label.find(|c: char| c.is_ascii_digit()) else {
        return label.to_string();
    };
    let end = label[start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(label.len(), |offset| start + offset);
    let (prefix, digits, suffix) = (&label[..start], &label[start..end], &label[end..]);
    if suffix.chars().any(|c| c.is_ascii_digit()) {
        return label.to_string();
    }

    let mut bumped: Vec<u8> = digits.bytes().collect();
    let mut carry = true;
    for digit in bumped.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            carry = false;
            break;
        }
    }
    let mut number = String::with_capacity(bumped.len() + 1);
    if carry {
        number.push('1');
    }
    number.extend(bumped.into_iter().map(char::from));

    format!("{prefix}{number}{suffix}")
}
