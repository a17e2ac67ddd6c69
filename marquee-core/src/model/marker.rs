use std::fmt;

use serde::{Deserialize, Serialize};

use super::Geometry;

/// Marker identity. `MarkerId::NONE` (0) means "no marker" and is never issued.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct MarkerId(pub u32);

impl MarkerId {
    pub const NONE: MarkerId = MarkerId(0);
    /// Largest id a marker may carry; the allocator needs room to count past it
    pub const MAX: MarkerId = MarkerId(u32::MAX - 1);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Not `NONE` and no larger than `MAX`
    pub fn is_valid(self) -> bool {
        self.is_some() && self <= Self::MAX
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outline drawn for a marker
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Rectangle,
    Ellipse,
}

impl Shape {
    pub fn all() -> &'static [Shape] {
        &[Shape::Rectangle, Shape::Ellipse]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Rectangle => "Rectangle",
            Shape::Ellipse => "Ellipse",
        }
    }

    pub fn toggled(self) -> Shape {
        match self {
            Shape::Rectangle => Shape::Ellipse,
            Shape::Ellipse => Shape::Rectangle,
        }
    }
}

/// A committed region on the image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    #[serde(flatten)]
    pub geometry: Geometry,
    pub shape: Shape,
    #[serde(default)]
    pub filled: bool,
    /// Render cache of "this is the surface's selection"
    #[serde(skip)]
    pub selected: bool,
}

impl Marker {
    /// Create a marker; the geometry is normalized so the origin is the top-left corner
    pub fn new(id: MarkerId, geometry: Geometry, shape: Shape, filled: bool) -> Self {
        Self {
            id,
            geometry: geometry.normalized(),
            shape,
            filled,
            selected: false,
        }
    }

    pub fn is_ellipse(&self) -> bool {
        self.shape == Shape::Ellipse
    }
}
