use serde::{Deserialize, Serialize};

/// A position on the image surface, in device pixels
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a rectangle. Components may be negative while a drag is live.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub const ZERO: Extent = Extent {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle; ellipses are rendered inscribed in it
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Geometry {
    pub origin: Point,
    pub extent: Extent,
}

impl Geometry {
    /// Reported alongside id 0 when the selection is cleared
    pub const EMPTY: Geometry = Geometry {
        origin: Point::ZERO,
        extent: Extent::ZERO,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            extent: Extent::new(width, height),
        }
    }

    /// Zero-sized geometry anchored at `origin`, the start of every drag
    pub fn at(origin: Point) -> Self {
        Self {
            origin,
            extent: Extent::ZERO,
        }
    }

    /// Flip negative extents so that `origin` is the top-left corner
    pub fn normalize(&mut self) {
        if self.extent.width < 0.0 {
            self.origin.x += self.extent.width;
            self.extent.width = -self.extent.width;
        }
        if self.extent.height < 0.0 {
            self.origin.y += self.extent.height;
            self.extent.height = -self.extent.height;
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    pub fn is_normalized(&self) -> bool {
        self.extent.width >= 0.0 && self.extent.height >= 0.0
    }

    /// Signed area; negative when exactly one extent component is negative
    pub fn area(&self) -> f64 {
        self.extent.width * self.extent.height
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.extent.width
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.extent.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.extent.width / 2.0,
            self.origin.y + self.extent.height / 2.0,
        )
    }

    /// Strict interior test. Points on the boundary are not contained.
    pub fn contains_point(&self, p: Point) -> bool {
        p.x > self.origin.x && p.x < self.right() && p.y > self.origin.y && p.y < self.bottom()
    }

    /// Overlap test that counts touching edges as intersecting
    pub fn intersects(&self, other: &Geometry) -> bool {
        !(self.right() < other.origin.x
            || other.right() < self.origin.x
            || self.bottom() < other.origin.y
            || other.bottom() < self.origin.y)
    }
}
