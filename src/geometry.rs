use serde::{Deserialize, Serialize};

/// A point on the diagram canvas (pixels)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Return this point shifted by a delta
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Rectangle representing position and size on the canvas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    /// Create a new rectangle
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the right edge of the rectangle
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the bottom edge of the rectangle
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if this rectangle intersects with another
    pub fn intersects(&self, other: &Rectangle) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }

    /// Check if this rectangle contains a point
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Return this rectangle shifted by a delta
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Point where the ray from the centre towards `toward` leaves the rectangle.
    ///
    /// Link endpoints are anchored here so that they sit on the node outline
    /// instead of its centre. A degenerate ray (target on the centre) yields
    /// the centre itself.
    pub fn boundary_point_towards(&self, toward: Point) -> Point {
        let center = self.center();
        let dx = toward.x - center.x;
        let dy = toward.y - center.y;

        if dx == 0.0 && dy == 0.0 {
            return center;
        }

        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let tx = if dx == 0.0 { f32::INFINITY } else { half_w / dx.abs() };
        let ty = if dy == 0.0 { f32::INFINITY } else { half_h / dy.abs() };
        let t = tx.min(ty);

        Point::new(center.x + dx * t, center.y + dy * t)
    }
}
