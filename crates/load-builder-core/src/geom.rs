use serde::{Deserialize, Serialize};

/// Comparison slack for floor coordinates (inches).
pub const EPS: f64 = 1e-6;

/// Axis-aligned rectangle on the trailer floor (inches).
/// `x` runs across the trailer width, `y` along the trailer length
/// (towards the rear); `w,h` are the extents along those axes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Forward extent along the trailer length (`y + h`).
    pub fn top(&self) -> f64 {
        self.y + self.h
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Returns true if `r` lies fully inside `self` (edge contact allowed).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x - EPS
            && r.y >= self.y - EPS
            && r.right() <= self.right() + EPS
            && r.top() <= self.top() + EPS
    }

    /// Returns true if the interiors of the two rectangles overlap.
    /// Shared edges do not count as an intersection.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x + EPS < other.right()
            && other.x + EPS < self.right()
            && self.y + EPS < other.top()
            && other.y + EPS < self.top()
    }
}
