use serde::{Deserialize, Serialize};

/// A 2D size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size2D {
    pub width: f64,
    pub height: f64,
}

impl Size2D {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Compute the aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0.0 {
            return 0.0;
        }
        self.width / self.height
    }
}

/// An axis-aligned rectangle in fractional coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin.
    pub fn from_size(size: Size2D) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Per-axis scale applied before every draw call.
///
/// Maps display-space coordinates onto device pixels, so callers can draw in
/// the preview's logical units while the buffer holds capture-quality pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleTransform {
    pub sx: f64,
    pub sy: f64,
}

impl ScaleTransform {
    pub fn identity() -> Self {
        Self { sx: 1.0, sy: 1.0 }
    }

    /// Transform that maps `from` onto `to`.
    pub fn between(from: Size2D, to: Size2D) -> Self {
        let sx = if from.width > 0.0 { to.width / from.width } else { 1.0 };
        let sy = if from.height > 0.0 { to.height / from.height } else { 1.0 };
        Self { sx, sy }
    }

    pub fn apply(&self, rect: Rect) -> Rect {
        Rect::new(
            rect.x * self.sx,
            rect.y * self.sy,
            rect.width * self.sx,
            rect.height * self.sy,
        )
    }
}

impl Default for ScaleTransform {
    fn default() -> Self {
        Self::identity()
    }
}
