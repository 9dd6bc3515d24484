//! Aspect ratios and the two sizes derived from them: the on-screen preview
//! box and the internal capture resolution.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReelError;
use crate::math::Size2D;

/// Bounding box for the on-screen preview.
pub const PREVIEW_BASE_WIDTH: u32 = 320;
pub const PREVIEW_BASE_HEIGHT: u32 = 240;

/// Long edge of the internal capture resolution.
pub const CAPTURE_LONG_EDGE: u32 = 1080;

/// One of the preset target aspect ratios, kept in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AspectRatio {
    w: u32,
    h: u32,
}

impl AspectRatio {
    pub const LANDSCAPE_16_9: AspectRatio = AspectRatio { w: 16, h: 9 };
    pub const CLASSIC_4_3: AspectRatio = AspectRatio { w: 4, h: 3 };
    pub const SQUARE: AspectRatio = AspectRatio { w: 1, h: 1 };
    pub const PORTRAIT_4_5: AspectRatio = AspectRatio { w: 4, h: 5 };
    pub const PORTRAIT_9_16: AspectRatio = AspectRatio { w: 9, h: 16 };

    /// The ratios offered by the preview selector.
    pub const PRESETS: [AspectRatio; 5] = [
        Self::LANDSCAPE_16_9,
        Self::CLASSIC_4_3,
        Self::SQUARE,
        Self::PORTRAIT_4_5,
        Self::PORTRAIT_9_16,
    ];

    /// Look up a preset ratio. Sides are reduced first, so `32:18` is
    /// `16:9`; anything outside `PRESETS` is rejected.
    pub fn new(w: u32, h: u32) -> Result<Self, ReelError> {
        if w == 0 || h == 0 {
            return Err(ReelError::InvalidArgument(format!(
                "aspect ratio sides must be positive, got {}:{}",
                w, h
            )));
        }
        let divisor = gcd(w, h);
        let reduced = Self {
            w: w / divisor,
            h: h / divisor,
        };
        if !Self::PRESETS.contains(&reduced) {
            let supported: Vec<String> = Self::PRESETS.iter().map(|r| r.to_string()).collect();
            return Err(ReelError::InvalidArgument(format!(
                "unsupported aspect ratio {}:{} (expected one of {})",
                w,
                h,
                supported.join(", ")
            )));
        }
        Ok(reduced)
    }

    pub fn w(&self) -> u32 {
        self.w
    }

    pub fn h(&self) -> u32 {
        self.h
    }

    pub fn is_landscape_or_square(&self) -> bool {
        self.w >= self.h
    }

    /// Size of the on-screen preview box, bounded by 320x240.
    pub fn display_size(&self) -> (u32, u32) {
        let (w, h) = (self.w as f64, self.h as f64);
        if self.is_landscape_or_square() {
            let height = (PREVIEW_BASE_WIDTH as f64 * h / w).round() as u32;
            (PREVIEW_BASE_WIDTH, height.max(1))
        } else {
            let width = (PREVIEW_BASE_HEIGHT as f64 * w / h).round() as u32;
            (width.max(1), PREVIEW_BASE_HEIGHT)
        }
    }

    /// Encoder-friendly internal resolution: long edge 1080, short edge even.
    pub fn internal_resolution(&self) -> (u32, u32) {
        let (w, h) = (self.w as f64, self.h as f64);
        let long = CAPTURE_LONG_EDGE as f64;
        if self.is_landscape_or_square() {
            (round_even(long * w / h), CAPTURE_LONG_EDGE)
        } else {
            (CAPTURE_LONG_EDGE, round_even(long * h / w))
        }
    }

    pub fn display_size2d(&self) -> Size2D {
        let (w, h) = self.display_size();
        Size2D::new(w as f64, h as f64)
    }

    pub fn internal_size2d(&self) -> Size2D {
        let (w, h) = self.internal_resolution();
        Size2D::new(w as f64, h as f64)
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Round to the nearest even integer, never below 2.
pub fn round_even(n: f64) -> u32 {
    let even = (n / 2.0).round() * 2.0;
    if even < 2.0 {
        2
    } else {
        even as u32
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::LANDSCAPE_16_9
    }
}

impl FromStr for AspectRatio {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReelError::InvalidArgument(format!("invalid aspect ratio '{}'", s));
        let (w, h) = s.trim().split_once(':').ok_or_else(invalid)?;
        let w = w.trim().parse::<u32>().map_err(|_| invalid())?;
        let h = h.trim().parse::<u32>().map_err(|_| invalid())?;
        AspectRatio::new(w, h)
    }
}

impl TryFrom<String> for AspectRatio {
    type Error = ReelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AspectRatio> for String {
    fn from(value: AspectRatio) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.w, self.h)
    }
}
