//! Background compositor: flat color or a center-cropped image.

use std::sync::Arc;

use spritereel_core::frame::FrameBuffer;
use spritereel_core::math::{Rect, Size2D};
use spritereel_core::Color;

use crate::surface::RenderSurface;

/// What sits behind the sprite.
#[derive(Debug, Clone)]
pub struct Background {
    /// Hex color string as entered by the user. Also the reference color for
    /// floor detection, even when an image covers it.
    color_hex: String,
    color: Color,
    image: Option<Arc<FrameBuffer>>,
}

impl Background {
    pub fn solid(hex: impl Into<String>) -> Self {
        let color_hex = hex.into();
        let color = Color::from_hex_or_white(Some(color_hex.as_str()));
        Self {
            color_hex,
            color,
            image: None,
        }
    }

    pub fn with_image(mut self, image: Option<FrameBuffer>) -> Self {
        self.set_image(image);
        self
    }

    pub fn color_hex(&self) -> &str {
        &self.color_hex
    }

    /// Parsed background color; malformed input reads as white.
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn image(&self) -> Option<&FrameBuffer> {
        self.image.as_deref()
    }

    pub fn set_color(&mut self, hex: impl Into<String>) {
        self.color_hex = hex.into();
        self.color = Color::from_hex_or_white(Some(self.color_hex.as_str()));
    }

    /// Zero-sized images count as "no image".
    pub fn set_image(&mut self, image: Option<FrameBuffer>) {
        self.image = image.filter(|img| !img.is_empty()).map(Arc::new);
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::solid("#ffffff")
    }
}

/// Source rectangle of a center crop of an `image_w` x `image_h` image to the
/// `target` aspect ratio (width / height).
pub fn center_crop(image_w: u32, image_h: u32, target: f64) -> Rect {
    let (iw, ih) = (image_w as f64, image_h as f64);
    if ih == 0.0 || target <= 0.0 {
        return Rect::new(0.0, 0.0, iw, ih);
    }
    if iw / ih > target {
        // Wider than the frame: keep full height, trim the sides.
        let sw = ih * target;
        Rect::new((iw - sw) / 2.0, 0.0, sw, ih)
    } else {
        let sh = iw / target;
        Rect::new(0.0, (ih - sh) / 2.0, iw, sh)
    }
}

/// Paint the whole display rectangle of `surface`.
pub fn paint_background(surface: &mut RenderSurface, background: &Background) {
    let display: Size2D = surface.display_size();
    let frame = Rect::from_size(display);
    match background.image() {
        Some(image) => {
            let src = center_crop(image.width, image.height, display.aspect_ratio());
            // Only the crop is drawn; transparent image pixels stay transparent.
            surface.clear();
            surface.draw_image(image, src, frame);
        }
        None => surface.fill_rect(frame, &background.color()),
    }
}
