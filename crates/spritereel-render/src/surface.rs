//! The render surface: one pixel buffer with two sizes.
//!
//! Drawing code works in display units (the 320-wide preview box); the buffer
//! holds the internal capture resolution. A per-axis scale transform, applied
//! inside every draw call, bridges the two.

use spritereel_core::frame::FrameBuffer;
use spritereel_core::math::{Rect, ScaleTransform, Size2D};
use spritereel_core::{AspectRatio, Color};

#[derive(Debug, Clone)]
pub struct RenderSurface {
    buffer: FrameBuffer,
    display: Size2D,
    transform: ScaleTransform,
    aspect: AspectRatio,
}

impl RenderSurface {
    pub fn new(aspect: AspectRatio) -> Self {
        let (iw, ih) = aspect.internal_resolution();
        let display = aspect.display_size2d();
        Self {
            buffer: FrameBuffer::new(iw, ih),
            display,
            transform: ScaleTransform::between(display, aspect.internal_size2d()),
            aspect,
        }
    }

    /// Adopt a new aspect ratio. The pixel buffer is reallocated only when the
    /// internal resolution actually changes; returns true in that case.
    pub fn configure(&mut self, aspect: AspectRatio) -> bool {
        if aspect == self.aspect {
            return false;
        }
        let (iw, ih) = aspect.internal_resolution();
        let reallocated = (iw, ih) != (self.buffer.width, self.buffer.height);
        if reallocated {
            self.buffer = FrameBuffer::new(iw, ih);
        }
        self.display = aspect.display_size2d();
        self.transform = ScaleTransform::between(self.display, aspect.internal_size2d());
        self.aspect = aspect;
        reallocated
    }

    pub fn aspect(&self) -> AspectRatio {
        self.aspect
    }

    /// Logical size that draw calls are expressed in.
    pub fn display_size(&self) -> Size2D {
        self.display
    }

    /// Pixel size of the underlying buffer.
    pub fn internal_size(&self) -> (u32, u32) {
        (self.buffer.width, self.buffer.height)
    }

    pub fn transform(&self) -> ScaleTransform {
        self.transform
    }

    /// The captured pixels, read in place by snapshots and the encoder.
    pub fn pixels(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.fill(&Color::TRANSPARENT);
    }

    /// Fill a display-space rectangle with a flat color.
    pub fn fill_rect(&mut self, rect: Rect, color: &Color) {
        let px = self.transform.apply(rect);
        let x0 = px.x.round().max(0.0) as u32;
        let y0 = px.y.round().max(0.0) as u32;
        let x1 = px.right().round().max(0.0) as u32;
        let y1 = px.bottom().round().max(0.0) as u32;
        self.buffer.fill_rect(x0, y0, x1, y1, color);
    }

    /// Draw the `src` region of `image` into the display-space rectangle `dst`.
    pub fn draw_image(&mut self, image: &FrameBuffer, src: Rect, dst: Rect) {
        let px = self.transform.apply(dst);
        self.buffer.draw_scaled(image, src, px);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_sizes_for_landscape() {
        let surface = RenderSurface::new(AspectRatio::LANDSCAPE_16_9);
        assert_eq!(surface.internal_size(), (1920, 1080));
        assert_eq!(surface.display_size(), Size2D::new(320.0, 180.0));
        assert!((surface.transform().sx - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_configure_reallocates_only_on_resolution_change() {
        let mut surface = RenderSurface::new(AspectRatio::LANDSCAPE_16_9);
        assert!(!surface.configure(AspectRatio::LANDSCAPE_16_9));
        assert!(surface.configure(AspectRatio::PORTRAIT_9_16));
        assert_eq!(surface.internal_size(), (1080, 1920));
        assert_eq!(surface.display_size(), Size2D::new(135.0, 240.0));
    }

    #[test]
    fn test_fill_rect_is_scaled_to_internal_pixels() {
        let mut surface = RenderSurface::new(AspectRatio::SQUARE);
        surface.clear();
        // 320 display units -> 1080 pixels.
        surface.fill_rect(Rect::new(0.0, 0.0, 160.0, 320.0), &Color::RED);
        assert_eq!(surface.pixels().get_pixel(539, 1079), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixels().get_pixel(540, 0), Some([0, 0, 0, 0]));
    }
}
