use crate::color::Color;
use crate::error::{ReelError, ReelResult};
use crate::math::Rect;

const BYTES_PER_PIXEL: usize = 4;

/// An RGBA8 raster: decoded sprites, background images and the render surface
/// all share this layout (row-major, 4 bytes per pixel, straight alpha).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Raw pixel data.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer filled with zeros (transparent black).
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width as usize) * (height as usize) * BYTES_PER_PIXEL;
        Self {
            data: vec![0u8; size],
            width,
            height,
        }
    }

    /// Create a frame buffer filled with a solid color.
    pub fn solid(width: u32, height: u32, color: &Color) -> Self {
        let mut fb = Self::new(width, height);
        fb.fill(color);
        fb
    }

    /// Wrap existing RGBA bytes. The length must match the dimensions.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> ReelResult<Self> {
        let expected = (width as usize) * (height as usize) * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(ReelError::InvalidArgument(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Total byte size of the pixel data.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * BYTES_PER_PIXEL
    }

    /// Get the RGBA value at a pixel coordinate. Returns None if out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let o = self.offset(x, y);
        Some([
            self.data[o],
            self.data[o + 1],
            self.data[o + 2],
            self.data[o + 3],
        ])
    }

    /// Set the RGBA value at a pixel coordinate. No-op if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let o = self.offset(x, y);
        self.data[o..o + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    /// The RGBA bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = self.offset(0, y);
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }

    /// Overwrite every pixel with `color`.
    pub fn fill(&mut self, color: &Color) {
        let pixel = color.to_rgba8();
        for d in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            d.copy_from_slice(&pixel);
        }
    }

    /// Overwrite the pixels of `[x0, x1) x [y0, y1)`, clipped to the buffer.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: &Color) {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let pixel = color.to_rgba8();
        for y in y0..y1 {
            let start = self.offset(x0, y);
            let end = self.offset(x1, y);
            for d in self.data[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
                d.copy_from_slice(&pixel);
            }
        }
    }

    /// Alpha-composite `src` on top of `self` at position (dx, dy), unscaled.
    pub fn composite_over(&mut self, src: &FrameBuffer, dx: i32, dy: i32) {
        let dst_width = self.width as i32;
        let dst_height = self.height as i32;

        let start_y = (-dy).max(0);
        let end_y = (src.height as i32).min(dst_height - dy);
        let start_x = (-dx).max(0);
        let end_x = (src.width as i32).min(dst_width - dx);

        if start_x >= end_x || start_y >= end_y {
            return;
        }

        let src_stride = src.width as usize * BYTES_PER_PIXEL;
        let dst_stride = self.width as usize * BYTES_PER_PIXEL;
        let len = (end_x - start_x) as usize * BYTES_PER_PIXEL;

        for sy in start_y..end_y {
            let src_row_start = sy as usize * src_stride + start_x as usize * BYTES_PER_PIXEL;
            let dst_row_start =
                (dy + sy) as usize * dst_stride + (dx + start_x) as usize * BYTES_PER_PIXEL;

            let src_slice = &src.data[src_row_start..src_row_start + len];
            let dst_slice = &mut self.data[dst_row_start..dst_row_start + len];

            for (s, d) in src_slice
                .chunks_exact(BYTES_PER_PIXEL)
                .zip(dst_slice.chunks_exact_mut(BYTES_PER_PIXEL))
            {
                blend_over(d, s);
            }
        }
    }

    /// Draw the `src_rect` region of `src` into `dst_rect` of `self`
    /// (both in pixel units), sampling nearest-neighbor and blending
    /// source-over. A destination pixel is covered when its center lies inside
    /// `dst_rect`.
    pub fn draw_scaled(&mut self, src: &FrameBuffer, src_rect: Rect, dst_rect: Rect) {
        if src.is_empty() || src_rect.is_empty() || dst_rect.is_empty() {
            return;
        }

        let x_start = dst_rect.x.floor().max(0.0) as u32;
        let x_end = dst_rect.right().ceil().min(self.width as f64).max(0.0) as u32;
        let y_start = dst_rect.y.floor().max(0.0) as u32;
        let y_end = dst_rect.bottom().ceil().min(self.height as f64).max(0.0) as u32;
        if x_start >= x_end || y_start >= y_end {
            return;
        }

        let src_x_max = (src_rect.right().ceil() as i64 - 1).clamp(0, src.width as i64 - 1);
        let src_y_max = (src_rect.bottom().ceil() as i64 - 1).clamp(0, src.height as i64 - 1);
        let src_x_min = (src_rect.x.floor() as i64).clamp(0, src_x_max);
        let src_y_min = (src_rect.y.floor() as i64).clamp(0, src_y_max);

        // Column lookup is identical for every row.
        let columns: Vec<Option<u32>> = (x_start..x_end)
            .map(|x| {
                let cx = x as f64 + 0.5;
                if cx < dst_rect.x || cx >= dst_rect.right() {
                    return None;
                }
                let u = (cx - dst_rect.x) / dst_rect.width;
                let sx = (src_rect.x + u * src_rect.width).floor() as i64;
                Some(sx.clamp(src_x_min, src_x_max) as u32)
            })
            .collect();

        for y in y_start..y_end {
            let cy = y as f64 + 0.5;
            if cy < dst_rect.y || cy >= dst_rect.bottom() {
                continue;
            }
            let v = (cy - dst_rect.y) / dst_rect.height;
            let sy = ((src_rect.y + v * src_rect.height).floor() as i64).clamp(src_y_min, src_y_max)
                as u32;

            for (i, sx) in columns.iter().enumerate() {
                let Some(sx) = *sx else { continue };
                let so = src.offset(sx, sy);
                let d_off = self.offset(x_start + i as u32, y);
                let s = [
                    src.data[so],
                    src.data[so + 1],
                    src.data[so + 2],
                    src.data[so + 3],
                ];
                blend_over(&mut self.data[d_off..d_off + BYTES_PER_PIXEL], &s);
            }
        }
    }
}

/// Porter-Duff "over" for one straight-alpha RGBA pixel.
fn blend_over(d: &mut [u8], s: &[u8]) {
    let sa = s[3] as u32;
    if sa == 0 {
        return;
    }
    if sa == 255 {
        d.copy_from_slice(&s[..BYTES_PER_PIXEL]);
        return;
    }

    let da = d[3] as u32;
    let inv_sa = 255 - sa;
    let out_a = sa + (da * inv_sa) / 255;
    if out_a == 0 {
        return;
    }

    for c in 0..3 {
        let sc = s[c] as u32;
        let dc = d[c] as u32;
        d[c] = ((sc * sa * 255 + dc * da * inv_sa) / (out_a * 255)) as u8;
    }
    d[3] = out_a as u8;
}
