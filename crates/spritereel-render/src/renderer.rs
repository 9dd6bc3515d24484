//! Frame renderer for the recording preview.
//!
//! One frame = background, then the selected sprite scaled to fit, centered
//! horizontally, with its floor row on the ground line at 85% of the frame
//! height.

use spritereel_core::math::{Rect, Size2D};
use spritereel_core::{AspectRatio, Sprite};

use crate::anchor::AnchorCache;
use crate::background::{paint_background, Background};
use crate::surface::RenderSurface;

/// Fraction of the frame height where sprite floors land.
pub const GROUND_LINE: f64 = 0.85;

pub const MIN_ZOOM_PERCENT: u32 = 10;
pub const MAX_ZOOM_PERCENT: u32 = 100;

/// Clamp a zoom percentage into the supported range.
pub fn clamp_zoom(percent: u32) -> u32 {
    percent.clamp(MIN_ZOOM_PERCENT, MAX_ZOOM_PERCENT)
}

/// Everything a frame depends on besides the sprite itself.
#[derive(Debug, Clone)]
pub struct FrameSettings {
    pub aspect: AspectRatio,
    pub background: Background,
    pub zoom_percent: u32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            aspect: AspectRatio::default(),
            background: Background::default(),
            zoom_percent: MAX_ZOOM_PERCENT,
        }
    }
}

/// Where a sprite ended up, in display units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpritePlacement {
    pub rect: Rect,
    pub scale: f64,
    pub floor: u32,
}

impl SpritePlacement {
    /// Display-space y of the sprite's floor row.
    pub fn floor_y(&self) -> f64 {
        self.rect.y + self.floor as f64 * self.scale
    }
}

/// Fit a `sprite_w` x `sprite_h` sprite into `frame` (never upscaling past
/// 1:1 before zoom) and pin its floor to the ground line.
pub fn place_sprite(
    frame: Size2D,
    sprite_w: u32,
    sprite_h: u32,
    floor: u32,
    zoom_percent: u32,
) -> SpritePlacement {
    let (sw, sh) = (sprite_w.max(1) as f64, sprite_h.max(1) as f64);
    let zoom = clamp_zoom(zoom_percent) as f64 / 100.0;
    let scale = (frame.width / sw).min(frame.height / sh).min(1.0) * zoom;
    let width = sw * scale;
    let height = sh * scale;
    let x = (frame.width - width) / 2.0;
    let y = frame.height * GROUND_LINE - floor as f64 * scale;
    SpritePlacement {
        rect: Rect::new(x, y, width, height),
        scale,
        floor,
    }
}

/// Composite one frame into `surface`. Without a sprite the frame is
/// background only.
pub fn render_frame(
    surface: &mut RenderSurface,
    sprite: Option<&Sprite>,
    settings: &FrameSettings,
    anchors: &mut AnchorCache,
) -> Option<SpritePlacement> {
    surface.configure(settings.aspect);
    paint_background(surface, &settings.background);

    let sprite = sprite?;
    let floor = anchors.floor(sprite);
    let placement = place_sprite(
        surface.display_size(),
        sprite.width(),
        sprite.height(),
        floor,
        settings.zoom_percent,
    );
    let src = Rect::new(0.0, 0.0, sprite.width() as f64, sprite.height() as f64);
    surface.draw_image(sprite.image(), src, placement.rect);
    Some(placement)
}

/// Owns the render surface and remembers whether its pixels are stale.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    surface: RenderSurface,
    dirty: bool,
    frames_rendered: u64,
    last_placement: Option<SpritePlacement>,
}

impl FrameRenderer {
    pub fn new(aspect: AspectRatio) -> Self {
        Self {
            surface: RenderSurface::new(aspect),
            dirty: true,
            frames_rendered: 0,
            last_placement: None,
        }
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Mark the current pixels as out of date (selection, settings or sprite
    /// set changed).
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn last_placement(&self) -> Option<SpritePlacement> {
        self.last_placement
    }

    /// Unconditionally render a frame.
    pub fn render(
        &mut self,
        sprite: Option<&Sprite>,
        settings: &FrameSettings,
        anchors: &mut AnchorCache,
    ) -> &RenderSurface {
        self.last_placement = render_frame(&mut self.surface, sprite, settings, anchors);
        self.frames_rendered += 1;
        self.dirty = false;
        &self.surface
    }

    /// Render only if something changed since the last frame.
    pub fn render_if_dirty(
        &mut self,
        sprite: Option<&Sprite>,
        settings: &FrameSettings,
        anchors: &mut AnchorCache,
    ) -> &RenderSurface {
        if self.dirty {
            self.render(sprite, settings, anchors);
        }
        &self.surface
    }
}
