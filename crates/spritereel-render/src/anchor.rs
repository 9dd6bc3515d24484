//! Sprite anchor resolver.
//!
//! Sprites exported from different tools carry different amounts of
//! transparent (or background-colored) padding below the character. The
//! "floor" is the lowest row holding visible content; the renderer pins that
//! row to a shared ground line so every sprite stands on the same spot.

use std::collections::HashMap;

use rayon::prelude::*;
use spritereel_core::frame::FrameBuffer;
use spritereel_core::{Color, Sprite, SpriteCollection, SpriteId};

/// Pixels at or below this alpha are treated as empty.
pub const ALPHA_THRESHOLD: u8 = 10;
/// Per-channel difference a pixel needs to count as "not background".
pub const CHANNEL_TOLERANCE: u8 = 10;

/// Lowest row of `image` containing a pixel that is visible and differs from
/// `background`. Rows are scanned bottom-up, columns left to right.
/// An image with no such pixel floors at its last row.
pub fn find_floor(image: &FrameBuffer, background: &Color) -> u32 {
    for y in (0..image.height).rev() {
        let hit = image.row(y).chunks_exact(4).any(|p| {
            let px = Color::rgba(p[0], p[1], p[2], p[3]);
            px.a > ALPHA_THRESHOLD && !px.rgb_close_to(background, CHANNEL_TOLERANCE)
        });
        if hit {
            return y;
        }
    }
    image.height.saturating_sub(1)
}

/// Floor rows per sprite, valid for exactly one background color.
#[derive(Debug, Clone)]
pub struct AnchorCache {
    background: Color,
    floors: HashMap<SpriteId, u32>,
}

impl AnchorCache {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            floors: HashMap::new(),
        }
    }

    /// The color every cached entry was computed against.
    pub fn background(&self) -> Color {
        self.background
    }

    /// Switch the reference color. Any actual change drops every entry;
    /// returns true when that happened.
    pub fn set_background(&mut self, background: Color) -> bool {
        if background.to_rgba8()[..3] == self.background.to_rgba8()[..3] {
            return false;
        }
        tracing::debug!(
            from = %self.background,
            to = %background,
            dropped = self.floors.len(),
            "background changed, invalidating floor cache"
        );
        self.background = background;
        self.floors.clear();
        true
    }

    /// Floor of `sprite`, computed on first use.
    pub fn floor(&mut self, sprite: &Sprite) -> u32 {
        let background = self.background;
        *self.floors.entry(sprite.id()).or_insert_with(|| {
            let floor = find_floor(sprite.image(), &background);
            tracing::debug!(sprite = %sprite.name(), floor, "resolved sprite floor");
            floor
        })
    }

    pub fn cached(&self, id: SpriteId) -> Option<u32> {
        self.floors.get(&id).copied()
    }

    /// Compute every missing floor up front, in parallel.
    pub fn rebuild<'a>(&mut self, sprites: impl IntoIterator<Item = &'a Sprite>) {
        let pending: Vec<&Sprite> = sprites
            .into_iter()
            .filter(|s| !self.floors.contains_key(&s.id()))
            .collect();
        if pending.is_empty() {
            return;
        }
        let background = self.background;
        let computed: Vec<(SpriteId, u32)> = pending
            .par_iter()
            .map(|s| (s.id(), find_floor(s.image(), &background)))
            .collect();
        tracing::debug!(count = computed.len(), "floor cache rebuilt");
        self.floors.extend(computed);
    }

    /// Forget sprites that are no longer in `sprites`.
    pub fn retain_loaded(&mut self, sprites: &SpriteCollection) {
        self.floors.retain(|id, _| sprites.contains(*id));
    }

    pub fn len(&self) -> usize {
        self.floors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }
}

impl Default for AnchorCache {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 8x20 sprite: opaque red body on rows 2..=9, transparent below.
    fn padded_sprite() -> FrameBuffer {
        let mut fb = FrameBuffer::new(8, 20);
        fb.fill_rect(2, 2, 6, 10, &Color::RED);
        fb
    }

    #[test]
    fn test_floor_skips_transparent_rows() {
        assert_eq!(find_floor(&padded_sprite(), &Color::WHITE), 9);
    }

    #[test]
    fn test_floor_ignores_background_colored_pixels() {
        let mut fb = padded_sprite();
        // Near-white ground strip should read as background.
        fb.fill_rect(0, 15, 8, 20, &Color::rgb(250, 250, 250));
        assert_eq!(find_floor(&fb, &Color::WHITE), 9);
        // Against black it is content.
        assert_eq!(find_floor(&fb, &Color::BLACK), 19);
    }

    #[test]
    fn test_floor_ignores_faint_alpha() {
        let mut fb = padded_sprite();
        fb.set_pixel(0, 18, [0, 0, 0, ALPHA_THRESHOLD]);
        assert_eq!(find_floor(&fb, &Color::WHITE), 9);
        fb.set_pixel(0, 18, [0, 0, 0, ALPHA_THRESHOLD + 1]);
        assert_eq!(find_floor(&fb, &Color::WHITE), 18);
    }

    #[test]
    fn test_floor_defaults_to_last_row() {
        let fb = FrameBuffer::new(4, 7);
        assert_eq!(find_floor(&fb, &Color::WHITE), 6);
        assert_eq!(find_floor(&FrameBuffer::new(0, 0), &Color::WHITE), 0);
    }

    #[test]
    fn test_cache_is_idempotent() {
        let sprite = Sprite::new("body", padded_sprite());
        let mut cache = AnchorCache::new(Color::WHITE);
        assert_eq!(cache.cached(sprite.id()), None);
        assert_eq!(cache.floor(&sprite), 9);
        assert_eq!(cache.floor(&sprite), 9);
        assert_eq!(cache.cached(sprite.id()), Some(9));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_background_change_invalidates_everything() {
        let a = Sprite::new("a", padded_sprite());
        let b = Sprite::new("b", FrameBuffer::solid(3, 3, &Color::BLACK));
        let mut cache = AnchorCache::new(Color::WHITE);
        cache.rebuild([&a, &b]);
        assert_eq!(cache.len(), 2);

        assert!(!cache.set_background(Color::WHITE));
        assert_eq!(cache.len(), 2);

        assert!(cache.set_background(Color::BLACK));
        assert!(cache.is_empty());
        // Recomputed against the new color: the black sprite is now all background.
        assert_eq!(cache.floor(&b), 2);
        assert_eq!(cache.floor(&a), 9);
    }

    #[test]
    fn test_retain_loaded_prunes_removed_sprites() {
        let mut sprites = SpriteCollection::new();
        let a = Sprite::new("a", padded_sprite());
        let b = Sprite::new("b", padded_sprite());
        let (ida, idb) = (a.id(), b.id());
        sprites.extend([a, b]);

        let mut cache = AnchorCache::default();
        cache.rebuild(sprites.iter());
        sprites.remove(ida);
        cache.retain_loaded(&sprites);
        assert_eq!(cache.cached(ida), None);
        assert_eq!(cache.cached(idb), Some(9));
    }
}
