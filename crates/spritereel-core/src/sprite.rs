//! Sprites and the ordered collection that owns them.
//!
//! Every sprite gets a [`SpriteId`] when it is loaded. Selection, floor caches
//! and thumbnails key off that id, so inserting, deleting or reordering
//! sprites never shifts state onto the wrong image.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::frame::FrameBuffer;

/// Stable opaque identity of a loaded sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpriteId(uuid::Uuid);

impl SpriteId {
    /// Allocate a fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for SpriteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decoded still image. Cheap to clone; the pixels are shared.
#[derive(Debug, Clone)]
pub struct Sprite {
    id: SpriteId,
    name: String,
    image: Arc<FrameBuffer>,
}

impl Sprite {
    pub fn new(name: impl Into<String>, image: FrameBuffer) -> Self {
        Self {
            id: SpriteId::new(),
            name: name.into(),
            image: Arc::new(image),
        }
    }

    pub fn id(&self) -> SpriteId {
        self.id
    }

    /// Source file name (or any label the loader chose).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &FrameBuffer {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }
}

/// Ordered set of sprites, in sheet/navigator order.
#[derive(Debug, Clone, Default)]
pub struct SpriteCollection {
    sprites: Vec<Sprite>,
}

impl SpriteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Append a loaded batch, keeping its order.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = Sprite>) {
        self.sprites.extend(batch);
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Sprite> {
        self.sprites.get(index)
    }

    pub fn position(&self, id: SpriteId) -> Option<usize> {
        self.sprites.iter().position(|s| s.id == id)
    }

    pub fn contains(&self, id: SpriteId) -> bool {
        self.position(id).is_some()
    }

    /// Remove a sprite, returning it if it was present.
    pub fn remove(&mut self, id: SpriteId) -> Option<Sprite> {
        let index = self.position(id)?;
        Some(self.sprites.remove(index))
    }

    /// Move a sprite so it ends up at `target` (clamped to the last slot).
    /// Returns false when the id is unknown.
    pub fn move_to(&mut self, id: SpriteId, target: usize) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let sprite = self.sprites.remove(from);
        let target = target.min(self.sprites.len());
        self.sprites.insert(target, sprite);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }

    pub fn as_slice(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn ids(&self) -> Vec<SpriteId> {
        self.sprites.iter().map(|s| s.id).collect()
    }
}
