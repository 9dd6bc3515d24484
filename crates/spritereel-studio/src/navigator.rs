//! Sprite selection.

use spritereel_core::{SpriteCollection, SpriteId};

#[derive(Debug, Clone, Default)]
pub struct Navigator {
    selected: Option<SpriteId>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<SpriteId> {
        self.selected
    }

    /// Zero-based index of the selection in `sprites`.
    pub fn position(&self, sprites: &SpriteCollection) -> Option<usize> {
        self.selected.and_then(|id| sprites.position(id))
    }

    /// Select `id` if it is loaded. Returns true when the selection changed.
    pub fn select(&mut self, id: SpriteId, sprites: &SpriteCollection) -> bool {
        if !sprites.contains(id) || self.selected == Some(id) {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn can_prev(&self, sprites: &SpriteCollection) -> bool {
        matches!(self.position(sprites), Some(i) if i > 0)
    }

    pub fn can_next(&self, sprites: &SpriteCollection) -> bool {
        matches!(self.position(sprites), Some(i) if i + 1 < sprites.len())
    }

    pub fn prev(&mut self, sprites: &SpriteCollection) -> bool {
        match self.position(sprites) {
            Some(i) if i > 0 => self.select_index(i - 1, sprites),
            _ => false,
        }
    }

    pub fn next(&mut self, sprites: &SpriteCollection) -> bool {
        match self.position(sprites) {
            Some(i) => self.select_index(i + 1, sprites),
            None => false,
        }
    }

    fn select_index(&mut self, index: usize, sprites: &SpriteCollection) -> bool {
        match sprites.at(index) {
            Some(sprite) => self.select(sprite.id(), sprites),
            None => false,
        }
    }

    /// Revalidate after the collection changed. A selection that is still
    /// loaded is kept. Otherwise the sprite at `former_index` (clamped to
    /// the last one) is selected, or the first one when there was no
    /// selection. Returns true when the selection changed.
    pub fn sync(&mut self, sprites: &SpriteCollection, former_index: Option<usize>) -> bool {
        if let Some(id) = self.selected {
            if sprites.contains(id) {
                return false;
            }
        }
        let before = self.selected;
        self.selected = if sprites.is_empty() {
            None
        } else {
            let index = former_index.unwrap_or(0).min(sprites.len() - 1);
            sprites.at(index).map(|s| s.id())
        };
        self.selected != before
    }

    /// `Sprite i / n`, 1-based; `Sprite 0 / 0` when nothing is loaded.
    pub fn label(&self, sprites: &SpriteCollection) -> String {
        let shown = self.position(sprites).map(|i| i + 1).unwrap_or(0);
        format!("Sprite {} / {}", shown, sprites.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spritereel_core::frame::FrameBuffer;
    use spritereel_core::Sprite;

    fn collection(n: usize) -> SpriteCollection {
        let mut sprites = SpriteCollection::new();
        sprites.extend((0..n).map(|i| Sprite::new(format!("s{}", i), FrameBuffer::new(1, 1))));
        sprites
    }

    #[test]
    fn test_sync_selects_first_sprite() {
        let sprites = collection(3);
        let mut nav = Navigator::new();
        assert_eq!(nav.label(&sprites), "Sprite 0 / 3");
        assert!(nav.sync(&sprites, None));
        assert_eq!(nav.position(&sprites), Some(0));
        assert_eq!(nav.label(&sprites), "Sprite 1 / 3");
    }

    #[test]
    fn test_prev_next_stop_at_edges() {
        let sprites = collection(2);
        let mut nav = Navigator::new();
        nav.sync(&sprites, None);
        assert!(!nav.can_prev(&sprites));
        assert!(!nav.prev(&sprites));
        assert!(nav.next(&sprites));
        assert_eq!(nav.label(&sprites), "Sprite 2 / 2");
        assert!(!nav.can_next(&sprites));
        assert!(!nav.next(&sprites));
        assert!(nav.prev(&sprites));
        assert_eq!(nav.position(&sprites), Some(0));
    }

    #[test]
    fn test_select_rejects_unknown_id() {
        let sprites = collection(2);
        let mut nav = Navigator::new();
        assert!(!nav.select(SpriteId::new(), &sprites));
        assert!(nav.select(sprites.ids()[1], &sprites));
        assert!(!nav.select(sprites.ids()[1], &sprites));
    }

    #[test]
    fn test_removing_selected_clamps_to_last() {
        let mut sprites = collection(3);
        let mut nav = Navigator::new();
        let last = sprites.ids()[2];
        nav.select(last, &sprites);
        sprites.remove(last);
        assert!(nav.sync(&sprites, Some(2)));
        assert_eq!(nav.position(&sprites), Some(1));
    }

    #[test]
    fn test_empty_collection_clears_selection() {
        let mut sprites = collection(1);
        let mut nav = Navigator::new();
        nav.sync(&sprites, None);
        let id = sprites.ids()[0];
        sprites.remove(id);
        assert!(nav.sync(&sprites, Some(0)));
        assert_eq!(nav.selected(), None);
        assert!(!nav.can_next(&sprites));
        assert_eq!(nav.label(&sprites), "Sprite 0 / 0");
    }
}
