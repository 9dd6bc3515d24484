//! # spritereel-render
//!
//! The spritereel compositor. Paints the recording preview (background,
//! floor-anchored sprite) into a render surface and packs sprite sheets.
//! CPU only; every draw is nearest-neighbor to keep pixel art crisp.

pub mod anchor;
pub mod background;
pub mod image_loader;
pub mod renderer;
pub mod sheet;
pub mod surface;

pub use anchor::{find_floor, AnchorCache};
pub use background::{paint_background, Background};
pub use image_loader::{decode_sprite, load_batch, load_image, load_sprite, LoadedBatch};
pub use renderer::{render_frame, FrameRenderer, FrameSettings, SpritePlacement};
pub use sheet::{compose_sheet, SheetLayout, SpriteSheet};
pub use surface::RenderSurface;
