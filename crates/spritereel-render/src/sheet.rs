//! Grid-packed sprite sheets.
//!
//! Every cell is as large as the largest sprite in each dimension and each
//! sprite is centered in its own cell, row-major in collection order.

use std::path::Path;

use serde::Serialize;
use spritereel_core::frame::FrameBuffer;
use spritereel_core::{ReelError, ReelResult, Sprite, SpriteId};

/// Where one sprite landed on the sheet, in sheet pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetPlacement {
    pub id: SpriteId,
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetLayout {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub placements: Vec<SheetPlacement>,
}

impl SheetLayout {
    pub fn width(&self) -> u32 {
        self.columns * self.cell_width
    }

    pub fn height(&self) -> u32 {
        self.rows * self.cell_height
    }
}

#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub image: FrameBuffer,
    pub layout: SheetLayout,
}

impl SpriteSheet {
    /// Write the sheet as a PNG at `path`.
    pub fn export_png(&self, path: &Path) -> ReelResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let image = image::RgbaImage::from_raw(self.image.width, self.image.height, self.image.data.clone())
            .ok_or_else(|| ReelError::Render("sheet buffer does not match its dimensions".into()))?;
        image.save(path).map_err(|e| {
            ReelError::asset(format!("failed to write sprite sheet: {}", e), path)
        })?;
        tracing::info!("exported sprite sheet to {}", path.display());
        Ok(())
    }
}

/// Compute the grid. `columns` below 1 is treated as 1. Returns `None` for
/// an empty sprite list.
pub fn layout_sheet(sprites: &[Sprite], columns: u32) -> Option<SheetLayout> {
    if sprites.is_empty() {
        return None;
    }
    let columns = columns.max(1);
    let count = sprites.len() as u32;
    let rows = count.div_ceil(columns);
    let cell_width = sprites.iter().map(Sprite::width).max().unwrap_or(0);
    let cell_height = sprites.iter().map(Sprite::height).max().unwrap_or(0);

    let placements = sprites
        .iter()
        .enumerate()
        .map(|(i, sprite)| {
            let (col, row) = (i as u32 % columns, i as u32 / columns);
            SheetPlacement {
                id: sprite.id(),
                name: sprite.name().to_string(),
                x: col * cell_width + (cell_width - sprite.width()) / 2,
                y: row * cell_height + (cell_height - sprite.height()) / 2,
                width: sprite.width(),
                height: sprite.height(),
            }
        })
        .collect();

    Some(SheetLayout {
        columns,
        rows,
        cell_width,
        cell_height,
        placements,
    })
}

/// Pack `sprites` onto a transparent sheet.
pub fn compose_sheet(sprites: &[Sprite], columns: u32) -> Option<SpriteSheet> {
    let layout = layout_sheet(sprites, columns)?;
    let mut image = FrameBuffer::new(layout.width(), layout.height());
    for (sprite, placement) in sprites.iter().zip(&layout.placements) {
        image.composite_over(sprite.image(), placement.x as i32, placement.y as i32);
    }
    tracing::info!(
        sprites = sprites.len(),
        columns = layout.columns,
        rows = layout.rows,
        width = image.width,
        height = image.height,
        "composed sprite sheet"
    );
    Some(SpriteSheet { image, layout })
}
