//! Single-image PNG export for snapshots and sprite sheets.

use std::io::Cursor;
use std::path::Path;

use spritereel_core::frame::FrameBuffer;
use spritereel_core::{ReelError, ReelResult};

/// Encode a frame as an RGBA PNG in memory.
pub fn encode_png(frame: &FrameBuffer) -> ReelResult<Vec<u8>> {
    let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| ReelError::Encode("frame buffer size does not match its dimensions".into()))?;
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| ReelError::Encode(format!("failed to encode PNG: {}", e)))?;
    Ok(bytes)
}

/// Encode and write a PNG, creating parent directories as needed.
pub fn write_png(frame: &FrameBuffer, path: &Path) -> ReelResult<()> {
    let bytes = encode_png(frame)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    tracing::debug!("wrote {}x{} PNG to {}", frame.width, frame.height, path.display());
    Ok(())
}
