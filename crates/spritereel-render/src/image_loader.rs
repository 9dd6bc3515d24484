//! Image loading module.
//! Decodes PNG, JPEG, WebP, GIF and other formats into sprites.

use std::path::{Path, PathBuf};

use spritereel_core::frame::FrameBuffer;
use spritereel_core::{ReelError, ReelResult, Sprite};

/// Load an image file and convert it to a FrameBuffer.
pub fn load_image(path: &Path) -> ReelResult<FrameBuffer> {
    let img = image::open(path).map_err(|e| {
        ReelError::asset(
            format!("failed to load image '{}': {}", path.display(), e),
            path,
        )
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    FrameBuffer::from_rgba(width, height, rgba.into_raw())
}

/// Decode an in-memory image blob into a sprite named `name`.
pub fn decode_sprite(name: &str, data: &[u8]) -> ReelResult<Sprite> {
    let img = image::load_from_memory(data)
        .map_err(|e| ReelError::asset(format!("failed to decode image: {}", e), name))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let fb = FrameBuffer::from_rgba(width, height, rgba.into_raw())?;
    Ok(Sprite::new(name, fb))
}

/// Load one file as a sprite named after its file name.
pub fn load_sprite(path: &Path) -> ReelResult<Sprite> {
    let image = load_image(path)?;
    Ok(Sprite::new(file_label(path), image))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Result of loading a batch of files.
#[derive(Debug, Default)]
pub struct LoadedBatch {
    /// Successfully decoded sprites, in file-name order.
    pub sprites: Vec<Sprite>,
    /// Files that could not be decoded, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Decode a batch of files concurrently.
///
/// Files are ordered by name (case-insensitive) before loading. Each file is
/// decoded exactly once on the blocking pool; the batch resolves once every
/// decode has finished, keeping successes in name order and reporting the
/// failures.
pub async fn load_batch(paths: Vec<PathBuf>) -> LoadedBatch {
    let mut paths = paths;
    paths.sort_by_cached_key(|p| {
        let label = file_label(p);
        (label.to_lowercase(), label)
    });

    let pending: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let task_path = path.clone();
            (path, tokio::task::spawn_blocking(move || load_sprite(&task_path)))
        })
        .collect();

    let mut batch = LoadedBatch::default();
    for (path, handle) in pending {
        match handle.await {
            Ok(Ok(sprite)) => batch.sprites.push(sprite),
            Ok(Err(e)) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                batch.skipped.push((path, e.to_string()));
            }
            Err(e) => {
                tracing::warn!("decode task for {} failed: {}", path.display(), e);
                batch.skipped.push((path, e.to_string()));
            }
        }
    }

    tracing::info!(
        loaded = batch.sprites.len(),
        skipped = batch.skipped.len(),
        "sprite batch loaded"
    );
    batch
}
