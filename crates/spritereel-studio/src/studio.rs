//! The studio context: owns the sprites, selection, floor cache, renderer
//! and recording session, and keeps them consistent with each other.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use spritereel_core::frame::FrameBuffer;
use spritereel_core::{AspectRatio, ReelConfig, ReelResult, Sprite, SpriteCollection, SpriteId};
use spritereel_encode::{
    factory_for, negotiate, parse_preferences, CaptureSettings, EncoderFactory, FfmpegProbe,
    MediaType,
};
use spritereel_render::renderer::clamp_zoom;
use spritereel_render::{
    compose_sheet, load_batch, load_image, AnchorCache, Background, FrameRenderer, FrameSettings,
    LoadedBatch, RenderSurface, SpriteSheet,
};

use crate::clock::{Clock, SystemClock};
use crate::navigator::Navigator;
use crate::session::{Artifact, RecordingSession, RecordingState, Still};

/// What a UI needs to draw the navigator and recording bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudioStatus {
    pub sprites: usize,
    pub selected: Option<String>,
    pub label: String,
    pub can_prev: bool,
    pub can_next: bool,
    pub recording: RecordingState,
    pub elapsed: String,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnail {
    pub id: SpriteId,
    pub name: String,
    pub selected: bool,
}

pub struct Studio {
    sprites: SpriteCollection,
    navigator: Navigator,
    anchors: AnchorCache,
    renderer: FrameRenderer,
    settings: FrameSettings,
    session: RecordingSession,
    clock: Arc<dyn Clock>,
    encoders: Box<dyn EncoderFactory>,
    fps: u32,
    bitrate: u64,
    sheet_columns: u32,
    sheet_file_name: String,
}

impl Studio {
    pub fn new(config: &ReelConfig, clock: Arc<dyn Clock>, encoders: Box<dyn EncoderFactory>) -> Self {
        let settings = FrameSettings {
            aspect: config.preview.aspect,
            background: Background::solid(config.preview.background.clone()),
            zoom_percent: clamp_zoom(config.preview.zoom),
        };
        let mut studio = Self {
            sprites: SpriteCollection::new(),
            navigator: Navigator::new(),
            anchors: AnchorCache::new(settings.background.color()),
            renderer: FrameRenderer::new(settings.aspect),
            settings,
            session: RecordingSession::new(),
            clock,
            encoders,
            fps: config.recording.fps.max(1),
            bitrate: config.recording.bitrate,
            sheet_columns: config.sheet.columns,
            sheet_file_name: config.sheet.file_name.clone(),
        };
        studio.redraw();
        studio
    }

    /// Studio on the wall clock, recording with the best format FFmpeg
    /// offers for the configured preferences.
    pub fn with_negotiated_encoder(config: &ReelConfig) -> Self {
        let mut preferences = parse_preferences(&config.recording.codecs);
        if preferences.is_empty() {
            preferences = MediaType::DEFAULT_PREFERENCES.to_vec();
        }
        let media = negotiate(&preferences, &FfmpegProbe::new());
        if !media.is_webm() {
            tracing::warn!("no WebM encoder available, recording falls back to {}", media);
        }
        Self::new(config, Arc::new(SystemClock::new()), factory_for(media))
    }

    pub fn sprites(&self) -> &SpriteCollection {
        &self.sprites
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    pub fn anchors(&self) -> &AnchorCache {
        &self.anchors
    }

    pub fn surface(&self) -> &RenderSurface {
        self.renderer.surface()
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn media_type(&self) -> MediaType {
        self.encoders.media_type()
    }

    pub fn selected_sprite(&self) -> Option<&Sprite> {
        self.navigator.selected().and_then(|id| self.sprites.get(id))
    }

    pub fn label(&self) -> String {
        self.navigator.label(&self.sprites)
    }

    pub fn status(&self) -> StudioStatus {
        StudioStatus {
            sprites: self.sprites.len(),
            selected: self.selected_sprite().map(|s| s.name().to_string()),
            label: self.label(),
            can_prev: self.navigator.can_prev(&self.sprites),
            can_next: self.navigator.can_next(&self.sprites),
            recording: self.session.state(),
            elapsed: self.session.duration_label(),
            media_type: self.session.media_type().map(|m| m.to_string()),
        }
    }

    pub fn thumbnails(&self) -> Vec<Thumbnail> {
        let selected = self.navigator.selected();
        self.sprites
            .iter()
            .map(|s| Thumbnail {
                id: s.id(),
                name: s.name().to_string(),
                selected: Some(s.id()) == selected,
            })
            .collect()
    }

    /// Re-render if anything changed since the last frame.
    fn redraw(&mut self) {
        let sprite = self.navigator.selected().and_then(|id| self.sprites.get(id));
        self.renderer.render_if_dirty(sprite, &self.settings, &mut self.anchors);
    }

    fn refresh(&mut self) {
        self.renderer.invalidate();
        self.redraw();
    }

    // -- sprites -----------------------------------------------------------

    /// Append decoded sprites in order and warm the floor cache for them.
    pub fn add_sprites(&mut self, batch: Vec<Sprite>) -> usize {
        let added = batch.len();
        if added == 0 {
            return 0;
        }
        self.sprites.extend(batch);
        self.anchors.rebuild(self.sprites.iter());
        self.navigator.sync(&self.sprites, None);
        self.refresh();
        added
    }

    /// Decode `paths` (sorted by name) and append them. Files that fail to
    /// decode are skipped and returned.
    pub async fn load_files(&mut self, paths: Vec<PathBuf>) -> Vec<(PathBuf, String)> {
        let LoadedBatch { sprites, skipped } = load_batch(paths).await;
        self.add_sprites(sprites);
        skipped
    }

    pub fn remove_sprite(&mut self, id: SpriteId) -> Option<Sprite> {
        let former = self.sprites.position(id)?;
        let removed = self.sprites.remove(id)?;
        self.anchors.retain_loaded(&self.sprites);
        self.navigator.sync(&self.sprites, Some(former));
        self.refresh();
        tracing::debug!("removed sprite {}", removed.name());
        Some(removed)
    }

    /// Move a sprite to `index` (clamped). Selection follows the sprite.
    pub fn move_sprite(&mut self, id: SpriteId, index: usize) -> bool {
        self.sprites.move_to(id, index)
    }

    // -- selection ---------------------------------------------------------

    pub fn select(&mut self, id: SpriteId) -> bool {
        let changed = self.navigator.select(id, &self.sprites);
        if changed {
            self.refresh();
        }
        changed
    }

    pub fn next(&mut self) -> bool {
        let changed = self.navigator.next(&self.sprites);
        if changed {
            self.refresh();
        }
        changed
    }

    pub fn prev(&mut self) -> bool {
        let changed = self.navigator.prev(&self.sprites);
        if changed {
            self.refresh();
        }
        changed
    }

    // -- frame settings ----------------------------------------------------

    /// Change the background color. A different color drops and rebuilds
    /// every cached floor before the next frame is drawn.
    pub fn set_background_color(&mut self, hex: &str) {
        self.settings.background.set_color(hex);
        if self.anchors.set_background(self.settings.background.color()) {
            self.anchors.rebuild(self.sprites.iter());
        }
        self.refresh();
    }

    pub fn set_background_image(&mut self, image: Option<FrameBuffer>) {
        self.settings.background.set_image(image);
        self.refresh();
    }

    pub fn load_background_image(&mut self, path: &Path) -> ReelResult<()> {
        let image = load_image(path)?;
        self.set_background_image(Some(image));
        Ok(())
    }

    /// Change the frame shape. Refused while recording, since the capture
    /// dimensions are fixed when it starts.
    pub fn set_aspect(&mut self, aspect: AspectRatio) -> bool {
        if self.session.is_active() {
            tracing::warn!("aspect ratio is locked while recording");
            return false;
        }
        self.settings.aspect = aspect;
        self.refresh();
        true
    }

    pub fn set_zoom(&mut self, percent: u32) {
        self.settings.zoom_percent = clamp_zoom(percent);
        self.refresh();
    }

    // -- recording ---------------------------------------------------------

    pub fn capture_settings(&self) -> CaptureSettings {
        let (width, height) = self.renderer.surface().internal_size();
        CaptureSettings::new(width, height)
            .with_fps(self.fps)
            .with_bitrate(self.bitrate)
    }

    /// Start a controlled recording. The current frame is the first frame
    /// captured. Returns false when there is nothing to record.
    pub fn start_recording(&mut self) -> ReelResult<bool> {
        self.redraw();
        let settings = self.capture_settings();
        let now = self.clock.now();
        if !self
            .session
            .start(self.sprites.len(), self.encoders.as_ref(), &settings, now)?
        {
            return Ok(false);
        }
        self.session.capture(self.renderer.surface().pixels(), now)?;
        Ok(true)
    }

    /// One recording tick: render the selected sprite and feed the frame
    /// to the capture. No-op unless recording.
    pub fn tick(&mut self) -> ReelResult<()> {
        if !self.session.is_active() {
            return Ok(());
        }
        let sprite = self.navigator.selected().and_then(|id| self.sprites.get(id));
        let surface = self.renderer.render(sprite, &self.settings, &mut self.anchors);
        self.session.capture(surface.pixels(), self.clock.now())
    }

    /// Stop and finalize. `None` when no recording was running.
    pub fn stop_recording(&mut self) -> ReelResult<Option<&Artifact>> {
        if !self.session.stop(self.clock.now())? {
            return Ok(None);
        }
        Ok(self.session.finalize())
    }

    pub fn discard_recording(&mut self) -> bool {
        self.session.discard()
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.session.artifact()
    }

    /// PNG of the current preview, only while recording.
    pub fn snapshot(&self) -> ReelResult<Option<Still>> {
        let position = self
            .navigator
            .position(&self.sprites)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.session.snapshot(self.renderer.surface().pixels(), position)
    }

    // -- sheet -------------------------------------------------------------

    pub fn set_sheet_columns(&mut self, columns: u32) {
        self.sheet_columns = columns.max(1);
    }

    pub fn compose_sheet(&self) -> Option<SpriteSheet> {
        compose_sheet(self.sprites.as_slice(), self.sheet_columns)
    }

    /// Write the sheet into `dir`. `None` when no sprites are loaded.
    pub fn export_sheet(&self, dir: &Path) -> ReelResult<Option<PathBuf>> {
        let Some(sheet) = self.compose_sheet() else {
            return Ok(None);
        };
        let path = dir.join(&self.sheet_file_name);
        sheet.export_png(&path)?;
        Ok(Some(path))
    }
}
