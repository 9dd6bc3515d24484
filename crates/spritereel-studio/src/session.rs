//! Controlled recording session.
//!
//! `Idle --start--> Active --stop--> Finalizing --finalize--> Ready
//! --discard--> Idle`. Starting from `Ready` drops the previous artifact;
//! starting from `Active` abandons the capture in flight.

use std::path::{Path, PathBuf};

use serde::Serialize;
use spritereel_core::frame::FrameBuffer;
use spritereel_core::hash::{hash_bytes, ContentHash};
use spritereel_core::{Duration, ReelResult, Timestamp};
use spritereel_encode::{encode_png, CaptureEncoder, CaptureSettings, EncoderFactory, MediaType};

/// Download name of a finished recording, without extension.
pub const ARTIFACT_STEM: &str = "sprites_controlled";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    Idle,
    Active,
    Finalizing,
    Ready,
}

/// A finished recording: every chunk, in emission order, as one blob.
#[derive(Debug, Clone)]
pub struct Artifact {
    bytes: Vec<u8>,
    media_type: MediaType,
    duration: Duration,
    hash: ContentHash,
}

impl Artifact {
    fn assemble(chunks: Vec<Vec<u8>>, media_type: MediaType, duration: Duration) -> Self {
        let bytes = chunks.concat();
        let hash = hash_bytes(&bytes);
        Self {
            bytes,
            media_type,
            duration,
            hash,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", ARTIFACT_STEM, self.media_type.extension())
    }

    /// Write the artifact into `dir` under [`Artifact::file_name`].
    pub fn save_to(&self, dir: &Path) -> ReelResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, &self.bytes)?;
        tracing::info!(
            "saved recording to {} ({} bytes, sha256 {})",
            path.display(),
            self.bytes.len(),
            self.hash.to_hex()
        );
        Ok(path)
    }
}

/// File name for a still taken while sprite `position` (1-based) is shown.
pub fn still_file_name(position: usize) -> String {
    format!("sprite_recorded_{}.png", position)
}

/// A PNG of the preview taken mid-recording.
#[derive(Debug, Clone)]
pub struct Still {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Still {
    pub fn save_to(&self, dir: &Path) -> ReelResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

pub struct RecordingSession {
    state: RecordingState,
    encoder: Option<Box<dyn CaptureEncoder>>,
    media_type: Option<MediaType>,
    chunks: Vec<Vec<u8>>,
    started_at: Timestamp,
    duration: Duration,
    frames: u64,
    artifact: Option<Artifact>,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            encoder: None,
            media_type: None,
            chunks: Vec::new(),
            started_at: Timestamp::zero(),
            duration: Duration::zero(),
            frames: 0,
            artifact: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == RecordingState::Active
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Elapsed recording time as `mm:ss`.
    pub fn duration_label(&self) -> String {
        self.duration.clock_label()
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Media type of the current or last capture.
    pub fn media_type(&self) -> Option<MediaType> {
        self.media_type
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Begin a capture. Does nothing without sprites; returns whether a
    /// capture is now running.
    pub fn start(
        &mut self,
        sprite_count: usize,
        encoders: &dyn EncoderFactory,
        settings: &CaptureSettings,
        now: Timestamp,
    ) -> ReelResult<bool> {
        if sprite_count == 0 {
            tracing::debug!("no sprites loaded, recording not started");
            return Ok(false);
        }

        match self.state {
            RecordingState::Active => {
                tracing::warn!(
                    "restarting recording, abandoning {} captured frames",
                    self.frames
                );
                if let Some(encoder) = self.encoder.take() {
                    encoder.abort();
                }
            }
            RecordingState::Ready => {
                if let Some(old) = self.artifact.take() {
                    tracing::debug!("discarding previous recording ({} bytes)", old.len());
                }
            }
            RecordingState::Idle | RecordingState::Finalizing => {}
        }
        self.chunks.clear();
        self.frames = 0;
        self.duration = Duration::zero();
        self.state = RecordingState::Idle;

        let encoder = encoders.open(settings)?;
        self.media_type = Some(encoder.media_type());
        self.encoder = Some(encoder);
        self.started_at = now;
        self.state = RecordingState::Active;
        tracing::info!(
            "recording started: {} {}x{} @ {}fps",
            encoders.media_type(),
            settings.width,
            settings.height,
            settings.fps
        );
        Ok(true)
    }

    /// Feed one rendered frame. No-op unless `Active`. An encoder failure
    /// drops the capture and returns the session to `Idle`.
    pub fn capture(&mut self, frame: &FrameBuffer, now: Timestamp) -> ReelResult<()> {
        if self.state != RecordingState::Active {
            return Ok(());
        }
        let Some(encoder) = self.encoder.as_mut() else {
            return Ok(());
        };
        if let Err(e) = encoder.push_frame(frame) {
            self.fail();
            return Err(e);
        }
        self.chunks.extend(encoder.drain_chunks());
        self.frames += 1;
        self.duration = now - self.started_at;
        Ok(())
    }

    /// Stop capturing and flush the encoder. Every chunk emitted so far is
    /// kept, even when the final flush fails; only a failed flush with
    /// nothing captured is an error. Returns false when there was nothing
    /// to stop.
    pub fn stop(&mut self, now: Timestamp) -> ReelResult<bool> {
        if self.state != RecordingState::Active {
            return Ok(false);
        }
        self.state = RecordingState::Finalizing;
        self.duration = now - self.started_at;
        if let Some(encoder) = self.encoder.take() {
            match encoder.finish() {
                Ok(rest) => self.chunks.extend(rest),
                Err(e) if !self.chunks.is_empty() => {
                    tracing::warn!(
                        "encoder flush failed, keeping {} captured chunks: {}",
                        self.chunks.len(),
                        e
                    );
                }
                Err(e) => {
                    self.fail();
                    return Err(e);
                }
            }
        }
        tracing::info!(
            "recording stopped after {} ({} frames, {} chunks)",
            self.duration_label(),
            self.frames,
            self.chunks.len()
        );
        Ok(true)
    }

    /// Assemble the artifact. Only valid while `Finalizing`.
    pub fn finalize(&mut self) -> Option<&Artifact> {
        if self.state != RecordingState::Finalizing {
            return None;
        }
        self.artifact = None;
        let media_type = self.media_type.unwrap_or(MediaType::Webm);
        let chunks = std::mem::take(&mut self.chunks);
        let artifact = Artifact::assemble(chunks, media_type, self.duration);
        tracing::info!(
            "recording ready: {} ({} bytes, {})",
            artifact.file_name(),
            artifact.len(),
            media_type
        );
        self.state = RecordingState::Ready;
        self.artifact = Some(artifact);
        self.artifact.as_ref()
    }

    /// Drop the finished artifact. Only valid while `Ready`.
    pub fn discard(&mut self) -> bool {
        if self.state != RecordingState::Ready {
            return false;
        }
        self.artifact = None;
        self.state = RecordingState::Idle;
        true
    }

    /// PNG of `frame` named after the shown sprite. `None` unless `Active`.
    pub fn snapshot(&self, frame: &FrameBuffer, position: usize) -> ReelResult<Option<Still>> {
        if self.state != RecordingState::Active {
            return Ok(None);
        }
        let still = Still {
            file_name: still_file_name(position),
            bytes: encode_png(frame)?,
        };
        tracing::debug!("snapshot {} at {}", still.file_name, self.duration_label());
        Ok(Some(still))
    }

    fn fail(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            encoder.abort();
        }
        self.chunks.clear();
        self.state = RecordingState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spritereel_core::{Color, ReelError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Emits one chunk per frame: the frame index followed by its first pixel.
    struct MemoryEncoder {
        pushed: u8,
        pending: Vec<Vec<u8>>,
        aborted: Arc<AtomicUsize>,
        fail_after: Option<u8>,
        fail_on_finish: bool,
    }

    impl CaptureEncoder for MemoryEncoder {
        fn media_type(&self) -> MediaType {
            MediaType::WebmVp9
        }

        fn push_frame(&mut self, frame: &FrameBuffer) -> ReelResult<()> {
            if self.fail_after == Some(self.pushed) {
                return Err(ReelError::Encode("encoder died".into()));
            }
            let mut chunk = vec![self.pushed];
            chunk.extend_from_slice(&frame.data[..4]);
            self.pending.push(chunk);
            self.pushed += 1;
            Ok(())
        }

        fn drain_chunks(&mut self) -> Vec<Vec<u8>> {
            std::mem::take(&mut self.pending)
        }

        fn finish(self: Box<Self>) -> ReelResult<Vec<Vec<u8>>> {
            if self.fail_on_finish {
                return Err(ReelError::Encode("flush failed".into()));
            }
            let mut rest = self.pending;
            rest.push(b"END".to_vec());
            Ok(rest)
        }

        fn abort(self: Box<Self>) {
            self.aborted.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct MemoryFactory {
        aborted: Arc<AtomicUsize>,
        fail_after: Option<u8>,
        fail_on_finish: bool,
    }

    impl EncoderFactory for MemoryFactory {
        fn media_type(&self) -> MediaType {
            MediaType::WebmVp9
        }

        fn open(&self, _settings: &CaptureSettings) -> ReelResult<Box<dyn CaptureEncoder>> {
            Ok(Box::new(MemoryEncoder {
                pushed: 0,
                pending: Vec::new(),
                aborted: self.aborted.clone(),
                fail_after: self.fail_after,
                fail_on_finish: self.fail_on_finish,
            }))
        }
    }

    fn settings() -> CaptureSettings {
        CaptureSettings::new(2, 2)
    }

    fn at(seconds: f64) -> Timestamp {
        Timestamp::from_seconds(seconds)
    }

    fn frame(value: u8) -> FrameBuffer {
        FrameBuffer::solid(2, 2, &Color::rgb(value, value, value))
    }

    fn record(session: &mut RecordingSession, factory: &MemoryFactory, frames: &[u8]) {
        assert!(session.start(1, factory, &settings(), at(0.0)).unwrap());
        for (i, v) in frames.iter().enumerate() {
            session.capture(&frame(*v), at(i as f64)).unwrap();
        }
        assert!(session.stop(at(frames.len() as f64)).unwrap());
        assert!(session.finalize().is_some());
    }

    #[test]
    fn test_start_without_sprites_stays_idle() {
        let mut session = RecordingSession::new();
        let started = session.start(0, &MemoryFactory::default(), &settings(), at(0.0)).unwrap();
        assert!(!started);
        assert_eq!(session.state(), RecordingState::Idle);
    }

    #[test]
    fn test_stop_when_not_active_is_noop() {
        let mut session = RecordingSession::new();
        assert!(!session.stop(at(1.0)).unwrap());
        assert_eq!(session.state(), RecordingState::Idle);

        record(&mut session, &MemoryFactory::default(), &[1]);
        assert!(!session.stop(at(9.0)).unwrap());
        assert_eq!(session.state(), RecordingState::Ready);
    }

    #[test]
    fn test_chunks_are_assembled_in_emission_order() {
        let mut session = RecordingSession::new();
        record(&mut session, &MemoryFactory::default(), &[10, 20, 30]);
        let artifact = session.artifact().unwrap();
        assert_eq!(
            artifact.bytes(),
            &[0, 10, 10, 10, 255, 1, 20, 20, 20, 255, 2, 30, 30, 30, 255, b'E', b'N', b'D']
        );
        assert_eq!(artifact.file_name(), "sprites_controlled.webm");
        assert_eq!(artifact.media_type(), MediaType::WebmVp9);
    }

    #[test]
    fn test_start_while_ready_discards_previous_artifact() {
        let factory = MemoryFactory::default();
        let mut session = RecordingSession::new();
        record(&mut session, &factory, &[1, 2]);
        assert!(session.artifact().is_some());

        assert!(session.start(1, &factory, &settings(), at(50.0)).unwrap());
        assert_eq!(session.state(), RecordingState::Active);
        assert!(session.artifact().is_none());
        assert_eq!(session.chunk_count(), 0);
        assert_eq!(session.duration_label(), "00:00");
    }

    #[test]
    fn test_start_while_active_abandons_capture() {
        let factory = MemoryFactory::default();
        let mut session = RecordingSession::new();
        session.start(1, &factory, &settings(), at(0.0)).unwrap();
        session.capture(&frame(1), at(1.0)).unwrap();
        session.start(1, &factory, &settings(), at(2.0)).unwrap();

        assert_eq!(factory.aborted.load(Ordering::SeqCst), 1);
        assert_eq!(session.frames_captured(), 0);
        assert_eq!(session.chunk_count(), 0);
        assert!(session.is_active());
    }

    #[test]
    fn test_duration_label_after_65_seconds() {
        let mut session = RecordingSession::new();
        session.start(3, &MemoryFactory::default(), &settings(), at(100.0)).unwrap();
        session.capture(&frame(0), at(100.0 + 64.2)).unwrap();
        assert_eq!(session.duration_label(), "01:04");
        session.capture(&frame(0), at(100.0 + 65.9)).unwrap();
        assert_eq!(session.duration_label(), "01:05");
    }

    #[test]
    fn test_capture_outside_active_is_ignored() {
        let mut session = RecordingSession::new();
        session.capture(&frame(1), at(1.0)).unwrap();
        assert_eq!(session.frames_captured(), 0);
    }

    #[test]
    fn test_finalize_and_discard_guards() {
        let mut session = RecordingSession::new();
        assert!(session.finalize().is_none());
        assert!(!session.discard());

        record(&mut session, &MemoryFactory::default(), &[5]);
        assert!(session.finalize().is_none());
        assert!(session.discard());
        assert_eq!(session.state(), RecordingState::Idle);
        assert!(session.artifact().is_none());
    }

    #[test]
    fn test_encoder_failure_returns_to_idle() {
        let factory = MemoryFactory {
            fail_after: Some(1),
            ..Default::default()
        };
        let mut session = RecordingSession::new();
        session.start(1, &factory, &settings(), at(0.0)).unwrap();
        session.capture(&frame(1), at(0.1)).unwrap();
        assert!(session.capture(&frame(2), at(0.2)).is_err());
        assert_eq!(session.state(), RecordingState::Idle);
        assert_eq!(factory.aborted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_flush_keeps_captured_chunks() {
        let factory = MemoryFactory {
            fail_on_finish: true,
            ..Default::default()
        };
        let mut session = RecordingSession::new();
        session.start(1, &factory, &settings(), at(0.0)).unwrap();
        session.capture(&frame(7), at(1.0)).unwrap();
        session.capture(&frame(8), at(2.0)).unwrap();

        assert!(session.stop(at(3.0)).unwrap());
        assert_eq!(session.state(), RecordingState::Finalizing);
        let artifact = session.finalize().unwrap();
        assert_eq!(artifact.bytes(), &[0, 7, 7, 7, 255, 1, 8, 8, 8, 255]);
        assert_eq!(session.state(), RecordingState::Ready);
    }

    #[test]
    fn test_failed_flush_with_nothing_captured_is_an_error() {
        let factory = MemoryFactory {
            fail_on_finish: true,
            ..Default::default()
        };
        let mut session = RecordingSession::new();
        session.start(1, &factory, &settings(), at(0.0)).unwrap();

        assert!(session.stop(at(1.0)).is_err());
        assert_eq!(session.state(), RecordingState::Idle);
        assert!(session.artifact().is_none());
    }

    #[test]
    fn test_snapshot_only_while_active() {
        let mut session = RecordingSession::new();
        assert!(session.snapshot(&frame(1), 1).unwrap().is_none());

        session.start(2, &MemoryFactory::default(), &settings(), at(0.0)).unwrap();
        let still = session.snapshot(&frame(1), 2).unwrap().unwrap();
        assert_eq!(still.file_name, "sprite_recorded_2.png");
        assert_eq!(&still.bytes[..4], b"\x89PNG");
    }
}
