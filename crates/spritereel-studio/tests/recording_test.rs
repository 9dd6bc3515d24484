use std::path::{Path, PathBuf};
use std::sync::Arc;

use spritereel_core::frame::FrameBuffer;
use spritereel_core::{AspectRatio, ReelConfig, ReelResult};
use spritereel_encode::{ApngFactory, CaptureEncoder, CaptureSettings, EncoderFactory, MediaType};
use spritereel_studio::{Control, ControlOutcome, Key, ManualClock, RecordingState, Studio};

/// Keeps one chunk per frame: a running counter.
struct MemoryEncoder {
    next: u32,
    pending: Vec<Vec<u8>>,
}

impl CaptureEncoder for MemoryEncoder {
    fn media_type(&self) -> MediaType {
        MediaType::WebmVp8
    }

    fn push_frame(&mut self, _frame: &FrameBuffer) -> ReelResult<()> {
        self.pending.push(self.next.to_be_bytes().to_vec());
        self.next += 1;
        Ok(())
    }

    fn drain_chunks(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.pending)
    }

    fn finish(self: Box<Self>) -> ReelResult<Vec<Vec<u8>>> {
        Ok(self.pending)
    }

    fn abort(self: Box<Self>) {}
}

struct MemoryFactory;

impl EncoderFactory for MemoryFactory {
    fn media_type(&self) -> MediaType {
        MediaType::WebmVp8
    }

    fn open(&self, _settings: &CaptureSettings) -> ReelResult<Box<dyn CaptureEncoder>> {
        Ok(Box::new(MemoryEncoder {
            next: 0,
            pending: Vec::new(),
        }))
    }
}

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("spritereel_{}_{}", tag, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_sprite(path: &Path, w: u32, h: u32, transparent_bottom: u32) {
    let img = image::RgbaImage::from_fn(w, h, |_, y| {
        if y < h - transparent_bottom {
            image::Rgba([30, 160, 90, 255])
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    });
    img.save(path).unwrap();
}

fn config() -> ReelConfig {
    let mut config = ReelConfig::default();
    config.preview.aspect = AspectRatio::SQUARE;
    config.recording.fps = 10;
    config
}

#[tokio::test]
async fn test_load_sort_and_floor_cache() {
    let dir = temp_dir("load");
    write_sprite(&dir.join("b_idle.png"), 24, 24, 4);
    write_sprite(&dir.join("A_walk.png"), 16, 32, 0);
    std::fs::write(dir.join("c_broken.png"), b"garbage").unwrap();

    let mut studio = Studio::new(&config(), Arc::new(ManualClock::new()), Box::new(MemoryFactory));
    let skipped = studio
        .load_files(vec![
            dir.join("c_broken.png"),
            dir.join("b_idle.png"),
            dir.join("A_walk.png"),
        ])
        .await;

    assert_eq!(skipped.len(), 1);
    let names: Vec<&str> = studio.sprites().iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["A_walk.png", "b_idle.png"]);
    assert_eq!(studio.label(), "Sprite 1 / 2");

    let ids = studio.sprites().ids();
    assert_eq!(studio.anchors().cached(ids[0]), Some(31));
    assert_eq!(studio.anchors().cached(ids[1]), Some(19));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_controlled_recording_65_seconds() {
    let clock = ManualClock::new();
    let mut studio = Studio::new(&config(), Arc::new(clock.clone()), Box::new(MemoryFactory));
    studio.add_sprites(vec![spritereel_core::Sprite::new(
        "hero.png",
        FrameBuffer::solid(8, 8, &spritereel_core::Color::BLACK),
    )]);

    assert!(matches!(studio.handle_key(Key::Space).unwrap(), ControlOutcome::RecordingStarted));
    for _ in 0..65 {
        clock.advance_seconds(1.0);
        studio.tick().unwrap();
    }
    assert_eq!(studio.session().duration_label(), "01:05");
    assert_eq!(studio.status().elapsed, "01:05");

    assert!(matches!(studio.handle_key(Key::Space).unwrap(), ControlOutcome::RecordingFinished));
    let artifact = studio.artifact().unwrap();
    assert_eq!(artifact.file_name(), "sprites_controlled.webm");
    // 66 frames (start + 65 ticks), chunks concatenated in emission order.
    let counters: Vec<u32> = artifact
        .bytes()
        .chunks(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(counters, (0..66).collect::<Vec<u32>>());
}

#[test]
fn test_restart_from_ready_discards_artifact() {
    let clock = ManualClock::new();
    let mut studio = Studio::new(&config(), Arc::new(clock.clone()), Box::new(MemoryFactory));
    studio.add_sprites(vec![spritereel_core::Sprite::new(
        "hero.png",
        FrameBuffer::solid(8, 8, &spritereel_core::Color::BLACK),
    )]);

    studio.handle(Control::ToggleRecording).unwrap();
    clock.advance_seconds(3.0);
    studio.tick().unwrap();
    studio.handle(Control::ToggleRecording).unwrap();
    assert_eq!(studio.session().state(), RecordingState::Ready);

    studio.handle(Control::ToggleRecording).unwrap();
    assert_eq!(studio.session().state(), RecordingState::Active);
    assert!(studio.artifact().is_none());
    assert_eq!(studio.session().duration_label(), "00:00");
}

#[test]
fn test_apng_fallback_artifact_saved_to_disk() {
    let clock = ManualClock::new();
    let mut studio = Studio::new(&config(), Arc::new(clock.clone()), Box::new(ApngFactory));
    studio.add_sprites(vec![
        spritereel_core::Sprite::new("a.png", FrameBuffer::solid(8, 8, &spritereel_core::Color::RED)),
        spritereel_core::Sprite::new("b.png", FrameBuffer::solid(8, 8, &spritereel_core::Color::BLUE)),
    ]);

    studio.start_recording().unwrap();
    clock.advance_seconds(0.1);
    studio.tick().unwrap();
    studio.handle(Control::Next).unwrap();
    clock.advance_seconds(0.1);
    studio.tick().unwrap();
    studio.stop_recording().unwrap();

    let dir = temp_dir("apng");
    let path = studio.artifact().unwrap().save_to(&dir).unwrap();
    assert!(path.ends_with("sprites_controlled.png"));

    let bytes = std::fs::read(&path).unwrap();
    let reader = png::Decoder::new(std::io::Cursor::new(bytes)).read_info().unwrap();
    assert_eq!(reader.info().width, 1080);
    assert_eq!(reader.info().animation_control.unwrap().num_frames, 2);

    let _ = std::fs::remove_dir_all(&dir);
}
