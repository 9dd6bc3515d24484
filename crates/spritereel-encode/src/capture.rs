//! Live capture interface.
//!
//! A capture receives rendered frames one at a time and emits encoded data
//! as an ordered sequence of chunks. Concatenating every chunk in emission
//! order yields the finished file.

use spritereel_core::frame::FrameBuffer;
use spritereel_core::ReelResult;

use crate::media::MediaType;

/// Parameters fixed for the lifetime of one capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Target video bitrate in bits per second.
    pub bitrate: u64,
}

impl CaptureSettings {
    pub const DEFAULT_FPS: u32 = 60;
    pub const DEFAULT_BITRATE: u64 = 16_000_000;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fps: Self::DEFAULT_FPS,
            bitrate: Self::DEFAULT_BITRATE,
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

pub trait CaptureEncoder: Send {
    fn media_type(&self) -> MediaType;

    /// Feed the next frame. Frames must match the capture dimensions.
    fn push_frame(&mut self, frame: &FrameBuffer) -> ReelResult<()>;

    /// Chunks produced since the last call, without blocking.
    fn drain_chunks(&mut self) -> Vec<Vec<u8>>;

    /// Flush the encoder and return every chunk not yet drained.
    fn finish(self: Box<Self>) -> ReelResult<Vec<Vec<u8>>>;

    /// Stop immediately and throw away anything pending.
    fn abort(self: Box<Self>);
}

/// Opens a fresh capture per recording.
pub trait EncoderFactory: Send + Sync {
    fn media_type(&self) -> MediaType;

    fn open(&self, settings: &CaptureSettings) -> ReelResult<Box<dyn CaptureEncoder>>;
}

/// Shared dimension check for captures.
pub(crate) fn check_frame(settings: &CaptureSettings, index: u64, frame: &FrameBuffer) -> ReelResult<()> {
    if frame.width != settings.width || frame.height != settings.height {
        return Err(spritereel_core::ReelError::Encode(format!(
            "frame {} has dimensions {}x{}, expected {}x{}",
            index, frame.width, frame.height, settings.width, settings.height
        )));
    }
    Ok(())
}
