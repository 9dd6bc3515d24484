//! Native APNG capture using the `png` crate.
//!
//! The frame count has to be known before the header is written, so frames
//! are held until [`CaptureEncoder::finish`]. Consecutive identical frames
//! collapse into a single frame with a longer delay, which keeps a mostly
//! static preview cheap to hold.

use spritereel_core::frame::FrameBuffer;
use spritereel_core::{ReelError, ReelResult};

use crate::capture::{check_frame, CaptureEncoder, CaptureSettings, EncoderFactory};
use crate::media::MediaType;

#[derive(Debug)]
struct HeldFrame {
    data: Vec<u8>,
    /// How many capture ticks this frame stays on screen.
    ticks: u64,
}

#[derive(Debug)]
pub struct ApngCapture {
    settings: CaptureSettings,
    held: Vec<HeldFrame>,
    pushed: u64,
}

impl ApngCapture {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings,
            held: Vec::new(),
            pushed: 0,
        }
    }

    /// Distinct frames held so far.
    pub fn distinct_frames(&self) -> usize {
        self.held.len()
    }

    pub fn frames_pushed(&self) -> u64 {
        self.pushed
    }

    /// Split held runs into (frame index, delay ticks) pairs that fit the
    /// 16-bit APNG delay numerator.
    fn timeline(&self) -> Vec<(usize, u16)> {
        let mut out = Vec::new();
        for (i, frame) in self.held.iter().enumerate() {
            let mut remaining = frame.ticks;
            while remaining > 0 {
                let step = remaining.min(u16::MAX as u64);
                out.push((i, step as u16));
                remaining -= step;
            }
        }
        out
    }

    fn encode(&self) -> ReelResult<Vec<u8>> {
        if self.held.is_empty() {
            return Err(ReelError::Encode("no frames to encode for APNG".into()));
        }
        let timeline = self.timeline();
        let delay_den = self.settings.fps.clamp(1, u16::MAX as u32) as u16;

        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, self.settings.width, self.settings.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder
                .set_animated(timeline.len() as u32, 0)
                .map_err(|e| ReelError::Encode(format!("failed to set APNG animation: {}", e)))?;

            let mut writer = encoder
                .write_header()
                .map_err(|e| ReelError::Encode(format!("failed to write APNG header: {}", e)))?;

            for (n, (index, ticks)) in timeline.iter().enumerate() {
                writer.set_frame_delay(*ticks, delay_den).map_err(|e| {
                    ReelError::Encode(format!("failed to set delay on frame {}: {}", n, e))
                })?;
                writer
                    .write_image_data(&self.held[*index].data)
                    .map_err(|e| ReelError::Encode(format!("failed to write APNG frame {}: {}", n, e)))?;
            }

            writer
                .finish()
                .map_err(|e| ReelError::Encode(format!("failed to finalize APNG: {}", e)))?;
        }

        tracing::info!(
            "Encoded {} frames ({} distinct) to APNG ({}x{} @ {}fps)",
            self.pushed,
            self.held.len(),
            self.settings.width,
            self.settings.height,
            self.settings.fps,
        );
        Ok(bytes)
    }
}

impl CaptureEncoder for ApngCapture {
    fn media_type(&self) -> MediaType {
        MediaType::Apng
    }

    fn push_frame(&mut self, frame: &FrameBuffer) -> ReelResult<()> {
        check_frame(&self.settings, self.pushed, frame)?;
        match self.held.last_mut() {
            Some(last) if last.data == frame.data => last.ticks += 1,
            _ => self.held.push(HeldFrame {
                data: frame.data.clone(),
                ticks: 1,
            }),
        }
        self.pushed += 1;
        Ok(())
    }

    fn drain_chunks(&mut self) -> Vec<Vec<u8>> {
        Vec::new()
    }

    fn finish(self: Box<Self>) -> ReelResult<Vec<Vec<u8>>> {
        Ok(vec![self.encode()?])
    }

    fn abort(self: Box<Self>) {
        tracing::debug!("APNG capture aborted after {} frames", self.pushed);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApngFactory;

impl EncoderFactory for ApngFactory {
    fn media_type(&self) -> MediaType {
        MediaType::Apng
    }

    fn open(&self, settings: &CaptureSettings) -> ReelResult<Box<dyn CaptureEncoder>> {
        Ok(Box::new(ApngCapture::new(*settings)))
    }
}
