//! # spritereel-encode
//!
//! Capture encoding: turns the render surface, frame by frame, into an
//! ordered stream of encoded chunks.
//! WebM (VP9/VP8) goes through an FFmpeg child process; APNG is encoded
//! natively and is always available as the last fallback.

pub mod apng;
pub mod capture;
pub mod media;
pub mod still;
pub mod webm;

pub use apng::{ApngCapture, ApngFactory};
pub use capture::{CaptureEncoder, CaptureSettings, EncoderFactory};
pub use media::{negotiate, parse_preferences, CodecProbe, FfmpegProbe, MediaType};
pub use still::{encode_png, write_png};
pub use webm::{WebmCapture, WebmFactory};

/// Factory for the negotiated media type.
pub fn factory_for(media: MediaType) -> Box<dyn EncoderFactory> {
    match media {
        MediaType::Apng => Box::new(ApngFactory),
        webm => Box::new(WebmFactory::new(webm)),
    }
}
