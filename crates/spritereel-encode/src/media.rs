//! Media types a capture can produce, and picking the first one this
//! machine can actually encode.

use std::fmt;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::sync::OnceLock;

use spritereel_core::ReelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// `video/webm;codecs=vp9`
    WebmVp9,
    /// `video/webm;codecs=vp8`
    WebmVp8,
    /// `video/webm`, codec left to the encoder.
    Webm,
    /// `image/apng`, encoded natively.
    Apng,
}

impl MediaType {
    /// Preference order used when nothing is configured.
    pub const DEFAULT_PREFERENCES: [MediaType; 3] =
        [MediaType::WebmVp9, MediaType::WebmVp8, MediaType::Webm];

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::WebmVp9 => "video/webm;codecs=vp9",
            MediaType::WebmVp8 => "video/webm;codecs=vp8",
            MediaType::Webm => "video/webm",
            MediaType::Apng => "image/apng",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Apng => "png",
            _ => "webm",
        }
    }

    /// FFmpeg encoder name, `None` when FFmpeg picks the container default
    /// or the type is encoded natively.
    pub fn ffmpeg_codec(&self) -> Option<&'static str> {
        match self {
            MediaType::WebmVp9 => Some("libvpx-vp9"),
            MediaType::WebmVp8 => Some("libvpx"),
            MediaType::Webm | MediaType::Apng => None,
        }
    }

    pub fn is_webm(&self) -> bool {
        !matches!(self, MediaType::Apng)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for MediaType {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "video/webm;codecs=vp9" | "vp9" => Ok(MediaType::WebmVp9),
            "video/webm;codecs=vp8" | "vp8" => Ok(MediaType::WebmVp8),
            "video/webm" | "webm" => Ok(MediaType::Webm),
            "image/apng" | "apng" => Ok(MediaType::Apng),
            _ => Err(ReelError::InvalidArgument(format!(
                "unknown media type '{}'",
                s
            ))),
        }
    }
}

/// Answers whether a media type can be encoded here.
pub trait CodecProbe {
    fn supports(&self, media: MediaType) -> bool;
}

/// Probes the `ffmpeg` on `PATH`. The encoder list is read once.
#[derive(Debug, Default)]
pub struct FfmpegProbe {
    encoders: OnceLock<Option<String>>,
}

impl FfmpegProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if FFmpeg is available on the system.
    pub fn is_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn encoder_list(&self) -> Option<&str> {
        self.encoders
            .get_or_init(|| {
                let output = Command::new("ffmpeg")
                    .args(["-hide_banner", "-encoders"])
                    .stderr(Stdio::null())
                    .output()
                    .ok()?;
                if !output.status.success() {
                    return None;
                }
                Some(String::from_utf8_lossy(&output.stdout).into_owned())
            })
            .as_deref()
    }
}

impl CodecProbe for FfmpegProbe {
    fn supports(&self, media: MediaType) -> bool {
        if media == MediaType::Apng {
            return true;
        }
        let Some(list) = self.encoder_list() else {
            return false;
        };
        match media.ffmpeg_codec() {
            Some(codec) => list_has_encoder(list, codec),
            None => list_has_encoder(list, "libvpx-vp9") || list_has_encoder(list, "libvpx"),
        }
    }
}

/// Encoder lines look like ` V....D libvpx-vp9   libvpx VP9 (codec vp9)`.
fn list_has_encoder(list: &str, name: &str) -> bool {
    list.lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|encoder| encoder == name)
}

/// First preference the probe accepts, falling back to native APNG.
pub fn negotiate(preferences: &[MediaType], probe: &dyn CodecProbe) -> MediaType {
    let chosen = preferences
        .iter()
        .copied()
        .find(|media| probe.supports(*media))
        .unwrap_or(MediaType::Apng);
    tracing::info!(media = %chosen, "negotiated capture format");
    chosen
}

/// Parse configured preference strings, skipping the ones we don't know.
pub fn parse_preferences<S: AsRef<str>>(entries: &[S]) -> Vec<MediaType> {
    entries
        .iter()
        .filter_map(|entry| match entry.as_ref().parse() {
            Ok(media) => Some(media),
            Err(e) => {
                tracing::warn!("ignoring codec preference: {}", e);
                None
            }
        })
        .collect()
}
