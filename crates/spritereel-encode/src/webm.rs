use std::io::{ErrorKind, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use spritereel_core::frame::FrameBuffer;
use spritereel_core::{ReelError, ReelResult};

use crate::capture::{check_frame, CaptureEncoder, CaptureSettings, EncoderFactory};
use crate::media::MediaType;

/// Bytes read from FFmpeg's stdout per chunk, at most.
const CHUNK_SIZE: usize = 64 * 1024;

/// Arguments for a raw-RGBA-in, WebM-on-stdout FFmpeg process.
pub fn ffmpeg_args(media: MediaType, settings: &CaptureSettings) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner", "-loglevel", "error",
        "-f", "rawvideo",
        "-pixel_format", "rgba",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push("-video_size".into());
    args.push(format!("{}x{}", settings.width, settings.height));
    args.push("-framerate".into());
    args.push(settings.fps.to_string());
    args.extend(["-i".to_string(), "-".to_string()]);

    if let Some(codec) = media.ffmpeg_codec() {
        args.extend(["-c:v".to_string(), codec.to_string()]);
        // Live capture: favour encode speed over compression.
        args.extend(["-deadline", "realtime", "-cpu-used", "8"].map(String::from));
        if media == MediaType::WebmVp9 {
            args.extend(["-row-mt", "1"].map(String::from));
        }
    }
    args.push("-b:v".into());
    args.push(settings.bitrate.to_string());
    args.extend(["-pix_fmt", "yuv420p", "-f", "webm", "-"].map(String::from));
    args
}

/// Streams frames into an FFmpeg child and collects WebM output as it is
/// produced.
pub struct WebmCapture {
    media: MediaType,
    settings: CaptureSettings,
    child: Child,
    stdin: Option<ChildStdin>,
    chunks: Receiver<Vec<u8>>,
    stdout_reader: Option<JoinHandle<()>>,
    stderr_reader: Option<JoinHandle<String>>,
    frames: u64,
}

impl WebmCapture {
    pub fn spawn(media: MediaType, settings: CaptureSettings) -> ReelResult<Self> {
        if !media.is_webm() {
            return Err(ReelError::Unsupported(format!(
                "{} is not a WebM media type",
                media
            )));
        }

        let mut child = Command::new("ffmpeg")
            .args(ffmpeg_args(media, &settings))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReelError::Encode(format!("failed to start ffmpeg: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::Encode("failed to open ffmpeg stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::Encode("failed to open ffmpeg stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::Encode("failed to open ffmpeg stderr".into()))?;

        let (tx, rx) = mpsc::channel();
        let stdout_reader = spawn_chunk_reader(stdout, tx);
        let stderr_reader = std::thread::spawn(move || {
            let mut text = String::new();
            let mut stderr = stderr;
            let _ = stderr.read_to_string(&mut text);
            text
        });

        tracing::debug!(
            "ffmpeg capture started: {} {}x{} @ {}fps, {} bps",
            media,
            settings.width,
            settings.height,
            settings.fps,
            settings.bitrate
        );

        Ok(Self {
            media,
            settings,
            child,
            stdin: Some(stdin),
            chunks: rx,
            stdout_reader: Some(stdout_reader),
            stderr_reader: Some(stderr_reader),
            frames: 0,
        })
    }

    fn stderr_text(&mut self) -> String {
        self.stderr_reader
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }
}

fn spawn_chunk_reader<R: Read + Send + 'static>(mut source: R, tx: Sender<Vec<u8>>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("reading ffmpeg output failed: {}", e);
                    break;
                }
            }
        }
    })
}

impl CaptureEncoder for WebmCapture {
    fn media_type(&self) -> MediaType {
        self.media
    }

    fn push_frame(&mut self, frame: &FrameBuffer) -> ReelResult<()> {
        check_frame(&self.settings, self.frames, frame)?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ReelError::Encode("ffmpeg stdin already closed".into()))?;
        if let Err(e) = stdin.write_all(&frame.data) {
            self.stdin = None;
            let _ = self.child.kill();
            let _ = self.child.wait();
            let stderr = self.stderr_text();
            return Err(ReelError::Encode(format!(
                "failed to write frame {} to ffmpeg: {}. FFmpeg stderr: {}",
                self.frames, e, stderr
            )));
        }
        self.frames += 1;
        Ok(())
    }

    fn drain_chunks(&mut self) -> Vec<Vec<u8>> {
        self.chunks.try_iter().collect()
    }

    fn finish(self: Box<Self>) -> ReelResult<Vec<Vec<u8>>> {
        let mut this = *self;
        // Closing stdin lets FFmpeg flush and exit.
        this.stdin = None;
        if let Some(reader) = this.stdout_reader.take() {
            let _ = reader.join();
        }
        let status = this
            .child
            .wait()
            .map_err(|e| ReelError::Encode(format!("ffmpeg process error: {}", e)))?;
        let stderr = this.stderr_text();
        if !status.success() {
            return Err(ReelError::Encode(format!(
                "ffmpeg ({}) failed with status {}: {}",
                this.media, status, stderr
            )));
        }

        let rest: Vec<Vec<u8>> = this.chunks.try_iter().collect();
        tracing::info!(
            "Encoded {} frames to {} ({}x{} @ {}fps)",
            this.frames,
            this.media,
            this.settings.width,
            this.settings.height,
            this.settings.fps
        );
        Ok(rest)
    }

    fn abort(self: Box<Self>) {
        tracing::debug!("ffmpeg capture aborted after {} frames", self.frames);
    }
}

impl Drop for WebmCapture {
    fn drop(&mut self) {
        self.stdin = None;
        if self.stdout_reader.is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Opens [`WebmCapture`]s for one negotiated WebM type.
#[derive(Debug, Clone, Copy)]
pub struct WebmFactory {
    media: MediaType,
}

impl WebmFactory {
    pub fn new(media: MediaType) -> Self {
        Self { media }
    }
}

impl EncoderFactory for WebmFactory {
    fn media_type(&self) -> MediaType {
        self.media
    }

    fn open(&self, settings: &CaptureSettings) -> ReelResult<Box<dyn CaptureEncoder>> {
        Ok(Box::new(WebmCapture::spawn(self.media, *settings)?))
    }
}
