use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use spritereel_core::{AspectRatio, Color, ReelConfig, CONFIG_FILE_NAME};
use spritereel_encode::{negotiate, parse_preferences, CodecProbe, FfmpegProbe, MediaType};
use spritereel_render::{find_floor, load_batch};
use spritereel_studio::{run_recording, RecordingPlan, Studio};

#[derive(Parser)]
#[command(
    name = "spritereel",
    version,
    about = "spritereel: sprite sheets and floor-anchored sprite recordings",
    long_about = "spritereel packs sprite images into sheets and records a looping preview of\none sprite at a time, standing on a shared ground line, to WebM or APNG."
)]
struct Cli {
    /// Config file to read (default: ./spritereel.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default, Clone)]
struct FrameArgs {
    /// Aspect ratio of the frame: 16:9, 4:3, 1:1, 4:5 or 9:16
    #[arg(long)]
    aspect: Option<AspectRatio>,

    /// Sprite zoom in percent (10-100)
    #[arg(long)]
    zoom: Option<u32>,

    /// Background color (#rgb or #rrggbb)
    #[arg(long)]
    background: Option<String>,

    /// Background image, center-cropped to the frame
    #[arg(long)]
    background_image: Option<PathBuf>,
}

impl FrameArgs {
    fn apply(&self, config: &mut ReelConfig) {
        if let Some(aspect) = self.aspect {
            config.preview.aspect = aspect;
        }
        if let Some(zoom) = self.zoom {
            config.preview.zoom = zoom;
        }
        if let Some(ref background) = self.background {
            config.preview.background = background.clone();
        }
        if let Some(ref image) = self.background_image {
            config.preview.background_image = Some(image.clone());
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Pack sprites into a grid sprite sheet PNG
    Sheet {
        /// Sprite image files (loaded in file-name order)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Number of columns (default from config)
        #[arg(short, long)]
        columns: Option<u32>,

        /// Output PNG path (default: <output_dir>/sprite_sheet.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a single preview frame to PNG
    Preview {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Which sprite to show, 1-based
        #[arg(long, default_value_t = 1)]
        sprite: usize,

        #[command(flatten)]
        frame: FrameArgs,

        /// Output PNG path (default: <output_dir>/preview.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a controlled preview clip
    Record {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Recording length in seconds
        #[arg(long, default_value_t = 5.0)]
        seconds: f64,

        /// Switch to the next sprite every N seconds (wraps around)
        #[arg(long)]
        cycle_every: Option<f64>,

        /// Save a still at these offsets in seconds (repeatable)
        #[arg(long = "snapshot-at")]
        snapshot_at: Vec<f64>,

        #[command(flatten)]
        frame: FrameArgs,

        /// Capture frame rate (default from config, 60)
        #[arg(long)]
        fps: Option<u32>,

        /// Preferred media type, e.g. vp9, vp8, webm, apng
        #[arg(long)]
        codec: Option<String>,

        /// Directory for the recording and stills
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Print each sprite's size and floor row as JSON
    Inspect {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Background color the floors are measured against
        #[arg(long, default_value = "#ffffff")]
        background: String,
    },

    /// Display version and encoder availability
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let json_output = matches!(cli.command, Commands::Inspect { .. });

    let subscriber = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    );

    if json_output {
        // Keep stdout parseable: logs go to stderr, uncolored.
        subscriber
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        subscriber.init();
    }

    // Best-effort config load; running without a config file is allowed.
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let config = if config_path.exists() {
        ReelConfig::load_from_file(&config_path)
            .with_context(|| format!("failed to read config: {}", config_path.display()))?
    } else {
        ReelConfig::default()
    };

    match cli.command {
        Commands::Sheet {
            files,
            columns,
            output,
        } => run_async(cmd_sheet(config, files, columns, output)),
        Commands::Preview {
            files,
            sprite,
            frame,
            output,
        } => run_async(cmd_preview(config, files, sprite, frame, output)),
        Commands::Record {
            files,
            seconds,
            cycle_every,
            snapshot_at,
            frame,
            fps,
            codec,
            output_dir,
        } => {
            let mut config = config;
            frame.apply(&mut config);
            if let Some(fps) = fps {
                config.recording.fps = fps;
            }
            if let Some(codec) = codec {
                config.recording.codecs = vec![codec];
            }
            if let Some(dir) = output_dir {
                config.recording.output_dir = dir;
            }
            let plan = recording_plan(seconds, cycle_every, &snapshot_at)?;
            run_async(cmd_record(config, files, plan))
        }
        Commands::Inspect { files, background } => run_async(cmd_inspect(files, background)),
        Commands::Info => cmd_info(&config),
    }
}

fn run_async<F>(future: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize async runtime")?;
    runtime.block_on(future)
}

fn seconds(value: f64, what: &str) -> Result<Duration> {
    if !value.is_finite() || value < 0.0 {
        anyhow::bail!("{} must be a non-negative number of seconds, got {}", what, value);
    }
    Ok(Duration::from_secs_f64(value))
}

fn recording_plan(length: f64, cycle_every: Option<f64>, snapshot_at: &[f64]) -> Result<RecordingPlan> {
    let mut plan = RecordingPlan::new(seconds(length, "--seconds")?);
    if let Some(every) = cycle_every {
        plan = plan.cycle_every(seconds(every, "--cycle-every")?);
    }
    for at in snapshot_at {
        plan = plan.snapshot_at(seconds(*at, "--snapshot-at")?);
    }
    Ok(plan)
}

/// Load sprites into a fresh studio, reporting skipped files.
async fn open_studio(config: &ReelConfig, files: Vec<PathBuf>) -> Result<Studio> {
    let mut studio = Studio::with_negotiated_encoder(config);
    if let Some(ref path) = config.preview.background_image {
        studio
            .load_background_image(path)
            .with_context(|| format!("failed to load background image: {}", path.display()))?;
    }

    let skipped = studio.load_files(files).await;
    for (path, reason) in &skipped {
        println!("   ⚠️  skipped {}: {}", path.display(), reason);
    }
    if studio.sprites().is_empty() {
        anyhow::bail!("no sprite images could be loaded");
    }
    Ok(studio)
}

async fn cmd_sheet(
    mut config: ReelConfig,
    files: Vec<PathBuf>,
    columns: Option<u32>,
    output: Option<PathBuf>,
) -> Result<()> {
    let start = Instant::now();
    if let Some(columns) = columns {
        config.sheet.columns = columns;
    }

    let batch = load_batch(files).await;
    for (path, reason) in &batch.skipped {
        println!("   ⚠️  skipped {}: {}", path.display(), reason);
    }
    let Some(sheet) = spritereel_render::compose_sheet(&batch.sprites, config.sheet.columns) else {
        anyhow::bail!("no sprite images could be loaded");
    };

    let output = output.unwrap_or_else(|| config.recording.output_dir.join(&config.sheet.file_name));
    sheet
        .export_png(&output)
        .with_context(|| format!("failed to write sprite sheet: {}", output.display()))?;

    println!("🧩 Sprite sheet");
    println!("   Sprites:  {}", batch.sprites.len());
    println!(
        "   Grid:     {} x {} cells of {}x{}",
        sheet.layout.columns, sheet.layout.rows, sheet.layout.cell_width, sheet.layout.cell_height
    );
    println!("   Size:     {}x{}", sheet.image.width, sheet.image.height);
    println!("   Output:   {}", output.display());
    println!("   Time:     {:.2?}", start.elapsed());
    Ok(())
}

async fn cmd_preview(
    mut config: ReelConfig,
    files: Vec<PathBuf>,
    sprite: usize,
    frame: FrameArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    frame.apply(&mut config);
    let mut studio = open_studio(&config, files).await?;

    let target = sprite
        .checked_sub(1)
        .and_then(|i| studio.sprites().at(i))
        .map(|s| s.id())
        .with_context(|| {
            format!(
                "--sprite {} is out of range (1..={})",
                sprite,
                studio.sprites().len()
            )
        })?;
    studio.select(target);

    let output = output.unwrap_or_else(|| config.recording.output_dir.join("preview.png"));
    spritereel_encode::write_png(studio.surface().pixels(), &output)
        .with_context(|| format!("failed to write preview: {}", output.display()))?;

    let (width, height) = studio.surface().internal_size();
    println!("🖼️  Preview frame");
    println!("   {}", studio.label());
    println!("   Aspect:   {} ({}x{})", studio.settings().aspect, width, height);
    println!("   Output:   {}", output.display());
    Ok(())
}

async fn cmd_record(config: ReelConfig, files: Vec<PathBuf>, plan: RecordingPlan) -> Result<()> {
    let mut studio = open_studio(&config, files).await?;
    let output_dir = config.recording.output_dir.clone();

    println!("🔴 Recording {} sprites", studio.sprites().len());
    println!("   Format:   {}", studio.media_type());
    println!("   Length:   {:.1}s @ {}fps", plan.length.as_secs_f64(), studio.fps());

    let report = run_recording(&mut studio, &plan).await?;
    for still in &report.stills {
        let path = still
            .save_to(&output_dir)
            .with_context(|| format!("failed to save {}", still.file_name))?;
        println!("   📸 {}", path.display());
    }

    let Some(artifact) = studio.artifact() else {
        anyhow::bail!("recording finished without an artifact");
    };
    let path = artifact
        .save_to(&output_dir)
        .with_context(|| format!("failed to save recording into {}", output_dir.display()))?;

    println!("✅ Recording ready");
    println!("   Duration: {}", report.elapsed_label);
    println!("   Frames:   {}", studio.session().frames_captured());
    println!("   Size:     {} bytes", artifact.len());
    println!("   Output:   {}", path.display());
    Ok(())
}

#[derive(Serialize)]
struct SpriteReport {
    name: String,
    width: u32,
    height: u32,
    floor: u32,
}

async fn cmd_inspect(files: Vec<PathBuf>, background: String) -> Result<()> {
    let color = Color::from_hex_or_white(Some(background.as_str()));
    let batch = load_batch(files).await;
    let reports: Vec<SpriteReport> = batch
        .sprites
        .iter()
        .map(|sprite| SpriteReport {
            name: sprite.name().to_string(),
            width: sprite.width(),
            height: sprite.height(),
            floor: find_floor(sprite.image(), &color),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn cmd_info(config: &ReelConfig) -> Result<()> {
    let probe = FfmpegProbe::new();
    let mut preferences = parse_preferences(&config.recording.codecs);
    if preferences.is_empty() {
        preferences = MediaType::DEFAULT_PREFERENCES.to_vec();
    }

    println!("🎞️  spritereel");
    println!("   Version:   {}", env!("CARGO_PKG_VERSION"));
    println!(
        "   FFmpeg:    {}",
        if FfmpegProbe::is_available() {
            "available ✓"
        } else {
            "NOT FOUND ✗"
        }
    );
    for media in preferences.iter().chain(std::iter::once(&MediaType::Apng)) {
        let mark = if probe.supports(*media) { "✓" } else { "✗" };
        println!("   {:<24} {}", media.mime(), mark);
    }
    println!("   Recording: {}", negotiate(&preferences, &probe));
    println!("   Config:    {}", config_summary(config));
    Ok(())
}

fn config_summary(config: &ReelConfig) -> String {
    format!(
        "{} @ {}fps, {} bps, background {}",
        config.preview.aspect, config.recording.fps, config.recording.bitrate, config.preview.background
    )
}
