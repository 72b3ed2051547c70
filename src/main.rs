//! Healthy Smile Lab: open your mouth to run the countdown, wear the glasses, keep the snapshot.

use anyhow::{bail, Result};
use clap::Parser;
use healthy_smile_lab::{
    app::{AppConfig, FrameSource, SmileLabApp, StillFrameSource, VideoSource},
    assets::AssetStore,
    audio::TrackedAudio,
    config::Config,
    detection::{tracker_from_config, ReplayBackend},
    landmarks::BackendKind,
    orchestrator::FrameOrchestrator,
};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Landmark scheme of the detection backend (ibug68, clm71)
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// Recorded landmark track to replay as the detection backend
    #[arg(short, long)]
    landmarks: Option<PathBuf>,

    /// Still image used as the video feed
    #[arg(short, long)]
    frame: Option<PathBuf>,

    /// Camera index to use (camera feature)
    #[arg(long, default_value = "0")]
    cam: i32,

    /// Session duration in seconds
    #[arg(long)]
    duration: Option<u32>,

    /// Start the session on the first frame
    #[arg(long)]
    auto_start: bool,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Export the snapshot here when the session finishes
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Display canvas width
    #[arg(long)]
    width: Option<u32>,

    /// Display canvas height
    #[arg(long)]
    height: Option<u32>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Healthy Smile Lab");

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(kind) = args.backend {
        config.backend.kind = kind;
    }
    if let Some(path) = args.landmarks {
        config.backend.recording = Some(path);
    }
    if let Some(secs) = args.duration {
        config.session.default_duration_secs = secs;
    }
    if let Some(width) = args.width {
        config.layout.canvas_width = width;
    }
    if let Some(height) = args.height {
        config.layout.canvas_height = height;
    }
    if let Some(path) = &args.export {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            config.export.output_dir = dir.to_path_buf();
        }
        if let Some(name) = path.file_name() {
            config.export.file_name = name.to_string_lossy().into_owned();
        }
    }
    config.validate()?;

    let assets = AssetStore::load(&config.assets)?;

    let Some(recording) = &config.backend.recording else {
        bail!("No detection backend available: pass --landmarks or set backend.recording");
    };
    let backend = ReplayBackend::from_file(recording)?;
    let tracker = tracker_from_config(&config.backend, Box::new(backend))?;

    let audio = Box::new(TrackedAudio::new(assets.music().to_path_buf()));
    let orchestrator = FrameOrchestrator::new(config.clone(), assets, tracker, audio)?;

    let video_source = match args.frame {
        Some(path) => VideoSource::Still(path),
        None => VideoSource::Camera(args.cam),
    };
    let source = open_source(&video_source, &config)?;
    let headless = matches!(video_source, VideoSource::Still(_));

    let app_config = AppConfig {
        video_source,
        auto_start: args.auto_start,
        max_frames: args.max_frames,
        export_on_finish: args.export.is_some(),
        show_window: !headless,
    };

    let mut app = SmileLabApp::new(app_config, orchestrator, source)?;
    let summary = app.run()?;
    info!(
        "Run complete: {} frames, state {}{}",
        summary.frames,
        summary.final_state,
        summary
            .exported
            .map(|p| format!(", snapshot at {}", p.display()))
            .unwrap_or_default()
    );

    Ok(())
}

fn open_source(source: &VideoSource, config: &Config) -> Result<Box<dyn FrameSource>> {
    match source {
        VideoSource::Still(path) => Ok(Box::new(StillFrameSource::open(path)?)),
        #[cfg(feature = "camera")]
        VideoSource::Camera(index) => Ok(Box::new(healthy_smile_lab::app::CameraSource::open(
            *index,
            config.capture.width,
            config.capture.height,
        )?)),
        #[cfg(not(feature = "camera"))]
        VideoSource::Camera(index) => {
            let _ = config;
            bail!("Camera {index} requested but this build has no camera support; pass --frame")
        }
    }
}
