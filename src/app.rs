//! Main application module: frame sources and the paced run loop.

use crate::{
    error::{Error, Result},
    orchestrator::{ControlEvent, EventOutcome, FrameOrchestrator},
    timer::TimerState,
};
use image::RgbaImage;
use log::info;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[cfg(feature = "camera")]
use crate::utils::image_conversion::{bgr_mat_to_rgba, rgba_to_bgr_mat};
#[cfg(feature = "camera")]
use opencv::{
    core::{Mat, Point, Scalar},
    highgui::{self, WINDOW_NORMAL},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};

#[cfg(feature = "camera")]
const WINDOW_NAME: &str = "Healthy Smile Lab";

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// A still image repeated every frame
    Still(PathBuf),
    /// Webcam index
    Camera(i32),
}

/// Run loop configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Frame source
    pub video_source: VideoSource,
    /// Press start on the first frame
    pub auto_start: bool,
    /// Stop after this many frames
    pub max_frames: Option<u64>,
    /// Export the snapshot as soon as the session finishes
    pub export_on_finish: bool,
    /// Show the canvas in a window (camera feature only)
    pub show_window: bool,
}

impl AppConfig {
    /// Headless run over a still frame
    #[must_use]
    pub fn headless(frame: PathBuf) -> Self {
        Self {
            video_source: VideoSource::Still(frame),
            auto_start: false,
            max_frames: None,
            export_on_finish: false,
            show_window: false,
        }
    }
}

/// One poll of a frame source
#[derive(Debug, Clone, PartialEq)]
pub enum FramePoll {
    /// A fresh frame
    Frame(RgbaImage),
    /// No frame this tick (dropped read, camera warming up)
    Pending,
    /// The source has no more frames
    Exhausted,
}

/// Live frame provider
pub trait FrameSource {
    /// Poll for the next frame
    ///
    /// # Errors
    ///
    /// Returns an error if the source failed for good
    fn next_frame(&mut self) -> Result<FramePoll>;

    /// Whether frames carry real video yet
    fn is_ready(&self) -> bool;

    fn name(&self) -> &str;
}

/// Repeats one image forever
pub struct StillFrameSource {
    frame: RgbaImage,
}

impl StillFrameSource {
    #[must_use]
    pub fn new(frame: RgbaImage) -> Self {
        Self { frame }
    }

    /// Load the frame from an image file
    ///
    /// # Errors
    ///
    /// Returns `Capture` if the image cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Using still frame {}", path.display());
        let frame = image::open(path)
            .map_err(|e| Error::Capture(format!("{}: {e}", path.display())))?
            .to_rgba8();
        Ok(Self::new(frame))
    }
}

impl FrameSource for StillFrameSource {
    fn next_frame(&mut self) -> Result<FramePoll> {
        Ok(FramePoll::Frame(self.frame.clone()))
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "StillFrameSource"
    }
}

/// Webcam frames through OpenCV
#[cfg(feature = "camera")]
pub struct CameraSource {
    capture: VideoCapture,
    ready: bool,
}

#[cfg(feature = "camera")]
impl CameraSource {
    /// Open a camera at the requested capture size
    ///
    /// # Errors
    ///
    /// Returns an error if the camera cannot be opened
    pub fn open(index: i32, width: u32, height: u32) -> Result<Self> {
        info!("Opening camera {}", index);
        let mut capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::Capture(format!("Camera {index} could not be opened")));
        }

        capture.set(CAP_PROP_BUFFERSIZE, 1.0)?;
        capture.set(CAP_PROP_FRAME_WIDTH, f64::from(width))?;
        capture.set(CAP_PROP_FRAME_HEIGHT, f64::from(height))?;

        Ok(Self { capture, ready: false })
    }
}

#[cfg(feature = "camera")]
impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<FramePoll> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.empty() {
            log::warn!("Failed to read frame, retrying...");
            return Ok(FramePoll::Pending);
        }
        self.ready = true;
        bgr_mat_to_rgba(&frame).map(FramePoll::Frame)
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn name(&self) -> &str {
        "CameraSource"
    }
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub final_state: TimerState,
    pub exported: Option<PathBuf>,
}

/// Main application struct
pub struct SmileLabApp {
    config: AppConfig,
    orchestrator: FrameOrchestrator,
    source: Box<dyn FrameSource>,
    frame_interval: Duration,
}

impl SmileLabApp {
    /// Create the application around a ready orchestrator
    ///
    /// # Errors
    ///
    /// Returns an error if the display window cannot be created
    pub fn new(config: AppConfig, orchestrator: FrameOrchestrator, source: Box<dyn FrameSource>) -> Result<Self> {
        info!("Initializing Healthy Smile Lab with {}", source.name());
        let fps = orchestrator.config().capture.target_fps.max(1);
        let frame_interval = Duration::from_secs(1) / fps;

        #[cfg(feature = "camera")]
        if config.show_window {
            let (width, height) = orchestrator.canvas_size();
            highgui::named_window(WINDOW_NAME, WINDOW_NORMAL)?;
            highgui::resize_window(
                WINDOW_NAME,
                i32::try_from(width).unwrap_or(i32::MAX),
                i32::try_from(height).unwrap_or(i32::MAX),
            )?;
        }

        Ok(Self {
            config,
            orchestrator,
            source,
            frame_interval,
        })
    }

    /// Run the main application loop
    ///
    /// # Errors
    ///
    /// Returns an error if a frame cannot be read or rendered, or an export fails
    pub fn run(&mut self) -> Result<RunSummary> {
        info!("Starting main application loop");

        let mut frames = 0u64;
        let mut exported = None;
        let (capture_width, capture_height) = {
            let capture = &self.orchestrator.config().capture;
            (capture.width, capture.height)
        };
        let mut last_frame: Option<RgbaImage> = None;
        let placeholder = RgbaImage::new(capture_width, capture_height);

        if self.config.auto_start {
            self.orchestrator.handle(ControlEvent::Toggle, Instant::now())?;
        }

        loop {
            let frame_start = Instant::now();

            let report = match self.source.next_frame()? {
                FramePoll::Frame(frame) => {
                    let report = self
                        .orchestrator
                        .render_frame(&frame, self.source.is_ready(), frame_start)?;
                    last_frame = Some(frame);
                    report
                }
                FramePoll::Pending => match &last_frame {
                    Some(frame) => self
                        .orchestrator
                        .render_frame(frame, self.source.is_ready(), frame_start)?,
                    None => self.orchestrator.render_frame(&placeholder, false, frame_start)?,
                },
                FramePoll::Exhausted => {
                    info!("Frame source exhausted");
                    break;
                }
            };
            frames += 1;

            if report.state == TimerState::Finished && self.config.export_on_finish && exported.is_none() {
                if let EventOutcome::Saved(path) = self.orchestrator.handle(ControlEvent::Save, Instant::now())? {
                    exported = path;
                }
            }

            #[cfg(feature = "camera")]
            if self.config.show_window && !self.show(&report.canvas)? {
                info!("Exit requested by user");
                break;
            }

            if self.config.max_frames.is_some_and(|max| frames >= max) {
                info!("Frame limit reached");
                break;
            }
            if !self.config.show_window && self.config.auto_start && report.state == TimerState::Finished {
                info!("Session finished");
                break;
            }

            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_interval {
                std::thread::sleep(self.frame_interval - elapsed);
            }
        }

        let final_state = self.orchestrator.session().state();
        info!("Application shutting down after {} frames ({})", frames, final_state);
        Ok(RunSummary {
            frames,
            final_state,
            exported,
        })
    }

    /// Display the canvas and apply key presses. Returns `false` on quit.
    #[cfg(feature = "camera")]
    fn show(&mut self, canvas: &RgbaImage) -> Result<bool> {
        let mut display = rgba_to_bgr_mat(canvas)?;
        let ui = self.orchestrator.ui_state();

        let mut lines = vec![format!("[space] {}", ui.button_label), ui.countdown_text.clone()];
        if let Some(summary) = &ui.summary {
            lines.push(summary.date_text());
            if let Some(phrase) = &ui.phrase {
                lines.push(phrase.clone());
            }
        }
        for (i, line) in lines.iter().enumerate() {
            let y = 40 + 36 * i32::try_from(i).unwrap_or(0);
            imgproc::put_text(
                &mut display,
                line,
                Point::new(20, y),
                FONT_HERSHEY_SIMPLEX,
                1.0,
                Scalar::new(255.0, 255.0, 255.0, 0.0),
                2,
                LINE_8,
                false,
            )?;
        }
        highgui::imshow(WINDOW_NAME, &display)?;

        let rect = highgui::get_window_image_rect(WINDOW_NAME)?;
        if let (Ok(width), Ok(height)) = (u32::try_from(rect.width), u32::try_from(rect.height)) {
            if width > 0 && height > 0 && (width, height) != self.orchestrator.canvas_size() {
                self.orchestrator.handle(ControlEvent::Resize { width, height }, Instant::now())?;
            }
        }

        let now = Instant::now();
        let key = highgui::wait_key(1)?;
        match key {
            27 => return Ok(false),
            k if k == i32::from(b'q') => return Ok(false),
            k if k == i32::from(b' ') => {
                self.orchestrator.handle(ControlEvent::Toggle, now)?;
            }
            k if k == i32::from(b's') => {
                self.orchestrator.handle(ControlEvent::Save, now)?;
            }
            k if k == i32::from(b'+') || k == i32::from(b'-') => {
                let current = self.orchestrator.session().timer().selected_secs();
                let next = if k == i32::from(b'+') {
                    current.saturating_add(5)
                } else {
                    current.saturating_sub(5).max(1)
                };
                if let Err(e) = self.orchestrator.handle(ControlEvent::SetDuration(next), now) {
                    log::warn!("Duration not changed: {}", e);
                }
            }
            _ => {}
        }
        Ok(true)
    }

    #[must_use]
    pub fn orchestrator(&self) -> &FrameOrchestrator {
        &self.orchestrator
    }
}
