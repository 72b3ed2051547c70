//! Per-frame driver.
//!
//! Every rendered frame runs the same sequence: background, then the frozen
//! snapshot or the live video, then detection and the gesture check, then
//! emission and the countdown tick, then the particle pass, and finally the
//! glasses overlay on top.

use crate::assets::AssetStore;
use crate::audio::AudioPlayer;
use crate::config::Config;
use crate::detection::FaceTracker;
use crate::geometry::{video_placement, Rect};
use crate::landmarks::FaceReading;
use crate::overlay::OverlayCompositor;
use crate::session::{SessionContext, UiState};
use crate::timer::{ControlOutcome, TickOutcome, TimerState};
use crate::utils::safe_cast::{f32_to_dimension, f32_to_offset};
use crate::{Error, Result};
use image::{imageops, RgbaImage};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Input from the page controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// The start/reset control
    Toggle,
    /// Duration selector changed (seconds)
    SetDuration(u32),
    /// Export the frozen snapshot
    Save,
    /// Display surface resized
    Resize { width: u32, height: u32 },
}

/// What handling a control event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Toggled(ControlOutcome),
    DurationSet(u32),
    /// Path written, or `None` when there was no snapshot yet
    Saved(Option<PathBuf>),
    Resized { width: u32, height: u32 },
}

/// Result of one rendered frame
pub struct FrameReport {
    /// The composed display canvas
    pub canvas: RgbaImage,
    pub state: TimerState,
    pub tick: TickOutcome,
    pub mouth_open: bool,
    /// Whether a face was available for this frame's overlay
    pub reading_present: bool,
}

/// Owns the session and sequences the components each frame
pub struct FrameOrchestrator {
    config: Config,
    assets: AssetStore,
    tracker: Box<dyn FaceTracker>,
    session: SessionContext,
    compositor: OverlayCompositor,
    canvas_size: (u32, u32),
    video_rect: Rect,
    background: RgbaImage,
}

impl FrameOrchestrator {
    /// Create an orchestrator with an idle session
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(
        config: Config,
        assets: AssetStore,
        tracker: Box<dyn FaceTracker>,
        audio: Box<dyn AudioPlayer>,
    ) -> Result<Self> {
        Self::build(config, assets, tracker, audio, None)
    }

    /// Like [`FrameOrchestrator::new`] with every random choice seeded
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn with_seed(
        config: Config,
        assets: AssetStore,
        tracker: Box<dyn FaceTracker>,
        audio: Box<dyn AudioPlayer>,
        seed: u64,
    ) -> Result<Self> {
        Self::build(config, assets, tracker, audio, Some(seed))
    }

    fn build(
        config: Config,
        assets: AssetStore,
        tracker: Box<dyn FaceTracker>,
        audio: Box<dyn AudioPlayer>,
        seed: Option<u64>,
    ) -> Result<Self> {
        config.validate()?;

        let session = SessionContext::new(&config, &assets, audio, seed)?;
        let compositor = OverlayCompositor::new(config.overlay.eye_distance_scale);
        let canvas_size = (config.layout.canvas_width, config.layout.canvas_height);
        let video_rect = Self::video_rect_for(&config, canvas_size.0);
        let background = Self::scaled_background(&assets, canvas_size);

        info!(
            "Frame orchestrator ready: canvas {}x{}, tracker {}",
            canvas_size.0,
            canvas_size.1,
            tracker.name()
        );

        Ok(Self {
            config,
            assets,
            tracker,
            session,
            compositor,
            canvas_size,
            video_rect,
            background,
        })
    }

    fn video_rect_for(config: &Config, canvas_width: u32) -> Rect {
        video_placement(
            canvas_width,
            config.capture.width,
            config.capture.height,
            config.layout.video_top_offset,
        )
    }

    fn scaled_background(assets: &AssetStore, (width, height): (u32, u32)) -> RgbaImage {
        imageops::resize(assets.background(), width, height, imageops::FilterType::Triangle)
    }

    /// Render one frame.
    ///
    /// `source_ready` is the frame source's readiness; until it is ready no
    /// video is drawn and no detection runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot or an overlay cannot be rendered
    pub fn render_frame(&mut self, frame: &RgbaImage, source_ready: bool, now: Instant) -> Result<FrameReport> {
        let mut canvas = self.background.clone();

        if let Some(frozen) = self.session.frozen() {
            self.draw_video(&mut canvas, frozen.image())?;
        } else if source_ready {
            self.draw_video(&mut canvas, frame)?;
        }

        let src = Rect::from_size(frame.width(), frame.height());
        let mut reading: Option<FaceReading> = None;
        let mut tick = TickOutcome::Inactive;

        if self.session.state() != TimerState::Finished && source_ready {
            reading = self.tracker.track(frame);
            if let Some(current) = &reading {
                self.session.last_reading = Some(current.clone());
            }

            let display_reading = reading.as_ref().map(|r| r.mapped(&src, &self.video_rect));
            let mouth_open = self.session.gesture.update(display_reading.as_ref());

            if mouth_open && self.session.timer.is_running() {
                if let Some(last) = &self.session.last_reading {
                    self.session.particles.emit(&last.mouth_contour, &src, &self.video_rect);
                }

                let capture_size = (self.config.capture.width, self.config.capture.height);
                tick = self
                    .session
                    .advance(now, frame, &self.assets, &self.compositor, capture_size)?;
                if tick == TickOutcome::Finished {
                    self.tracker.invalidate();
                }
            }
        }

        self.session.particles.update_and_render(&mut canvas);

        let glasses = self.assets.glasses(self.session.glasses_index());
        if let Some(placement) = self.compositor.placement(reading.as_ref(), glasses.dimensions()) {
            self.compositor.draw(&mut canvas, glasses, &placement.mapped(&src, &self.video_rect))?;
        }

        debug!(
            "Frame: state={} mouth_open={} particles={}",
            self.session.state(),
            self.session.is_mouth_open(),
            self.session.particles().len()
        );

        Ok(FrameReport {
            canvas,
            state: self.session.state(),
            tick,
            mouth_open: self.session.is_mouth_open(),
            reading_present: reading.is_some(),
        })
    }

    fn draw_video(&self, canvas: &mut RgbaImage, image: &RgbaImage) -> Result<()> {
        let width = f32_to_dimension(self.video_rect.width)?;
        let height = f32_to_dimension(self.video_rect.height)?;
        let x = f32_to_offset(self.video_rect.x)?;
        let y = f32_to_offset(self.video_rect.y)?;

        if image.dimensions() == (width, height) {
            imageops::overlay(canvas, image, x, y);
        } else {
            let scaled = imageops::resize(image, width, height, imageops::FilterType::Triangle);
            imageops::overlay(canvas, &scaled, x, y);
        }
        Ok(())
    }

    /// Apply a control event
    ///
    /// # Errors
    ///
    /// Returns an error for a zero duration or canvas size, or if the export fails
    pub fn handle(&mut self, event: ControlEvent, now: Instant) -> Result<EventOutcome> {
        match event {
            ControlEvent::Toggle => {
                let outcome = self.session.toggle(now, &self.assets);
                self.tracker.invalidate();
                Ok(EventOutcome::Toggled(outcome))
            }
            ControlEvent::SetDuration(secs) => {
                self.session.set_duration(secs)?;
                info!("Duration set to {}s", secs);
                Ok(EventOutcome::DurationSet(secs))
            }
            ControlEvent::Save => Ok(EventOutcome::Saved(self.save()?)),
            ControlEvent::Resize { width, height } => {
                self.resize(width, height)?;
                Ok(EventOutcome::Resized { width, height })
            }
        }
    }

    /// Export the frozen snapshot to the configured path.
    ///
    /// Returns `None` without writing anything when no snapshot exists.
    ///
    /// # Errors
    ///
    /// Returns `Export` if the file cannot be written
    pub fn save(&self) -> Result<Option<PathBuf>> {
        let Some(frozen) = self.session.frozen() else {
            info!("Nothing to save yet");
            return Ok(None);
        };

        let path = self.config.export.path();
        frozen.save(&path)?;
        Ok(Some(path))
    }

    /// Resize the display canvas. Session and particles are untouched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either dimension is zero
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidInput(format!("Invalid canvas size {width}x{height}")));
        }

        self.canvas_size = (width, height);
        self.video_rect = Self::video_rect_for(&self.config, width);
        self.background = Self::scaled_background(&self.assets, self.canvas_size);
        info!("Canvas resized to {}x{}", width, height);
        Ok(())
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    #[must_use]
    pub fn ui_state(&self) -> UiState {
        self.session.ui_state()
    }

    #[must_use]
    pub fn canvas_size(&self) -> (u32, u32) {
        self.canvas_size
    }

    /// Where the video sits on the canvas
    #[must_use]
    pub fn video_rect(&self) -> Rect {
        self.video_rect
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::TrackedAudio;
    use crate::geometry::Point;
    use crate::landmarks::SeparationMetric;
    use image::Rgba;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Tracker that hands out scripted readings, then repeats the last
    struct ScriptedTracker {
        script: VecDeque<Option<FaceReading>>,
        last: Option<FaceReading>,
        calls: usize,
    }

    impl ScriptedTracker {
        fn new(script: Vec<Option<FaceReading>>) -> Self {
            Self {
                script: script.into(),
                last: None,
                calls: 0,
            }
        }
    }

    impl FaceTracker for ScriptedTracker {
        fn track(&mut self, _frame: &RgbaImage) -> Option<FaceReading> {
            self.calls += 1;
            if let Some(next) = self.script.pop_front() {
                self.last = next;
            }
            self.last.clone()
        }

        fn invalidate(&mut self) {}

        fn name(&self) -> &str {
            "ScriptedTracker"
        }
    }

    fn face(gap: f32) -> FaceReading {
        FaceReading {
            mouth_top: Point::new(320.0, 300.0),
            mouth_bottom: Point::new(320.0, 300.0 + gap),
            left_eye: Point::new(300.0, 200.0),
            right_eye: Point::new(340.0, 200.0),
            mouth_contour: (0..12).map(|i| Point::new(300.0 + i as f32 * 4.0, 310.0)).collect(),
            metric: SeparationMetric::Vertical,
        }
    }

    fn orchestrator(script: Vec<Option<FaceReading>>) -> FrameOrchestrator {
        let assets = AssetStore::from_parts(
            RgbaImage::from_pixel(32, 18, Rgba([0, 0, 80, 255])),
            vec![RgbaImage::from_pixel(20, 8, Rgba([255, 0, 0, 255]))],
            PathBuf::from("music.mp3"),
        )
        .unwrap();
        let audio = Box::new(TrackedAudio::new(PathBuf::from("music.mp3")));
        FrameOrchestrator::with_seed(
            Config::default(),
            assets,
            Box::new(ScriptedTracker::new(script)),
            audio,
            11,
        )
        .unwrap()
    }

    fn frame() -> RgbaImage {
        RgbaImage::from_pixel(640, 480, Rgba([0, 200, 0, 255]))
    }

    #[test]
    fn test_idle_frame_draws_video_and_overlay() {
        let mut orch = orchestrator(vec![Some(face(5.0))]);
        let report = orch.render_frame(&frame(), true, Instant::now()).unwrap();

        assert_eq!(report.canvas.dimensions(), (1280, 720));
        assert_eq!(report.state, TimerState::Idle);
        assert!(report.reading_present);
        assert!(!report.mouth_open);
        // Video rect starts at (320, 150)
        assert_eq!(report.canvas.get_pixel(330, 160), &Rgba([0, 200, 0, 255]));
        assert_eq!(report.canvas.get_pixel(5, 5), &Rgba([0, 0, 80, 255]));
        // Glasses centered on the eye midpoint (320, 200) in video space
        assert_eq!(report.canvas.get_pixel(640, 350), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_no_emission_or_tick_while_idle() {
        let mut orch = orchestrator(vec![Some(face(40.0))]);
        let report = orch.render_frame(&frame(), true, Instant::now()).unwrap();
        assert!(report.mouth_open);
        assert_eq!(report.tick, TickOutcome::Inactive);
        assert!(orch.session().particles().is_empty());
    }

    #[test]
    fn test_not_ready_source_skips_detection() {
        let mut orch = orchestrator(vec![Some(face(40.0))]);
        let report = orch.render_frame(&frame(), false, Instant::now()).unwrap();
        assert!(!report.reading_present);
        assert!(!report.mouth_open);
        assert_eq!(report.canvas.get_pixel(330, 160), &Rgba([0, 0, 80, 255]));
    }

    #[test]
    fn test_miss_skips_overlay_but_keeps_gesture() {
        let mut orch = orchestrator(vec![Some(face(40.0)), None]);
        let t0 = Instant::now();
        orch.handle(ControlEvent::Toggle, t0).unwrap();

        orch.render_frame(&frame(), true, t0).unwrap();
        let emitted = orch.session().particles().len();
        assert_eq!(emitted, 12);

        let report = orch.render_frame(&frame(), true, t0).unwrap();
        assert!(!report.reading_present);
        assert!(report.mouth_open);
        // Sticky gesture keeps emitting from the last known mouth
        assert_eq!(orch.session().particles().len(), 24);
    }

    #[test]
    fn test_session_runs_to_finish_and_saves() {
        let mut orch = orchestrator(vec![Some(face(40.0))]);
        orch.handle(ControlEvent::SetDuration(2), Instant::now()).unwrap();
        let t0 = Instant::now();
        assert_eq!(
            orch.handle(ControlEvent::Toggle, t0).unwrap(),
            EventOutcome::Toggled(ControlOutcome::Started)
        );

        let mut ticks = 0;
        for i in 0..90u64 {
            let report = orch.render_frame(&frame(), true, t0 + Duration::from_millis(i * 33)).unwrap();
            if matches!(report.tick, TickOutcome::Ticked { .. } | TickOutcome::Finished) {
                ticks += 1;
            }
        }
        assert_eq!(ticks, 2);
        assert_eq!(orch.session().state(), TimerState::Finished);
        assert!(orch.session().frozen().is_some());
        assert!(orch.ui_state().summary.is_some());
        assert!(!orch.session().is_music_playing());

        let dir = tempdir().unwrap();
        orch.config.export.output_dir = dir.path().to_path_buf();
        let saved = orch.handle(ControlEvent::Save, Instant::now()).unwrap();
        assert_eq!(saved, EventOutcome::Saved(Some(dir.path().join("my_smile_with_glasses.png"))));
        assert!(dir.path().join("my_smile_with_glasses.png").is_file());
    }

    #[test]
    fn test_save_without_snapshot_is_noop() {
        let orch = orchestrator(vec![]);
        assert_eq!(orch.save().unwrap(), None);
    }

    #[test]
    fn test_resize_keeps_session() {
        let mut orch = orchestrator(vec![Some(face(40.0))]);
        let t0 = Instant::now();
        orch.handle(ControlEvent::Toggle, t0).unwrap();
        orch.render_frame(&frame(), true, t0).unwrap();
        let particles = orch.session().particles().len();

        orch.handle(ControlEvent::Resize { width: 800, height: 600 }, t0).unwrap();
        assert_eq!(orch.canvas_size(), (800, 600));
        assert_eq!(orch.video_rect(), Rect::new(80.0, 150.0, 640.0, 480.0));
        assert_eq!(orch.session().state(), TimerState::Running);
        assert_eq!(orch.session().particles().len(), particles);

        let report = orch.render_frame(&frame(), true, t0).unwrap();
        assert_eq!(report.canvas.dimensions(), (800, 600));

        assert!(orch.resize(0, 600).is_err());
    }
}
