//! End-to-end session tests driven by recorded landmarks


use healthy_smile_lab::{
    app::{AppConfig, FramePoll, FrameSource, SmileLabApp, StillFrameSource},
    audio::TrackedAudio,
    detection::{create_tracker, LandmarkRecording, ReplayBackend},
    landmarks::BackendKind,
    orchestrator::{ControlEvent, EventOutcome, FrameOrchestrator},
    timer::{ControlOutcome, TickOutcome, TimerState},
};
use image::Rgba;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::tempdir;
use test_helpers::*;

const FRAME: Duration = Duration::from_nanos(33_333_333);

#[test]
fn test_five_second_session_at_30_fps() {
    let mut orch = replay_orchestrator(
        config_with_duration(5),
        constant_recording(BackendKind::Ibug68, ibug68_face(30.0)),
    )
    .unwrap();
    let frame = test_frame();
    let t0 = Instant::now();

    assert_eq!(
        orch.handle(ControlEvent::Toggle, t0).unwrap(),
        EventOutcome::Toggled(ControlOutcome::Started)
    );

    let mut decrements = 0;
    let mut finishes = 0;
    let mut first_capture = None;

    // Six seconds of frames with the mouth held open
    for i in 0..180u32 {
        let now = t0 + FRAME * (i + 1);
        let report = orch.render_frame(&frame, true, now).unwrap();
        match report.tick {
            TickOutcome::Ticked { .. } => decrements += 1,
            TickOutcome::Finished => {
                decrements += 1;
                finishes += 1;
            }
            TickOutcome::Inactive | TickOutcome::Waiting => {}
        }

        if let Some(frozen) = orch.session().frozen() {
            let captured = frozen.captured_at();
            assert_eq!(*first_capture.get_or_insert(captured), captured);
        }
    }

    assert_eq!(decrements, 5);
    assert_eq!(finishes, 1);
    assert_eq!(orch.session().state(), TimerState::Finished);
    assert_eq!(orch.session().timer().remaining_secs(), 0);
    assert!(first_capture.is_some());

    let ui = orch.ui_state();
    assert_eq!(ui.button_label, "Reset");
    assert_eq!(ui.countdown_text, "Time remaining: 0s");
    assert!(ui.summary.is_some());
}

#[test]
fn test_particles_drain_after_finish() {
    let mut orch = replay_orchestrator(
        config_with_duration(1),
        constant_recording(BackendKind::Ibug68, ibug68_face(30.0)),
    )
    .unwrap();
    let frame = test_frame();
    let t0 = Instant::now();
    orch.handle(ControlEvent::Toggle, t0).unwrap();

    let mut i = 0u32;
    while orch.session().state() != TimerState::Finished {
        i += 1;
        orch.render_frame(&frame, true, t0 + FRAME * i).unwrap();
        assert!(i < 60, "session did not finish");
    }

    let mut previous = orch.session().particles().len();
    assert!(previous > 0);
    for _ in 0..85 {
        i += 1;
        let report = orch.render_frame(&frame, true, t0 + FRAME * i).unwrap();
        assert!(!report.reading_present);
        let count = orch.session().particles().len();
        assert!(count <= previous, "no particle may be emitted after finish");
        previous = count;
    }
    assert!(orch.session().particles().is_empty());
}

#[test]
fn test_frozen_snapshot_is_shown_and_reset_restores_idle() {
    let mut orch = replay_orchestrator(
        config_with_duration(1),
        constant_recording(BackendKind::Ibug68, ibug68_face(30.0)),
    )
    .unwrap();
    let t0 = Instant::now();
    orch.handle(ControlEvent::Toggle, t0).unwrap();

    let mut i = 0u32;
    while orch.session().state() != TimerState::Finished {
        i += 1;
        orch.render_frame(&test_frame(), true, t0 + FRAME * i).unwrap();
    }

    // A different live frame no longer reaches the canvas
    let blue = image::RgbaImage::from_pixel(640, 480, Rgba([0, 0, 255, 255]));
    let report = orch.render_frame(&blue, true, t0 + FRAME * (i + 1)).unwrap();
    assert_eq!(report.canvas.get_pixel(330, 160), &Rgba([0, 180, 0, 255]));

    // The snapshot carries the glasses at the eye midpoint
    let frozen = orch.session().frozen().unwrap();
    assert_eq!(frozen.image().dimensions(), (640, 480));
    assert_eq!(frozen.image().get_pixel(320, 200), &Rgba([255, 0, 0, 255]));

    assert_eq!(
        orch.handle(ControlEvent::Toggle, t0 + FRAME * (i + 2)).unwrap(),
        EventOutcome::Toggled(ControlOutcome::Reset)
    );
    assert_eq!(orch.session().state(), TimerState::Idle);
    assert_eq!(orch.session().timer().remaining_secs(), 1);
    assert!(orch.session().particles().is_empty());
    assert!(orch.session().frozen().is_none());
    assert!(orch.ui_state().summary.is_none());
    assert!(orch.session().is_music_playing());

    let report = orch.render_frame(&blue, true, t0 + FRAME * (i + 3)).unwrap();
    assert_eq!(report.canvas.get_pixel(330, 160), &Rgba([0, 0, 255, 255]));
}

#[test]
fn test_closed_mouth_pauses_countdown() {
    let recording = LandmarkRecording {
        kind: BackendKind::Ibug68,
        frames: vec![Some(ibug68_face(5.0))],
    };
    let mut orch = replay_orchestrator(config_with_duration(3), recording).unwrap();
    let t0 = Instant::now();
    orch.handle(ControlEvent::Toggle, t0).unwrap();

    for i in 1..=90u32 {
        let report = orch.render_frame(&test_frame(), true, t0 + FRAME * i).unwrap();
        assert!(!report.mouth_open);
        assert_eq!(report.tick, TickOutcome::Inactive);
    }
    assert_eq!(orch.session().timer().remaining_secs(), 3);
    assert!(orch.session().particles().is_empty());
}

#[test]
fn test_clm71_session_emits_full_contour() {
    let mut orch = replay_orchestrator(
        config_with_duration(5),
        constant_recording(BackendKind::Clm71, clm71_face(30.0)),
    )
    .unwrap();
    let t0 = Instant::now();
    orch.handle(ControlEvent::Toggle, t0).unwrap();

    let report = orch.render_frame(&test_frame(), true, t0 + FRAME).unwrap();
    assert!(report.mouth_open);
    assert_eq!(orch.session().particles().len(), 18);
}

#[test]
fn test_duration_change_applies_on_next_start() {
    let mut orch = replay_orchestrator(
        config_with_duration(30),
        constant_recording(BackendKind::Ibug68, ibug68_face(30.0)),
    )
    .unwrap();
    let t0 = Instant::now();

    orch.handle(ControlEvent::SetDuration(10), t0).unwrap();
    assert_eq!(orch.ui_state().countdown_text, "Time remaining: 10s");

    orch.handle(ControlEvent::Toggle, t0).unwrap();
    orch.handle(ControlEvent::SetDuration(20), t0).unwrap();
    assert_eq!(orch.session().timer().selected_secs(), 10);

    orch.handle(ControlEvent::Toggle, t0).unwrap();
    orch.handle(ControlEvent::Toggle, t0).unwrap();
    assert_eq!(orch.session().timer().selected_secs(), 20);
    assert_eq!(orch.session().timer().remaining_secs(), 20);
}

#[test]
fn test_async_tracker_session() {
    let backend = ReplayBackend::new(constant_recording(BackendKind::Ibug68, ibug68_face(30.0))).unwrap();
    let tracker = create_tracker(Box::new(backend), true).unwrap();
    let audio = Box::new(TrackedAudio::new(PathBuf::from("assets/music.mp3")));
    let mut orch = FrameOrchestrator::with_seed(config_with_duration(1), test_assets(2), tracker, audio, 5).unwrap();

    let t0 = Instant::now();
    orch.handle(ControlEvent::Toggle, t0).unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut i = 0u32;
    while orch.session().state() != TimerState::Finished {
        assert!(Instant::now() < deadline, "async session did not finish");
        i += 1;
        orch.render_frame(&test_frame(), true, t0 + FRAME * i).unwrap();
        std::thread::sleep(Duration::from_millis(2));
    }

    assert!(orch.session().frozen().is_some());
    let report = orch.render_frame(&test_frame(), true, t0 + FRAME * (i + 1)).unwrap();
    assert!(!report.reading_present);
}

#[test]
fn test_headless_app_runs_to_export() {
    let dir = tempdir().unwrap();
    let mut config = config_with_duration(1);
    config.capture.target_fps = 200;
    config.session.tick_interval_ms = 50;
    config.export.output_dir = dir.path().to_path_buf();

    let orch = replay_orchestrator(config, constant_recording(BackendKind::Ibug68, ibug68_face(30.0))).unwrap();
    let app_config = AppConfig {
        auto_start: true,
        max_frames: Some(2_000),
        export_on_finish: true,
        ..AppConfig::headless(PathBuf::from("frame.png"))
    };

    let mut app = SmileLabApp::new(app_config, orch, Box::new(StillFrameSource::new(test_frame()))).unwrap();
    let summary = app.run().unwrap();

    assert_eq!(summary.final_state, TimerState::Finished);
    assert!(summary.frames < 2_000);
    let exported = summary.exported.unwrap();
    assert_eq!(exported, dir.path().join("my_smile_with_glasses.png"));
    let saved = image::open(&exported).unwrap().to_rgba8();
    assert_eq!(saved.dimensions(), (640, 480));
}

#[test]
fn test_headless_app_stops_at_frame_limit() {
    let orch = replay_orchestrator(
        config_with_duration(30),
        constant_recording(BackendKind::Ibug68, ibug68_face(5.0)),
    )
    .unwrap();
    let app_config = AppConfig {
        max_frames: Some(3),
        ..AppConfig::headless(PathBuf::from("frame.png"))
    };
    let mut app = SmileLabApp::new(app_config, orch, Box::new(StillFrameSource::new(test_frame()))).unwrap();
    let summary = app.run().unwrap();
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.final_state, TimerState::Idle);
    assert!(summary.exported.is_none());
}

/// Camera stand-in: a few dropped reads while warming up, then frames, then
/// a dropped read mid-stream, then the end of the feed
struct WarmingUpSource {
    polls: usize,
    dropped: Vec<usize>,
    total: usize,
    ready: bool,
}

impl WarmingUpSource {
    fn new(dropped: Vec<usize>, total: usize) -> Self {
        Self {
            polls: 0,
            dropped,
            total,
            ready: false,
        }
    }
}

impl FrameSource for WarmingUpSource {
    fn next_frame(&mut self) -> healthy_smile_lab::Result<FramePoll> {
        let poll = self.polls;
        self.polls += 1;
        if poll >= self.total {
            return Ok(FramePoll::Exhausted);
        }
        if self.dropped.contains(&poll) {
            return Ok(FramePoll::Pending);
        }
        self.ready = true;
        Ok(FramePoll::Frame(test_frame()))
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn name(&self) -> &str {
        "WarmingUpSource"
    }
}

#[test]
fn test_dropped_reads_keep_the_loop_running() {
    let orch = replay_orchestrator(
        config_with_duration(30),
        constant_recording(BackendKind::Ibug68, ibug68_face(30.0)),
    )
    .unwrap();
    let mut config = AppConfig::headless(PathBuf::from("frame.png"));
    config.auto_start = true;
    let source = WarmingUpSource::new(vec![0, 1, 4], 6);

    let mut app = SmileLabApp::new(config, orch, Box::new(source)).unwrap();
    let summary = app.run().unwrap();

    assert_eq!(summary.frames, 6);
    assert_eq!(summary.final_state, TimerState::Running);
    assert!(app.orchestrator().session().last_reading().is_some());
}

#[test]
fn test_source_that_never_delivers_runs_no_detection() {
    let orch = replay_orchestrator(
        config_with_duration(30),
        constant_recording(BackendKind::Ibug68, ibug68_face(30.0)),
    )
    .unwrap();
    let mut config = AppConfig::headless(PathBuf::from("frame.png"));
    config.auto_start = true;
    let source = WarmingUpSource::new(vec![0, 1, 2], 3);

    let mut app = SmileLabApp::new(config, orch, Box::new(source)).unwrap();
    let summary = app.run().unwrap();

    assert_eq!(summary.frames, 3);
    assert!(app.orchestrator().session().last_reading().is_none());
    assert!(!app.orchestrator().session().is_mouth_open());
    assert!(app.orchestrator().session().particles().is_empty());
}
