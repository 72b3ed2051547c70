//! Healthy Smile Lab: a webcam toy driven by a mouth-open gesture.
//!
//! While a countdown session runs, opening the mouth emits colored particles
//! from the lips and advances the countdown once per second. A randomly
//! chosen pair of glasses follows the eyes. When the countdown reaches zero
//! the last frame is frozen together with the glasses and can be exported
//! as a PNG.
//!
//! The per-frame pipeline:
//! 1. A detection backend yields raw landmarks in its own numbering
//! 2. A landmark adapter reduces them to a [`landmarks::FaceReading`]
//! 3. The gesture detector decides whether the mouth is open
//! 4. Particles are emitted, advanced and drawn
//! 5. The overlay compositor places the glasses on the eyes
//!
//! # Examples
//!
//! ## Headless session
//!
//! ```no_run
//! use healthy_smile_lab::{
//!     assets::AssetStore,
//!     audio::TrackedAudio,
//!     config::Config,
//!     detection::{create_tracker, ReplayBackend},
//!     orchestrator::{ControlEvent, FrameOrchestrator},
//! };
//! use std::time::Instant;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let assets = AssetStore::load(&config.assets)?;
//! let backend = ReplayBackend::from_file("recordings/smile.yaml")?;
//! let tracker = create_tracker(Box::new(backend), true)?;
//! let audio = Box::new(TrackedAudio::new(assets.music().to_path_buf()));
//!
//! let mut orchestrator = FrameOrchestrator::new(config, assets, tracker, audio)?;
//! orchestrator.handle(ControlEvent::Toggle, Instant::now())?;
//!
//! let frame = image::open("frame.png")?.to_rgba8();
//! let report = orchestrator.render_frame(&frame, true, Instant::now())?;
//! println!("Mouth open: {}, state: {}", report.mouth_open, report.state);
//! # Ok(())
//! # }
//! ```
//!
//! ## Gesture detection
//!
//! ```
//! use healthy_smile_lab::gesture::MouthGestureDetector;
//! use healthy_smile_lab::landmarks::{create_adapter, BackendKind};
//! use healthy_smile_lab::geometry::Point;
//!
//! let adapter = create_adapter(BackendKind::Ibug68);
//! let mut raw = vec![Point::new(0.0, 0.0); 68];
//! raw[61] = Point::new(100.0, 100.0);
//! raw[67] = Point::new(100.0, 130.0);
//!
//! let mut detector = MouthGestureDetector::default();
//! assert!(detector.update(adapter.adapt(&raw).as_ref()));
//! // A missed detection keeps the last decision
//! assert!(detector.update(None));
//! ```

/// Coordinate mapping between video and canvas space
pub mod geometry;

/// Landmark schemes and adapters
pub mod landmarks;

/// Detection backends and face trackers
pub mod detection;

/// Mouth-open gesture detection
pub mod gesture;

/// Glasses overlay placement and drawing
pub mod overlay;

/// Decorative particle system
pub mod particles;

/// Session countdown state machine
pub mod timer;

/// Frozen snapshot and session summary
pub mod composite;

/// Background, glasses and music assets
pub mod assets;

/// Ambient music control
pub mod audio;

/// Per-session state
pub mod session;

/// Per-frame driver
pub mod orchestrator;

/// Utility functions for pixel geometry and frame conversion
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
