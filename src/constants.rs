//! Constants used throughout the application

/// Native capture width of the video feed
pub const VIDEO_WIDTH: u32 = 640;

/// Native capture height of the video feed
pub const VIDEO_HEIGHT: u32 = 480;

/// Vertical offset of the video rectangle inside the display canvas
pub const VIDEO_TOP_OFFSET: f32 = 150.0;

/// Default display canvas size
pub const DEFAULT_CANVAS_WIDTH: u32 = 1280;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 720;

/// Target render cadence
pub const DEFAULT_FPS: u32 = 30;

/// Mouth separation (display pixels) above which the mouth counts as open
pub const DEFAULT_MOUTH_OPEN_THRESHOLD: f32 = 20.0;

/// Glasses width as a multiple of the outer eye-to-eye distance
pub const DEFAULT_GLASSES_SCALE: f32 = 2.5;

/// Particle emission and decay defaults
pub const DEFAULT_PARTICLE_JITTER: f32 = 30.0;
pub const DEFAULT_PARTICLE_VX: (f32, f32) = (-2.0, 2.0);
pub const DEFAULT_PARTICLE_VY: (f32, f32) = (-3.0, -1.0);
pub const DEFAULT_PARTICLE_SIZE: (f32, f32) = (4.0, 8.0);
pub const DEFAULT_PARTICLE_COLOR_MIN: u8 = 100;
pub const PARTICLE_INITIAL_OPACITY: i32 = 255;
pub const DEFAULT_PARTICLE_DECAY: i32 = 3;

/// Session defaults
pub const DEFAULT_DURATION_SECS: u32 = 30;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Landmark counts per supported scheme
pub const NUM_IBUG_LANDMARKS: usize = 68;
pub const NUM_CLM_LANDMARKS: usize = 71;

/// Default file name for the exported snapshot
pub const DEFAULT_EXPORT_FILE_NAME: &str = "my_smile_with_glasses.png";

/// Date style used for the session summary (es-ES short date)
pub const SUMMARY_DATE_FORMAT: &str = "%-d/%-m/%Y";
