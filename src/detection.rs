//! Detection backends and the trackers the frame loop talks to.
//!
//! A [`DetectionBackend`] turns a video frame into raw landmarks in its own
//! numbering. A [`FaceTracker`] pairs a backend with a
//! [`LandmarkAdapter`](crate::landmarks::LandmarkAdapter) and decides when
//! detection runs:
//!
//! - [`SyncTracker`] detects inline, once per frame.
//! - [`AsyncTracker`] hands frames to a worker thread and answers with the
//!   newest completed result, which may be a few frames old.

use crate::config::BackendConfig;
use crate::geometry::Point;
use crate::landmarks::{create_adapter, BackendKind, FaceReading, LandmarkAdapter};
use crate::{Error, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use image::RgbaImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Source of raw per-frame landmarks
pub trait DetectionBackend: Send {
    /// Detect a face. `Ok(None)` means no face this frame, which is normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend itself failed on this frame
    fn detect(&mut self, frame: &RgbaImage) -> Result<Option<Vec<Point>>>;

    /// Landmark numbering the backend produces
    fn kind(&self) -> BackendKind;

    /// Backend name
    fn name(&self) -> &str;
}

/// What the frame loop depends on
pub trait FaceTracker {
    /// Reading to use for this frame, if a face is known
    fn track(&mut self, frame: &RgbaImage) -> Option<FaceReading>;

    /// Drop cached and in-flight results
    fn invalidate(&mut self);

    /// Tracker name
    fn name(&self) -> &str;
}

fn run_detection(backend: &mut dyn DetectionBackend, adapter: &dyn LandmarkAdapter, frame: &RgbaImage) -> Option<FaceReading> {
    match backend.detect(frame) {
        Ok(Some(raw)) => adapter.adapt(&raw),
        Ok(None) => None,
        Err(e) => {
            warn!("{} failed on frame: {}", backend.name(), e);
            None
        }
    }
}

/// Detects inline on the calling thread
pub struct SyncTracker {
    backend: Box<dyn DetectionBackend>,
    adapter: Box<dyn LandmarkAdapter>,
}

impl SyncTracker {
    #[must_use]
    pub fn new(backend: Box<dyn DetectionBackend>) -> Self {
        let adapter = create_adapter(backend.kind());
        Self { backend, adapter }
    }
}

impl FaceTracker for SyncTracker {
    fn track(&mut self, frame: &RgbaImage) -> Option<FaceReading> {
        run_detection(self.backend.as_mut(), self.adapter.as_ref(), frame)
    }

    fn invalidate(&mut self) {}

    fn name(&self) -> &str {
        "SyncTracker"
    }
}

struct Slot {
    epoch: u64,
    latest: Option<Option<FaceReading>>,
}

/// Single-slot cell holding the newest detection outcome.
///
/// Every result is stamped with the epoch that was current when its frame
/// was submitted. Bumping the epoch empties the cell and makes any result
/// still in flight land nowhere.
pub struct LatestReading {
    slot: Mutex<Slot>,
}

impl LatestReading {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot { epoch: 0, latest: None }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Current epoch
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Store a result computed for `epoch`. Returns `false` if it was stale.
    pub fn publish(&self, epoch: u64, reading: Option<FaceReading>) -> bool {
        let mut slot = self.lock();
        if slot.epoch != epoch {
            return false;
        }
        slot.latest = Some(reading);
        true
    }

    /// Newest outcome: `None` before any result, `Some(None)` when the last
    /// detection found no face
    #[must_use]
    pub fn latest(&self) -> Option<Option<FaceReading>> {
        self.lock().latest.clone()
    }

    /// Start a new epoch and forget the cached result
    pub fn invalidate(&self) -> u64 {
        let mut slot = self.lock();
        slot.epoch += 1;
        slot.latest = None;
        slot.epoch
    }
}

impl Default for LatestReading {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs detection on a worker thread, fire-and-forget per frame
pub struct AsyncTracker {
    requests: Option<Sender<(u64, RgbaImage)>>,
    cell: Arc<LatestReading>,
    worker: Option<JoinHandle<()>>,
}

impl AsyncTracker {
    /// Spawn the detection worker
    ///
    /// # Errors
    ///
    /// Returns `BackendInit` if the worker thread cannot be started
    pub fn new(backend: Box<dyn DetectionBackend>) -> Result<Self> {
        let adapter = create_adapter(backend.kind());
        let cell = Arc::new(LatestReading::new());
        let (tx, rx) = crossbeam_channel::bounded(1);

        let worker_cell = Arc::clone(&cell);
        let worker = thread::Builder::new()
            .name("face-detection".to_string())
            .spawn(move || detection_loop(backend, adapter, &rx, &worker_cell))
            .map_err(|e| Error::BackendInit(format!("Failed to start detection worker: {e}")))?;

        Ok(Self {
            requests: Some(tx),
            cell,
            worker: Some(worker),
        })
    }

    /// Shared result cell
    #[must_use]
    pub fn cell(&self) -> Arc<LatestReading> {
        Arc::clone(&self.cell)
    }
}

fn detection_loop(
    mut backend: Box<dyn DetectionBackend>,
    adapter: Box<dyn LandmarkAdapter>,
    requests: &Receiver<(u64, RgbaImage)>,
    cell: &LatestReading,
) {
    info!("Detection worker started with {}", backend.name());
    while let Ok(mut request) = requests.recv() {
        while let Ok(newer) = requests.try_recv() {
            request = newer;
        }

        let (epoch, frame) = request;
        let reading = run_detection(backend.as_mut(), adapter.as_ref(), &frame);
        if !cell.publish(epoch, reading) {
            debug!("Discarded detection result from epoch {}", epoch);
        }
    }
    info!("Detection worker stopped");
}

impl FaceTracker for AsyncTracker {
    fn track(&mut self, frame: &RgbaImage) -> Option<FaceReading> {
        if let Some(tx) = &self.requests {
            if tx.is_full() {
                debug!("Detection busy, frame skipped");
            } else {
                match tx.try_send((self.cell.epoch(), frame.clone())) {
                    Ok(()) | Err(TrySendError::Full(_)) => {}
                    Err(TrySendError::Disconnected(_)) => warn!("Detection worker is gone"),
                }
            }
        }
        self.cell.latest().flatten()
    }

    fn invalidate(&mut self) {
        let epoch = self.cell.invalidate();
        debug!("Detection results invalidated, epoch {}", epoch);
    }

    fn name(&self) -> &str {
        "AsyncTracker"
    }
}

impl Drop for AsyncTracker {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Detection worker panicked");
            }
        }
    }
}

/// Recorded landmark track: one optional point list per frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkRecording {
    /// Numbering of the recorded points
    pub kind: BackendKind,
    /// Per-frame landmarks, `null` where no face was found
    pub frames: Vec<Option<Vec<[f32; 2]>>>,
}

impl LandmarkRecording {
    /// Load a recording from YAML
    ///
    /// # Errors
    ///
    /// Returns `BackendInit` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::BackendInit(format!("Cannot read landmark recording {}: {e}", path.display())))?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::BackendInit(format!("Invalid landmark recording {}: {e}", path.display())))
    }

    /// Write the recording as YAML
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize recording: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Backend that replays a recorded landmark track, looping at the end
pub struct ReplayBackend {
    kind: BackendKind,
    frames: Vec<Option<Vec<Point>>>,
    cursor: usize,
}

impl ReplayBackend {
    /// Create a replay backend
    ///
    /// # Errors
    ///
    /// Returns `BackendInit` if the recording has no frames
    pub fn new(recording: LandmarkRecording) -> Result<Self> {
        if recording.frames.is_empty() {
            return Err(Error::BackendInit("Landmark recording has no frames".to_string()));
        }

        let frames = recording
            .frames
            .into_iter()
            .map(|frame| frame.map(|points| points.into_iter().map(Point::from).collect()))
            .collect();

        Ok(Self {
            kind: recording.kind,
            frames,
            cursor: 0,
        })
    }

    /// Load and create a replay backend from a YAML recording
    ///
    /// # Errors
    ///
    /// Returns `BackendInit` if the recording is missing, invalid or empty
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading landmark recording from {}", path.display());
        Self::new(LandmarkRecording::from_file(path)?)
    }

    /// Number of recorded frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl DetectionBackend for ReplayBackend {
    fn detect(&mut self, _frame: &RgbaImage) -> Result<Option<Vec<Point>>> {
        let frame = self.frames[self.cursor % self.frames.len()].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(frame)
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn name(&self) -> &str {
        "ReplayBackend"
    }
}

/// Wrap a backend in the requested tracker flavor
///
/// # Errors
///
/// Returns `BackendInit` if the asynchronous worker cannot start
pub fn create_tracker(backend: Box<dyn DetectionBackend>, asynchronous: bool) -> Result<Box<dyn FaceTracker>> {
    info!(
        "Using {} ({}) with {} detection",
        backend.name(),
        backend.kind(),
        if asynchronous { "asynchronous" } else { "synchronous" }
    );
    if asynchronous {
        Ok(Box::new(AsyncTracker::new(backend)?))
    } else {
        Ok(Box::new(SyncTracker::new(backend)))
    }
}

/// Build the tracker a backend configuration asks for.
///
/// The configured scheme decides how landmarks are read, so a backend
/// reporting any other scheme is refused.
///
/// # Errors
///
/// Returns `BackendInit` on a scheme mismatch or if the worker cannot start
pub fn tracker_from_config(config: &BackendConfig, backend: Box<dyn DetectionBackend>) -> Result<Box<dyn FaceTracker>> {
    if backend.kind() != config.kind {
        return Err(Error::BackendInit(format!(
            "{} produces {} landmarks but {} is configured",
            backend.name(),
            backend.kind(),
            config.kind
        )));
    }
    create_tracker(backend, config.asynchronous)
}
