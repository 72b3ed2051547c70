//! Ambient music control.

use log::info;
use std::path::{Path, PathBuf};

/// Playback control for the looping music track
pub trait AudioPlayer: Send {
    fn is_playing(&self) -> bool;

    /// Start looping from the beginning
    fn play_loop(&mut self);

    fn stop(&mut self);
}

/// Player that keeps track of playback state and logs transitions.
///
/// Actual sound output is left to the host; this keeps the session's view of
/// the music consistent.
pub struct TrackedAudio {
    track: PathBuf,
    playing: bool,
}

impl TrackedAudio {
    #[must_use]
    pub fn new(track: PathBuf) -> Self {
        Self { track, playing: false }
    }

    #[must_use]
    pub fn track(&self) -> &Path {
        &self.track
    }
}

impl AudioPlayer for TrackedAudio {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play_loop(&mut self) {
        info!("Music looping: {}", self.track.display());
        self.playing = true;
    }

    fn stop(&mut self) {
        info!("Music stopped");
        self.playing = false;
    }
}
