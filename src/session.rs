//! Session context: the single owner of all mutable per-session state.
//!
//! The timer, gesture decision, particle collection, last known face,
//! frozen snapshot, glasses choice and music live here together, so the
//! transitions that touch several of them happen in one place.

use crate::assets::AssetStore;
use crate::audio::AudioPlayer;
use crate::composite::{FrozenComposite, SessionSummary};
use crate::config::Config;
use crate::gesture::MouthGestureDetector;
use crate::landmarks::FaceReading;
use crate::overlay::OverlayCompositor;
use crate::particles::ParticleSystem;
use crate::timer::{ControlOutcome, SessionTimer, TickOutcome, TimerState};
use crate::Result;
use chrono::Local;
use image::RgbaImage;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// Snapshot of everything the page controls display
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub button_label: &'static str,
    pub countdown_text: String,
    /// End-of-session panel, shown only when finished
    pub summary: Option<SessionSummary>,
    pub phrase: Option<String>,
}

/// Owned per-session state
pub struct SessionContext {
    pub(crate) timer: SessionTimer,
    pub(crate) gesture: MouthGestureDetector,
    pub(crate) particles: ParticleSystem,
    /// Most recent face in video space; kept across missed detections
    pub(crate) last_reading: Option<FaceReading>,
    frozen: Option<FrozenComposite>,
    summary: Option<SessionSummary>,
    glasses_index: usize,
    audio: Box<dyn AudioPlayer>,
    rng: StdRng,
    phrase: Option<String>,
}

impl SessionContext {
    /// Create an idle session. Music starts looping and a glasses image and
    /// phrase are picked.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured duration or tick interval is zero
    pub fn new(config: &Config, assets: &AssetStore, mut audio: Box<dyn AudioPlayer>, seed: Option<u64>) -> Result<Self> {
        let timer = SessionTimer::new(
            config.session.default_duration_secs,
            Duration::from_millis(config.session.tick_interval_ms),
        )?;

        let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let particles = match seed {
            Some(seed) => ParticleSystem::with_seed(config.particles.clone(), seed.wrapping_add(1)),
            None => ParticleSystem::new(config.particles.clone()),
        };
        let glasses_index = assets.pick_glasses(&mut rng);
        let phrase = config.session.phrases.choose(&mut rng).cloned();

        if !audio.is_playing() {
            audio.play_loop();
        }

        Ok(Self {
            timer,
            gesture: MouthGestureDetector::new(config.gesture.mouth_open_threshold),
            particles,
            last_reading: None,
            frozen: None,
            summary: None,
            glasses_index,
            audio,
            rng,
            phrase,
        })
    }

    /// Start/reset control
    pub fn toggle(&mut self, now: Instant, assets: &AssetStore) -> ControlOutcome {
        let outcome = self.timer.toggle(now);

        self.frozen = None;
        self.summary = None;
        self.particles.clear();

        if outcome == ControlOutcome::Started {
            self.glasses_index = assets.pick_glasses(&mut self.rng);
            log::debug!("Glasses {} selected", self.glasses_index);
        }
        if !self.audio.is_playing() {
            self.audio.play_loop();
        }

        outcome
    }

    /// Duration selector
    ///
    /// # Errors
    ///
    /// Returns an error if `secs` is zero
    pub fn set_duration(&mut self, secs: u32) -> Result<()> {
        self.timer.set_duration(secs)
    }

    /// Countdown step for a frame with the mouth open. On the finishing tick
    /// the snapshot is captured from `frame`; if that fails the timer is put
    /// back as it was, so the session never sits in Finished without one.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be rendered
    pub(crate) fn advance(
        &mut self,
        now: Instant,
        frame: &RgbaImage,
        assets: &AssetStore,
        compositor: &OverlayCompositor,
        capture_size: (u32, u32),
    ) -> Result<TickOutcome> {
        let before = self.timer.clone();
        let outcome = self.timer.tick(now);
        if outcome == TickOutcome::Finished {
            if let Err(e) = self.finish(frame, assets, compositor, capture_size) {
                self.timer = before;
                return Err(e);
            }
        }
        Ok(outcome)
    }

    /// Running -> Finished side effects: capture the snapshot once, show the
    /// summary, stop the music.
    fn finish(
        &mut self,
        frame: &RgbaImage,
        assets: &AssetStore,
        compositor: &OverlayCompositor,
        capture_size: (u32, u32),
    ) -> Result<()> {
        let now = Local::now();
        let glasses = assets.glasses(self.glasses_index);
        self.frozen = Some(FrozenComposite::capture(
            frame,
            self.last_reading.as_ref(),
            glasses,
            compositor,
            capture_size,
            now,
        )?);
        self.summary = Some(SessionSummary::new(now, self.timer.selected_secs()));

        if self.audio.is_playing() {
            self.audio.stop();
        }
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.timer.state()
    }

    #[must_use]
    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    #[must_use]
    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    #[must_use]
    pub fn is_mouth_open(&self) -> bool {
        self.gesture.is_mouth_open()
    }

    #[must_use]
    pub fn last_reading(&self) -> Option<&FaceReading> {
        self.last_reading.as_ref()
    }

    #[must_use]
    pub fn frozen(&self) -> Option<&FrozenComposite> {
        self.frozen.as_ref()
    }

    #[must_use]
    pub fn glasses_index(&self) -> usize {
        self.glasses_index
    }

    #[must_use]
    pub fn is_music_playing(&self) -> bool {
        self.audio.is_playing()
    }

    /// What the page controls show right now
    #[must_use]
    pub fn ui_state(&self) -> UiState {
        UiState {
            button_label: self.timer.button_label(),
            countdown_text: self.timer.countdown_text(),
            summary: self.summary.clone(),
            phrase: self.phrase.clone(),
        }
    }
}
