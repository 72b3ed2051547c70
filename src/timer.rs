//! Session countdown and its Idle / Running / Finished state machine.
//!
//! Time is passed in explicitly so the countdown can be driven by the frame
//! loop and by tests alike. The countdown only advances while the caller
//! asks it to (the orchestrator does so while the mouth is open), and at
//! most once per tick interval of wall-clock time regardless of frame rate.

use crate::constants::{DEFAULT_DURATION_SECS, DEFAULT_TICK_INTERVAL_MS};
use crate::{Error, Result};
use std::fmt;
use std::time::{Duration, Instant};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Finished,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerState::Idle => write!(f, "idle"),
            TimerState::Running => write!(f, "running"),
            TimerState::Finished => write!(f, "finished"),
        }
    }
}

/// Which branch of the shared start/reset control ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Idle -> Running
    Started,
    /// Running or Finished -> Idle
    Reset,
}

/// Result of a tick check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, nothing to do
    Inactive,
    /// Less than one interval since the last tick
    Waiting,
    /// Countdown decremented, still running
    Ticked { remaining: u32 },
    /// Countdown reached zero on this tick
    Finished,
}

/// The session timer
#[derive(Debug, Clone)]
pub struct SessionTimer {
    state: TimerState,
    requested_secs: u32,
    selected_secs: u32,
    remaining_secs: u32,
    last_tick: Option<Instant>,
    tick_interval: Duration,
}

impl SessionTimer {
    /// Create an idle timer
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_secs` is zero or `tick_interval` is zero
    pub fn new(duration_secs: u32, tick_interval: Duration) -> Result<Self> {
        if duration_secs == 0 {
            return Err(Error::InvalidInput("Session duration must be at least 1 second".to_string()));
        }
        if tick_interval.is_zero() {
            return Err(Error::InvalidInput("Tick interval must be greater than 0".to_string()));
        }

        Ok(Self {
            state: TimerState::Idle,
            requested_secs: duration_secs,
            selected_secs: duration_secs,
            remaining_secs: duration_secs,
            last_tick: None,
            tick_interval,
        })
    }

    /// Duration selector changed.
    ///
    /// The value is captured at the next start. While idle the countdown
    /// display follows the selector immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if `secs` is zero
    pub fn set_duration(&mut self, secs: u32) -> Result<()> {
        if secs == 0 {
            return Err(Error::InvalidInput("Session duration must be at least 1 second".to_string()));
        }

        self.requested_secs = secs;
        if self.state == TimerState::Idle {
            self.selected_secs = secs;
            self.remaining_secs = secs;
        }
        Ok(())
    }

    /// The start/reset control
    pub fn toggle(&mut self, now: Instant) -> ControlOutcome {
        match self.state {
            TimerState::Idle => {
                self.selected_secs = self.requested_secs;
                self.remaining_secs = self.selected_secs;
                self.last_tick = Some(now);
                self.state = TimerState::Running;
                log::info!("Session started: {}s", self.selected_secs);
                ControlOutcome::Started
            }
            TimerState::Running | TimerState::Finished => {
                self.selected_secs = self.requested_secs;
                self.remaining_secs = self.selected_secs;
                self.last_tick = None;
                self.state = TimerState::Idle;
                log::info!("Session reset");
                ControlOutcome::Reset
            }
        }
    }

    /// Decrement the countdown if a full interval elapsed since the last tick
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Inactive;
        }

        let last = *self.last_tick.get_or_insert(now);
        if now.saturating_duration_since(last) < self.tick_interval {
            return TickOutcome::Waiting;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.last_tick = Some(now);
        log::debug!("Tick: {}s remaining", self.remaining_secs);

        if self.remaining_secs == 0 {
            self.state = TimerState::Finished;
            log::info!("Session finished");
            TickOutcome::Finished
        } else {
            TickOutcome::Ticked {
                remaining: self.remaining_secs,
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == TimerState::Finished
    }

    /// Duration captured by the current (or next) session
    #[must_use]
    pub fn selected_secs(&self) -> u32 {
        self.selected_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Countdown label
    #[must_use]
    pub fn countdown_text(&self) -> String {
        format!("Time remaining: {}s", self.remaining_secs)
    }

    /// Label of the start/reset control for the current state
    #[must_use]
    pub fn button_label(&self) -> &'static str {
        match self.state {
            TimerState::Idle => "Start",
            TimerState::Running | TimerState::Finished => "Reset",
        }
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self {
            state: TimerState::Idle,
            requested_secs: DEFAULT_DURATION_SECS,
            selected_secs: DEFAULT_DURATION_SECS,
            remaining_secs: DEFAULT_DURATION_SECS,
            last_tick: None,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        }
    }
}
