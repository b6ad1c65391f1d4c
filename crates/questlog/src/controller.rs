//! Timer controller
//!
//! Owns the single active session and the Idle / Running / Paused state
//! machine. Invalid transitions are no-ops: the caller gets the state back
//! unchanged rather than an error.
//!
//! Every operation takes `now` explicitly; the [`Tracker`](crate::Tracker)
//! supplies it from its clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::millis_between;
use crate::session::Session;

/// Tag of the current timer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

impl TimerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        }
    }
}

/// Timer state
///
/// `elapsed` is the time accumulated over completed run segments and never
/// includes the segment in progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Idle,
    Running {
        session: Session,
        /// Start of the current run segment
        segment_start: DateTime<Utc>,
        elapsed: u64,
    },
    Paused {
        session: Session,
        elapsed: u64,
    },
}

impl TimerState {
    pub fn status(&self) -> TimerStatus {
        match self {
            TimerState::Idle => TimerStatus::Idle,
            TimerState::Running { .. } => TimerStatus::Running,
            TimerState::Paused { .. } => TimerStatus::Paused,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            TimerState::Idle => None,
            TimerState::Running { session, .. } | TimerState::Paused { session, .. } => {
                Some(session)
            }
        }
    }

    /// Accumulated milliseconds, excluding the running segment
    pub fn banked(&self) -> u64 {
        match self {
            TimerState::Idle => 0,
            TimerState::Running { elapsed, .. } | TimerState::Paused { elapsed, .. } => *elapsed,
        }
    }

    /// True elapsed milliseconds at `now`
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        match self {
            TimerState::Idle => 0,
            TimerState::Running {
                segment_start,
                elapsed,
                ..
            } => elapsed.saturating_add(millis_between(*segment_start, now)),
            TimerState::Paused { elapsed, .. } => *elapsed,
        }
    }
}

/// The session timer
#[derive(Debug, Clone, Default)]
pub struct TimerController {
    state: TimerState,
}

impl TimerController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a controller around an existing state (used by recovery)
    pub fn from_state(state: TimerState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.state.session()
    }

    pub fn is_running(&self) -> bool {
        self.status() == TimerStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status() == TimerStatus::Paused
    }

    /// Start a new session.
    ///
    /// A session that is still active is finalized first and returned so the
    /// caller can record it; its time is never silently dropped.
    pub fn start(
        &mut self,
        project_id: Option<String>,
        task_id: Option<String>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Option<Session> {
        let displaced = self.stop(now);

        let session = Session::new(project_id, task_id, description, now);
        debug!(session = %session.id, "timer started");
        self.state = TimerState::Running {
            session,
            segment_start: now,
            elapsed: 0,
        };

        displaced
    }

    /// Bank the running segment and pause. No-op unless running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        match std::mem::take(&mut self.state) {
            TimerState::Running {
                session,
                segment_start,
                elapsed,
            } => {
                let elapsed = elapsed.saturating_add(millis_between(segment_start, now));
                debug!(session = %session.id, elapsed, "timer paused");
                self.state = TimerState::Paused { session, elapsed };
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Open a new run segment. No-op unless paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        match std::mem::take(&mut self.state) {
            TimerState::Paused { session, elapsed } => {
                debug!(session = %session.id, elapsed, "timer resumed");
                self.state = TimerState::Running {
                    session,
                    segment_start: now,
                    elapsed,
                };
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Finalize the active session and return to idle.
    ///
    /// Returns the finalized session, or `None` when already idle.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Session> {
        let duration = self.state.elapsed_at(now);
        let session = match std::mem::take(&mut self.state) {
            TimerState::Idle => return None,
            TimerState::Running { session, .. } | TimerState::Paused { session, .. } => session,
        };

        let session = session.finalize(duration, now);
        debug!(session = %session.id, duration, xp = session.xp_earned, "timer stopped");
        Some(session)
    }

    /// Live elapsed milliseconds. Never mutates state.
    pub fn current_elapsed(&self, now: DateTime<Utc>) -> u64 {
        self.state.elapsed_at(now)
    }
}
