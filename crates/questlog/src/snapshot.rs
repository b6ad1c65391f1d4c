//! Persisted timer snapshot
//!
//! The on-disk schema is kept separate from [`TimerState`]: it is a flat,
//! versioned record of the controller plus the ledger, written whole and read
//! whole. The flat form can describe states the enum cannot (running without
//! a segment start, both flags set); [`recovery`](crate::recovery) repairs
//! those on load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::controller::{TimerController, TimerState};
use crate::error::TimerError;
use crate::ledger::SessionLedger;
use crate::session::Session;

/// Current schema version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Key the snapshot is stored under
pub const STORAGE_KEY: &str = "timer-storage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub active_session: Option<Session>,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub is_paused: bool,
    /// Start of the current run segment
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Milliseconds banked from completed run segments
    #[serde(default)]
    pub elapsed_time: u64,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            active_session: None,
            is_running: false,
            is_paused: false,
            start_time: None,
            elapsed_time: 0,
            sessions: Vec::new(),
        }
    }
}

impl TimerSnapshot {
    /// Capture the controller and ledger
    pub fn capture(controller: &TimerController, ledger: &SessionLedger) -> Self {
        let mut snapshot = Self {
            sessions: ledger.sessions().to_vec(),
            ..Self::default()
        };

        match controller.state() {
            TimerState::Idle => {}
            TimerState::Running {
                session,
                segment_start,
                elapsed,
            } => {
                snapshot.active_session = Some(session.clone());
                snapshot.is_running = true;
                snapshot.start_time = Some(*segment_start);
                snapshot.elapsed_time = *elapsed;
            }
            TimerState::Paused { session, elapsed } => {
                snapshot.active_session = Some(session.clone());
                snapshot.is_paused = true;
                snapshot.elapsed_time = *elapsed;
            }
        }

        snapshot
    }

    pub fn to_json(&self) -> Result<String, TimerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a snapshot, rejecting versions newer than this build
    pub fn from_json(json: &str) -> Result<Self, TimerError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(TimerError::UnsupportedVersion {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_capture_idle() {
        let snapshot = TimerSnapshot::capture(&TimerController::new(), &SessionLedger::new());
        assert_eq!(snapshot, TimerSnapshot::default());
    }

    #[test]
    fn test_capture_running_and_paused() {
        let now = Utc::now();
        let mut timer = TimerController::new();
        timer.start(Some("p".to_string()), None, None, now);

        let running = TimerSnapshot::capture(&timer, &SessionLedger::new());
        assert!(running.is_running && !running.is_paused);
        assert_eq!(running.start_time, Some(now));
        assert_eq!(running.elapsed_time, 0);

        timer.pause(now + Duration::seconds(8));
        let paused = TimerSnapshot::capture(&timer, &SessionLedger::new());
        assert!(paused.is_paused && !paused.is_running);
        assert_eq!(paused.start_time, None);
        assert_eq!(paused.elapsed_time, 8_000);
        assert_eq!(paused.active_session, running.active_session);
    }

    #[test]
    fn test_decode_fills_defaults() {
        let snapshot = TimerSnapshot::from_json("{}").unwrap();
        assert_eq!(snapshot, TimerSnapshot::default());
    }

    #[test]
    fn test_rejects_future_version() {
        let err = TimerSnapshot::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(
            err,
            TimerError::UnsupportedVersion { found: 99, supported: SNAPSHOT_VERSION }
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            TimerSnapshot::from_json("not json"),
            Err(TimerError::Malformed(_))
        ));
    }
}
