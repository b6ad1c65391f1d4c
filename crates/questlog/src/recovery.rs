//! Start-up recovery
//!
//! Runs once when the tracker is built from a persisted snapshot. Reconciles
//! the saved timer against the wall clock:
//! - nothing active: idle
//! - session older than the staleness threshold: stopped and moved to the ledger
//! - running: the gap while the process was gone counts as running time
//! - paused: untouched, no time accrues

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::clock::millis_between;
use crate::controller::{TimerController, TimerState};
use crate::ledger::SessionLedger;
use crate::session::Session;
use crate::snapshot::TimerSnapshot;

/// Sessions started longer ago than this are stopped on recovery
pub const DEFAULT_STALE_AFTER_HOURS: i64 = 24;

/// Which recovery branch was taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// No active session was persisted
    Idle,
    /// The session was past the staleness threshold and has been stopped
    Expired(Session),
    /// A running session continues; `gap` ms were added for the downtime
    Resumed { gap: u64 },
    /// Running was persisted without a segment start; a fresh segment was opened
    Restarted,
    /// A paused session stays paused
    StillPaused,
}

/// Result of recovery
#[derive(Debug, Clone)]
pub struct Recovered {
    pub controller: TimerController,
    pub ledger: SessionLedger,
    pub outcome: RecoveryOutcome,
}

/// Rebuild controller and ledger from `snapshot` as of `now`
pub fn recover(snapshot: TimerSnapshot, now: DateTime<Utc>, stale_after: Duration) -> Recovered {
    let TimerSnapshot {
        active_session,
        is_running,
        is_paused,
        start_time,
        elapsed_time,
        sessions,
        ..
    } = snapshot;

    let mut ledger = SessionLedger::from_sessions(sessions);

    let Some(session) = active_session else {
        return Recovered {
            controller: TimerController::new(),
            ledger,
            outcome: RecoveryOutcome::Idle,
        };
    };

    if is_running && is_paused {
        warn!(session = %session.id, "snapshot has both running and paused set");
    }

    let (state, outcome) = if is_running {
        match start_time {
            Some(segment_start) => {
                let gap = millis_between(segment_start, now);
                (
                    TimerState::Running {
                        session,
                        segment_start: now,
                        elapsed: elapsed_time.saturating_add(gap),
                    },
                    RecoveryOutcome::Resumed { gap },
                )
            }
            None => {
                warn!(session = %session.id, "running snapshot without a segment start");
                (
                    TimerState::Running {
                        session,
                        segment_start: now,
                        elapsed: elapsed_time,
                    },
                    RecoveryOutcome::Restarted,
                )
            }
        }
    } else {
        if !is_paused {
            warn!(session = %session.id, "active session with neither flag set, treating as paused");
        }
        (
            TimerState::Paused {
                session,
                elapsed: elapsed_time,
            },
            RecoveryOutcome::StillPaused,
        )
    };

    let mut controller = TimerController::from_state(state);

    let is_stale = controller
        .active_session()
        .map(|s| now.signed_duration_since(s.start_time) > stale_after)
        .unwrap_or(false);

    if is_stale {
        if let Some(expired) = controller.stop(now) {
            warn!(
                session = %expired.id,
                started = %expired.start_time,
                duration = expired.duration,
                "stale session stopped on recovery"
            );
            ledger.append(expired.clone());
            return Recovered {
                controller,
                ledger,
                outcome: RecoveryOutcome::Expired(expired),
            };
        }
    }

    info!(outcome = ?outcome, "timer recovered");
    Recovered {
        controller,
        ledger,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::TimerStatus;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-02T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn stale() -> Duration {
        Duration::hours(DEFAULT_STALE_AFTER_HOURS)
    }

    fn running_snapshot(started: DateTime<Utc>) -> TimerSnapshot {
        let mut timer = TimerController::new();
        timer.start(Some("p".to_string()), None, None, started);
        TimerSnapshot::capture(&timer, &SessionLedger::new())
    }

    #[test]
    fn test_empty_snapshot_is_idle() {
        let recovered = recover(TimerSnapshot::default(), t0(), stale());
        assert_eq!(recovered.outcome, RecoveryOutcome::Idle);
        assert_eq!(recovered.controller.status(), TimerStatus::Idle);
        assert!(recovered.ledger.is_empty());
    }

    #[test]
    fn test_ledger_is_preserved() {
        let mut timer = TimerController::new();
        timer.start(None, None, None, t0());
        let done = timer.stop(t0() + Duration::minutes(5)).unwrap();

        let mut ledger = SessionLedger::new();
        ledger.append(done.clone());
        let snapshot = TimerSnapshot::capture(&timer, &ledger);

        let recovered = recover(snapshot, t0() + Duration::hours(1), stale());
        assert_eq!(recovered.ledger.sessions(), &[done]);
    }

    #[test]
    fn test_running_session_counts_downtime() {
        let snapshot = running_snapshot(t0());
        let now = t0() + Duration::minutes(20);

        let recovered = recover(snapshot, now, stale());
        assert_eq!(recovered.outcome, RecoveryOutcome::Resumed { gap: 1_200_000 });
        assert!(recovered.controller.is_running());
        assert_eq!(recovered.controller.current_elapsed(now), 1_200_000);
        assert_eq!(
            recovered.controller.current_elapsed(now + Duration::minutes(1)),
            1_260_000
        );
        match recovered.controller.state() {
            TimerState::Running { segment_start, .. } => assert_eq!(*segment_start, now),
            other => panic!("expected running, got {:?}", other),
        }
    }

    #[test]
    fn test_paused_session_accrues_nothing() {
        let mut timer = TimerController::new();
        timer.start(None, None, None, t0());
        timer.pause(t0() + Duration::minutes(3));
        let snapshot = TimerSnapshot::capture(&timer, &SessionLedger::new());

        let now = t0() + Duration::hours(10);
        let recovered = recover(snapshot, now, stale());
        assert_eq!(recovered.outcome, RecoveryOutcome::StillPaused);
        assert!(recovered.controller.is_paused());
        assert_eq!(recovered.controller.current_elapsed(now), 180_000);
    }

    #[test]
    fn test_stale_session_is_stopped() {
        let snapshot = running_snapshot(t0());
        let now = t0() + Duration::hours(25);

        let recovered = recover(snapshot, now, stale());
        assert_eq!(recovered.controller.status(), TimerStatus::Idle);
        assert_eq!(recovered.ledger.len(), 1);

        let entry = &recovered.ledger.sessions()[0];
        assert_eq!(entry.end_time, Some(now));
        assert_eq!(entry.duration, 25 * 3_600_000);
        assert_eq!(entry.xp_earned, 25 * 60);
        assert_eq!(recovered.outcome, RecoveryOutcome::Expired(entry.clone()));
    }

    #[test]
    fn test_stale_paused_session_keeps_banked_time() {
        let mut timer = TimerController::new();
        timer.start(None, None, None, t0());
        timer.pause(t0() + Duration::minutes(45));
        let snapshot = TimerSnapshot::capture(&timer, &SessionLedger::new());

        let recovered = recover(snapshot, t0() + Duration::hours(30), stale());
        assert!(matches!(recovered.outcome, RecoveryOutcome::Expired(_)));
        assert_eq!(recovered.ledger.sessions()[0].duration, 2_700_000);
    }

    #[test]
    fn test_exactly_at_threshold_is_not_stale() {
        let snapshot = running_snapshot(t0());
        let recovered = recover(snapshot, t0() + Duration::hours(24), stale());
        assert!(matches!(recovered.outcome, RecoveryOutcome::Resumed { .. }));
    }

    #[test]
    fn test_running_without_start_time() {
        let mut snapshot = running_snapshot(t0());
        snapshot.start_time = None;
        snapshot.elapsed_time = 90_000;

        let now = t0() + Duration::hours(2);
        let recovered = recover(snapshot, now, stale());
        assert_eq!(recovered.outcome, RecoveryOutcome::Restarted);
        assert!(recovered.controller.is_running());
        assert_eq!(recovered.controller.current_elapsed(now), 90_000);
    }

    #[test]
    fn test_no_flags_treated_as_paused() {
        let mut snapshot = running_snapshot(t0());
        snapshot.is_running = false;
        snapshot.start_time = None;
        snapshot.elapsed_time = 5_000;

        let recovered = recover(snapshot, t0() + Duration::hours(1), stale());
        assert_eq!(recovered.outcome, RecoveryOutcome::StillPaused);
        assert_eq!(recovered.controller.current_elapsed(t0() + Duration::hours(2)), 5_000);
    }

    #[test]
    fn test_both_flags_prefers_running() {
        let mut snapshot = running_snapshot(t0());
        snapshot.is_paused = true;
        snapshot.elapsed_time = 30_000;

        let now = t0() + Duration::minutes(10);
        let recovered = recover(snapshot, now, stale());
        assert_eq!(recovered.outcome, RecoveryOutcome::Resumed { gap: 600_000 });
        assert!(recovered.controller.is_running());
        assert_eq!(recovered.controller.current_elapsed(now), 630_000);
    }

    #[test]
    fn test_custom_threshold() {
        let snapshot = running_snapshot(t0());
        let recovered = recover(snapshot, t0() + Duration::hours(2), Duration::hours(1));
        assert!(matches!(recovered.outcome, RecoveryOutcome::Expired(_)));
    }
}
