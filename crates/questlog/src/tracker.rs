//! Tracker context
//!
//! The one object the application root owns: timer, ledger and goals, plus
//! the clock and store they run against. Building it runs recovery; every
//! mutation is persisted before it returns.

use anyhow::Result;
use chrono::{DateTime, Duration, Local, Utc};
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::controller::{TimerController, TimerStatus};
use crate::goals::GoalTracker;
use crate::ledger::SessionLedger;
use crate::level::LevelProgress;
use crate::recovery::{recover, RecoveryOutcome, DEFAULT_STALE_AFTER_HOURS};
use crate::session::{Session, SessionPatch};
use crate::snapshot::TimerSnapshot;
use crate::stats::LedgerStats;
use crate::store::{FileStore, SnapshotStore};

/// Settings applied when opening a tracker
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    pub stale_after: Duration,
    pub daily_goal: f64,
    pub weekly_goal: f64,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        let goals = GoalTracker::default();
        Self {
            stale_after: Duration::hours(DEFAULT_STALE_AFTER_HOURS),
            daily_goal: goals.daily_goal,
            weekly_goal: goals.weekly_goal,
        }
    }
}

pub struct Tracker<C: Clock = SystemClock, S: SnapshotStore = FileStore> {
    clock: C,
    store: S,
    controller: TimerController,
    ledger: SessionLedger,
    goals: GoalTracker,
    recovery: RecoveryOutcome,
}

impl<C: Clock, S: SnapshotStore> Tracker<C, S> {
    /// Load persisted state, run recovery and save the reconciled state
    pub fn open(clock: C, store: S, options: TrackerOptions) -> Result<Self> {
        let snapshot = store.load()?.unwrap_or_default();
        let recovered = recover(snapshot, clock.now(), options.stale_after);

        let mut tracker = Self {
            clock,
            store,
            controller: recovered.controller,
            ledger: recovered.ledger,
            goals: GoalTracker::new(options.daily_goal, options.weekly_goal),
            recovery: recovered.outcome,
        };

        if tracker.recovery != RecoveryOutcome::Idle {
            tracker.persist()?;
        }
        tracker.refresh_goals();
        Ok(tracker)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn controller(&self) -> &TimerController {
        &self.controller
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    pub fn goals(&self) -> &GoalTracker {
        &self.goals
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// What recovery did when this tracker was opened
    pub fn recovery(&self) -> &RecoveryOutcome {
        &self.recovery
    }

    pub fn status(&self) -> TimerStatus {
        self.controller.status()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.controller.active_session()
    }

    /// Live elapsed time of the active session (ms)
    pub fn current_elapsed(&self) -> u64 {
        self.controller.current_elapsed(self.clock.now())
    }

    /// Start a session, first recording any session that was still active
    pub fn start(
        &mut self,
        project_id: Option<String>,
        task_id: Option<String>,
        description: Option<String>,
    ) -> Result<&Session> {
        let now = self.clock.now();
        if let Some(previous) = self.controller.start(project_id, task_id, description, now) {
            warn!(
                session = %previous.id,
                duration = previous.duration,
                "timer started while active; previous session recorded"
            );
            self.ledger.append(previous);
            self.refresh_goals();
        }
        self.persist()?;

        let session = self
            .controller
            .active_session()
            .ok_or_else(|| anyhow::anyhow!("timer did not start"))?;
        info!(session = %session.id, "session started");
        Ok(session)
    }

    pub fn pause(&mut self) -> Result<bool> {
        let paused = self.controller.pause(self.clock.now());
        if paused {
            self.persist()?;
        }
        Ok(paused)
    }

    pub fn resume(&mut self) -> Result<bool> {
        let resumed = self.controller.resume(self.clock.now());
        if resumed {
            self.persist()?;
        }
        Ok(resumed)
    }

    /// Stop the timer and record the session in the ledger
    pub fn stop(&mut self) -> Result<Option<Session>> {
        let Some(session) = self.controller.stop(self.clock.now()) else {
            return Ok(None);
        };

        info!(
            session = %session.id,
            duration = session.duration,
            xp = session.xp_earned,
            "session stopped"
        );
        self.ledger.append(session.clone());
        self.refresh_goals();
        self.persist()?;
        Ok(Some(session))
    }

    pub fn update_session(&mut self, id: &str, patch: &SessionPatch) -> Result<bool> {
        let updated = self.ledger.update(id, patch);
        if updated {
            self.refresh_goals();
            self.persist()?;
        }
        Ok(updated)
    }

    pub fn delete_session(&mut self, id: &str) -> Result<bool> {
        let deleted = self.ledger.delete(id);
        if deleted {
            self.refresh_goals();
            self.persist()?;
        }
        Ok(deleted)
    }

    pub fn clear_ledger(&mut self) -> Result<()> {
        self.ledger.clear();
        self.refresh_goals();
        self.persist()
    }

    pub fn set_daily_goal(&mut self, minutes: f64) {
        self.goals.set_daily_goal(minutes);
    }

    pub fn set_weekly_goal(&mut self, minutes: f64) {
        self.goals.set_weekly_goal(minutes);
    }

    /// Feed today / this-week ledger totals into the goal counters
    pub fn refresh_goals(&mut self) {
        let now = self.clock.now().with_timezone(&Local);
        self.goals
            .update_daily_time(self.ledger.today_total(&now) as f64 / 60_000.0);
        self.goals
            .update_weekly_time(self.ledger.week_total(&now) as f64 / 60_000.0);
    }

    pub fn level(&self) -> LevelProgress {
        LevelProgress::from_xp(self.ledger.total_xp())
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats::from_ledger(&self.ledger, &self.clock.now().with_timezone(&Local))
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::capture(&self.controller, &self.ledger)
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.snapshot())
    }
}
