//! questlog - Session timer with crash recovery, XP and goal tracking
//!
//! "Every minute counts. Literally: one minute, one XP."
//!
//! The core of a gamified time tracker:
//! - A single session timer (idle, running, paused) that survives restarts
//! - A ledger of completed sessions with filters and today/this-week totals
//! - XP derived from tracked minutes, and levels derived from XP
//! - Daily and weekly goal progress
//!
//! Commands:
//! - start: Start tracking a session
//! - pause / resume: Suspend and continue the running session
//! - stop: Finish the session and record it
//! - status: Show the timer, goals and level
//! - log / edit / delete / clear: Work with recorded sessions
//! - stats: Show ledger statistics
//! - goals: Show or change daily and weekly goals

pub mod clock;
pub mod controller;
pub mod error;
pub mod goals;
pub mod ledger;
pub mod level;
pub mod recovery;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{TimerController, TimerState, TimerStatus};
pub use error::TimerError;
pub use goals::GoalTracker;
pub use ledger::SessionLedger;
pub use level::LevelProgress;
pub use recovery::{recover, Recovered, RecoveryOutcome};
pub use session::{Session, SessionPatch};
pub use snapshot::TimerSnapshot;
pub use stats::LedgerStats;
pub use store::{FileStore, MemoryStore, SnapshotStore};
pub use tracker::{Tracker, TrackerOptions};
