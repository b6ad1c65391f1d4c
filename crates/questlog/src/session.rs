//! Tracked session model
//!
//! A session is one contiguous (possibly pause-interrupted) interval of
//! tracked time. It is mutable while the timer owns it and frozen once
//! stopped and moved into the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Milliseconds of tracked time that earn one XP
pub const MS_PER_XP: u64 = 60_000;

/// XP earned for a duration: one point per full minute
pub fn xp_for_duration(duration_ms: u64) -> u64 {
    duration_ms / MS_PER_XP
}

/// A tracked session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier, generated at start
    pub id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// When the session was created
    pub start_time: DateTime<Utc>,
    /// Set once, when the session is stopped
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Tracked milliseconds; 0 while active
    #[serde(default)]
    pub duration: u64,
    /// `floor(duration / 60000)`; 0 while active
    #[serde(default)]
    pub xp_earned: u64,
}

impl Session {
    /// Create a new active session starting at `now`
    pub fn new(
        project_id: Option<String>,
        task_id: Option<String>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            task_id,
            description,
            start_time: now,
            end_time: None,
            duration: 0,
            xp_earned: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Freeze the session with its final tracked duration
    pub fn finalize(mut self, duration_ms: u64, ended_at: DateTime<Utc>) -> Self {
        self.end_time = Some(ended_at);
        self.set_duration(duration_ms);
        self
    }

    /// Set the duration and re-derive XP
    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration = duration_ms;
        self.xp_earned = xp_for_duration(duration_ms);
    }

    /// Short form of the id for display
    pub fn short_id(&self) -> &str {
        let end = self.id.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.id.len());
        &self.id[..end]
    }

    /// Human label: description, then task, then project
    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .or(self.task_id.as_deref())
            .or(self.project_id.as_deref())
            .unwrap_or("(untitled)")
    }
}

/// Field-wise patch for a ledger entry
///
/// Outer `None` leaves a field alone; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub project_id: Option<Option<String>>,
    pub task_id: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// New duration in ms; XP is re-derived
    pub duration: Option<u64>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the patch into a session
    pub fn apply(&self, session: &mut Session) {
        if let Some(project_id) = &self.project_id {
            session.project_id = project_id.clone();
        }
        if let Some(task_id) = &self.task_id {
            session.task_id = task_id.clone();
        }
        if let Some(description) = &self.description {
            session.description = description.clone();
        }
        if let Some(start_time) = self.start_time {
            session.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            session.end_time = Some(end_time);
        }
        if let Some(duration) = self.duration {
            session.set_duration(duration);
        }
    }
}
