//! Session ledger
//!
//! Insertion-ordered record of completed sessions. Once a session is stopped
//! this is the only place its tracked time lives.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionPatch};

/// Completed sessions, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionLedger {
    sessions: Vec<Session>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sessions(sessions: Vec<Session>) -> Self {
        Self { sessions }
    }

    pub fn into_sessions(self) -> Vec<Session> {
        self.sessions
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Append a session. Ids are not deduplicated.
    pub fn append(&mut self, session: Session) {
        self.sessions.push(session);
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Find the single session whose id starts with `prefix`
    ///
    /// Returns `None` when no session or more than one session matches.
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&Session> {
        if prefix.is_empty() {
            return None;
        }
        let mut matches = self.sessions.iter().filter(|s| s.id.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(session), None) => Some(session),
            _ => None,
        }
    }

    /// Merge `patch` into the first session with `id`. Returns whether one matched.
    pub fn update(&mut self, id: &str, patch: &SessionPatch) -> bool {
        match self.sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                patch.apply(session);
                true
            }
            None => false,
        }
    }

    /// Remove sessions with `id`. Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        self.sessions.len() != before
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
    }

    pub fn filter_by_project(&self, project_id: &str) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| s.project_id.as_deref() == Some(project_id))
            .collect()
    }

    pub fn filter_by_task(&self, task_id: &str) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| s.task_id.as_deref() == Some(task_id))
            .collect()
    }

    /// Mean duration in ms; 0 for an empty ledger
    pub fn average_duration(&self) -> f64 {
        if self.sessions.is_empty() {
            return 0.0;
        }
        self.total_duration() as f64 / self.sessions.len() as f64
    }

    /// Total tracked ms, saturating at `u64::MAX`
    pub fn total_duration(&self) -> u64 {
        saturating_sum(self.sessions.iter().map(|s| s.duration))
    }

    pub fn total_xp(&self) -> u64 {
        saturating_sum(self.sessions.iter().map(|s| s.xp_earned))
    }

    /// Sum of durations for sessions whose start time satisfies `predicate`
    pub fn total_duration_for_range<F>(&self, predicate: F) -> u64
    where
        F: Fn(&DateTime<Utc>) -> bool,
    {
        saturating_sum(
            self.sessions
                .iter()
                .filter(|s| predicate(&s.start_time))
                .map(|s| s.duration),
        )
    }

    /// Time tracked in sessions started on the same calendar day as `now`,
    /// in `now`'s time zone
    pub fn today_total<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> u64 {
        let tz = now.timezone();
        let today = now.date_naive();
        self.total_duration_for_range(|start| start.with_timezone(&tz).date_naive() == today)
    }

    /// Time tracked in sessions started in the same ISO week (Monday start)
    /// as `now`, in `now`'s time zone
    pub fn week_total<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> u64 {
        let tz = now.timezone();
        let week = now.iso_week();
        self.total_duration_for_range(|start| start.with_timezone(&tz).iso_week() == week)
    }
}

fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0u64, |acc, v| acc.saturating_add(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    fn completed(project: Option<&str>, task: Option<&str>, start: DateTime<Utc>, minutes: i64) -> Session {
        Session::new(project.map(String::from), task.map(String::from), None, start)
            .finalize((minutes * 60_000) as u64, start + Duration::minutes(minutes))
    }

    #[test]
    fn test_append_update_delete() {
        let mut ledger = SessionLedger::new();
        let start = at("2026-03-02T09:00:00Z");
        let session = completed(Some("p1"), None, start, 25);
        let id = session.id.clone();

        ledger.append(session);
        assert_eq!(ledger.len(), 1);

        let patch = SessionPatch {
            description: Some(Some("Planning".to_string())),
            ..Default::default()
        };
        assert!(ledger.update(&id, &patch));
        assert_eq!(ledger.get(&id).unwrap().description.as_deref(), Some("Planning"));

        assert!(!ledger.update("missing", &patch));
        assert!(!ledger.delete("missing"));
        assert_eq!(ledger.len(), 1);

        assert!(ledger.delete(&id));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_clear() {
        let start = at("2026-03-02T09:00:00Z");
        let mut ledger = SessionLedger::from_sessions(vec![
            completed(None, None, start, 5),
            completed(None, None, start, 10),
        ]);
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_filters_keep_order() {
        let start = at("2026-03-02T09:00:00Z");
        let ledger = SessionLedger::from_sessions(vec![
            completed(Some("a"), Some("t1"), start, 5),
            completed(Some("b"), Some("t1"), start, 10),
            completed(Some("a"), Some("t2"), start, 15),
            completed(None, None, start, 20),
        ]);

        let by_project: Vec<u64> = ledger.filter_by_project("a").iter().map(|s| s.duration).collect();
        assert_eq!(by_project, vec![300_000, 900_000]);

        let by_task: Vec<u64> = ledger.filter_by_task("t1").iter().map(|s| s.duration).collect();
        assert_eq!(by_task, vec![300_000, 600_000]);

        assert!(ledger.filter_by_project("zzz").is_empty());
    }

    #[test]
    fn test_average_duration() {
        assert_eq!(SessionLedger::new().average_duration(), 0.0);

        let start = at("2026-03-02T09:00:00Z");
        let ledger = SessionLedger::from_sessions(vec![
            completed(None, None, start, 10),
            completed(None, None, start, 20),
            completed(None, None, start, 45),
        ]);
        assert_eq!(ledger.average_duration(), 1_500_000.0);
        assert_eq!(ledger.total_xp(), 75);
    }

    #[test]
    fn test_today_is_calendar_day() {
        let ledger = SessionLedger::from_sessions(vec![
            completed(None, None, at("2026-03-04T00:30:00Z"), 10),
            completed(None, None, at("2026-03-04T23:00:00Z"), 20),
            // Less than 24h before "now" but on the previous day
            completed(None, None, at("2026-03-03T23:30:00Z"), 40),
        ]);

        let now = at("2026-03-04T23:45:00Z");
        assert_eq!(ledger.today_total(&now), 1_800_000);
    }

    #[test]
    fn test_today_uses_callers_time_zone() {
        let ledger = SessionLedger::from_sessions(vec![
            completed(None, None, at("2026-03-03T23:30:00Z"), 40),
        ]);

        // 23:30 UTC on the 3rd is 01:30 on the 4th at UTC+2
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = at("2026-03-04T08:00:00Z").with_timezone(&plus_two);
        assert_eq!(ledger.today_total(&now), 2_400_000);
        assert_eq!(ledger.today_total(&at("2026-03-04T08:00:00Z")), 0);
    }

    #[test]
    fn test_week_is_iso_calendar_week() {
        let ledger = SessionLedger::from_sessions(vec![
            // Sunday of the previous week
            completed(None, None, at("2026-03-01T12:00:00Z"), 30),
            // Monday
            completed(None, None, at("2026-03-02T09:00:00Z"), 60),
            // Thursday
            completed(None, None, at("2026-03-05T09:00:00Z"), 15),
        ]);

        let friday = at("2026-03-06T10:00:00Z");
        assert_eq!(ledger.week_total(&friday), 75 * 60_000);
    }

    #[test]
    fn test_totals_saturate_on_huge_durations() {
        let start = at("2026-03-04T09:00:00Z");
        let mut ledger = SessionLedger::from_sessions(vec![
            completed(None, None, start, 1),
            completed(None, None, start, 1),
        ]);
        let patch = SessionPatch {
            duration: Some(u64::MAX / 2 + 1),
            ..Default::default()
        };
        let ids: Vec<String> = ledger.iter().map(|s| s.id.clone()).collect();
        for id in &ids {
            assert!(ledger.update(id, &patch));
        }

        assert_eq!(ledger.total_duration(), u64::MAX);
        assert_eq!(ledger.today_total(&start), u64::MAX);
        assert_eq!(ledger.week_total(&start), u64::MAX);
        assert_eq!(ledger.total_xp(), 2 * ((u64::MAX / 2 + 1) / 60_000));
        assert!(ledger.average_duration() > 0.0);
    }

    #[test]
    fn test_find_by_prefix() {
        let start = at("2026-03-02T09:00:00Z");
        let mut a = completed(None, None, start, 1);
        a.id = "abc123".to_string();
        let mut b = completed(None, None, start, 1);
        b.id = "abd456".to_string();
        let ledger = SessionLedger::from_sessions(vec![a, b]);

        assert_eq!(ledger.find_by_prefix("abc").unwrap().id, "abc123");
        assert!(ledger.find_by_prefix("ab").is_none());
        assert!(ledger.find_by_prefix("").is_none());
        assert!(ledger.find_by_prefix("x").is_none());
    }
}
