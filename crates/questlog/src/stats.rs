//! Ledger statistics
//!
//! Aggregates the ledger into the figures the status and stats views show:
//! totals, averages, today / this-week time, XP and per-project breakdown.

use chrono::{DateTime, TimeZone};
use std::collections::BTreeMap;

use crate::ledger::SessionLedger;
use crate::level::LevelProgress;

/// Aggregated ledger statistics
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStats {
    pub total_sessions: u32,
    /// Total tracked time (ms)
    pub total_ms: u64,
    /// Mean session length (ms)
    pub average_ms: u64,
    /// Longest single session (ms)
    pub longest_ms: u64,
    /// Tracked today, calendar day (ms)
    pub today_ms: u64,
    /// Tracked this ISO week (ms)
    pub week_ms: u64,
    pub level: LevelProgress,
    /// Time per project, largest first; sessions without a project are skipped
    pub by_project: Vec<(String, u64)>,
}

impl LedgerStats {
    /// Calculate statistics as of `now`
    pub fn from_ledger<Tz: TimeZone>(ledger: &SessionLedger, now: &DateTime<Tz>) -> Self {
        let mut projects: BTreeMap<&str, u64> = BTreeMap::new();
        for session in ledger.iter() {
            if let Some(project) = session.project_id.as_deref() {
                let total = projects.entry(project).or_default();
                *total = total.saturating_add(session.duration);
            }
        }

        let mut by_project: Vec<(String, u64)> = projects
            .into_iter()
            .map(|(name, ms)| (name.to_string(), ms))
            .collect();
        by_project.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            total_sessions: ledger.len() as u32,
            total_ms: ledger.total_duration(),
            average_ms: ledger.average_duration().round() as u64,
            longest_ms: ledger.iter().map(|s| s.duration).max().unwrap_or(0),
            today_ms: ledger.today_total(now),
            week_ms: ledger.week_total(now),
            level: LevelProgress::from_xp(ledger.total_xp()),
            by_project,
        }
    }

    /// Total tracked time as (hours, minutes)
    pub fn total_time(&self) -> (u64, u64) {
        let minutes = self.total_ms / 60_000;
        (minutes / 60, minutes % 60)
    }
}
