//! Daily and weekly goal progress
//!
//! Goals and counters are both in minutes. Counters are fed in from outside
//! (the tracker derives them from the ledger); nothing here reads sessions.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalTracker {
    pub daily_goal: f64,
    pub weekly_goal: f64,
    pub daily_time: f64,
    pub weekly_time: f64,
}

impl Default for GoalTracker {
    fn default() -> Self {
        Self::new(480.0, 2400.0)
    }
}

impl GoalTracker {
    pub fn new(daily_goal: f64, weekly_goal: f64) -> Self {
        Self {
            daily_goal,
            weekly_goal,
            daily_time: 0.0,
            weekly_time: 0.0,
        }
    }

    pub fn set_daily_goal(&mut self, minutes: f64) {
        self.daily_goal = minutes;
    }

    pub fn set_weekly_goal(&mut self, minutes: f64) {
        self.weekly_goal = minutes;
    }

    pub fn update_daily_time(&mut self, minutes: f64) {
        self.daily_time = minutes;
    }

    pub fn update_weekly_time(&mut self, minutes: f64) {
        self.weekly_time = minutes;
    }

    /// Daily progress, 0-100
    pub fn daily_progress(&self) -> u32 {
        progress_percent(self.daily_time, self.daily_goal)
    }

    /// Weekly progress, 0-100
    pub fn weekly_progress(&self) -> u32 {
        progress_percent(self.weekly_time, self.weekly_goal)
    }
}

/// `round(time / goal * 100)` clamped to 0..=100; a non-positive goal is 0%
pub fn progress_percent(time: f64, goal: f64) -> u32 {
    if !goal.is_finite() || goal <= 0.0 || !time.is_finite() {
        return 0;
    }
    (time / goal * 100.0).round().clamp(0.0, 100.0) as u32
}
