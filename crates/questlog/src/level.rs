//! XP levels
//!
//! Reaching level `n + 1` takes `100 * n * (n + 1) / 2` total XP: 100 XP for
//! level 2, 300 for level 3, 600 for level 4, and so on.

use serde::{Deserialize, Serialize};

/// XP added to each successive level's requirement
pub const XP_STEP: u64 = 100;

/// Total XP needed to reach `level` (level 1 needs none)
pub fn xp_for_level(level: u32) -> u64 {
    let n = u64::from(level.saturating_sub(1));
    XP_STEP * n * (n + 1) / 2
}

/// Level reached with `xp` total XP
pub fn level_for_xp(xp: u64) -> u32 {
    let mut level = 1;
    while xp >= xp_for_level(level + 1) {
        level += 1;
    }
    level
}

/// Where a total XP figure sits within its level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub total_xp: u64,
    /// XP earned since reaching `level`
    pub xp_into_level: u64,
    /// XP between `level` and the next one
    pub xp_for_next: u64,
}

impl LevelProgress {
    pub fn from_xp(total_xp: u64) -> Self {
        let level = level_for_xp(total_xp);
        let floor = xp_for_level(level);
        Self {
            level,
            total_xp,
            xp_into_level: total_xp - floor,
            xp_for_next: xp_for_level(level + 1) - floor,
        }
    }

    /// Progress toward the next level, 0-100
    pub fn percent(&self) -> u32 {
        if self.xp_for_next == 0 {
            return 0;
        }
        ((self.xp_into_level * 100) / self.xp_for_next).min(100) as u32
    }

    pub fn xp_remaining(&self) -> u64 {
        self.xp_for_next - self.xp_into_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(xp_for_level(1), 0);
        assert_eq!(xp_for_level(2), 100);
        assert_eq!(xp_for_level(3), 300);
        assert_eq!(xp_for_level(4), 600);
    }

    #[test]
    fn test_level_for_xp() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(299), 2);
        assert_eq!(level_for_xp(300), 3);
    }

    #[test]
    fn test_level_progress() {
        let progress = LevelProgress::from_xp(450);
        assert_eq!(progress.level, 3);
        assert_eq!(progress.xp_into_level, 150);
        assert_eq!(progress.xp_for_next, 300);
        assert_eq!(progress.percent(), 50);
        assert_eq!(progress.xp_remaining(), 150);
    }
}
