//! Score tiers, XP and levels.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scoring::round_half_up;

/// Streak length at which the XP bonus kicks in.
pub const STREAK_BONUS_MIN_DAYS: u32 = 3;

pub const MAX_LEVEL: u32 = 99;

const LEVEL_TITLES: [&str; 10] = [
    "Beginner",
    "Novice",
    "Apprentice",
    "Adept",
    "Expert",
    "Veteran",
    "Master",
    "Grandmaster",
    "Legend",
    "Mythic",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Poor,
    NeedsWork,
    Decent,
    Good,
    Excellent,
    Legendary,
}

impl ScoreTier {
    /// Inclusive lower bound of the tier.
    pub fn floor(&self) -> f64 {
        match self {
            ScoreTier::Legendary => 95.0,
            ScoreTier::Excellent => 85.0,
            ScoreTier::Good => 70.0,
            ScoreTier::Decent => 50.0,
            ScoreTier::NeedsWork => 30.0,
            ScoreTier::Poor => f64::NEG_INFINITY,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreTier::Legendary => "LEGENDARY",
            ScoreTier::Excellent => "Excellent",
            ScoreTier::Good => "Good",
            ScoreTier::Decent => "Decent",
            ScoreTier::NeedsWork => "Needs Work",
            ScoreTier::Poor => "Poor",
        }
    }
}

impl fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// First tier, top-down, whose floor the score reaches.
pub fn get_score_tier(score: f64) -> ScoreTier {
    [
        ScoreTier::Legendary,
        ScoreTier::Excellent,
        ScoreTier::Good,
        ScoreTier::Decent,
        ScoreTier::NeedsWork,
    ]
    .into_iter()
    .find(|t| score >= t.floor())
    .unwrap_or(ScoreTier::Poor)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    pub xp: i64,
    pub streak_bonus: i64,
}

/// XP for one day: the action score plus `2 × streak` once the streak reaches 3 days.
pub fn calculate_xp(action_score: i32, streak_days: u32) -> XpAward {
    let streak_bonus = if streak_days >= STREAK_BONUS_MIN_DAYS {
        i64::from(streak_days) * 2
    } else {
        0
    };
    XpAward {
        xp: i64::from(action_score) + streak_bonus,
        streak_bonus,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    pub title: String,
    /// XP accumulated inside the current level.
    pub current_xp: i64,
    /// XP needed to clear the current level.
    pub xp_for_next_level: i64,
    /// 0-100.
    pub xp_progress: i32,
}

pub fn level_title(level: u32) -> String {
    match level {
        1..=10 => LEVEL_TITLES[(level - 1) as usize].to_string(),
        n => format!("Level {n}"),
    }
}

/// Level `n` costs `n × 100` XP to clear; walk up until the remainder doesn't cover the
/// next threshold.
pub fn get_level_info(total_xp: i64) -> LevelInfo {
    let mut level: u32 = 1;
    let mut remaining = total_xp.max(0);

    while level < MAX_LEVEL && remaining >= i64::from(level) * 100 {
        remaining -= i64::from(level) * 100;
        level += 1;
    }

    let xp_for_next_level = i64::from(level) * 100;
    // Past the level cap the remainder keeps growing; progress stays pinned at 100.
    let xp_progress =
        round_half_up(remaining as f64 / xp_for_next_level as f64 * 100.0).min(100);

    LevelInfo {
        level,
        title: level_title(level),
        current_xp: remaining,
        xp_for_next_level,
        xp_progress,
    }
}
