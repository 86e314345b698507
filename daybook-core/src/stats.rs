//! Daily score records, streaks and user stats.
//!
//! Everything here is derived: a `DailyScore` from a day's breakdown plus the streak
//! leading into it, and `UserStats` from replaying daily scores in date order.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::pillar::PillarKey;
use crate::scoring::DailyBreakdown;
use crate::tiers::{XpAward, calculate_xp, get_level_info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    /// Minimum action score for a day to count as passing.
    pub passing_score: i32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self { passing_score: 70 }
    }
}

impl ScoringPolicy {
    pub fn is_passing(&self, action_score: i32) -> bool {
        action_score >= self.passing_score
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyScore {
    pub date: NaiveDate,
    pub action_score: i32,
    pub pillar_scores: BTreeMap<PillarKey, i32>,
    pub is_passing: bool,
    pub xp_earned: i64,
}

/// Build the record for `date`. `history` supplies the streak leading into the day; a
/// row for `date` itself in `history` is ignored.
pub fn score_day(
    date: NaiveDate,
    breakdown: DailyBreakdown,
    history: &[DailyScore],
    policy: &ScoringPolicy,
) -> DailyScore {
    let is_passing = policy.is_passing(breakdown.action_score);
    let streak = if is_passing {
        streak_ending(history, date - Duration::days(1)) + 1
    } else {
        0
    };
    let XpAward { xp, .. } = calculate_xp(breakdown.action_score, streak);

    DailyScore {
        date,
        action_score: breakdown.action_score,
        pillar_scores: breakdown.pillar_scores,
        is_passing,
        xp_earned: xp,
    }
}

/// Consecutive passing days ending on `last_day` (0 if that day didn't pass).
pub fn streak_ending(scores: &[DailyScore], last_day: NaiveDate) -> u32 {
    let passing: HashSet<NaiveDate> = scores
        .iter()
        .filter(|s| s.is_passing)
        .map(|s| s.date)
        .collect();

    let mut streak = 0;
    let mut day = last_day;
    while passing.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

/// Live streak as of `as_of`. A day that hasn't been scored yet doesn't break it.
pub fn current_streak(scores: &[DailyScore], as_of: NaiveDate) -> u32 {
    if scores.iter().any(|s| s.date == as_of) {
        streak_ending(scores, as_of)
    } else {
        streak_ending(scores, as_of - Duration::days(1))
    }
}

/// Recompute each day's `xp_earned` from the passing streak that ends on it. Returns
/// only the rows whose stored XP is stale, in date order. Rescoring an earlier day can
/// lengthen or break the streaks of every day after it.
pub fn restate_xp(scores: &[DailyScore]) -> Vec<DailyScore> {
    let by_date: BTreeMap<NaiveDate, &DailyScore> =
        scores.iter().map(|s| (s.date, s)).collect();
    let latest: Vec<DailyScore> = by_date.values().map(|s| (*s).clone()).collect();

    latest
        .iter()
        .filter_map(|s| {
            let streak = if s.is_passing { streak_ending(&latest, s.date) } else { 0 };
            let xp = calculate_xp(s.action_score, streak).xp;
            (xp != s.xp_earned).then(|| DailyScore {
                xp_earned: xp,
                ..s.clone()
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_xp: i64,
    pub level: u32,
    pub level_title: String,
    pub current_streak: u32,
    pub best_streak: u32,
}

impl Default for UserStats {
    fn default() -> Self {
        let info = get_level_info(0);
        Self {
            total_xp: 0,
            level: info.level,
            level_title: info.title,
            current_streak: 0,
            best_streak: 0,
        }
    }
}

impl UserStats {
    /// Fold one day into the stats. The XP bonus uses the streak including this day.
    pub fn apply_day(&self, action_score: i32, is_passing: bool) -> (UserStats, XpAward) {
        let current_streak = if is_passing { self.current_streak + 1 } else { 0 };
        let award = calculate_xp(action_score, current_streak);
        let total_xp = self.total_xp + award.xp;
        let info = get_level_info(total_xp);

        let next = UserStats {
            total_xp,
            level: info.level,
            level_title: info.title,
            current_streak,
            best_streak: self.best_streak.max(current_streak),
        };
        (next, award)
    }
}

/// Re-derive stats from every stored daily score. Later rows for the same date win; a
/// calendar gap breaks the streak.
pub fn rebuild_stats(scores: &[DailyScore], as_of: NaiveDate) -> UserStats {
    let by_date: BTreeMap<NaiveDate, &DailyScore> =
        scores.iter().map(|s| (s.date, s)).collect();

    let mut stats = UserStats::default();
    let mut prev: Option<NaiveDate> = None;

    for (date, score) in &by_date {
        if prev.is_some_and(|p| *date - p > Duration::days(1)) {
            stats.current_streak = 0;
        }
        let (next, _) = stats.apply_day(score.action_score, score.is_passing);
        stats = next;
        prev = Some(*date);
    }

    let deduped: Vec<DailyScore> = by_date.into_values().cloned().collect();
    stats.current_streak = current_streak(&deduped, as_of);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::parse_calendar_date;

    fn d(offset: i64) -> NaiveDate {
        parse_calendar_date("2026-03-01").unwrap() + Duration::days(offset)
    }

    fn row(offset: i64, score: i32) -> DailyScore {
        DailyScore {
            date: d(offset),
            action_score: score,
            pillar_scores: BTreeMap::new(),
            is_passing: ScoringPolicy::default().is_passing(score),
            xp_earned: 0,
        }
    }

    fn breakdown(score: i32) -> DailyBreakdown {
        DailyBreakdown {
            action_score: score,
            ..Default::default()
        }
    }

    #[test]
    fn test_score_day_streak_bonus() {
        let history = vec![row(0, 80), row(1, 90)];
        let rec = score_day(d(2), breakdown(75), &history, &ScoringPolicy::default());
        assert!(rec.is_passing);
        // Third passing day in a row: 75 + 3*2
        assert_eq!(rec.xp_earned, 81);

        let miss = score_day(d(2), breakdown(40), &history, &ScoringPolicy::default());
        assert!(!miss.is_passing);
        assert_eq!(miss.xp_earned, 40);
    }

    #[test]
    fn test_streak_breaks_on_gap_and_fail() {
        let scores = vec![row(0, 80), row(1, 80), row(3, 80), row(4, 50), row(5, 90)];
        assert_eq!(streak_ending(&scores, d(1)), 2);
        assert_eq!(streak_ending(&scores, d(3)), 1);
        assert_eq!(streak_ending(&scores, d(4)), 0);
        assert_eq!(current_streak(&scores, d(5)), 1);
        // Today (d6) not scored yet: yesterday's streak still stands.
        assert_eq!(current_streak(&scores, d(6)), 1);
        assert_eq!(current_streak(&scores, d(7)), 0);
    }

    #[test]
    fn test_apply_day_levels_up() {
        let stats = UserStats::default();
        let (stats, award) = stats.apply_day(100, true);
        assert_eq!(award.xp, 100);
        assert_eq!(stats.level, 2);
        assert_eq!(stats.level_title, "Novice");
        assert_eq!(stats.current_streak, 1);

        let (stats, _) = stats.apply_day(10, false);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.best_streak, 1);
        assert_eq!(stats.total_xp, 110);
    }

    #[test]
    fn test_rebuild_matches_incremental_scoring() {
        let policy = ScoringPolicy::default();
        let mut history: Vec<DailyScore> = Vec::new();
        for (i, s) in [80, 85, 90, 95, 20, 70].into_iter().enumerate() {
            let rec = score_day(d(i as i64), breakdown(s), &history, &policy);
            history.push(rec);
        }

        let stats = rebuild_stats(&history, d(5));
        let stored_total: i64 = history.iter().map(|r| r.xp_earned).sum();
        assert_eq!(stats.total_xp, stored_total);
        // 80 + 85 + (90+6) + (95+8) + 20 + 70
        assert_eq!(stats.total_xp, 454);
        assert_eq!(stats.best_streak, 4);
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn test_restate_xp_after_backfill() {
        let policy = ScoringPolicy::default();
        let mut history: Vec<DailyScore> = Vec::new();
        // Scored newest first: each day sees no streak leading into it.
        for day in [2, 1, 0] {
            let rec = score_day(d(day), breakdown(100), &history, &policy);
            assert_eq!(rec.xp_earned, 100);
            history.push(rec);
        }

        let stale = restate_xp(&history);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].date, d(2));
        assert_eq!(stale[0].xp_earned, 106);

        history.retain(|s| s.date != d(2));
        history.extend(stale);
        let stored_total: i64 = history.iter().map(|r| r.xp_earned).sum();
        assert_eq!(stored_total, rebuild_stats(&history, d(2)).total_xp);
        assert!(restate_xp(&history).is_empty());
    }

    #[test]
    fn test_rebuild_gap_resets_streak() {
        let scores = vec![row(0, 80), row(1, 80), row(2, 80), row(5, 80)];
        let stats = rebuild_stats(&scores, d(5));
        // Day 5 starts a fresh streak, no bonus.
        assert_eq!(stats.total_xp, 80 + 80 + 86 + 80);
        assert_eq!(stats.best_streak, 3);
        assert_eq!(stats.current_streak, 1);
    }
}
