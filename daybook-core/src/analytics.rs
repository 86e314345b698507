//! Cycle-level pace, consistency and projection across every goal in a cycle.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cycle::{GoalStatus, WeekScore, WeeklyTarget};
use crate::goals::GoalId;

/// A goal as the cycle sees it: a total target and how far it has come.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleGoal {
    pub id: GoalId,
    pub title: String,
    pub target_value: f64,
    pub current_value: f64,
}

impl CycleGoal {
    pub fn new(id: i64, title: impl Into<String>, target_value: f64, current_value: f64) -> Self {
        Self {
            id: GoalId(id),
            title: title.into(),
            target_value,
            current_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleAnalytics {
    pub total_target: f64,
    pub total_current: f64,
    /// 0-100+, current over target across all goals.
    pub overall_completion: f64,
    /// Where the cycle should be by the start of the current week.
    pub expected_value: f64,
    pub pace_ratio: f64,
    pub pace: GoalStatus,
    /// Weeks where every goal was reviewed good-or-better.
    pub consistent_weeks: u32,
    /// Weeks where every goal was reviewed.
    pub total_reviewed_weeks: u32,
    /// Linear extrapolation of the current weekly rate, capped at 100.
    pub projected_completion: f64,
}

impl CycleAnalytics {
    fn empty() -> Self {
        Self {
            total_target: 0.0,
            total_current: 0.0,
            overall_completion: 0.0,
            expected_value: 0.0,
            pace_ratio: 1.0,
            pace: GoalStatus::OnTrack,
            consistent_weeks: 0,
            total_reviewed_weeks: 0,
            projected_completion: 0.0,
        }
    }
}

pub fn compute_cycle_analytics(
    goals: &[CycleGoal],
    weekly_targets: &[WeeklyTarget],
    current_week: u32,
    total_weeks: u32,
) -> CycleAnalytics {
    if goals.is_empty() {
        return CycleAnalytics::empty();
    }

    let total_target: f64 = goals.iter().map(|g| g.target_value).sum();
    let total_current: f64 = goals.iter().map(|g| g.current_value).sum();

    let overall_completion = if total_target > 0.0 {
        total_current / total_target * 100.0
    } else {
        0.0
    };

    let weeks_done = current_week.saturating_sub(1);
    let expected_value = if total_weeks > 0 {
        weeks_done as f64 / total_weeks as f64 * total_target
    } else {
        0.0
    };
    let pace_ratio = if expected_value > 0.0 {
        total_current / expected_value
    } else {
        1.0
    };

    let scores: HashMap<(GoalId, u32), Option<WeekScore>> = weekly_targets
        .iter()
        .map(|t| ((t.goal_id, t.week_number), t.score))
        .collect();

    let mut consistent_weeks = 0;
    let mut total_reviewed_weeks = 0;
    for week in 1..=total_weeks {
        let week_scores: Option<Vec<WeekScore>> = goals
            .iter()
            .map(|g| scores.get(&(g.id, week)).copied().flatten())
            .collect();

        // Only weeks with every goal reviewed count toward either number.
        if let Some(week_scores) = week_scores {
            total_reviewed_weeks += 1;
            if week_scores.iter().all(WeekScore::is_solid) {
                consistent_weeks += 1;
            }
        }
    }

    let rate_per_week = total_current / weeks_done.max(1) as f64;
    let projected_completion = if total_target > 0.0 {
        (rate_per_week * total_weeks as f64 / total_target * 100.0).min(100.0)
    } else {
        0.0
    };

    CycleAnalytics {
        total_target,
        total_current,
        overall_completion,
        expected_value,
        pace_ratio,
        pace: GoalStatus::from_ratio(pace_ratio),
        consistent_weeks,
        total_reviewed_weeks,
        projected_completion,
    }
}
