//! Twelve-week-year cycle: weekly targets, week scoring and deficit redistribution.
//!
//! Per (goal, week) a target row moves through: generated -> reviewed (actual submitted,
//! score assigned) -> optionally overridden (pinned, exempt from redistribution). Missed
//! progress from reviewed past weeks is spread over the unreviewed weeks still ahead.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::goals::GoalId;
use crate::time::days_between;

/// A cycle is 12 weeks = 84 days, counting the start day.
pub const CYCLE_DAYS: i64 = 84;

/// Ratio bands shared by week scores, goal status and pace.
pub const AHEAD_RATIO: f64 = 1.10;
pub const ON_TRACK_RATIO: f64 = 0.85;
pub const PARTIAL_RATIO: f64 = 0.50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekScore {
    Exceeded,
    Good,
    Partial,
    Missed,
}

impl WeekScore {
    /// Good or better.
    pub fn is_solid(&self) -> bool {
        matches!(self, WeekScore::Exceeded | WeekScore::Good)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeekScore::Exceeded => "exceeded",
            WeekScore::Good => "good",
            WeekScore::Partial => "partial",
            WeekScore::Missed => "missed",
        }
    }
}

impl fmt::Display for WeekScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WeekScore {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim() {
            "exceeded" => Ok(WeekScore::Exceeded),
            "good" => Ok(WeekScore::Good),
            "partial" => Ok(WeekScore::Partial),
            "missed" => Ok(WeekScore::Missed),
            other => Err(anyhow::anyhow!("unknown week score: {other}")),
        }
    }
}

pub fn get_week_score(actual: f64, target: f64) -> WeekScore {
    if target <= 0.0 {
        return if actual > 0.0 { WeekScore::Exceeded } else { WeekScore::Missed };
    }

    let ratio = actual / target;
    if ratio >= AHEAD_RATIO {
        WeekScore::Exceeded
    } else if ratio >= ON_TRACK_RATIO {
        WeekScore::Good
    } else if ratio >= PARTIAL_RATIO {
        WeekScore::Partial
    } else {
        WeekScore::Missed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTarget {
    pub goal_id: GoalId,
    /// 1-indexed.
    pub week_number: u32,
    pub target_value: f64,
    pub actual_value: f64,
    pub is_overridden: bool,
    pub score: Option<WeekScore>,
}

impl WeeklyTarget {
    pub fn is_reviewed(&self) -> bool {
        self.score.is_some()
    }

    /// Still ahead as of `current_week`, unpinned and unreviewed.
    pub fn is_open(&self, current_week: u32) -> bool {
        self.week_number >= current_week && !self.is_overridden && !self.is_reviewed()
    }

    /// Positive shortfall, 0 when the week met its target.
    pub fn shortfall(&self) -> f64 {
        (self.target_value - self.actual_value).max(0.0)
    }
}

/// Evenly split a goal's cycle target across its weeks.
pub fn generate_weekly_targets(
    goal_id: GoalId,
    target_value: f64,
    total_weeks: u32,
) -> Vec<WeeklyTarget> {
    let per_week = if total_weeks > 0 {
        target_value / total_weeks as f64
    } else {
        0.0
    };

    (1..=total_weeks)
        .map(|week_number| WeeklyTarget {
            goal_id,
            week_number,
            target_value: per_week,
            actual_value: 0.0,
            is_overridden: false,
            score: None,
        })
        .collect()
}

/// Submit a week's actual and score it against the row's target.
pub fn review_week(target: &WeeklyTarget, actual: f64) -> WeeklyTarget {
    WeeklyTarget {
        actual_value: actual,
        score: Some(get_week_score(actual, target.target_value)),
        ..target.clone()
    }
}

/// Pin a week's target so redistribution leaves it alone.
pub fn override_target(target: &WeeklyTarget, value: f64) -> WeeklyTarget {
    WeeklyTarget {
        target_value: value,
        is_overridden: true,
        ..target.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAdjustment {
    pub week_number: u32,
    pub target_value: f64,
}

/// Spread one goal's missed progress over the weeks still ahead.
///
/// Deficit is the summed shortfall of reviewed weeks before `current_week`. It goes in
/// equal parts to weeks at or after `current_week` that are neither overridden nor
/// reviewed. Returns only the rows that changed. When no week can absorb it the deficit
/// is dropped (logged, not returned).
pub fn redistribute_targets(targets: &[WeeklyTarget], current_week: u32) -> Vec<TargetAdjustment> {
    let deficit: f64 = targets
        .iter()
        .filter(|t| t.week_number < current_week && t.is_reviewed())
        .map(WeeklyTarget::shortfall)
        .sum();

    if deficit <= 0.0 {
        return Vec::new();
    }

    let eligible: Vec<&WeeklyTarget> = targets.iter().filter(|t| t.is_open(current_week)).collect();

    if eligible.is_empty() {
        warn!(
            deficit,
            current_week,
            "no open weeks left to absorb missed progress; deficit dropped"
        );
        return Vec::new();
    }

    let share = deficit / eligible.len() as f64;
    eligible
        .into_iter()
        .map(|t| TargetAdjustment {
            week_number: t.week_number,
            target_value: t.target_value + share,
        })
        .collect()
}

/// Write adjustments back onto a goal's target rows.
pub fn apply_adjustments(targets: &mut [WeeklyTarget], adjustments: &[TargetAdjustment]) {
    for adj in adjustments {
        if let Some(t) = targets.iter_mut().find(|t| t.week_number == adj.week_number) {
            t.target_value = adj.target_value;
        }
    }
}

/// Recompute a goal's open weeks from the even split instead of their stored targets.
///
/// Unpinned rows are measured against `per_week`, pinned rows against their own value,
/// so the deficit is counted once no matter how often the goal is reviewed. Open weeks
/// get `per_week` plus an equal share of it. Returns only rows whose target changes.
pub fn rebalance_targets(
    targets: &[WeeklyTarget],
    per_week: f64,
    current_week: u32,
) -> Vec<TargetAdjustment> {
    let baseline: Vec<WeeklyTarget> = targets
        .iter()
        .map(|t| WeeklyTarget {
            target_value: if t.is_overridden { t.target_value } else { per_week },
            ..t.clone()
        })
        .collect();
    let raised = redistribute_targets(&baseline, current_week);

    targets
        .iter()
        .filter(|t| t.is_open(current_week))
        .filter_map(|t| {
            let target_value = raised
                .iter()
                .find(|a| a.week_number == t.week_number)
                .map_or(per_week, |a| a.target_value);
            (t.target_value != target_value).then_some(TargetAdjustment {
                week_number: t.week_number,
                target_value,
            })
        })
        .collect()
}

pub fn calculate_end_date(start_date: NaiveDate) -> NaiveDate {
    start_date + Duration::days(CYCLE_DAYS - 1)
}

/// Whole weeks covering `[start, end]` inclusive, at least 1.
pub fn get_total_weeks(start_date: NaiveDate, end_date: NaiveDate) -> u32 {
    let days = days_between(start_date, end_date) + 1;
    let weeks = (days + 6).div_euclid(7);
    weeks.max(1) as u32
}

/// 1-indexed week containing `today`, clamped into the cycle.
pub fn get_current_week_number(
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> u32 {
    let total = i64::from(get_total_weeks(start_date, end_date));
    let week = days_between(start_date, today).div_euclid(7) + 1;
    week.clamp(1, total) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Ahead,
    OnTrack,
    Behind,
}

impl GoalStatus {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= AHEAD_RATIO {
            GoalStatus::Ahead
        } else if ratio >= ON_TRACK_RATIO {
            GoalStatus::OnTrack
        } else {
            GoalStatus::Behind
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalStatus::Ahead => "Ahead",
            GoalStatus::OnTrack => "On Track",
            GoalStatus::Behind => "Behind",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compare progress to a straight line from 0 to `target` over the cycle.
pub fn get_goal_status(
    current: f64,
    target: f64,
    weeks_passed: u32,
    total_weeks: u32,
) -> GoalStatus {
    if target <= 0.0 || total_weeks == 0 {
        return GoalStatus::OnTrack;
    }

    let expected = weeks_passed as f64 / total_weeks as f64 * target;
    if expected <= 0.0 {
        return GoalStatus::OnTrack;
    }

    GoalStatus::from_ratio(current / expected)
}

/// Start/end pair with the derived week helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Cycle {
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date: calculate_end_date(start_date),
        }
    }

    pub fn total_weeks(&self) -> u32 {
        get_total_weeks(self.start_date, self.end_date)
    }

    pub fn current_week(&self, today: NaiveDate) -> u32 {
        get_current_week_number(self.start_date, self.end_date, today)
    }
}
