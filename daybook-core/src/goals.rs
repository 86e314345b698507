//! Outcome goals: long-running numeric targets tracked through logs.
//!
//! An outcome's current value is always recomputed from its logs, never incremented in
//! place. Achievement goals are reached by going over the target; limiting goals are
//! kept by staying under it until the window closes.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::{days_between, local_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(pub i64);

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Logged as minutes, tracked in hours.
    Time,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    /// Reach the target.
    Achievement,
    /// Stay at or under the target.
    Limiting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: GoalId,
    pub title: String,
    pub start_value: f64,
    pub target_value: f64,
    /// Last value the caller persisted. Informational; progress recomputes it.
    pub current_value: f64,
    pub direction: Direction,
    pub metric_type: MetricType,
    pub goal_type: GoalType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Outcome {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        target_value: f64,
        metric_type: MetricType,
        goal_type: GoalType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id: GoalId(id),
            title: title.into(),
            start_value: 0.0,
            target_value,
            current_value: 0.0,
            direction: match goal_type {
                GoalType::Achievement => Direction::Increase,
                GoalType::Limiting => Direction::Decrease,
            },
            metric_type,
            goal_type,
            start_date,
            end_date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// One logged contribution toward an outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeLog {
    pub outcome_id: GoalId,
    pub logged_at: DateTime<Utc>,
    pub minutes: Option<f64>,
    pub count: Option<f64>,
}

impl OutcomeLog {
    /// Contribution in the outcome's unit (hours for time, raw count otherwise).
    pub fn amount(&self, metric: MetricType) -> f64 {
        match metric {
            MetricType::Time => self.minutes.unwrap_or(0.0) / 60.0,
            MetricType::Count => self.count.unwrap_or(0.0),
        }
    }
}

/// Cumulative value from logs falling in the outcome window up to and including
/// `through` (user-local calendar dates).
pub fn value_as_of(outcome: &Outcome, logs: &[OutcomeLog], through: NaiveDate, tz: Tz) -> f64 {
    logs.iter()
        .filter(|l| l.outcome_id == outcome.id)
        .filter(|l| {
            let day = local_date(l.logged_at, tz);
            outcome.contains(day) && day <= through
        })
        .map(|l| l.amount(outcome.metric_type))
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProgress {
    pub outcome_id: GoalId,
    pub current_value: f64,
    pub percent_complete: f64,
    pub percent_elapsed: f64,
    pub days_remaining: i64,
    pub daily_target: f64,
    pub is_completed: bool,
    pub is_overdue: bool,
}

pub fn compute_progress(
    outcome: &Outcome,
    logs: &[OutcomeLog],
    today: NaiveDate,
    tz: Tz,
) -> OutcomeProgress {
    let current_value = value_as_of(outcome, logs, outcome.end_date, tz);
    let target = outcome.target_value;

    let percent_complete = if target > 0.0 {
        current_value / target * 100.0
    } else {
        0.0
    };

    let total_days = days_between(outcome.start_date, outcome.end_date);
    let elapsed_days = days_between(outcome.start_date, today);
    let percent_elapsed = if total_days > 0 {
        (elapsed_days as f64 / total_days as f64 * 100.0).clamp(0.0, 100.0)
    } else if elapsed_days >= 0 {
        100.0
    } else {
        0.0
    };

    // Whole days left before the deadline; 0 on the end date itself.
    let days_remaining = days_between(today, outcome.end_date).max(0);
    let has_ended = today > outcome.end_date;

    let remaining = target - current_value;
    let daily_target = if remaining > 0.0 && days_remaining > 0 {
        remaining / days_remaining as f64
    } else {
        0.0
    };

    let (is_completed, is_overdue) = match outcome.goal_type {
        GoalType::Achievement => {
            let reached = current_value >= target;
            (reached, has_ended && !reached)
        }
        GoalType::Limiting => {
            let over = current_value > target;
            (has_ended && !over, over)
        }
    };

    OutcomeProgress {
        outcome_id: outcome.id,
        current_value,
        percent_complete,
        percent_elapsed,
        days_remaining,
        daily_target,
        is_completed,
        is_overdue,
    }
}
