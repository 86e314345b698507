//! Task + completion model for daily scoring.
//!
//! Tasks are recurring behaviours with a scoring configuration; completions are what the
//! user actually logged for a task on a calendar date. Storage owns both; the scoring
//! engine only reads them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::pillar::PillarId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionType {
    Checkbox,
    Numeric,
    Percentage,
    Count,
    Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    High,
    Medium,
    Low,
    /// Anything storage hands us that we don't recognise. Scores like `Low`.
    #[serde(other)]
    Unknown,
}

impl Importance {
    pub fn multiplier(&self) -> f64 {
        match self {
            Importance::High => 3.0,
            Importance::Medium => 2.0,
            Importance::Low | Importance::Unknown => 1.0,
        }
    }

    /// Lenient parse used at the storage boundary.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Importance::High,
            "medium" => Importance::Medium,
            "low" => Importance::Low,
            _ => Importance::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexibilityRule {
    /// Has to happen on the scheduled day.
    MustToday,
    /// Can slide within its window.
    Flexible,
    /// Stay at or under `limit_value`; going over costs points.
    LimitAvoid,
    #[serde(other)]
    Other,
}

impl FlexibilityRule {
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "must_today" => FlexibilityRule::MustToday,
            "flexible" => FlexibilityRule::Flexible,
            "limit_avoid" => FlexibilityRule::LimitAvoid,
            _ => FlexibilityRule::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Custom,
}

/// A scheduled behaviour with its scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,

    /// `None` groups the task under the unassigned bucket.
    pub pillar_id: Option<PillarId>,

    pub completion_type: CompletionType,

    /// Goal amount for numeric-ish tasks. Linear progress is scored against it.
    pub target: Option<f64>,

    pub importance: Importance,
    pub base_points: f64,

    pub flexibility_rule: FlexibilityRule,

    /// Only meaningful for `LimitAvoid`.
    pub limit_value: Option<f64>,

    pub frequency: Frequency,

    /// Weekdays for `Frequency::Custom`, 0 = Sunday .. 6 = Saturday.
    pub custom_days: BTreeSet<u8>,

    pub is_weekend_task: bool,
}

impl Task {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id: TaskId(id),
            title: title.into(),
            pillar_id: None,
            completion_type: CompletionType::Checkbox,
            target: None,
            importance: Importance::Medium,
            base_points: 10.0,
            flexibility_rule: FlexibilityRule::Flexible,
            limit_value: None,
            frequency: Frequency::Daily,
            custom_days: BTreeSet::new(),
            is_weekend_task: false,
        }
    }

    pub fn with_pillar(mut self, pillar: i64) -> Self {
        self.pillar_id = Some(PillarId(pillar));
        self
    }

    pub fn with_type(mut self, completion_type: CompletionType) -> Self {
        self.completion_type = completion_type;
        self
    }

    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_points(mut self, base_points: f64) -> Self {
        self.base_points = base_points;
        self
    }

    pub fn with_limit(mut self, limit: f64) -> Self {
        self.flexibility_rule = FlexibilityRule::LimitAvoid;
        self.limit_value = Some(limit);
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_custom_days(mut self, days: impl IntoIterator<Item = u8>) -> Self {
        self.frequency = Frequency::Custom;
        self.custom_days = days.into_iter().collect();
        self
    }

    pub fn weekend_only(mut self) -> Self {
        self.is_weekend_task = true;
        self
    }

    /// Points this task is worth when fully done: `base_points × importance multiplier`.
    pub fn full_points(&self) -> f64 {
        self.base_points * self.importance.multiplier()
    }
}

/// What the user logged for one task on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub task_id: TaskId,
    pub date: NaiveDate,
    pub completed: bool,
    pub value: Option<f64>,
}

impl Completion {
    pub fn checked(task_id: i64, date: NaiveDate) -> Self {
        Self {
            task_id: TaskId(task_id),
            date,
            completed: true,
            value: None,
        }
    }

    pub fn unchecked(task_id: i64, date: NaiveDate) -> Self {
        Self {
            task_id: TaskId(task_id),
            date,
            completed: false,
            value: None,
        }
    }

    pub fn valued(task_id: i64, date: NaiveDate, value: f64) -> Self {
        Self {
            task_id: TaskId(task_id),
            date,
            completed: value > 0.0,
            value: Some(value),
        }
    }
}
