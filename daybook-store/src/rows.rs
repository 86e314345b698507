//! CSV row shapes, one per table, and their conversions to and from core records.
//!
//! Rows keep lenient text where storage is lenient (importance, flexibility rule) and
//! let serde reject everything else. JSON-encoded columns go through `parsers`.

use chrono::NaiveDate;
use chrono_tz::Tz;
use daybook_core::{
    Completion, CompletionType, Cycle, DailyScore, Direction, FlexibilityRule, Frequency,
    GoalId, GoalType, Importance, MetricType, Outcome, OutcomeLog, Pillar, PillarId, Task,
    TaskId, WeekScore, WeeklyTarget, calculate_end_date,
};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::parsers::duration::parse_duration_minutes;
use crate::parsers::side_channel::{
    decode_custom_days, decode_pillar_scores, encode_custom_days, encode_pillar_scores,
    parse_logged_at,
};

/// Text form of a snake_case serde enum for a `tasks.csv` cell.
fn enum_text<T: Serialize>(value: &T, field: &'static str) -> StoreResult<String> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(StoreError::decode(
            "tasks",
            field,
            format!("expected a unit variant, got {other}"),
        )),
    }
}

// tasks.csv

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: i64,
    pub title: String,
    pub pillar_id: Option<i64>,
    pub completion_type: CompletionType,
    pub target: Option<f64>,
    pub importance: String,
    pub base_points: f64,
    pub flexibility_rule: String,
    pub limit_value: Option<f64>,
    pub frequency: Frequency,
    pub custom_days: String,
    pub is_weekend_task: bool,
}

impl TaskRow {
    pub fn into_task(self) -> StoreResult<Task> {
        Ok(Task {
            id: TaskId(self.id),
            title: self.title,
            pillar_id: self.pillar_id.map(PillarId),
            completion_type: self.completion_type,
            target: self.target,
            importance: Importance::parse_lossy(&self.importance),
            base_points: self.base_points,
            flexibility_rule: FlexibilityRule::parse_lossy(&self.flexibility_rule),
            limit_value: self.limit_value,
            frequency: self.frequency,
            custom_days: decode_custom_days(&self.custom_days)?,
            is_weekend_task: self.is_weekend_task,
        })
    }

    pub fn from_task(task: &Task) -> StoreResult<Self> {
        Ok(Self {
            id: task.id.0,
            title: task.title.clone(),
            pillar_id: task.pillar_id.map(|p| p.0),
            completion_type: task.completion_type,
            target: task.target,
            importance: enum_text(&task.importance, "importance")?,
            base_points: task.base_points,
            flexibility_rule: enum_text(&task.flexibility_rule, "flexibility_rule")?,
            limit_value: task.limit_value,
            frequency: task.frequency,
            custom_days: encode_custom_days(&task.custom_days)?,
            is_weekend_task: task.is_weekend_task,
        })
    }
}

// pillars.csv

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarRow {
    pub id: i64,
    pub name: String,
    /// Blank means the default weight.
    pub weight: Option<f64>,
}

impl From<PillarRow> for Pillar {
    fn from(row: PillarRow) -> Self {
        Pillar::new(
            row.id,
            row.name,
            row.weight.unwrap_or(daybook_core::scoring::DEFAULT_PILLAR_WEIGHT),
        )
    }
}

impl From<&Pillar> for PillarRow {
    fn from(p: &Pillar) -> Self {
        Self {
            id: p.id.0,
            name: p.name.clone(),
            weight: Some(p.weight),
        }
    }
}

// completions.csv

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRow {
    pub task_id: i64,
    pub date: NaiveDate,
    pub completed: bool,
    pub value: Option<f64>,
}

impl From<CompletionRow> for Completion {
    fn from(row: CompletionRow) -> Self {
        Completion {
            task_id: TaskId(row.task_id),
            date: row.date,
            completed: row.completed,
            value: row.value,
        }
    }
}

impl From<&Completion> for CompletionRow {
    fn from(c: &Completion) -> Self {
        Self {
            task_id: c.task_id.0,
            date: c.date,
            completed: c.completed,
            value: c.value,
        }
    }
}

// daily_scores.csv

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyScoreRow {
    pub date: NaiveDate,
    pub action_score: i32,
    pub pillar_scores: String,
    pub is_passing: bool,
    pub xp_earned: i64,
}

impl DailyScoreRow {
    pub fn into_score(self) -> StoreResult<DailyScore> {
        Ok(DailyScore {
            date: self.date,
            action_score: self.action_score,
            pillar_scores: decode_pillar_scores(&self.pillar_scores)?,
            is_passing: self.is_passing,
            xp_earned: self.xp_earned,
        })
    }

    pub fn from_score(score: &DailyScore) -> StoreResult<Self> {
        Ok(Self {
            date: score.date,
            action_score: score.action_score,
            pillar_scores: encode_pillar_scores(&score.pillar_scores)?,
            is_passing: score.is_passing,
            xp_earned: score.xp_earned,
        })
    }
}

// outcomes.csv

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRow {
    pub id: i64,
    pub title: String,
    pub start_value: Option<f64>,
    pub target_value: f64,
    pub current_value: Option<f64>,
    /// Blank derives it from the goal type.
    pub direction: Option<Direction>,
    pub metric_type: MetricType,
    pub goal_type: GoalType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<OutcomeRow> for Outcome {
    fn from(row: OutcomeRow) -> Self {
        let mut outcome = Outcome::new(
            row.id,
            row.title,
            row.target_value,
            row.metric_type,
            row.goal_type,
            row.start_date,
            row.end_date,
        );
        outcome.start_value = row.start_value.unwrap_or(0.0);
        outcome.current_value = row.current_value.unwrap_or(0.0);
        if let Some(direction) = row.direction {
            outcome.direction = direction;
        }
        outcome
    }
}

impl From<&Outcome> for OutcomeRow {
    fn from(o: &Outcome) -> Self {
        Self {
            id: o.id.0,
            title: o.title.clone(),
            start_value: Some(o.start_value),
            target_value: o.target_value,
            current_value: Some(o.current_value),
            direction: Some(o.direction),
            metric_type: o.metric_type,
            goal_type: o.goal_type,
            start_date: o.start_date,
            end_date: o.end_date,
        }
    }
}

// outcome_logs.csv

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeLogRow {
    pub outcome_id: i64,
    pub logged_at: String,
    /// Free-form duration text ("90", "1h30m").
    pub duration: String,
    pub count: Option<f64>,
}

impl OutcomeLogRow {
    pub fn into_log(self, tz: Tz) -> StoreResult<OutcomeLog> {
        Ok(OutcomeLog {
            outcome_id: GoalId(self.outcome_id),
            logged_at: parse_logged_at(&self.logged_at, tz)?,
            minutes: parse_duration_minutes(&self.duration)?,
            count: self.count,
        })
    }
}

impl From<&OutcomeLog> for OutcomeLogRow {
    fn from(log: &OutcomeLog) -> Self {
        Self {
            outcome_id: log.outcome_id.0,
            logged_at: log.logged_at.to_rfc3339(),
            duration: log.minutes.map(|m| m.to_string()).unwrap_or_default(),
            count: log.count,
        }
    }
}

// cycle_goals.csv

/// A goal inside a twelve-week cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleGoalRecord {
    pub id: GoalId,
    pub title: String,
    /// Whole-cycle target.
    pub target_value: f64,
    pub cycle: Cycle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleGoalRow {
    pub id: i64,
    pub title: String,
    pub target_value: f64,
    pub start_date: NaiveDate,
    /// Blank means a standard twelve-week cycle.
    pub end_date: Option<NaiveDate>,
}

impl From<CycleGoalRow> for CycleGoalRecord {
    fn from(row: CycleGoalRow) -> Self {
        Self {
            id: GoalId(row.id),
            title: row.title,
            target_value: row.target_value,
            cycle: Cycle {
                start_date: row.start_date,
                end_date: row.end_date.unwrap_or_else(|| calculate_end_date(row.start_date)),
            },
        }
    }
}

impl From<&CycleGoalRecord> for CycleGoalRow {
    fn from(g: &CycleGoalRecord) -> Self {
        Self {
            id: g.id.0,
            title: g.title.clone(),
            target_value: g.target_value,
            start_date: g.cycle.start_date,
            end_date: Some(g.cycle.end_date),
        }
    }
}

// weekly_targets.csv

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTargetRow {
    pub goal_id: i64,
    pub week_number: u32,
    pub target_value: f64,
    pub actual_value: Option<f64>,
    pub is_overridden: bool,
    /// Blank until the week is reviewed.
    pub score: Option<WeekScore>,
}

impl From<WeeklyTargetRow> for WeeklyTarget {
    fn from(row: WeeklyTargetRow) -> Self {
        WeeklyTarget {
            goal_id: GoalId(row.goal_id),
            week_number: row.week_number,
            target_value: row.target_value,
            actual_value: row.actual_value.unwrap_or(0.0),
            is_overridden: row.is_overridden,
            score: row.score,
        }
    }
}

impl From<&WeeklyTarget> for WeeklyTargetRow {
    fn from(t: &WeeklyTarget) -> Self {
        Self {
            goal_id: t.goal_id.0,
            week_number: t.week_number,
            target_value: t.target_value,
            actual_value: t.score.map(|_| t.actual_value),
            is_overridden: t.is_overridden,
            score: t.score,
        }
    }
}
