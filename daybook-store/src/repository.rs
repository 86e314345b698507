//! The storage seam: everything the workflows read and write.
//!
//! A repository is constructed by the caller and passed in. Range reads are provided on
//! top of the whole-table reads so small backends only implement the latter.

use chrono::NaiveDate;
use daybook_core::{
    Completion, DailyScore, GoalId, Outcome, OutcomeLog, Pillar, Task, UserStats, WeeklyTarget,
};

use crate::error::StoreResult;
use crate::rows::CycleGoalRecord;

pub trait Repository {
    fn tasks(&self) -> StoreResult<Vec<Task>>;
    fn pillars(&self) -> StoreResult<Vec<Pillar>>;
    fn all_completions(&self) -> StoreResult<Vec<Completion>>;
    fn all_daily_scores(&self) -> StoreResult<Vec<DailyScore>>;
    fn outcomes(&self) -> StoreResult<Vec<Outcome>>;
    fn outcome_logs(&self) -> StoreResult<Vec<OutcomeLog>>;
    fn cycle_goals(&self) -> StoreResult<Vec<CycleGoalRecord>>;
    fn weekly_targets(&self) -> StoreResult<Vec<WeeklyTarget>>;
    /// `None` until stats have been saved once.
    fn user_stats(&self) -> StoreResult<Option<UserStats>>;

    /// Insert, or replace the row for the same date.
    fn save_daily_score(&mut self, score: &DailyScore) -> StoreResult<()>;
    fn save_outcome_value(&mut self, id: GoalId, current_value: f64) -> StoreResult<()>;
    /// Replace every weekly target row for `goal`.
    fn save_weekly_targets(&mut self, goal: GoalId, rows: &[WeeklyTarget]) -> StoreResult<()>;
    fn save_user_stats(&mut self, stats: &UserStats) -> StoreResult<()>;

    /// Completions dated in `[start, end]`.
    fn completions(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<Vec<Completion>> {
        Ok(self
            .all_completions()?
            .into_iter()
            .filter(|c| c.date >= start && c.date <= end)
            .collect())
    }

    /// Daily scores dated in `[start, end]`.
    fn daily_scores(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<Vec<DailyScore>> {
        Ok(self
            .all_daily_scores()?
            .into_iter()
            .filter(|s| s.date >= start && s.date <= end)
            .collect())
    }

    fn weekly_targets_for(&self, goal: GoalId) -> StoreResult<Vec<WeeklyTarget>> {
        let mut rows: Vec<WeeklyTarget> = self
            .weekly_targets()?
            .into_iter()
            .filter(|t| t.goal_id == goal)
            .collect();
        rows.sort_by_key(|t| t.week_number);
        Ok(rows)
    }

    fn cycle_goal(&self, goal: GoalId) -> StoreResult<Option<CycleGoalRecord>> {
        Ok(self.cycle_goals()?.into_iter().find(|g| g.id == goal))
    }
}
