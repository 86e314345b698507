//! In-memory repository. Useful for tests and for scoring rows that never touch disk.

use daybook_core::{
    Completion, DailyScore, GoalId, Outcome, OutcomeLog, Pillar, Task, UserStats, WeeklyTarget,
};

use crate::error::{StoreError, StoreResult};
use crate::repository::Repository;
use crate::rows::CycleGoalRecord;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub tasks: Vec<Task>,
    pub pillars: Vec<Pillar>,
    pub completions: Vec<Completion>,
    pub daily_scores: Vec<DailyScore>,
    pub outcomes: Vec<Outcome>,
    pub outcome_logs: Vec<OutcomeLog>,
    pub cycle_goals: Vec<CycleGoalRecord>,
    pub weekly_targets: Vec<WeeklyTarget>,
    pub user_stats: Option<UserStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_pillars(mut self, pillars: Vec<Pillar>) -> Self {
        self.pillars = pillars;
        self
    }

    pub fn with_completions(mut self, completions: Vec<Completion>) -> Self {
        self.completions = completions;
        self
    }

    pub fn with_cycle_goal(mut self, goal: CycleGoalRecord) -> Self {
        self.cycle_goals.push(goal);
        self
    }
}

impl Repository for MemoryStore {
    fn tasks(&self) -> StoreResult<Vec<Task>> {
        Ok(self.tasks.clone())
    }

    fn pillars(&self) -> StoreResult<Vec<Pillar>> {
        Ok(self.pillars.clone())
    }

    fn all_completions(&self) -> StoreResult<Vec<Completion>> {
        Ok(self.completions.clone())
    }

    fn all_daily_scores(&self) -> StoreResult<Vec<DailyScore>> {
        Ok(self.daily_scores.clone())
    }

    fn outcomes(&self) -> StoreResult<Vec<Outcome>> {
        Ok(self.outcomes.clone())
    }

    fn outcome_logs(&self) -> StoreResult<Vec<OutcomeLog>> {
        Ok(self.outcome_logs.clone())
    }

    fn cycle_goals(&self) -> StoreResult<Vec<CycleGoalRecord>> {
        Ok(self.cycle_goals.clone())
    }

    fn weekly_targets(&self) -> StoreResult<Vec<WeeklyTarget>> {
        Ok(self.weekly_targets.clone())
    }

    fn user_stats(&self) -> StoreResult<Option<UserStats>> {
        Ok(self.user_stats.clone())
    }

    fn save_daily_score(&mut self, score: &DailyScore) -> StoreResult<()> {
        self.daily_scores.retain(|s| s.date != score.date);
        self.daily_scores.push(score.clone());
        self.daily_scores.sort_by_key(|s| s.date);
        Ok(())
    }

    fn save_outcome_value(&mut self, id: GoalId, current_value: f64) -> StoreResult<()> {
        let outcome = self
            .outcomes
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::UnknownGoal(id))?;
        outcome.current_value = current_value;
        Ok(())
    }

    fn save_weekly_targets(&mut self, goal: GoalId, rows: &[WeeklyTarget]) -> StoreResult<()> {
        self.weekly_targets.retain(|t| t.goal_id != goal);
        self.weekly_targets.extend_from_slice(rows);
        Ok(())
    }

    fn save_user_stats(&mut self, stats: &UserStats) -> StoreResult<()> {
        self.user_stats = Some(stats.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_core::time::parse_calendar_date;
    use std::collections::BTreeMap;

    fn score(date: &str, action_score: i32) -> DailyScore {
        DailyScore {
            date: parse_calendar_date(date).unwrap(),
            action_score,
            pillar_scores: BTreeMap::new(),
            is_passing: action_score >= 70,
            xp_earned: action_score as i64,
        }
    }

    #[test]
    fn test_save_daily_score_upserts_by_date() {
        let mut store = MemoryStore::new();
        store.save_daily_score(&score("2026-03-02", 50)).unwrap();
        store.save_daily_score(&score("2026-03-01", 80)).unwrap();
        store.save_daily_score(&score("2026-03-02", 90)).unwrap();

        let all = store.all_daily_scores().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].action_score, 90);

        let from = parse_calendar_date("2026-03-02").unwrap();
        let to = parse_calendar_date("2026-03-31").unwrap();
        let one = store.daily_scores(from, to).unwrap();
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn test_save_outcome_value_unknown_goal() {
        let mut store = MemoryStore::new();
        let err = store.save_outcome_value(GoalId(9), 1.0).unwrap_err();
        assert!(matches!(err, StoreError::UnknownGoal(GoalId(9))));
    }
}
