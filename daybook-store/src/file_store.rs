//! CSV-directory repository.
//!
//! Layout of the data directory:
//!   tasks.csv  pillars.csv  completions.csv  daily_scores.csv
//!   outcomes.csv  outcome_logs.csv  cycle_goals.csv  weekly_targets.csv
//!   user_stats.json
//!
//! A missing file is an empty table. Writes rewrite the whole file.

use chrono_tz::Tz;
use daybook_core::{
    Completion, DailyScore, GoalId, Outcome, OutcomeLog, Pillar, Task, UserStats, WeeklyTarget,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::Repository;
use crate::rows::{
    CompletionRow, CycleGoalRecord, CycleGoalRow, DailyScoreRow, OutcomeLogRow, OutcomeRow,
    PillarRow, TaskRow, WeeklyTargetRow,
};

pub const TASKS: &str = "tasks.csv";
pub const PILLARS: &str = "pillars.csv";
pub const COMPLETIONS: &str = "completions.csv";
pub const DAILY_SCORES: &str = "daily_scores.csv";
pub const OUTCOMES: &str = "outcomes.csv";
pub const OUTCOME_LOGS: &str = "outcome_logs.csv";
pub const CYCLE_GOALS: &str = "cycle_goals.csv";
pub const WEEKLY_TARGETS: &str = "weekly_targets.csv";
pub const USER_STATS: &str = "user_stats.json";

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    /// Used to read local log timestamps.
    tz: Tz,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, tz: Tz) -> Self {
        Self { dir: dir.into(), tz }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_table<R: DeserializeOwned>(&self, file: &str) -> StoreResult<Vec<R>> {
        let path = self.path(file);
        if !path.exists() {
            debug!(table = file, "missing table, reading as empty");
            return Ok(Vec::new());
        }

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|source| StoreError::Csv { path: path.clone(), source })?;

        let rows = rdr
            .deserialize()
            .collect::<Result<Vec<R>, _>>()
            .map_err(|source| StoreError::Csv { path: path.clone(), source })?;

        debug!(table = file, rows = rows.len(), "loaded table");
        Ok(rows)
    }

    fn write_table<R: Serialize>(&self, file: &str, rows: &[R]) -> StoreResult<()> {
        self.ensure_dir()?;
        let path = self.path(file);

        let mut wtr = csv::Writer::from_path(&path)
            .map_err(|source| StoreError::Csv { path: path.clone(), source })?;
        for row in rows {
            wtr.serialize(row)
                .map_err(|source| StoreError::Csv { path: path.clone(), source })?;
        }
        wtr.flush().map_err(|source| StoreError::Io { path: path.clone(), source })?;

        debug!(table = file, rows = rows.len(), "wrote table");
        Ok(())
    }

    fn ensure_dir(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    /// Write an empty file with headers for every table that doesn't exist yet.
    pub fn init_tables(&self) -> StoreResult<Vec<PathBuf>> {
        self.ensure_dir()?;
        let headers: [(&str, &str); 8] = [
            (TASKS, "id,title,pillar_id,completion_type,target,importance,base_points,flexibility_rule,limit_value,frequency,custom_days,is_weekend_task"),
            (PILLARS, "id,name,weight"),
            (COMPLETIONS, "task_id,date,completed,value"),
            (DAILY_SCORES, "date,action_score,pillar_scores,is_passing,xp_earned"),
            (OUTCOMES, "id,title,start_value,target_value,current_value,direction,metric_type,goal_type,start_date,end_date"),
            (OUTCOME_LOGS, "outcome_id,logged_at,duration,count"),
            (CYCLE_GOALS, "id,title,target_value,start_date,end_date"),
            (WEEKLY_TARGETS, "goal_id,week_number,target_value,actual_value,is_overridden,score"),
        ];

        let mut created = Vec::new();
        for (file, header) in headers {
            let path = self.path(file);
            if path.exists() {
                continue;
            }
            fs::write(&path, format!("{header}\n"))
                .map_err(|source| StoreError::Io { path: path.clone(), source })?;
            created.push(path);
        }
        Ok(created)
    }
}

impl Repository for FileStore {
    fn tasks(&self) -> StoreResult<Vec<Task>> {
        self.read_table::<TaskRow>(TASKS)?
            .into_iter()
            .map(TaskRow::into_task)
            .collect()
    }

    fn pillars(&self) -> StoreResult<Vec<Pillar>> {
        Ok(self
            .read_table::<PillarRow>(PILLARS)?
            .into_iter()
            .map(Pillar::from)
            .collect())
    }

    fn all_completions(&self) -> StoreResult<Vec<Completion>> {
        Ok(self
            .read_table::<CompletionRow>(COMPLETIONS)?
            .into_iter()
            .map(Completion::from)
            .collect())
    }

    fn all_daily_scores(&self) -> StoreResult<Vec<DailyScore>> {
        self.read_table::<DailyScoreRow>(DAILY_SCORES)?
            .into_iter()
            .map(DailyScoreRow::into_score)
            .collect()
    }

    fn outcomes(&self) -> StoreResult<Vec<Outcome>> {
        Ok(self
            .read_table::<OutcomeRow>(OUTCOMES)?
            .into_iter()
            .map(Outcome::from)
            .collect())
    }

    fn outcome_logs(&self) -> StoreResult<Vec<OutcomeLog>> {
        self.read_table::<OutcomeLogRow>(OUTCOME_LOGS)?
            .into_iter()
            .map(|row| row.into_log(self.tz))
            .collect()
    }

    fn cycle_goals(&self) -> StoreResult<Vec<CycleGoalRecord>> {
        Ok(self
            .read_table::<CycleGoalRow>(CYCLE_GOALS)?
            .into_iter()
            .map(CycleGoalRecord::from)
            .collect())
    }

    fn weekly_targets(&self) -> StoreResult<Vec<WeeklyTarget>> {
        Ok(self
            .read_table::<WeeklyTargetRow>(WEEKLY_TARGETS)?
            .into_iter()
            .map(WeeklyTarget::from)
            .collect())
    }

    fn user_stats(&self) -> StoreResult<Option<UserStats>> {
        let path = self.path(USER_STATS);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|source| StoreError::Io { path, source })?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save_daily_score(&mut self, score: &DailyScore) -> StoreResult<()> {
        let mut rows: Vec<DailyScoreRow> = self
            .read_table::<DailyScoreRow>(DAILY_SCORES)?
            .into_iter()
            .filter(|r| r.date != score.date)
            .collect();
        rows.push(DailyScoreRow::from_score(score)?);
        rows.sort_by_key(|r| r.date);
        self.write_table(DAILY_SCORES, &rows)
    }

    fn save_outcome_value(&mut self, id: GoalId, current_value: f64) -> StoreResult<()> {
        let mut rows = self.read_table::<OutcomeRow>(OUTCOMES)?;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id.0)
            .ok_or(StoreError::UnknownGoal(id))?;
        row.current_value = Some(current_value);
        self.write_table(OUTCOMES, &rows)
    }

    fn save_weekly_targets(&mut self, goal: GoalId, targets: &[WeeklyTarget]) -> StoreResult<()> {
        let mut rows: Vec<WeeklyTargetRow> = self
            .read_table::<WeeklyTargetRow>(WEEKLY_TARGETS)?
            .into_iter()
            .filter(|r| r.goal_id != goal.0)
            .collect();
        rows.extend(targets.iter().map(WeeklyTargetRow::from));
        rows.sort_by_key(|r| (r.goal_id, r.week_number));
        self.write_table(WEEKLY_TARGETS, &rows)
    }

    fn save_user_stats(&mut self, stats: &UserStats) -> StoreResult<()> {
        self.ensure_dir()?;
        let path = self.path(USER_STATS);
        let text = serde_json::to_string_pretty(stats)?;
        fs::write(&path, text).map_err(|source| StoreError::Io { path, source })?;
        debug!(total_xp = stats.total_xp, level = stats.level, "wrote user stats");
        Ok(())
    }
}
