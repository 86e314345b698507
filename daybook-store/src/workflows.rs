//! Load rows, run the engine, write derived rows back.
//!
//! Each workflow is one request's worth of work against an explicitly passed repository.
//! Derived values (daily scores, stats, outcome current values, redistributed targets)
//! are always recomputed from base rows before they are persisted.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use daybook_core::{
    Cycle, CycleAnalytics, CycleGoal, DailyBreakdown, DailyScore, GoalId, GoalStatus, Outcome,
    OutcomeProgress, ReportInput, ReportResult, ReportType, ScoringPolicy, TargetAdjustment,
    UserStats, WeeklyTarget, apply_adjustments, calculate_daily_score, compute_cycle_analytics,
    compute_progress, compute_report, generate_weekly_targets, get_goal_status, override_target,
    rebalance_targets, rebuild_stats, restate_xp, tasks_for_day,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreError;
use crate::repository::Repository;
use crate::rows::CycleGoalRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDay {
    pub score: DailyScore,
    pub breakdown: DailyBreakdown,
    pub stats: UserStats,
}

/// Score `date` from its completions, upsert the daily record and refresh user stats.
/// Later days whose streak bonus changed because of this day are rewritten too.
pub fn score_day<R: Repository>(
    repo: &mut R,
    date: NaiveDate,
    policy: &ScoringPolicy,
) -> Result<ScoredDay> {
    let tasks = repo.tasks().context("loading tasks")?;
    let pillars = repo.pillars().context("loading pillars")?;
    let completions = repo
        .completions(date, date)
        .with_context(|| format!("loading completions for {date}"))?;
    let history = repo.all_daily_scores().context("loading daily scores")?;

    let scheduled = tasks_for_day(&tasks, date);
    let breakdown = calculate_daily_score(&completions, &scheduled, &pillars);
    let score = daybook_core::score_day(date, breakdown.clone(), &history, policy);

    repo.save_daily_score(&score)
        .with_context(|| format!("saving daily score for {date}"))?;
    info!(
        %date,
        action_score = score.action_score,
        passing = score.is_passing,
        xp = score.xp_earned,
        "saved daily score"
    );

    let stored = repo.all_daily_scores().context("reloading daily scores")?;
    for stale in restate_xp(&stored) {
        repo.save_daily_score(&stale)
            .with_context(|| format!("restating XP for {}", stale.date))?;
        info!(date = %stale.date, xp = stale.xp_earned, "restated daily XP");
    }

    let stats = rebuild_user_stats(repo, date)?;
    Ok(ScoredDay {
        score,
        breakdown,
        stats,
    })
}

/// Replay every stored daily score into fresh stats and persist them.
pub fn rebuild_user_stats<R: Repository>(repo: &mut R, as_of: NaiveDate) -> Result<UserStats> {
    let scores = repo.all_daily_scores().context("loading daily scores")?;
    let stats = rebuild_stats(&scores, as_of);
    repo.save_user_stats(&stats).context("saving user stats")?;
    info!(
        total_xp = stats.total_xp,
        level = stats.level,
        streak = stats.current_streak,
        "rebuilt user stats"
    );
    Ok(stats)
}

/// Stored stats, or the starting stats when nothing has been scored.
pub fn load_user_stats<R: Repository>(repo: &R) -> Result<UserStats> {
    Ok(repo
        .user_stats()
        .context("loading user stats")?
        .unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeStatus {
    pub outcome: Outcome,
    pub progress: OutcomeProgress,
}

/// Progress for every outcome as of `today`; each recomputed current value is written back.
pub fn outcome_progress<R: Repository>(
    repo: &mut R,
    today: NaiveDate,
    tz: Tz,
) -> Result<Vec<OutcomeStatus>> {
    let outcomes = repo.outcomes().context("loading outcomes")?;
    let logs = repo.outcome_logs().context("loading outcome logs")?;

    let mut out = Vec::with_capacity(outcomes.len());
    for mut outcome in outcomes {
        let progress = compute_progress(&outcome, &logs, today, tz);
        if progress.current_value != outcome.current_value {
            repo.save_outcome_value(outcome.id, progress.current_value)
                .with_context(|| format!("saving current value for outcome {}", outcome.id))?;
            info!(outcome = %outcome.id, value = progress.current_value, "updated outcome value");
            outcome.current_value = progress.current_value;
        }
        out.push(OutcomeStatus { outcome, progress });
    }
    Ok(out)
}

/// A goal's weekly rows, generated on first use.
fn weekly_rows<R: Repository>(repo: &R, goal: &CycleGoalRecord) -> Result<Vec<WeeklyTarget>> {
    let rows = repo
        .weekly_targets_for(goal.id)
        .with_context(|| format!("loading weekly targets for goal {}", goal.id))?;
    if rows.is_empty() {
        return Ok(generate_weekly_targets(goal.id, goal.target_value, goal.cycle.total_weeks()));
    }
    Ok(rows)
}

fn find_goal<R: Repository>(repo: &R, goal: GoalId) -> Result<CycleGoalRecord> {
    Ok(repo
        .cycle_goal(goal)
        .context("loading cycle goals")?
        .ok_or(StoreError::UnknownGoal(goal))?)
}

fn week_index(rows: &[WeeklyTarget], goal: GoalId, week: u32) -> Result<usize> {
    Ok(rows
        .iter()
        .position(|t| t.week_number == week)
        .ok_or(StoreError::UnknownWeek { goal, week })?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekReview {
    pub reviewed: WeeklyTarget,
    pub current_week: u32,
    pub adjustments: Vec<TargetAdjustment>,
}

/// Submit a week's actual, then re-spread the goal's total shortfall over the weeks still
/// open as of `today`. Open weeks are recomputed from the even split every time, so
/// repeating a review leaves them where they were.
pub fn review_week<R: Repository>(
    repo: &mut R,
    goal: GoalId,
    week: u32,
    actual: f64,
    today: NaiveDate,
) -> Result<WeekReview> {
    let record = find_goal(repo, goal)?;
    let mut rows = weekly_rows(repo, &record)?;
    let idx = week_index(&rows, goal, week)?;

    rows[idx] = daybook_core::review_week(&rows[idx], actual);
    let reviewed = rows[idx].clone();

    let current_week = record.cycle.current_week(today);
    let per_week = record.target_value / f64::from(record.cycle.total_weeks());
    let adjustments = rebalance_targets(&rows, per_week, current_week);
    apply_adjustments(&mut rows, &adjustments);

    repo.save_weekly_targets(goal, &rows)
        .with_context(|| format!("saving weekly targets for goal {goal}"))?;
    info!(
        %goal,
        week,
        score = ?reviewed.score,
        adjusted = adjustments.len(),
        "reviewed week"
    );

    Ok(WeekReview {
        reviewed,
        current_week,
        adjustments,
    })
}

/// Pin a week's target; pinned weeks are skipped by redistribution.
pub fn override_week<R: Repository>(
    repo: &mut R,
    goal: GoalId,
    week: u32,
    value: f64,
) -> Result<WeeklyTarget> {
    let record = find_goal(repo, goal)?;
    let mut rows = weekly_rows(repo, &record)?;
    let idx = week_index(&rows, goal, week)?;

    rows[idx] = override_target(&rows[idx], value);
    repo.save_weekly_targets(goal, &rows)
        .with_context(|| format!("saving weekly targets for goal {goal}"))?;
    info!(%goal, week, value, "overrode weekly target");
    Ok(rows[idx].clone())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalLine {
    pub goal: CycleGoal,
    pub status: GoalStatus,
    /// This week's row, if the cycle is running.
    pub this_week: Option<WeeklyTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleStatus {
    pub cycle: Cycle,
    pub current_week: u32,
    pub total_weeks: u32,
    pub goals: Vec<GoalLine>,
    pub analytics: CycleAnalytics,
}

/// The cycle to report on: the latest one already started by `today`, else the earliest
/// upcoming one.
fn active_cycle(goals: &[CycleGoalRecord], today: NaiveDate) -> Option<Cycle> {
    let started = goals
        .iter()
        .map(|g| g.cycle)
        .filter(|c| c.start_date <= today)
        .max_by_key(|c| c.start_date);
    started.or_else(|| goals.iter().map(|g| g.cycle).min_by_key(|c| c.start_date))
}

/// Per-goal status plus cycle-wide analytics. `None` when no cycle goals exist.
pub fn cycle_status<R: Repository>(repo: &R, today: NaiveDate) -> Result<Option<CycleStatus>> {
    let records = repo.cycle_goals().context("loading cycle goals")?;
    let Some(cycle) = active_cycle(&records, today) else {
        return Ok(None);
    };

    let current_week = cycle.current_week(today);
    let total_weeks = cycle.total_weeks();

    let mut goals = Vec::new();
    let mut all_rows = Vec::new();
    for record in records.iter().filter(|g| g.cycle == cycle) {
        let rows = weekly_rows(repo, record)?;
        // Reviewed actuals are the goal's progress so far.
        let current_value: f64 = rows
            .iter()
            .filter(|t| t.is_reviewed())
            .map(|t| t.actual_value)
            .sum();

        let goal = CycleGoal {
            id: record.id,
            title: record.title.clone(),
            target_value: record.target_value,
            current_value,
        };
        let status = get_goal_status(
            current_value,
            record.target_value,
            current_week.saturating_sub(1),
            total_weeks,
        );
        let this_week = rows.iter().find(|t| t.week_number == current_week).cloned();

        goals.push(GoalLine {
            goal,
            status,
            this_week,
        });
        all_rows.extend(rows);
    }

    let cycle_goals: Vec<CycleGoal> = goals.iter().map(|l| l.goal.clone()).collect();
    let analytics = compute_cycle_analytics(&cycle_goals, &all_rows, current_week, total_weeks);

    Ok(Some(CycleStatus {
        cycle,
        current_week,
        total_weeks,
        goals,
        analytics,
    }))
}

/// Report over the `report_type` window ending at `end_date`.
pub fn build_report<R: Repository>(
    repo: &R,
    report_type: ReportType,
    end_date: NaiveDate,
    tz: Tz,
) -> Result<ReportResult> {
    let (start, end) = report_type.range(end_date);

    let daily_scores = repo.daily_scores(start, end).context("loading daily scores")?;
    let pillars = repo.pillars().context("loading pillars")?;
    let tasks = repo.tasks().context("loading tasks")?;
    let completions = repo.completions(start, end).context("loading completions")?;
    let outcomes = repo.outcomes().context("loading outcomes")?;
    let outcome_logs = repo.outcome_logs().context("loading outcome logs")?;

    let input = ReportInput {
        daily_scores: &daily_scores,
        pillars: &pillars,
        tasks: &tasks,
        completions: &completions,
        outcomes: &outcomes,
        outcome_logs: &outcome_logs,
        tz,
    };
    Ok(compute_report(&input, report_type, end_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use daybook_core::time::{parse_calendar_date, parse_timezone};
    use daybook_core::{Completion, CompletionType, Pillar, Task, WeekScore};

    fn d(s: &str) -> NaiveDate {
        parse_calendar_date(s).unwrap()
    }

    fn sample_store() -> MemoryStore {
        MemoryStore::new()
            .with_pillars(vec![Pillar::new(1, "Health", 2.0), Pillar::new(2, "Mind", 1.0)])
            .with_tasks(vec![
                Task::new(1, "Workout").with_pillar(1),
                Task::new(2, "Read")
                    .with_pillar(2)
                    .with_type(CompletionType::Numeric)
                    .with_target(30.0),
            ])
    }

    fn goal(id: i64, target: f64, start: &str) -> CycleGoalRecord {
        CycleGoalRecord {
            id: GoalId(id),
            title: format!("goal {id}"),
            target_value: target,
            cycle: Cycle::starting(d(start)),
        }
    }

    #[test]
    fn test_score_day_persists_and_rebuilds_stats() {
        let mut repo = sample_store().with_completions(vec![
            Completion::checked(1, d("2026-03-02")),
            Completion::valued(2, d("2026-03-02"), 15.0),
        ]);

        let day = score_day(&mut repo, d("2026-03-02"), &ScoringPolicy::default()).unwrap();
        // Health 100 (w2), Mind 50 (w1) -> 250/3 = 83.3
        assert_eq!(day.score.action_score, 83);
        assert!(day.score.is_passing);
        assert_eq!(day.stats.total_xp, 83);
        assert_eq!(day.stats.current_streak, 1);

        assert_eq!(repo.daily_scores.len(), 1);
        assert_eq!(repo.user_stats.as_ref().unwrap().total_xp, 83);
    }

    #[test]
    fn test_rescoring_a_day_replaces_it() {
        let mut repo = sample_store();
        score_day(&mut repo, d("2026-03-02"), &ScoringPolicy::default()).unwrap();
        assert_eq!(repo.daily_scores[0].action_score, 0);

        repo.completions.push(Completion::checked(1, d("2026-03-02")));
        let again = score_day(&mut repo, d("2026-03-02"), &ScoringPolicy::default()).unwrap();
        assert_eq!(repo.daily_scores.len(), 1);
        assert_eq!(again.score.action_score, 67);
        assert_eq!(again.stats.total_xp, 67);
    }

    #[test]
    fn test_backfilled_days_restate_later_xp() {
        let days = ["2026-03-04", "2026-03-03", "2026-03-02"];
        let completions = days
            .iter()
            .flat_map(|day| [Completion::checked(1, d(day)), Completion::valued(2, d(day), 30.0)])
            .collect();
        let mut repo = sample_store().with_completions(completions);

        let mut last = None;
        for day in days {
            last = Some(score_day(&mut repo, d(day), &ScoringPolicy::default()).unwrap());
        }
        let stats = last.unwrap().stats;
        // 100 + 100 + (100 + 3*2): Mar 4 closes a three-day streak.
        assert_eq!(stats.total_xp, 306);

        let stored: i64 = repo.daily_scores.iter().map(|s| s.xp_earned).sum();
        assert_eq!(stored, stats.total_xp);
        let tz = parse_timezone("UTC").unwrap();
        let report = build_report(&repo, ReportType::Weekly, d("2026-03-08"), tz).unwrap();
        assert_eq!(report.summary.total_xp, stats.total_xp);
    }

    #[test]
    fn test_review_generates_and_redistributes() {
        let mut repo = MemoryStore::new().with_cycle_goal(goal(1, 120.0, "2026-01-05"));

        // Today is in week 3; week 1 missed by 10.
        let review = review_week(&mut repo, GoalId(1), 1, 0.0, d("2026-01-19")).unwrap();
        assert_eq!(review.current_week, 3);
        assert_eq!(review.reviewed.score, Some(WeekScore::Missed));
        // Weeks 3..=12 absorb the 10. Week 2 is past but unreviewed, so it's left alone.
        assert_eq!(review.adjustments.len(), 10);
        assert_eq!(review.adjustments[0].target_value, 11.0);

        let rows = repo.weekly_targets_for(GoalId(1)).unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[1].target_value, 10.0);
        assert_eq!(rows[2].target_value, 11.0);
    }

    fn week_targets(repo: &MemoryStore, goal: i64) -> Vec<f64> {
        repo.weekly_targets_for(GoalId(goal))
            .unwrap()
            .iter()
            .map(|t| t.target_value)
            .collect()
    }

    #[test]
    fn test_repeated_review_leaves_targets_alone() {
        let mut repo = MemoryStore::new().with_cycle_goal(goal(1, 120.0, "2026-01-05"));
        let today = d("2026-01-19"); // week 3

        review_week(&mut repo, GoalId(1), 1, 0.0, today).unwrap();
        let after_first = week_targets(&repo, 1);

        let again = review_week(&mut repo, GoalId(1), 1, 0.0, today).unwrap();
        assert!(again.adjustments.is_empty());
        assert_eq!(week_targets(&repo, 1), after_first);

        // Reviewing another week on target doesn't re-add week 1's shortfall.
        review_week(&mut repo, GoalId(1), 2, 10.0, today).unwrap();
        assert_eq!(week_targets(&repo, 1), after_first);
        assert_eq!(after_first[2], 11.0);
    }

    #[test]
    fn test_targets_sum_to_goal_plus_shortfall() {
        let mut repo = MemoryStore::new().with_cycle_goal(goal(1, 120.0, "2026-01-05"));
        let today = d("2026-01-26"); // week 4

        let reviews = [(1, 4.0), (2, 10.0), (1, 6.0), (3, 7.0), (3, 7.0), (2, 10.0)];
        for (week, actual) in reviews {
            review_week(&mut repo, GoalId(1), week, actual, today).unwrap();
        }

        // Week 1 short by 4, week 3 short by 3; weeks 4..=12 absorb all of it.
        let rows = repo.weekly_targets_for(GoalId(1)).unwrap();
        let total: f64 = rows.iter().map(|t| t.target_value).sum();
        assert!((total - 127.0).abs() < 1e-9);
        assert!((rows[3].target_value - (10.0 + 7.0 / 9.0)).abs() < 1e-9);

        // Once the last week is reviewed, new shortfall has nowhere to go.
        let late = d("2026-03-29"); // week 12
        review_week(&mut repo, GoalId(1), 12, 20.0, late).unwrap();
        let dropped = review_week(&mut repo, GoalId(1), 4, 0.0, late).unwrap();
        assert!(dropped.adjustments.is_empty());
        let unchanged: f64 = week_targets(&repo, 1).iter().sum();
        assert!((unchanged - 127.0).abs() < 1e-9);
    }

    #[test]
    fn test_override_is_exempt_from_redistribution() {
        let mut repo = MemoryStore::new().with_cycle_goal(goal(1, 120.0, "2026-01-05"));
        let pinned = override_week(&mut repo, GoalId(1), 12, 4.0).unwrap();
        assert!(pinned.is_overridden);

        let review = review_week(&mut repo, GoalId(1), 1, 1.0, d("2026-01-12")).unwrap();
        // Deficit 9 over weeks 2..=11.
        assert_eq!(review.adjustments.len(), 10);
        assert!(review.adjustments.iter().all(|a| a.week_number != 12));
        assert!((review.adjustments[0].target_value - 10.9).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_goal_and_week() {
        let mut repo = MemoryStore::new().with_cycle_goal(goal(1, 120.0, "2026-01-05"));
        assert!(review_week(&mut repo, GoalId(2), 1, 1.0, d("2026-01-12")).is_err());
        let err = override_week(&mut repo, GoalId(1), 13, 1.0).unwrap_err();
        assert!(err.to_string().contains("no week 13"));
    }

    #[test]
    fn test_cycle_status_uses_reviewed_actuals() {
        let mut repo = MemoryStore::new()
            .with_cycle_goal(goal(1, 120.0, "2026-01-05"))
            .with_cycle_goal(goal(2, 60.0, "2026-01-05"));
        let today = d("2026-01-26"); // week 4
        for week in 1..=3 {
            review_week(&mut repo, GoalId(1), week, 10.0, today).unwrap();
            review_week(&mut repo, GoalId(2), week, 1.0, today).unwrap();
        }

        let status = cycle_status(&repo, today).unwrap().unwrap();
        assert_eq!(status.current_week, 4);
        assert_eq!(status.total_weeks, 12);
        assert_eq!(status.goals[0].goal.current_value, 30.0);
        assert_eq!(status.goals[0].status, GoalStatus::OnTrack);
        assert_eq!(status.goals[1].status, GoalStatus::Behind);
        assert_eq!(status.analytics.total_reviewed_weeks, 3);
        assert!(status.goals[0].this_week.is_some());
    }

    #[test]
    fn test_cycle_status_without_goals() {
        assert!(cycle_status(&MemoryStore::new(), d("2026-01-26")).unwrap().is_none());
    }

    #[test]
    fn test_outcome_progress_writes_back() {
        use chrono::{TimeZone, Utc};
        use daybook_core::{GoalType, MetricType, OutcomeLog};

        let tz = parse_timezone("America/Chicago").unwrap();
        let mut repo = MemoryStore::new();
        repo.outcomes.push(Outcome::new(
            1,
            "Books",
            4.0,
            MetricType::Count,
            GoalType::Achievement,
            d("2026-03-01"),
            d("2026-03-31"),
        ));
        repo.outcome_logs.push(OutcomeLog {
            outcome_id: GoalId(1),
            logged_at: Utc.with_ymd_and_hms(2026, 3, 3, 18, 0, 0).unwrap(),
            minutes: None,
            count: Some(2.0),
        });

        let statuses = outcome_progress(&mut repo, d("2026-03-10"), tz).unwrap();
        assert_eq!(statuses[0].progress.percent_complete, 50.0);
        assert_eq!(repo.outcomes[0].current_value, 2.0);
    }
}
