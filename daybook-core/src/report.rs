//! Period reports built from daily scores, completions and outcome logs.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use crate::goals::{Direction, GoalId, Outcome, OutcomeLog, value_as_of};
use crate::pillar::{Pillar, PillarKey};
use crate::schedule::is_task_scheduled;
use crate::scoring::round_half_up;
use crate::stats::DailyScore;
use crate::task::{Completion, Task, TaskId};
use crate::tiers::{ScoreTier, get_score_tier};
use crate::time::date_range;

/// How many tasks each ranking keeps.
pub const RANKING_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Daily,
    Weekly,
    Monthly,
}

impl ReportType {
    pub fn days(&self) -> i64 {
        match self {
            ReportType::Daily => 1,
            ReportType::Weekly => 7,
            ReportType::Monthly => 30,
        }
    }

    /// Inclusive range ending at `end_date`.
    pub fn range(&self, end_date: NaiveDate) -> (NaiveDate, NaiveDate) {
        (end_date - Duration::days(self.days() - 1), end_date)
    }
}

impl FromStr for ReportType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(ReportType::Daily),
            "weekly" | "week" => Ok(ReportType::Weekly),
            "monthly" | "month" => Ok(ReportType::Monthly),
            other => Err(anyhow::anyhow!("unknown report type: {other}")),
        }
    }
}

/// Every row a report reads, already scoped to one user.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub daily_scores: &'a [DailyScore],
    pub pillars: &'a [Pillar],
    pub tasks: &'a [Task],
    pub completions: &'a [Completion],
    pub outcomes: &'a [Outcome],
    pub outcome_logs: &'a [OutcomeLog],
    pub tz: Tz,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayHighlight {
    pub date: NaiveDate,
    pub action_score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub days_scored: usize,
    pub avg_score: i32,
    pub tier: ScoreTier,
    pub passing_days: usize,
    pub best_day: Option<DayHighlight>,
    pub worst_day: Option<DayHighlight>,
    pub total_xp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarAverage {
    pub key: PillarKey,
    pub name: Option<String>,
    pub avg_score: i32,
    /// Days the pillar had a recorded score.
    pub days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRate {
    pub task_id: TaskId,
    pub title: String,
    pub scheduled_days: usize,
    pub completed_days: usize,
    /// 0-100.
    pub rate: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeDelta {
    pub outcome_id: GoalId,
    pub title: String,
    pub start_value: f64,
    pub end_value: f64,
    pub change: f64,
    /// Moved the way the outcome wants (held-or-lower counts for decrease goals).
    pub improved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub report_type: ReportType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub summary: ReportSummary,
    pub pillar_averages: Vec<PillarAverage>,
    pub top_tasks: Vec<TaskRate>,
    pub bottom_tasks: Vec<TaskRate>,
    pub outcomes: Vec<OutcomeDelta>,
}

pub fn compute_report(
    input: &ReportInput<'_>,
    report_type: ReportType,
    end_date: NaiveDate,
) -> ReportResult {
    let (start_date, end_date) = report_type.range(end_date);

    let mut days: Vec<&DailyScore> = input
        .daily_scores
        .iter()
        .filter(|s| s.date >= start_date && s.date <= end_date)
        .collect();
    days.sort_by_key(|s| s.date);

    let task_rates = task_completion_rates(input, start_date, end_date);

    let mut top_tasks = task_rates.clone();
    top_tasks.sort_by(|a, b| b.rate.cmp(&a.rate).then(a.task_id.cmp(&b.task_id)));
    top_tasks.truncate(RANKING_SIZE);

    let mut bottom_tasks = task_rates;
    bottom_tasks.sort_by(|a, b| a.rate.cmp(&b.rate).then(a.task_id.cmp(&b.task_id)));
    bottom_tasks.truncate(RANKING_SIZE);

    ReportResult {
        report_type,
        start_date,
        end_date,
        summary: summarize(&days),
        pillar_averages: pillar_averages(&days, input.pillars),
        top_tasks,
        bottom_tasks,
        outcomes: outcome_deltas(input, start_date, end_date),
    }
}

fn summarize(days: &[&DailyScore]) -> ReportSummary {
    let avg_score = if days.is_empty() {
        0
    } else {
        let total: i64 = days.iter().map(|d| i64::from(d.action_score)).sum();
        round_half_up(total as f64 / days.len() as f64)
    };

    // Ties: the later day wins for both best and worst.
    let mut best: Option<&DailyScore> = None;
    let mut worst: Option<&DailyScore> = None;
    for &day in days {
        if best.is_none_or(|b| day.action_score >= b.action_score) {
            best = Some(day);
        }
        if worst.is_none_or(|w| day.action_score <= w.action_score) {
            worst = Some(day);
        }
    }

    let highlight = |d: &DailyScore| DayHighlight {
        date: d.date,
        action_score: d.action_score,
    };

    ReportSummary {
        days_scored: days.len(),
        avg_score,
        tier: get_score_tier(avg_score as f64),
        passing_days: days.iter().filter(|d| d.is_passing).count(),
        best_day: best.map(highlight),
        worst_day: worst.map(highlight),
        total_xp: days.iter().map(|d| d.xp_earned).sum(),
    }
}

fn pillar_averages(days: &[&DailyScore], pillars: &[Pillar]) -> Vec<PillarAverage> {
    let mut sums: BTreeMap<PillarKey, (i64, usize)> = BTreeMap::new();
    for day in days {
        for (key, score) in &day.pillar_scores {
            let entry = sums.entry(*key).or_default();
            entry.0 += i64::from(*score);
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(key, (total, n))| PillarAverage {
            key,
            name: match key {
                PillarKey::Pillar(id) => {
                    pillars.iter().find(|p| p.id == id).map(|p| p.name.clone())
                }
                PillarKey::Unassigned => None,
            },
            avg_score: round_half_up(total as f64 / n as f64),
            days: n,
        })
        .collect()
}

fn task_completion_rates(
    input: &ReportInput<'_>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<TaskRate> {
    let done: HashSet<(TaskId, NaiveDate)> = input
        .completions
        .iter()
        .filter(|c| c.completed && c.date >= start && c.date <= end)
        .map(|c| (c.task_id, c.date))
        .collect();

    input
        .tasks
        .iter()
        .filter_map(|task| {
            let scheduled: Vec<NaiveDate> = date_range(start, end)
                .filter(|day| is_task_scheduled(task, *day))
                .collect();
            if scheduled.is_empty() {
                return None;
            }
            let completed_days = scheduled
                .iter()
                .filter(|day| done.contains(&(task.id, **day)))
                .count();
            Some(TaskRate {
                task_id: task.id,
                title: task.title.clone(),
                scheduled_days: scheduled.len(),
                completed_days,
                rate: round_half_up(100.0 * completed_days as f64 / scheduled.len() as f64),
            })
        })
        .collect()
}

fn outcome_deltas(input: &ReportInput<'_>, start: NaiveDate, end: NaiveDate) -> Vec<OutcomeDelta> {
    input
        .outcomes
        .iter()
        .filter(|o| o.start_date <= end && o.end_date >= start)
        .map(|o| {
            let day_before = start - Duration::days(1);
            let start_value = value_as_of(o, input.outcome_logs, day_before, input.tz);
            let end_value = value_as_of(o, input.outcome_logs, end, input.tz);
            let change = end_value - start_value;
            OutcomeDelta {
                outcome_id: o.id,
                title: o.title.clone(),
                start_value,
                end_value,
                change,
                improved: match o.direction {
                    Direction::Increase => change > 0.0,
                    Direction::Decrease => change <= 0.0,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::{GoalType, MetricType};
    use crate::pillar::PillarId;
    use crate::time::{parse_calendar_date, parse_timezone};
    use chrono::{TimeZone, Utc};

    fn d(offset: i64) -> NaiveDate {
        // Monday
        parse_calendar_date("2026-03-02").unwrap() + Duration::days(offset)
    }

    fn score(offset: i64, action: i32, pillars: &[(i64, i32)]) -> DailyScore {
        DailyScore {
            date: d(offset),
            action_score: action,
            pillar_scores: pillars
                .iter()
                .map(|(p, s)| (PillarKey::Pillar(PillarId(*p)), *s))
                .collect(),
            is_passing: action >= 70,
            xp_earned: i64::from(action),
        }
    }

    fn input<'a>(
        scores: &'a [DailyScore],
        tasks: &'a [Task],
        completions: &'a [Completion],
        outcomes: &'a [Outcome],
        logs: &'a [OutcomeLog],
        pillars: &'a [Pillar],
    ) -> ReportInput<'a> {
        ReportInput {
            daily_scores: scores,
            pillars,
            tasks,
            completions,
            outcomes,
            outcome_logs: logs,
            tz: parse_timezone("UTC").unwrap(),
        }
    }

    #[test]
    fn test_report_ranges() {
        assert_eq!(ReportType::Weekly.range(d(6)), (d(0), d(6)));
        assert_eq!(ReportType::Daily.range(d(3)), (d(3), d(3)));
        assert_eq!(ReportType::Monthly.range(d(29)), (d(0), d(29)));
        assert_eq!("Monthly".parse::<ReportType>().unwrap(), ReportType::Monthly);
    }

    #[test]
    fn test_summary_avg_matches_daily_scores() {
        let scores = vec![
            score(0, 80, &[]),
            score(1, 71, &[]),
            score(2, 40, &[]),
            score(3, 80, &[]),
            score(4, 40, &[]),
            // Outside the week.
            score(9, 100, &[]),
        ];
        let r = compute_report(&input(&scores, &[], &[], &[], &[], &[]), ReportType::Weekly, d(6));
        let s = &r.summary;
        assert_eq!(s.days_scored, 5);
        // 311 / 5 = 62.2
        assert_eq!(s.avg_score, 62);
        assert_eq!(s.tier, ScoreTier::Decent);
        assert_eq!(s.passing_days, 3);
        assert_eq!(s.total_xp, 311);
        // Ties go to the later day.
        assert_eq!(s.best_day.as_ref().unwrap().date, d(3));
        assert_eq!(s.worst_day.as_ref().unwrap().date, d(4));
    }

    #[test]
    fn test_empty_range() {
        let r = compute_report(&input(&[], &[], &[], &[], &[], &[]), ReportType::Daily, d(0));
        assert_eq!(r.summary.avg_score, 0);
        assert!(r.summary.best_day.is_none());
        assert!(r.pillar_averages.is_empty());
    }

    #[test]
    fn test_pillar_average_only_counts_present_days() {
        let scores = vec![
            score(0, 80, &[(1, 80), (2, 60)]),
            score(1, 90, &[(1, 90)]),
            score(2, 70, &[(1, 75)]),
        ];
        let pillars = vec![Pillar::new(1, "Health", 1.0)];
        let report_input = input(&scores, &[], &[], &[], &[], &pillars);
        let r = compute_report(&report_input, ReportType::Weekly, d(6));
        let health = &r.pillar_averages[0];
        assert_eq!(health.name.as_deref(), Some("Health"));
        assert_eq!(health.avg_score, 82);
        assert_eq!(health.days, 3);
        let money = &r.pillar_averages[1];
        assert_eq!(money.avg_score, 60);
        assert_eq!(money.days, 1);
        assert_eq!(money.name, None);
    }

    #[test]
    fn test_task_rankings() {
        let mut tasks: Vec<Task> = (1..=7).map(|i| Task::new(i, format!("task {i}"))).collect();
        // Weekly task: only Monday in range.
        tasks.push(Task::new(8, "review").with_frequency(crate::task::Frequency::Weekly));
        // Never scheduled this week.
        tasks.push(Task::new(9, "never").with_custom_days([]));

        let mut completions = Vec::new();
        // task i completed on i-1 days of the week.
        for i in 1..=7 {
            for day in 0..(i - 1) {
                completions.push(Completion::checked(i, d(day)));
            }
        }
        completions.push(Completion::checked(8, d(0)));
        // Not completed rows don't count.
        completions.push(Completion::unchecked(1, d(5)));

        let report_input = input(&[], &tasks, &completions, &[], &[], &[]);
        let r = compute_report(&report_input, ReportType::Weekly, d(6));
        let top: Vec<i64> = r.top_tasks.iter().map(|t| t.task_id.0).collect();
        assert_eq!(top, vec![8, 7, 6, 5, 4]);
        assert_eq!(r.top_tasks[0].rate, 100);
        assert_eq!(r.top_tasks[0].scheduled_days, 1);
        assert_eq!(r.top_tasks[1].rate, 86);

        let bottom: Vec<i64> = r.bottom_tasks.iter().map(|t| t.task_id.0).collect();
        assert_eq!(bottom, vec![1, 2, 3, 4, 5]);
        assert_eq!(r.bottom_tasks[0].rate, 0);
        assert!(!r.top_tasks.iter().chain(&r.bottom_tasks).any(|t| t.task_id.0 == 9));
    }

    #[test]
    fn test_outcome_deltas() {
        let (count, achieve) = (MetricType::Count, GoalType::Achievement);
        let mut outcome = Outcome::new(1, "Pages", 500.0, count, achieve, d(-10), d(40));
        outcome.current_value = 999.0;
        let limit = Outcome::new(2, "Takeout", 4.0, count, GoalType::Limiting, d(-10), d(40));
        let past = Outcome::new(3, "Old", 4.0, count, achieve, d(-60), d(-30));

        let log = |id: i64, offset: i64, n: f64| OutcomeLog {
            outcome_id: GoalId(id),
            logged_at: Utc.from_utc_datetime(&d(offset).and_hms_opt(12, 0, 0).unwrap()),
            minutes: None,
            count: Some(n),
        };
        let logs = vec![log(1, -2, 50.0), log(1, 2, 30.0), log(2, -3, 1.0)];
        let outcomes = vec![outcome, limit, past];

        let report_input = input(&[], &[], &[], &outcomes, &logs, &[]);
        let r = compute_report(&report_input, ReportType::Weekly, d(6));
        assert_eq!(r.outcomes.len(), 2);

        let pages = &r.outcomes[0];
        assert_eq!(pages.start_value, 50.0);
        assert_eq!(pages.end_value, 80.0);
        assert_eq!(pages.change, 30.0);
        assert!(pages.improved);

        let takeout = &r.outcomes[1];
        assert_eq!(takeout.change, 0.0);
        assert!(takeout.improved);
    }
}
