//! Task scoring + daily score aggregation.
//!
//! `score_task` turns one completion into points; `calculate_daily_score` groups a day's
//! scheduled tasks by pillar, normalizes each pillar to 0-100 and takes the
//! weight-normalized average of the pillars present that day.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::pillar::{Pillar, PillarKey};
use crate::task::{Completion, CompletionType, FlexibilityRule, Task, TaskId};

/// Weight for pillars the caller didn't pass (and the unassigned bucket).
pub const DEFAULT_PILLAR_WEIGHT: f64 = 1.0;

/// Half-up rounding, so -0.5 rounds to 0 rather than -1.
pub fn round_half_up(x: f64) -> i32 {
    (x + 0.5).floor() as i32
}

/// Points earned for one completion. Negative only for `LimitAvoid` overruns.
pub fn score_task(task: &Task, completion: &Completion) -> f64 {
    let full = task.full_points();

    if task.completion_type == CompletionType::Checkbox {
        return if completion.completed { full } else { 0.0 };
    }

    let value = completion.value.unwrap_or(0.0);

    if task.flexibility_rule == FlexibilityRule::LimitAvoid {
        if let Some(limit) = task.limit_value.filter(|l| *l > 0.0) {
            if value <= limit {
                return full;
            }
            let over_ratio = (value - limit) / limit;
            return -full * over_ratio.min(1.0);
        }
    }

    if task.completion_type == CompletionType::Percentage {
        return full * value.min(100.0) / 100.0;
    }

    if let Some(target) = task.target.filter(|t| *t > 0.0) {
        return full * (value / target).min(1.0);
    }

    if value > 0.0 { full } else { 0.0 }
}

/// Per-pillar working numbers behind a pillar score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarTally {
    pub key: PillarKey,
    pub earned: f64,
    pub max_possible: f64,
    pub score: i32,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyBreakdown {
    pub action_score: i32,
    pub pillar_scores: BTreeMap<PillarKey, i32>,
    pub tallies: Vec<PillarTally>,
}

/// Score one day.
///
/// `completions` are that day's completion rows; tasks without one still count toward
/// their pillar's max-possible. Pillars with no scheduled task don't dilute the average.
pub fn calculate_daily_score(
    completions: &[Completion],
    tasks_for_day: &[Task],
    pillars: &[Pillar],
) -> DailyBreakdown {
    if tasks_for_day.is_empty() {
        return DailyBreakdown::default();
    }

    let by_task: HashMap<TaskId, &Completion> =
        completions.iter().map(|c| (c.task_id, c)).collect();

    // (earned, max_possible)
    let mut groups: BTreeMap<PillarKey, (f64, f64)> = BTreeMap::new();
    for task in tasks_for_day {
        let entry = groups.entry(PillarKey::of(task.pillar_id)).or_default();
        entry.1 += task.full_points();
        if let Some(c) = by_task.get(&task.id) {
            entry.0 += score_task(task, c);
        }
    }

    let weights: HashMap<PillarKey, f64> = pillars
        .iter()
        .map(|p| (PillarKey::Pillar(p.id), p.weight))
        .collect();

    let mut tallies = Vec::with_capacity(groups.len());
    let mut pillar_scores = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for (key, (earned, max_possible)) in groups {
        let score = if max_possible > 0.0 {
            round_half_up(100.0 * earned / max_possible)
        } else {
            0
        };
        let weight = weights.get(&key).copied().unwrap_or(DEFAULT_PILLAR_WEIGHT);

        weighted_sum += score as f64 * weight;
        weight_total += weight;
        pillar_scores.insert(key, score);
        tallies.push(PillarTally {
            key,
            earned,
            max_possible,
            score,
            weight,
        });
    }

    let action_score = if weight_total > 0.0 {
        round_half_up(weighted_sum / weight_total)
    } else {
        0
    };

    debug!(action_score, pillars = tallies.len(), "scored day");

    DailyBreakdown {
        action_score,
        pillar_scores,
        tallies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pillar::PillarId;
    use crate::task::Importance;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn test_checkbox_is_all_or_nothing() {
        let t = Task::new(1, "Meditate").with_importance(Importance::High).with_points(7.0);
        assert_eq!(score_task(&t, &Completion::checked(1, today())), 21.0);
        assert_eq!(score_task(&t, &Completion::unchecked(1, today())), 0.0);

        // A value on a checkbox doesn't matter, only the flag.
        let mut c = Completion::unchecked(1, today());
        c.value = Some(50.0);
        assert_eq!(score_task(&t, &c), 0.0);
    }

    #[test]
    fn test_limit_avoid_boundaries() {
        let t = Task::new(1, "Screen time")
            .with_type(CompletionType::Duration)
            .with_importance(Importance::Medium)
            .with_points(10.0)
            .with_limit(60.0);

        // At the limit is a pass.
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 60.0)), 20.0);
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 0.0)), 20.0);
        // Half over the limit costs half.
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 90.0)), -10.0);
        // Over-ratio clamps at 1.
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 120.0)), -20.0);
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 500.0)), -20.0);
    }

    #[test]
    fn test_limit_avoid_without_limit_falls_through() {
        let t = Task::new(1, "Sugar")
            .with_type(CompletionType::Count)
            .with_importance(Importance::Low)
            .with_points(5.0)
            .with_limit(0.0);
        // No usable limit -> binary rule.
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 3.0)), 5.0);
    }

    #[test]
    fn test_percentage_caps_at_100() {
        let t = Task::new(1, "Inbox zero")
            .with_type(CompletionType::Percentage)
            .with_importance(Importance::Low)
            .with_points(10.0);
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 40.0)), 4.0);
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 150.0)), 10.0);
        assert_eq!(score_task(&t, &Completion::unchecked(1, today())), 0.0);
    }

    #[test]
    fn test_target_is_linear() {
        let t = Task::new(1, "Pages")
            .with_type(CompletionType::Count)
            .with_target(40.0)
            .with_importance(Importance::Medium)
            .with_points(10.0);
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 10.0)), 5.0);
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 80.0)), 20.0);
    }

    #[test]
    fn test_no_target_is_binary() {
        let t = Task::new(1, "Walk")
            .with_type(CompletionType::Duration)
            .with_importance(Importance::Low)
            .with_points(10.0);
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 0.5)), 10.0);
        assert_eq!(score_task(&t, &Completion::valued(1, today(), 0.0)), 0.0);
    }

    #[test]
    fn test_end_to_end_single_pillar() {
        let tasks = vec![
            Task::new(1, "Workout")
                .with_pillar(1)
                .with_points(10.0)
                .with_importance(Importance::High),
            Task::new(2, "Steps")
                .with_pillar(1)
                .with_type(CompletionType::Numeric)
                .with_target(100.0)
                .with_points(10.0)
                .with_importance(Importance::Medium),
            Task::new(3, "Floss").with_pillar(1).with_points(10.0).with_importance(Importance::Low),
        ];
        let completions = vec![
            Completion::checked(1, today()),
            Completion::valued(2, today(), 50.0),
            Completion::unchecked(3, today()),
        ];
        let pillars = vec![Pillar::new(1, "Health", 10.0)];

        let out = calculate_daily_score(&completions, &tasks, &pillars);
        let tally = &out.tallies[0];
        assert_eq!(tally.max_possible, 60.0);
        assert_eq!(tally.earned, 40.0);
        assert_eq!(out.pillar_scores[&PillarKey::Pillar(PillarId(1))], 67);
        assert_eq!(out.action_score, 67);
    }

    #[test]
    fn test_no_completions_scores_zero() {
        let tasks = vec![
            Task::new(1, "A").with_pillar(1),
            Task::new(2, "B").with_pillar(2),
            Task::new(3, "C"),
        ];
        let out = calculate_daily_score(&[], &tasks, &[]);
        assert_eq!(out.action_score, 0);
        assert_eq!(out.pillar_scores.len(), 3);
        assert!(out.pillar_scores.values().all(|s| *s == 0));
    }

    #[test]
    fn test_empty_day() {
        let out = calculate_daily_score(&[Completion::checked(1, today())], &[], &[]);
        assert_eq!(out.action_score, 0);
        assert!(out.pillar_scores.is_empty());
    }

    #[test]
    fn test_weighted_average_skips_absent_pillars() {
        let tasks = vec![
            Task::new(1, "Run").with_pillar(1),
            Task::new(2, "Budget").with_pillar(2),
        ];
        let completions = vec![Completion::checked(1, today())];
        let pillars = vec![
            Pillar::new(1, "Health", 3.0),
            Pillar::new(2, "Money", 1.0),
            // Nothing scheduled today; must not drag the average down.
            Pillar::new(3, "Social", 50.0),
        ];

        let out = calculate_daily_score(&completions, &tasks, &pillars);
        // (100*3 + 0*1) / 4 = 75
        assert_eq!(out.action_score, 75);
        assert!(!out.pillar_scores.contains_key(&PillarKey::Pillar(PillarId(3))));
    }

    #[test]
    fn test_unassigned_bucket_separate_from_pillar_zero() {
        let tasks = vec![Task::new(1, "Zero").with_pillar(0), Task::new(2, "Loose")];
        let completions = vec![Completion::checked(1, today())];
        let out = calculate_daily_score(&completions, &tasks, &[Pillar::new(0, "Zero", 1.0)]);
        assert_eq!(out.pillar_scores[&PillarKey::Pillar(PillarId(0))], 100);
        assert_eq!(out.pillar_scores[&PillarKey::Unassigned], 0);
        assert_eq!(out.action_score, 50);
    }

    #[test]
    fn test_zero_weights_guarded() {
        let tasks = vec![Task::new(1, "Run").with_pillar(1)];
        let out = calculate_daily_score(
            &[Completion::checked(1, today())],
            &tasks,
            &[Pillar::new(1, "Health", 0.0)],
        );
        assert_eq!(out.pillar_scores[&PillarKey::Pillar(PillarId(1))], 100);
        assert_eq!(out.action_score, 0);
    }

    #[test]
    fn test_penalty_can_push_pillar_negative() {
        let tasks = vec![Task::new(1, "Doomscroll")
            .with_pillar(1)
            .with_type(CompletionType::Duration)
            .with_limit(30.0)];
        let out = calculate_daily_score(&[Completion::valued(1, today(), 90.0)], &tasks, &[]);
        assert_eq!(out.action_score, -100);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(66.5), 67);
        assert_eq!(round_half_up(-0.5), 0);
        assert_eq!(round_half_up(-0.6), -1);
    }
}
