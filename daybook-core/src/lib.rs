//! daybook-core: the daily scoring and goal-progress engine.
//!
//! Pure functions over plain records. Callers load rows, pass them in, and persist
//! whatever derived values come back; nothing here does I/O or holds state.

pub mod analytics;
pub mod cycle;
pub mod goals;
pub mod pillar;
pub mod report;
pub mod schedule;
pub mod scoring;
pub mod stats;
pub mod task;
pub mod tiers;
pub mod time;

pub use analytics::{CycleAnalytics, CycleGoal, compute_cycle_analytics};
pub use cycle::{
    Cycle, GoalStatus, TargetAdjustment, WeekScore, WeeklyTarget, apply_adjustments,
    calculate_end_date, generate_weekly_targets, get_current_week_number, get_goal_status,
    get_total_weeks, get_week_score, override_target, rebalance_targets, redistribute_targets,
    review_week,
};
pub use goals::{
    Direction, GoalId, GoalType, MetricType, Outcome, OutcomeLog, OutcomeProgress,
    compute_progress, value_as_of,
};
pub use pillar::{Pillar, PillarId, PillarKey};
pub use report::{ReportInput, ReportResult, ReportType, compute_report};
pub use schedule::{is_task_scheduled, tasks_for_day};
pub use scoring::{DailyBreakdown, PillarTally, calculate_daily_score, score_task};
pub use stats::{
    DailyScore, ScoringPolicy, UserStats, current_streak, rebuild_stats, restate_xp, score_day,
    streak_ending,
};
pub use task::{Completion, CompletionType, FlexibilityRule, Frequency, Importance, Task, TaskId};
pub use tiers::{LevelInfo, ScoreTier, XpAward, calculate_xp, get_level_info, get_score_tier};
