//! Plain-text output for each command. `--json` bypasses all of this.

use daybook_core::{LevelInfo, PillarKey, ReportResult, UserStats, get_score_tier};
use daybook_store::workflows::{CycleStatus, OutcomeStatus, ScoredDay, WeekReview};
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct StatsView {
    pub stats: UserStats,
    pub level: LevelInfo,
}

fn pillar_label(key: &PillarKey, name: Option<&str>) -> String {
    match (key, name) {
        (_, Some(name)) => name.to_string(),
        (PillarKey::Unassigned, None) => "Unassigned".to_string(),
        (PillarKey::Pillar(id), None) => format!("Pillar {id}"),
    }
}

pub fn init(config_path: &Path, created: bool, data_dir: &Path, tables: &[PathBuf]) -> String {
    let mut out = String::new();
    if created {
        let _ = writeln!(out, "Wrote {}", config_path.display());
    } else {
        let _ = writeln!(out, "Config already exists: {}", config_path.display());
    }
    let _ = writeln!(out, "Data directory: {}", data_dir.display());
    for t in tables {
        let _ = writeln!(out, "  created {}", t.display());
    }
    out.trim_end().to_string()
}

pub fn scored_day(day: &ScoredDay) -> String {
    let mut out = String::new();
    let s = &day.score;
    let _ = writeln!(
        out,
        "{}  score {}  [{}]  {}",
        s.date,
        s.action_score,
        get_score_tier(s.action_score as f64),
        if s.is_passing { "passing" } else { "not passing" }
    );
    for t in &day.breakdown.tallies {
        let _ = writeln!(
            out,
            "  {:<12} {:>4}  ({:.1}/{:.1} pts, weight {})",
            pillar_label(&t.key, None),
            t.score,
            t.earned,
            t.max_possible,
            t.weight
        );
    }
    let _ = writeln!(
        out,
        "XP +{}  total {}  streak {}",
        s.xp_earned, day.stats.total_xp, day.stats.current_streak
    );
    out.trim_end().to_string()
}

pub fn stats(view: &StatsView) -> String {
    let StatsView { stats, level } = view;
    format!(
        "Level {} {}  ({}/{} XP, {}%)\nTotal XP {}\nStreak {} (best {})",
        level.level,
        level.title,
        level.current_xp,
        level.xp_for_next_level,
        level.xp_progress,
        stats.total_xp,
        stats.current_streak,
        stats.best_streak
    )
}

pub fn report(r: &ReportResult) -> String {
    let mut out = String::new();
    let s = &r.summary;
    let _ = writeln!(out, "{:?} report {} .. {}", r.report_type, r.start_date, r.end_date);
    let _ = writeln!(
        out,
        "Average {} [{}] over {} scored days, {} passing, {} XP",
        s.avg_score, s.tier, s.days_scored, s.passing_days, s.total_xp
    );
    if let (Some(best), Some(worst)) = (&s.best_day, &s.worst_day) {
        let _ = writeln!(
            out,
            "Best {} ({})  Worst {} ({})",
            best.date, best.action_score, worst.date, worst.action_score
        );
    }

    if !r.pillar_averages.is_empty() {
        let _ = writeln!(out, "\nPillars");
        for p in &r.pillar_averages {
            let _ = writeln!(
                out,
                "  {:<16} {:>4}  ({} days)",
                pillar_label(&p.key, p.name.as_deref()),
                p.avg_score,
                p.days
            );
        }
    }

    for (heading, tasks) in [("Top tasks", &r.top_tasks), ("Needs attention", &r.bottom_tasks)] {
        if tasks.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{heading}");
        for t in tasks {
            let _ = writeln!(
                out,
                "  {:<24} {:>3}%  ({}/{})",
                t.title, t.rate, t.completed_days, t.scheduled_days
            );
        }
    }

    if !r.outcomes.is_empty() {
        let _ = writeln!(out, "\nOutcomes");
        for o in &r.outcomes {
            let _ = writeln!(
                out,
                "  {:<24} {:.2} -> {:.2} ({:+.2}){}",
                o.title,
                o.start_value,
                o.end_value,
                o.change,
                if o.improved { "" } else { "  !" }
            );
        }
    }
    out.trim_end().to_string()
}

pub fn outcomes(statuses: &[OutcomeStatus]) -> String {
    if statuses.is_empty() {
        return "No outcome goals yet. Add rows to outcomes.csv.".to_string();
    }
    let mut out = String::new();
    for OutcomeStatus { outcome, progress } in statuses {
        let flag = if progress.is_completed {
            "done"
        } else if progress.is_overdue {
            "overdue"
        } else {
            "open"
        };
        let _ = writeln!(
            out,
            "{:<24} {:.2}/{:.2}  {:.0}% done, {:.0}% of time used, {} days left, {:.2}/day  [{}]",
            outcome.title,
            progress.current_value,
            outcome.target_value,
            progress.percent_complete,
            progress.percent_elapsed,
            progress.days_remaining,
            progress.daily_target,
            flag
        );
    }
    out.trim_end().to_string()
}

pub fn cycle_status(s: &CycleStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Cycle {} .. {}  week {}/{}",
        s.cycle.start_date, s.cycle.end_date, s.current_week, s.total_weeks
    );
    for line in &s.goals {
        let this_week = line
            .this_week
            .as_ref()
            .map(|t| format!("this week {:.2}", t.target_value))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  {:<24} {:.2}/{:.2}  {}  {}",
            line.goal.title, line.goal.current_value, line.goal.target_value, line.status, this_week
        );
    }
    let a = &s.analytics;
    let _ = writeln!(
        out,
        "Overall {:.0}%  pace {} ({:.2})  projected {:.0}%  consistent {}/{} weeks",
        a.overall_completion,
        a.pace,
        a.pace_ratio,
        a.projected_completion,
        a.consistent_weeks,
        a.total_reviewed_weeks
    );
    out.trim_end().to_string()
}

pub fn week_review(r: &WeekReview) -> String {
    let t = &r.reviewed;
    let mut out = format!(
        "Goal {} week {}: {:.2}/{:.2} -> {}",
        t.goal_id,
        t.week_number,
        t.actual_value,
        t.target_value,
        t.score.map(|s| s.as_str()).unwrap_or("unreviewed")
    );
    if !r.adjustments.is_empty() {
        let _ = write!(out, "\nRedistributed into {} weeks:", r.adjustments.len());
        for a in &r.adjustments {
            let _ = write!(out, "\n  week {:>2} -> {:.2}", a.week_number, a.target_value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_core::PillarId;

    #[test]
    fn test_pillar_label() {
        assert_eq!(pillar_label(&PillarKey::Unassigned, None), "Unassigned");
        assert_eq!(pillar_label(&PillarKey::Pillar(PillarId(4)), None), "Pillar 4");
        assert_eq!(pillar_label(&PillarKey::Pillar(PillarId(4)), Some("Mind")), "Mind");
    }

    #[test]
    fn test_stats_text() {
        let (stats, _) = UserStats::default().apply_day(150, true);
        let text = stats_text(&stats);
        assert!(text.starts_with("Level 2 Novice  (50/200 XP, 25%)"));
        assert!(text.ends_with("Streak 1 (best 1)"));
    }

    fn stats_text(user: &UserStats) -> String {
        stats(&StatsView {
            level: daybook_core::get_level_info(user.total_xp),
            stats: user.clone(),
        })
    }
}
