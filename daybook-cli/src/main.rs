use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use daybook_core::time::parse_calendar_date;
use daybook_core::{GoalId, ReportType, get_level_info, get_score_tier};
use daybook_store::FileStore;
use daybook_store::workflows;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "daybook",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DAYBOOK_BUILD_SHA"), ")"),
    about = "Daily scoring, streaks and twelve-week goal tracking"
)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Data directory (overrides [data] dir in config.toml)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write ~/.daybook/config.toml and empty data tables
    Init,

    /// Score a day from its completions and update stats
    ScoreDay {
        /// YYYY-MM-DD (default: today in the configured timezone)
        #[arg(long)]
        date: Option<String>,
    },

    /// Show XP, level and streaks
    Stats {
        /// Recompute from every stored daily score first
        #[arg(long)]
        rebuild: bool,
    },

    /// Map a 0-100 score to its tier
    Tier { score: f64 },

    /// Summarize a daily, weekly or monthly window
    Report {
        #[arg(long = "type", default_value = "weekly")]
        report_type: String,

        /// Last day of the window (default: today)
        #[arg(long)]
        end: Option<String>,
    },

    /// Outcome goals
    Goal {
        #[command(subcommand)]
        command: GoalCommand,
    },

    /// Twelve-week cycle goals
    Cycle {
        #[command(subcommand)]
        command: CycleCommand,
    },
}

#[derive(Subcommand, Debug)]
enum GoalCommand {
    /// Progress of every outcome goal, recomputed from logs
    Progress {
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CycleCommand {
    /// Per-goal status and cycle analytics
    Status {
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a week's actual and redistribute any shortfall
    Review {
        #[arg(long)]
        goal: i64,
        #[arg(long)]
        week: u32,
        #[arg(long)]
        actual: f64,
        /// Date the review happens on (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Pin a week's target so redistribution leaves it alone
    Override {
        #[arg(long)]
        goal: i64,
        #[arg(long)]
        week: u32,
        #[arg(long)]
        value: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_logging(&cfg.logging.level);

    let home = state::ensure_daybook_home()?;
    let out = run(cli, &cfg, home)?;
    println!("{out}");
    Ok(())
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Everything a command needs, resolved once from config and flags.
struct App {
    store: FileStore,
    cfg: Config,
    tz: Tz,
    json: bool,
}

impl App {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    fn date_or_today(&self, date: Option<&str>) -> Result<NaiveDate> {
        match date {
            Some(s) => parse_calendar_date(s),
            None => Ok(self.today()),
        }
    }

    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T) -> String) -> Result<String> {
        if self.json {
            return serde_json::to_string_pretty(value).context("serialize output");
        }
        Ok(human(value))
    }
}

fn run(cli: Cli, cfg: &Config, home: PathBuf) -> Result<String> {
    let tz = cfg.timezone()?;
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| cfg.data_dir(&home));
    debug!(data_dir = %data_dir.display(), %tz, "resolved data directory");

    let mut app = App {
        store: FileStore::new(data_dir, tz),
        cfg: cfg.clone(),
        tz,
        json: cli.json,
    };

    match cli.command {
        Command::Init => {
            let (config_path, created) = config::init_config()?;
            let tables = app
                .store
                .init_tables()
                .with_context(|| format!("creating tables in {}", app.store.dir().display()))?;
            Ok(render::init(&config_path, created, app.store.dir(), &tables))
        }

        Command::ScoreDay { date } => {
            let date = app.date_or_today(date.as_deref())?;
            let policy = app.cfg.policy();
            let scored = workflows::score_day(&mut app.store, date, &policy)?;
            app.emit(&scored, render::scored_day)
        }

        Command::Stats { rebuild } => {
            let stats = if rebuild {
                let today = app.today();
                workflows::rebuild_user_stats(&mut app.store, today)?
            } else {
                workflows::load_user_stats(&app.store)?
            };
            let view = render::StatsView {
                level: get_level_info(stats.total_xp),
                stats,
            };
            app.emit(&view, render::stats)
        }

        Command::Tier { score } => {
            if !score.is_finite() {
                bail!("score must be a number, got {score}");
            }
            let tier = get_score_tier(score);
            app.emit(&tier, |t| format!("{score} -> {t}"))
        }

        Command::Report { report_type, end } => {
            let report_type: ReportType = report_type.parse()?;
            let end = app.date_or_today(end.as_deref())?;
            let report = workflows::build_report(&app.store, report_type, end, app.tz)?;
            app.emit(&report, render::report)
        }

        Command::Goal { command } => match command {
            GoalCommand::Progress { date } => {
                let today = app.date_or_today(date.as_deref())?;
                let statuses = workflows::outcome_progress(&mut app.store, today, app.tz)?;
                app.emit(&statuses, |s| render::outcomes(s))
            }
        },

        Command::Cycle { command } => match command {
            CycleCommand::Status { date } => {
                let today = app.date_or_today(date.as_deref())?;
                let status = workflows::cycle_status(&app.store, today)?;
                app.emit(&status, |s| match s {
                    Some(s) => render::cycle_status(s),
                    None => "No cycle goals yet. Add rows to cycle_goals.csv.".to_string(),
                })
            }
            CycleCommand::Review {
                goal,
                week,
                actual,
                date,
            } => {
                let today = app.date_or_today(date.as_deref())?;
                let review =
                    workflows::review_week(&mut app.store, GoalId(goal), week, actual, today)?;
                app.emit(&review, render::week_review)
            }
            CycleCommand::Override { goal, week, value } => {
                let row = workflows::override_week(&mut app.store, GoalId(goal), week, value)?;
                app.emit(&row, |r| {
                    format!(
                        "Goal {} week {} pinned at {:.2}",
                        r.goal_id, r.week_number, r.target_value
                    )
                })
            }
        },
    }
}
