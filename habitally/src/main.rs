//! habitally - command-line habit tracker
//!
//! Register, create habits, mark days complete and watch streaks, goals,
//! points and achievements build up.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/habitally/habits.db (~/.local/share/habitally/habits.db)
//! - Config: $XDG_CONFIG_HOME/habitally/config.toml (~/.config/habitally/config.toml)
//! - Logs: $XDG_STATE_HOME/habitally/ (~/.local/state/habitally/)
//!
//! Passwords are never taken on the command line. `register` and `login`
//! read `$HABITALLY_PASSWORD`, or prompt when attached to a terminal.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use habitally_core::format::{
    format_due, format_progress_bar, format_relative_time, format_streak,
};
use habitally_core::{Config, Database, Frequency, NewHabit, Tracker, UserContext};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::io::IsTerminal;

/// Environment variable consulted before prompting for a password
const PASSWORD_ENV: &str = "HABITALLY_PASSWORD";

#[derive(Parser)]
#[command(name = "habitally")]
#[command(about = "Track habits, streaks, goals and achievements")]
#[command(version)]
struct Args {
    /// Username to act as
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    /// Day to act on (YYYY-MM-DD, default: today in UTC)
    #[arg(short, long, global = true)]
    date: Option<NaiveDate>,

    /// Seed for insight selection (for reproducible output)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account (password from $HABITALLY_PASSWORD or a prompt)
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },

    /// Check an email/password pair (password from $HABITALLY_PASSWORD or a prompt)
    Login {
        #[arg(long)]
        email: String,
    },

    /// Manage habits
    Habit {
        #[command(subcommand)]
        command: HabitCommand,
    },

    /// Show goals of a habit
    Goals {
        /// Habit ID
        habit: i64,
    },

    /// Show today's overview
    Dashboard,

    /// Generate a new insight
    Insight,

    /// List insights, newest first
    Insights {
        /// Show at most this many
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List unlocked achievements
    Achievements,

    /// Show the completion history of every habit
    History,

    /// Delete the account and all of its data
    DeleteAccount {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum HabitCommand {
    /// Create a habit
    Add {
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        description: Option<String>,
        /// daily, weekly or custom
        #[arg(long, default_value = "daily")]
        frequency: Frequency,
        /// Hex color, e.g. #10b981
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },

    /// List habits
    List {
        /// Include paused habits
        #[arg(long)]
        all: bool,
    },

    /// Flip completion for a day
    Toggle {
        /// Habit ID
        id: i64,
        /// Day to flip, for backfilling (default: today)
        #[arg(long)]
        on: Option<NaiveDate>,
    },

    /// Attach a note to the day
    Note {
        /// Habit ID
        id: i64,
        text: String,
    },

    /// Pause a habit (kept, but excluded from stats)
    Pause {
        /// Habit ID
        id: i64,
    },

    /// Resume a paused habit
    Resume {
        /// Habit ID
        id: i64,
    },

    /// Delete a habit with its history and goals
    Delete {
        /// Habit ID
        id: i64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        habitally_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Open database
    let db_path = config.resolved_database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let tracker = Tracker::from_config(db, &config);
    let today = args.date.unwrap_or_else(|| Utc::now().date_naive());
    tracing::debug!(db = %db_path.display(), %today, user = ?args.user, "Starting habitally");
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let out = Output {
        format: args.format,
    };

    match args.command {
        Command::Register { username, email } => {
            let password = read_password(true)?;
            let user = tracker
                .register(&username, &email, &password, &password)
                .context("registration failed")?;
            out.emit(&user, || {
                println!("Registered {} (id {})", user.username, user.id);
            })
        }
        Command::Login { email } => {
            let password = read_password(false)?;
            let ctx = tracker.login(&email, &password).context("login failed")?;
            out.emit(&ctx, || {
                println!("Logged in as {} (id {})", ctx.username, ctx.user_id);
            })
        }
        Command::Habit { command } => {
            let ctx = resolve_user(&tracker, args.user.as_deref())?;
            cmd_habit(&tracker, &ctx, command, today, &mut rng, &out)
        }
        Command::Goals { habit } => {
            let ctx = resolve_user(&tracker, args.user.as_deref())?;
            cmd_goals(&tracker, &ctx, habit, today, &out)
        }
        Command::Dashboard => {
            let ctx = resolve_user(&tracker, args.user.as_deref())?;
            cmd_dashboard(&tracker, &ctx, today, &out)
        }
        Command::Insight => {
            let ctx = resolve_user(&tracker, args.user.as_deref())?;
            let insight = tracker
                .generate_insight(&ctx, today, &mut rng)
                .context("failed to generate insight")?;
            out.emit(&insight, || {
                println!("{} ({}% confidence)", insight.title, insight.confidence);
                println!("  {}", insight.message);
            })
        }
        Command::Insights { limit } => {
            let ctx = resolve_user(&tracker, args.user.as_deref())?;
            let mut insights = tracker
                .list_insights(&ctx)
                .context("failed to list insights")?;
            if let Some(limit) = limit {
                insights.truncate(limit);
            }
            out.emit(&insights, || {
                let now = Utc::now();
                for insight in &insights {
                    println!(
                        "[{}] {} ({})",
                        insight.kind.as_str(),
                        insight.title,
                        format_relative_time(insight.created_at, now)
                    );
                    println!("  {}", insight.message);
                }
            })
        }
        Command::Achievements => {
            let ctx = resolve_user(&tracker, args.user.as_deref())?;
            let achievements = tracker
                .list_achievements(&ctx)
                .context("failed to list achievements")?;
            out.emit(&achievements, || {
                if achievements.is_empty() {
                    println!("No achievements yet.");
                }
                for a in &achievements {
                    println!("{:<14} {} (+{} pts)", a.name, a.description, a.points);
                }
            })
        }
        Command::History => {
            let ctx = resolve_user(&tracker, args.user.as_deref())?;
            let history = tracker.history(&ctx).context("failed to load history")?;
            out.emit(&history, || {
                for habit in &history {
                    println!(
                        "{} [{}]: {} of {} logged days completed",
                        habit.name,
                        habit.category,
                        habit.completed_count(),
                        habit.days.len()
                    );
                    for day in &habit.days {
                        println!("  {} {}", day.date, if day.completed { "done" } else { "missed" });
                    }
                }
            })
        }
        Command::DeleteAccount { yes } => {
            let ctx = resolve_user(&tracker, args.user.as_deref())?;
            if !yes {
                bail!("refusing to delete account '{}' without --yes", ctx.username);
            }
            tracker
                .delete_user(&ctx)
                .context("failed to delete account")?;
            out.emit(&ctx, || println!("Deleted account {}", ctx.username))
        }
    }
}

/// Prints results as text or JSON.
struct Output {
    format: Format,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
        match self.format {
            Format::Json => {
                let json = serde_json::to_string_pretty(value).context("failed to encode JSON")?;
                println!("{}", json);
            }
            Format::Text => text(),
        }
        Ok(())
    }
}

/// Password from `$HABITALLY_PASSWORD`, else an interactive prompt.
fn read_password(confirm: bool) -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    if !std::io::stdin().is_terminal() {
        bail!("no password given; set {} or run in a terminal", PASSWORD_ENV);
    }

    let prompt = dialoguer::Password::new().with_prompt("Password");
    let prompt = if confirm {
        prompt.with_confirmation("Confirm password", "Passwords don't match, try again")
    } else {
        prompt
    };
    prompt.interact().context("failed to read password")
}

fn resolve_user(tracker: &Tracker, user: Option<&str>) -> Result<UserContext> {
    let Some(username) = user else {
        bail!("no user selected; pass --user <username>");
    };
    tracker
        .context_for(username)
        .with_context(|| format!("unknown user '{}'", username))
}

fn cmd_habit(
    tracker: &Tracker,
    ctx: &UserContext,
    command: HabitCommand,
    today: NaiveDate,
    rng: &mut StdRng,
    out: &Output,
) -> Result<()> {
    match command {
        HabitCommand::Add {
            name,
            category,
            description,
            frequency,
            color,
            icon,
        } => {
            let new_habit = NewHabit {
                description,
                frequency,
                color,
                icon,
                ..NewHabit::new(name, category)
            };
            let habit = tracker
                .create_habit(ctx, new_habit, today)
                .context("failed to create habit")?;
            out.emit(&habit, || {
                println!("Created habit {} (id {})", habit.name, habit.id);
            })
        }
        HabitCommand::List { all } => {
            let habits = tracker
                .list_habits(ctx, all)
                .context("failed to list habits")?;
            out.emit(&habits, || {
                if habits.is_empty() {
                    println!("No habits yet. Add one with 'habitally habit add'.");
                }
                for h in &habits {
                    println!(
                        "{:>4}  {:<24} {:<12} {}{}",
                        h.id,
                        h.name,
                        h.category,
                        h.frequency.as_str(),
                        if h.is_active { "" } else { " (paused)" }
                    );
                }
            })
        }
        HabitCommand::Toggle { id, on } => {
            let outcome = tracker
                .toggle_habit(ctx, id, on.unwrap_or(today), today, rng)
                .context("failed to toggle habit")?;
            out.emit(&outcome, || {
                println!(
                    "{} marked {}",
                    outcome.date,
                    if outcome.completed { "done" } else { "not done" }
                );
                println!(
                    "Level {} with {} points",
                    outcome.stats.level, outcome.stats.total_points
                );
                for unlock in &outcome.unlocked {
                    println!("Achievement unlocked: {} - {}", unlock.name, unlock.description);
                }
                for goal in outcome.updated_goals.iter().filter(|g| g.achieved) {
                    println!("Goal achieved: {}", goal.title);
                }
                if let Some(insight) = &outcome.insight {
                    println!("New insight: {}", insight.title);
                }
            })
        }
        HabitCommand::Note { id, text } => {
            tracker
                .annotate(ctx, id, today, &text)
                .context("failed to save note")?;
            out.emit(&serde_json::json!({ "habit_id": id, "date": today, "notes": text }), || {
                println!("Saved note for {}", today);
            })
        }
        HabitCommand::Pause { id } => set_active(tracker, ctx, id, false, today, out),
        HabitCommand::Resume { id } => set_active(tracker, ctx, id, true, today, out),
        HabitCommand::Delete { id } => {
            tracker
                .delete_habit(ctx, id, today)
                .context("failed to delete habit")?;
            out.emit(&serde_json::json!({ "deleted": id }), || {
                println!("Deleted habit {}", id);
            })
        }
    }
}

fn set_active(
    tracker: &Tracker,
    ctx: &UserContext,
    id: i64,
    active: bool,
    today: NaiveDate,
    out: &Output,
) -> Result<()> {
    let habit = tracker
        .set_habit_active(ctx, id, active, today)
        .context("failed to update habit")?;
    out.emit(&habit, || {
        println!(
            "{} {}",
            habit.name,
            if habit.is_active { "resumed" } else { "paused" }
        );
    })
}

fn cmd_goals(
    tracker: &Tracker,
    ctx: &UserContext,
    habit_id: i64,
    today: NaiveDate,
    out: &Output,
) -> Result<()> {
    let goals = tracker
        .list_goals(ctx, habit_id)
        .context("failed to list goals")?;
    out.emit(&goals, || {
        for goal in &goals {
            let due = match (goal.achieved, goal.target_date) {
                (true, _) => "achieved".to_string(),
                (false, Some(date)) => format_due(date, today),
                (false, None) => "no due date".to_string(),
            };
            println!(
                "{} {} {}/{} ({})",
                goal.title,
                format_progress_bar(goal.progress_percentage(), 20),
                goal.current,
                goal.target,
                due
            );
        }
    })
}

fn cmd_dashboard(tracker: &Tracker, ctx: &UserContext, today: NaiveDate, out: &Output) -> Result<()> {
    let dash = tracker
        .dashboard(ctx, today)
        .context("failed to build dashboard")?;

    out.emit(&dash, || {
        println!("Dashboard for {} on {}", ctx.username, dash.date);
        println!("==================================");
        println!();
        println!("Completed today:   {}", dash.format_today());
        println!("Longest streak:    {}", format_streak(dash.longest_current_streak));
        println!("Weekly completion: {}%", dash.average_completion_rate);
        println!("{}", dash.format_level());
        println!();

        for s in &dash.habits {
            println!(
                "{:>4}  {:<24} {}  {:>3}%  streak {}",
                s.habit.id,
                s.habit.name,
                s.format_week(),
                s.completion_rate,
                format_streak(s.streak)
            );
        }

        if !dash.recent_achievements.is_empty() {
            println!();
            println!("Recent achievements:");
            for a in &dash.recent_achievements {
                println!("  {} - {}", a.name, a.description);
            }
        }

        if !dash.recent_insights.is_empty() {
            println!();
            println!("Insights:");
            for i in &dash.recent_insights {
                println!("  {}: {}", i.title, i.message);
            }
        }
    })
}
