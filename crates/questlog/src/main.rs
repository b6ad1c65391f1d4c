//! questlog - Session timer with crash recovery, XP and goal tracking
//!
//! Usage:
//!   questlog start [--project P] [--task T] [--desc D]   Start a session
//!   questlog pause                                       Pause the running session
//!   questlog resume                                      Resume a paused session
//!   questlog stop                                        Stop and record the session
//!   questlog status                                      Show timer, goals and level
//!   questlog log [--project P | --task T] [--json]       List recorded sessions
//!   questlog edit ID [...]                               Patch a recorded session
//!   questlog delete ID                                   Delete a recorded session
//!   questlog clear --yes                                 Delete every recorded session
//!   questlog stats                                       Show statistics
//!   questlog goals [--daily MIN] [--weekly MIN]          Show or set goals

use anyhow::{bail, Context, Result};
use chrono::Duration;
use clap::{Parser, Subcommand};
use questlog_core::{format, Config, Paths};
use tracing_subscriber::EnvFilter;

use questlog::recovery::RecoveryOutcome;
use questlog::session::{Session, SessionPatch};
use questlog::store::FileStore;
use questlog::tracker::{Tracker, TrackerOptions};
use questlog::{SystemClock, TimerStatus};

/// questlog - Session timer with crash recovery, XP and goal tracking
#[derive(Parser)]
#[command(name = "questlog")]
#[command(about = "Session timer with crash recovery, XP and goal tracking")]
#[command(version)]
#[command(after_help = r#"WHEN TO USE:
    Track focused time against projects and tasks. Every full minute
    earns one XP; XP raises your level.

RECOVERY:
    A running session keeps counting while questlog is not running.
    A paused session stays paused. A session started more than
    'stale_after_hours' ago (default 24) is stopped and recorded.

EXAMPLES:
    questlog start --project api --desc "Auth refactor"
    questlog pause
    questlog resume
    questlog stop
    questlog log --project api
    questlog edit 3f2a --minutes 45
    questlog goals --daily 360

LOGGING:
    RUST_LOG=debug questlog status

ALIASES:
    questlog s     # start
    questlog st    # status
    questlog p     # pause
    questlog r     # resume
"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session (records any session still running)
    #[command(alias = "s")]
    Start {
        /// Project the time belongs to
        #[arg(long)]
        project: Option<String>,

        /// Task the time belongs to
        #[arg(long)]
        task: Option<String>,

        /// What you're working on
        #[arg(long = "desc")]
        description: Option<String>,
    },

    /// Pause the running session
    #[command(alias = "p")]
    Pause,

    /// Resume a paused session
    #[command(alias = "r")]
    Resume,

    /// Stop the session and record it
    #[command(alias = "end")]
    Stop,

    /// Show timer, goals and level
    #[command(alias = "st")]
    Status,

    /// List recorded sessions
    #[command(alias = "ls")]
    Log {
        /// Only sessions for this project
        #[arg(long, conflicts_with = "task")]
        project: Option<String>,

        /// Only sessions for this task
        #[arg(long)]
        task: Option<String>,

        /// Show at most this many (most recent)
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Patch a recorded session (empty string clears a field)
    Edit {
        /// Session id or unique id prefix
        id: String,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        task: Option<String>,

        #[arg(long = "desc")]
        description: Option<String>,

        /// New duration in minutes
        #[arg(long)]
        minutes: Option<u64>,
    },

    /// Delete a recorded session
    #[command(alias = "rm")]
    Delete {
        /// Session id or unique id prefix
        id: String,
    },

    /// Delete every recorded session
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show statistics
    Stats,

    /// Show or set daily and weekly goals (minutes)
    Goals {
        #[arg(long)]
        daily: Option<f64>,

        #[arg(long)]
        weekly: Option<f64>,
    },
}

// ANSI color codes
const GREEN: &str = "\x1b[0;32m";
const YELLOW: &str = "\x1b[0;33m";
const CYAN: &str = "\x1b[0;36m";
const MAGENTA: &str = "\x1b[0;35m";
const BOLD: &str = "\x1b[1m";
const NC: &str = "\x1b[0m";

/// Check if stdout is a TTY and colors should be used
fn use_colors() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stdout())
}

/// Conditionally apply color
fn color(code: &str, text: &str) -> String {
    if use_colors() {
        format!("{}{}{}", code, text, NC)
    } else {
        text.to_string()
    }
}

type App = Tracker<SystemClock, FileStore>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = Paths::new();
    let config_path = paths.config_file();
    let config = Config::load(&config_path)?;
    let store = FileStore::new(&paths.state("timer"))?;

    let options = TrackerOptions {
        stale_after: Duration::hours(i64::from(config.stale_after_hours)),
        daily_goal: config.daily_goal_minutes,
        weekly_goal: config.weekly_goal_minutes,
    };
    let mut tracker = Tracker::open(SystemClock, store, options)?;
    report_recovery(tracker.recovery());

    match cli.command {
        Some(Commands::Start {
            project,
            task,
            description,
        }) => cmd_start(&mut tracker, project, task, description),
        Some(Commands::Pause) => cmd_pause(&mut tracker),
        Some(Commands::Resume) => cmd_resume(&mut tracker),
        Some(Commands::Stop) => cmd_stop(&mut tracker),
        Some(Commands::Status) | None => cmd_status(&tracker),
        Some(Commands::Log {
            project,
            task,
            limit,
            json,
        }) => cmd_log(&tracker, project, task, limit, json),
        Some(Commands::Edit {
            id,
            project,
            task,
            description,
            minutes,
        }) => cmd_edit(&mut tracker, &id, project, task, description, minutes),
        Some(Commands::Delete { id }) => cmd_delete(&mut tracker, &id),
        Some(Commands::Clear { yes }) => cmd_clear(&mut tracker, yes),
        Some(Commands::Stats) => cmd_stats(&tracker),
        Some(Commands::Goals { daily, weekly }) => {
            cmd_goals(&mut tracker, config, &config_path, daily, weekly)
        }
    }
}

/// Tell the user when recovery stopped a session on their behalf
///
/// Goes to stderr so command output (e.g. `log --json`) stays parseable.
fn report_recovery(outcome: &RecoveryOutcome) {
    if let RecoveryOutcome::Expired(session) = outcome {
        eprintln!(
            "{} Stale session '{}' was stopped and recorded ({})",
            color(YELLOW, "[warn]"),
            session.label(),
            format::duration_ms(session.duration)
        );
        eprintln!();
    }
}

/// Start a new session
fn cmd_start(
    tracker: &mut App,
    project: Option<String>,
    task: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let previous = tracker.active_session().map(|s| s.id.clone());
    let session = tracker.start(project, task, description)?.clone();

    if let Some(previous) = previous.and_then(|id| tracker.ledger().get(&id).cloned()) {
        println!(
            "{} Previous session '{}' recorded ({}, +{} XP)",
            color(CYAN, "[info]"),
            previous.label(),
            format::duration_ms(previous.duration),
            previous.xp_earned
        );
    }

    println!("{} Session started", color(GREEN, "[ok]"));
    println!();
    print_session_fields(&session);
    println!();
    println!("Run 'questlog pause' to take a break");
    println!("Run 'questlog stop' to finish");

    Ok(())
}

/// Pause the running session
fn cmd_pause(tracker: &mut App) -> Result<()> {
    if !tracker.pause()? {
        println!("{} No running session to pause", color(CYAN, "[info]"));
        return Ok(());
    }

    println!(
        "{} Paused at {}",
        color(GREEN, "[ok]"),
        format::clock(tracker.current_elapsed())
    );
    Ok(())
}

/// Resume a paused session
fn cmd_resume(tracker: &mut App) -> Result<()> {
    if !tracker.resume()? {
        println!("{} No paused session to resume", color(CYAN, "[info]"));
        return Ok(());
    }

    println!(
        "{} Resumed at {}",
        color(GREEN, "[ok]"),
        format::clock(tracker.current_elapsed())
    );
    Ok(())
}

/// Stop and record the session
fn cmd_stop(tracker: &mut App) -> Result<()> {
    let level_before = tracker.level().level;

    let session = match tracker.stop()? {
        Some(s) => s,
        None => {
            println!("{} No active session", color(CYAN, "[info]"));
            return Ok(());
        }
    };

    println!("{} Session recorded", color(GREEN, "[ok]"));
    println!(
        "Tracked {} (+{} XP)",
        format::duration_ms(session.duration),
        session.xp_earned
    );

    let level = tracker.level();
    if level.level > level_before {
        println!();
        println!(
            "{}",
            color(&format!("{}{}", BOLD, MAGENTA), &format!("LEVEL UP! You reached level {}", level.level))
        );
    }

    Ok(())
}

/// Show timer, goals and level
fn cmd_status(tracker: &App) -> Result<()> {
    match tracker.active_session() {
        Some(session) => {
            let heading = match tracker.status() {
                TimerStatus::Paused => "TIMER PAUSED",
                _ => "TIMER RUNNING",
            };
            println!("{}", color(&format!("{}{}", BOLD, MAGENTA), heading));
            println!();
            println!(
                "  {}   {}",
                color(CYAN, "Elapsed:"),
                format::clock(tracker.current_elapsed())
            );
            print_session_fields(session);
            println!(
                "  {}   {}",
                color(CYAN, "Started:"),
                format::relative_time(session.start_time, tracker.now())
            );
        }
        None => {
            println!("No active session");
            println!();
            println!("Start one with: questlog start");
        }
    }

    println!();
    print_goals(tracker);
    println!();

    let level = tracker.level();
    println!(
        "  {}     {} [{}] {}/{} XP",
        color(CYAN, "Level:"),
        level.level,
        format::progress_bar(level.percent(), 20),
        level.xp_into_level,
        level.xp_for_next
    );

    Ok(())
}

/// List recorded sessions
fn cmd_log(
    tracker: &App,
    project: Option<String>,
    task: Option<String>,
    limit: usize,
    json: bool,
) -> Result<()> {
    let ledger = tracker.ledger();
    let sessions: Vec<&Session> = match (project.as_deref(), task.as_deref()) {
        (Some(project), _) => ledger.filter_by_project(project),
        (None, Some(task)) => ledger.filter_by_task(task),
        (None, None) => ledger.iter().collect(),
    };

    let skip = sessions.len().saturating_sub(limit);
    let shown = &sessions[skip..];

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    if shown.is_empty() {
        println!("No recorded sessions");
        return Ok(());
    }

    let header = format!(
        "{:<10} {:<17} {:>9} {:>5}  {}",
        "ID", "STARTED", "DURATION", "XP", "LABEL"
    );
    println!("{}", color(BOLD, &header));
    for session in shown {
        println!(
            "{:<10} {:<17} {:>9} {:>5}  {}",
            session.short_id(),
            format::timestamp(session.start_time),
            format::duration_ms(session.duration),
            session.xp_earned,
            format::truncate(session.label(), 40)
        );
    }

    if skip > 0 {
        println!();
        println!("({} older sessions not shown)", skip);
    }

    Ok(())
}

/// Patch a recorded session
fn cmd_edit(
    tracker: &mut App,
    id: &str,
    project: Option<String>,
    task: Option<String>,
    description: Option<String>,
    minutes: Option<u64>,
) -> Result<()> {
    let id = resolve_id(tracker, id)?;

    let duration = match minutes {
        Some(m) => Some(minutes_to_ms(m)?),
        None => None,
    };

    let patch = SessionPatch {
        project_id: project.map(non_empty),
        task_id: task.map(non_empty),
        description: description.map(non_empty),
        duration,
        ..Default::default()
    };

    if patch.is_empty() {
        bail!("Nothing to change. Pass --project, --task, --desc or --minutes.");
    }

    tracker.update_session(&id, &patch)?;
    let session = tracker
        .ledger()
        .get(&id)
        .with_context(|| format!("Session {} disappeared after update", id))?;

    println!("{} Session updated", color(GREEN, "[ok]"));
    println!();
    print_session_fields(session);
    println!(
        "  {}  {} (+{} XP)",
        color(CYAN, "Duration:"),
        format::duration_ms(session.duration),
        session.xp_earned
    );

    Ok(())
}

/// Delete a recorded session
fn cmd_delete(tracker: &mut App, id: &str) -> Result<()> {
    let id = resolve_id(tracker, id)?;
    tracker.delete_session(&id)?;
    println!("{} Session deleted", color(GREEN, "[ok]"));
    Ok(())
}

/// Delete every recorded session
fn cmd_clear(tracker: &mut App, yes: bool) -> Result<()> {
    if !yes {
        bail!(
            "This deletes all {} recorded sessions. Re-run with --yes to confirm.",
            tracker.ledger().len()
        );
    }

    let count = tracker.ledger().len();
    tracker.clear_ledger()?;
    println!("{} Deleted {} sessions", color(GREEN, "[ok]"), count);
    Ok(())
}

/// Show statistics
fn cmd_stats(tracker: &App) -> Result<()> {
    let stats = tracker.stats();
    let (hours, mins) = stats.total_time();

    println!("{}", color(BOLD, "Statistics"));
    println!();
    println!("  {}    {}", color(CYAN, "Total Sessions:"), stats.total_sessions);
    println!("  {}  {}h {}m", color(CYAN, "Total Time:"), hours, mins);
    println!("  {}       {}", color(CYAN, "Today:"), format::duration_ms(stats.today_ms));
    println!("  {}   {}", color(CYAN, "This Week:"), format::duration_ms(stats.week_ms));

    if stats.total_sessions > 0 {
        println!();
        println!(
            "  {}   {}",
            color(CYAN, "Average Session:"),
            format::duration_ms(stats.average_ms)
        );
        println!(
            "  {}   {}",
            color(CYAN, "Longest Session:"),
            format::duration_ms(stats.longest_ms)
        );
    }

    println!();
    println!(
        "  {}  {} (level {})",
        color(CYAN, "Total XP:"),
        stats.level.total_xp,
        stats.level.level
    );

    if !stats.by_project.is_empty() {
        println!();
        println!("{}", color(BOLD, "By Project"));
        for (project, ms) in &stats.by_project {
            println!("  {:<24} {}", format::truncate(project, 24), format::duration_ms(*ms));
        }
    }

    Ok(())
}

/// Show or set goals
fn cmd_goals(
    tracker: &mut App,
    mut config: Config,
    config_path: &std::path::Path,
    daily: Option<f64>,
    weekly: Option<f64>,
) -> Result<()> {
    if daily.is_some() || weekly.is_some() {
        if let Some(minutes) = daily {
            tracker.set_daily_goal(minutes);
            config.daily_goal_minutes = minutes;
        }
        if let Some(minutes) = weekly {
            tracker.set_weekly_goal(minutes);
            config.weekly_goal_minutes = minutes;
        }
        config.save(config_path)?;
        println!("{} Goals updated", color(GREEN, "[ok]"));
        println!();
    }

    print_goals(tracker);
    Ok(())
}

fn print_session_fields(session: &Session) {
    if let Some(ref project) = session.project_id {
        println!("  {}   {}", color(CYAN, "Project:"), project);
    }
    if let Some(ref task) = session.task_id {
        println!("  {}      {}", color(CYAN, "Task:"), task);
    }
    if let Some(ref description) = session.description {
        println!("  {}      {}", color(CYAN, "Desc:"), description);
    }
    println!("  {}        {}", color(CYAN, "ID:"), session.short_id());
}

fn print_goals(tracker: &App) {
    let goals = tracker.goals();
    println!(
        "  {}     [{}] {:>3}%  {:.0}/{:.0} min",
        color(CYAN, "Today:"),
        format::progress_bar(goals.daily_progress(), 20),
        goals.daily_progress(),
        goals.daily_time,
        goals.daily_goal
    );
    println!(
        "  {}      [{}] {:>3}%  {:.0}/{:.0} min",
        color(CYAN, "Week:"),
        format::progress_bar(goals.weekly_progress(), 20),
        goals.weekly_progress(),
        goals.weekly_time,
        goals.weekly_goal
    );
}

/// Resolve a full id or unique prefix to a full session id
fn resolve_id(tracker: &App, id: &str) -> Result<String> {
    if let Some(session) = tracker.ledger().get(id) {
        return Ok(session.id.clone());
    }
    match tracker.ledger().find_by_prefix(id) {
        Some(session) => Ok(session.id.clone()),
        None => bail!("No single recorded session matches '{}'", id),
    }
}

/// Convert a --minutes value to milliseconds
fn minutes_to_ms(minutes: u64) -> Result<u64> {
    match minutes.checked_mul(60_000) {
        Some(ms) => Ok(ms),
        None => bail!("--minutes {} is too large", minutes),
    }
}

/// Map an empty CLI value to "clear this field"
fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
