mod app;
mod domain;
mod persistence;
mod report;
mod suggest;

use anyhow::{Context, Result};
use app::{App, AppState, ACTIVITY_BOOST};
use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use domain::{SphereKey, Task};
use persistence::{init_local_dir, FileStore, KeyValueStore, LoadOutcome};
use std::path::PathBuf;
use std::time::Duration;
use suggest::{daily_check_in, micro_action_by_name, weekly_plan, Suggestion, UreqTransport};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "HARMONIA_LOG";

#[derive(Parser)]
#[command(name = "harmonia")]
#[command(about = "Track balance across six life spheres, with focus tasks, a journal and micro-habit suggestions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .harmonia directory in the current directory
    Init,
    /// Show spheres, harmony score and open tasks (default)
    Status,
    /// Set a sphere's progress (0-100, clamped)
    Set {
        sphere: SphereKey,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Log an activity for a sphere and give it a small boost
    Log {
        sphere: SphereKey,
        text: String,
        /// Progress points to add
        #[arg(short, long, default_value_t = ACTIVITY_BOOST, allow_negative_numbers = true)]
        boost: i32,
    },
    /// Manage focus tasks
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Write or read journal entries
    Journal {
        #[command(subcommand)]
        action: JournalCommand,
    },
    /// Get a micro-habit suggestion
    Suggest {
        /// Add the suggestion as a task and an active habit
        #[arg(long)]
        accept: bool,
        /// Remote call timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Use the fixed template for this sphere instead of resolving
        #[arg(long)]
        sphere: Option<String>,
    },
    /// Daily check-in: mood prompt and one small action
    Checkin,
    /// Weekly plan for the three weakest spheres
    Plan,
    /// Edit preferences
    Config {
        /// Enable or disable remote suggestions (on/off)
        #[arg(long, value_parser = BoolishValueParser::new())]
        ai: Option<bool>,
        /// Remote suggestion endpoint
        #[arg(long)]
        api_url: Option<String>,
        /// Forget the remote suggestion endpoint
        #[arg(long, conflicts_with = "api_url")]
        clear_api_url: bool,
        /// Mark onboarding as completed
        #[arg(long)]
        onboarded: bool,
    },
    /// Generate a markdown report
    Report {
        /// Date to stamp the report with (YYYY-MM-DD format). Defaults to today.
        #[arg(short, long)]
        date: Option<String>,
        /// Output file path. Defaults to <data dir>/report-YYYY-MM-DD.md
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Add a task at the top of the list
    Add {
        text: String,
        #[arg(short, long)]
        sphere: Option<SphereKey>,
    },
    /// Toggle a task's completion
    Done { id: String },
    /// Delete a task
    Rm { id: String },
    /// List tasks, most recent first
    List,
}

#[derive(Subcommand)]
enum JournalCommand {
    /// Append an entry
    Add {
        /// Mood from 1 to 10
        #[arg(short, long)]
        mood: Option<i64>,
        #[arg(short, long, default_value = "")]
        gratitude: String,
        #[arg(short, long, default_value = "")]
        reflection: String,
    },
    /// List entries, newest first
    List,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            let dir = init_local_dir()?;
            println!("Initialized harmonia directory: {}", dir.display());
            println!();
            println!("Harmonia will now keep its state in this local directory.");
            Ok(())
        }
        command => run(command.unwrap_or(Commands::Status)),
    }
}

fn run(command: Commands) -> Result<()> {
    let store = FileStore::open_default()?;
    let (mut app, outcome) = App::open(store);
    match outcome {
        LoadOutcome::Restored { skipped } if skipped > 0 => {
            eprintln!("Warning: skipped {} malformed saved item(s)", skipped);
        }
        _ => {
            if let Some(e) = outcome.error() {
                eprintln!("Warning: {}", e);
                eprintln!("Starting from the default state.");
            }
        }
    }

    match command {
        Commands::Init | Commands::Status => print_status(app.state()),
        Commands::Set { sphere, value } => {
            if app.set_progress(sphere.as_str(), value) {
                let s = app.state().spheres.get(sphere);
                println!("{} {}: {}%", s.icon, s.name, s.progress);
                println!("Harmony score: {}", app.state().harmony_score);
            } else {
                eprintln!("Ignored: '{}' is not a number", value);
            }
        }
        Commands::Log { sphere, text, boost } => match app.log_activity(sphere, &text, boost) {
            Some(_) => {
                let s = app.state().spheres.get(sphere);
                println!("Logged for {} {}: now {}%", s.icon, s.name, s.progress);
            }
            None => eprintln!("Ignored: activity text is empty"),
        },
        Commands::Task { action } => match run_task(&mut app, action) {
            Ok(out) => println!("{}", out),
            Err(msg) => eprintln!("{}", msg),
        },
        Commands::Journal { action } => run_journal(&mut app, action),
        Commands::Suggest {
            accept,
            timeout,
            sphere,
        } => {
            let suggestion = match sphere {
                Some(name) => Suggestion {
                    recommended_action: micro_action_by_name(&name),
                    reason: format!("Template for '{}'", name),
                    sphere_key: name.parse().ok(),
                },
                None => {
                    let mut config = app.suggestion_config();
                    if let Some(secs) = timeout {
                        config = config.with_timeout(Duration::from_secs(secs));
                    }
                    app.suggest(&config, &UreqTransport)
                }
            };
            print_suggestion(&suggestion);

            if accept {
                match app.accept_suggestion(&suggestion) {
                    Some((task_id, _)) => println!("Added as task {}", short_id(&task_id)),
                    None => eprintln!("Ignored: suggestion has no text"),
                }
            }
        }
        Commands::Checkin => {
            let check = daily_check_in(&app.state().spheres);
            println!("{}", check.mood_prompt);
            println!("  → harmonia journal add --mood <1-10>");
            println!();
            print_suggestion(&check.suggestion);
        }
        Commands::Plan => {
            for entry in weekly_plan(&app.state().spheres) {
                let s = app.state().spheres.get(entry.sphere);
                let duration = entry
                    .habit
                    .rounded_minutes()
                    .map(|m| format!(" ({} min)", m))
                    .unwrap_or_default();
                println!("{} {:<14} {}: {}{}", s.icon, s.name, entry.day, entry.habit.text, duration);
            }
        }
        Commands::Config {
            ai,
            api_url,
            clear_api_url,
            onboarded,
        } => {
            app.update_preferences(|prefs| {
                if let Some(enabled) = ai {
                    prefs.ai_enabled = enabled;
                }
                if let Some(url) = api_url {
                    prefs.ai_api_url = Some(url.trim().to_string()).filter(|u| !u.is_empty());
                }
                if clear_api_url {
                    prefs.ai_api_url = None;
                }
                if onboarded {
                    prefs.onboarding_completed = true;
                }
            });
            let prefs = &app.state().preferences;
            println!("AI suggestions: {}", if prefs.ai_enabled { "on" } else { "off" });
            println!("API URL: {}", prefs.ai_api_url.as_deref().unwrap_or("(none)"));
            println!("Onboarding completed: {}", prefs.onboarding_completed);
        }
        Commands::Report { date, output } => {
            let report_date = date
                .map(|d| {
                    chrono::NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date format. Use YYYY-MM-DD: {}", d))
                })
                .transpose()?;
            let path = report::generate_report(app.state(), report_date, output.map(PathBuf::from))?;
            println!("Report generated: {}", path.display());
        }
    }

    if let Some(e) = app.take_save_error() {
        eprintln!("Warning: changes could not be saved: {}", e);
    }
    Ok(())
}

/// Run a task subcommand. `Ok` text goes to stdout, `Err` text to stderr.
fn run_task<S: KeyValueStore>(app: &mut App<S>, action: TaskCommand) -> Result<String, String> {
    match action {
        TaskCommand::Add { text, sphere } => app
            .add_task(&text, sphere)
            .map(|id| format!("Added task {}", short_id(&id)))
            .ok_or_else(|| "Ignored: task text is empty".to_string()),
        TaskCommand::Done { id } => {
            let resolved = app.state().focus_tasks.resolve_id(&id).map(str::to_string);
            let Some(full_id) = resolved else {
                return Err(format!("No task matches '{}'", id));
            };
            match app.toggle_task(&full_id) {
                Some(completed) => {
                    let state = if completed { "completed" } else { "reopened" };
                    Ok(format!("Task {} {}", short_id(&full_id), state))
                }
                None => Err(format!("No task matches '{}'", id)),
            }
        }
        TaskCommand::Rm { id } => {
            let resolved = app.state().focus_tasks.resolve_id(&id).map(str::to_string);
            match resolved.and_then(|full_id| app.remove_task(&full_id)) {
                Some(task) => Ok(format!("Removed \"{}\"", task.text)),
                None => Err(format!("No task matches '{}', nothing removed", id)),
            }
        }
        TaskCommand::List => {
            let state = app.state();
            if state.focus_tasks.is_empty() {
                return Ok("No tasks.".to_string());
            }
            let lines: Vec<String> = state.focus_tasks.iter().map(|t| format_task(state, t)).collect();
            Ok(lines.join("\n"))
        }
    }
}

fn run_journal(app: &mut App<FileStore>, action: JournalCommand) {
    match action {
        JournalCommand::Add {
            mood,
            gratitude,
            reflection,
        } => match app.add_journal_entry(mood, &gratitude, &reflection) {
            Some(_) => {
                if let Some(avg) = app.state().mood_average() {
                    println!("Entry saved. Average mood: {:.1}/10", avg);
                } else {
                    println!("Entry saved.");
                }
            }
            None => eprintln!("Ignored: entry is empty"),
        },
        JournalCommand::List => {
            let entries = &app.state().journal_entries;
            if entries.is_empty() {
                println!("No journal entries.");
                return;
            }
            for entry in entries.iter().rev() {
                let mood = entry
                    .mood
                    .map(|m| format!("mood {}/10", m))
                    .unwrap_or_else(|| "no mood".to_string());
                println!("{} ({})", entry.created_at.format("%Y-%m-%d %H:%M"), mood);
                if !entry.gratitude.is_empty() {
                    println!("  Gratitude: {}", entry.gratitude);
                }
                if !entry.reflection.is_empty() {
                    println!("  Reflection: {}", entry.reflection);
                }
            }
            if let Some(avg) = app.state().mood_average() {
                println!();
                println!("Average mood (latest entries): {:.1}/10", avg);
            }
        }
    }
}

fn print_status(state: &AppState) {
    println!(
        "Harmony score: {}/100  {}",
        state.harmony_score,
        report::harmony_message(state.harmony_score)
    );
    println!();
    for sphere in state.spheres.iter() {
        println!(
            "{} {:<14} {} {:>3}%",
            sphere.icon,
            sphere.name,
            report::progress_bar(sphere.progress, 20),
            sphere.progress
        );
    }
    let lowest = state.spheres.lowest();
    println!();
    println!("Needs attention: {} {}", lowest.icon, lowest.name);
    if let Some(avg) = state.mood_average() {
        println!("Average mood: {:.1}/10", avg);
    }

    let open: Vec<&Task> = state.focus_tasks.iter().filter(|t| !t.completed).collect();
    println!();
    println!("Open tasks ({}):", open.len());
    for task in open {
        println!("{}", format_task(state, task));
    }
}

fn print_suggestion(suggestion: &Suggestion) {
    let action = &suggestion.recommended_action;
    match action.rounded_minutes() {
        Some(min) => println!("Suggestion: {} ({} min)", action.text, min),
        None => println!("Suggestion: {}", action.text),
    }
    if !suggestion.reason.is_empty() {
        println!("Why: {}", suggestion.reason);
    }
}

fn format_task(state: &AppState, task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    let icon = task
        .sphere_key
        .map(|key| format!(" {}", state.spheres.get(key).icon))
        .unwrap_or_default();
    format!("[{}] {}{} {}", mark, short_id(&task.id), icon, task.text)
}

/// Trailing 8 characters of an id, enough to address a task from the CLI
fn short_id(id: &str) -> &str {
    match id.char_indices().rev().nth(7) {
        Some((i, _)) => &id[i..],
        None => id,
    }
}
