mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use greenhouse_lib::care::UpdatePlantRequest;

#[derive(Parser)]
#[command(name = "greenhouse-cli", about = "Plant care schedules from the terminal", version)]
struct Cli {
    /// Use a specific data directory (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Pretend the current time is this (RFC 3339 or YYYY-MM-DD[THH:MM])
    #[arg(long, global = true)]
    now: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Manage plants
    #[command(subcommand)]
    Plant(PlantCommand),

    /// Manage care tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Show late, due and upcoming care grouped by urgency
    UpNext {
        /// Days ahead to include (default from config.toml)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Show settings, or change them with the flags below
    Config {
        /// Weekday counted as day 1 in weekly rules (e.g. Sun, Mon)
        #[arg(long)]
        first_weekday: Option<String>,
        /// Default Up Next horizon in days
        #[arg(long)]
        up_next_days: Option<u32>,
    },

    /// Print upcoming occurrences of a rule without saving anything
    Preview {
        /// Rule such as daily:3, weekly:1:2,4,6 or monthly:1:1,15
        rule: String,
        /// Number of occurrences
        #[arg(long, default_value = "5")]
        count: usize,
    },
}

#[derive(Subcommand)]
enum PlantCommand {
    /// Register a plant
    Add {
        name: String,
        #[arg(long)]
        species: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Edit a plant's details
    Edit {
        /// Plant name (case-insensitive prefix match)
        plant: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        species: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List plants
    List,

    /// Remove a plant and its care tasks
    Remove {
        /// Plant name (case-insensitive prefix match)
        plant: String,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    /// Assign a care task to a plant
    Add {
        /// Plant name (case-insensitive prefix match)
        plant: String,
        /// Care kind: water, fertilize, mist, repot, prune, rotate or any label
        kind: String,
        /// Repeat rule such as daily:3 or weekly:1:2,4,6 (omit for a one-off task)
        #[arg(long)]
        every: Option<String>,
        /// First due date (default: now)
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Change a task's repeat rule or notes
    Edit {
        /// Task ID (prefix)
        task: String,
        /// New repeat rule; a missing day list gets a default (weekly:1)
        #[arg(long, conflicts_with = "once")]
        every: Option<String>,
        /// Stop repeating; the task becomes one-off
        #[arg(long)]
        once: bool,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List care tasks
    List {
        /// Filter by plant name
        #[arg(long)]
        plant: Option<String>,
    },

    /// Mark a task done now
    Done {
        /// Task ID (prefix)
        task: String,
    },

    /// Undo the latest completion of a task
    Undo {
        /// Task ID (prefix)
        task: String,
    },

    /// Delete a care task
    Remove {
        /// Task ID (prefix)
        task: String,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let now = cli.now.as_deref().map(app::parse_datetime).transpose()?;

    let app = app::App::new(cli.data_dir, now)?;

    match cli.command {
        Command::Plant(subcmd) => match subcmd {
            PlantCommand::Add { name, species, location, notes } => {
                commands::plant::run_add(&app, name, species, location, notes, &cli.format)?;
            }
            PlantCommand::Edit { plant, name, species, location, notes } => {
                let updates = UpdatePlantRequest { name, species, location, notes };
                commands::plant::run_edit(&app, &plant, updates, &cli.format)?;
            }
            PlantCommand::List => {
                commands::plant::run_list(&app, &cli.format)?;
            }
            PlantCommand::Remove { plant } => {
                commands::plant::run_remove(&app, &plant, &cli.format)?;
            }
        },
        Command::Task(subcmd) => match subcmd {
            TaskCommand::Add { plant, kind, every, start, notes } => {
                commands::task::run_add(
                    &app,
                    &plant,
                    &kind,
                    every.as_deref(),
                    start.as_deref(),
                    notes,
                    &cli.format,
                )?;
            }
            TaskCommand::Edit { task, every, once, notes } => {
                commands::task::run_edit(&app, &task, every.as_deref(), once, notes, &cli.format)?;
            }
            TaskCommand::List { plant } => {
                commands::task::run_list(&app, plant.as_deref(), &cli.format)?;
            }
            TaskCommand::Done { task } => {
                commands::task::run_done(&app, &task, &cli.format)?;
            }
            TaskCommand::Undo { task } => {
                commands::task::run_undo(&app, &task, &cli.format)?;
            }
            TaskCommand::Remove { task } => {
                commands::task::run_remove(&app, &task, &cli.format)?;
            }
        },
        Command::UpNext { days } => {
            commands::up_next::run(&app, days, &cli.format)?;
        }
        Command::Config { first_weekday, up_next_days } => {
            commands::config::run(app, first_weekday.as_deref(), up_next_days, &cli.format)?;
        }
        Command::Preview { rule, count } => {
            commands::preview::run(&app, &rule, count, &cli.format)?;
        }
    }

    Ok(())
}
