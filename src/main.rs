//! # tm - Personal Task Manager CLI
//!
//! A command-line task manager with single-level subtasks, hierarchical
//! categories, a month calendar, a kanban board and activity statistics.
//!
//! ## Key Features
//!
//! - **Tasks and Subtasks**: Priority, due date with reminder, category, tags,
//!   and one level of subtasks under a top-level task
//! - **Category Tree**: Nested categories with colours, shown as full paths
//!   ("Projects → Programming")
//! - **Multiple Views**: Filtered list, month calendar, printed kanban columns
//!   and an interactive kanban board (TUI)
//! - **Local File Storage**: Plain JSON files with full export/import and
//!   automatic backups before an import
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a task due tomorrow at 9:30 with a reminder 15 minutes before
//! tm add "Call the plumber" --due "tomorrow 09:30" --remind 15 --category Home
//!
//! # List open high-priority tasks
//! tm list --priority high --status todo
//!
//! # Open the kanban board
//! tm board
//! ```
//!
//! Data is stored in `~/.task-manager/` unless `--data-dir` or `TM_DATA_DIR`
//! points elsewhere. Set `RUST_LOG=task_manager=debug` to trace loads and saves.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod calendar;
pub mod cli;
pub mod clock;
pub mod cmd;
pub mod db;
pub mod error;
pub mod fields;
pub mod ops;
pub mod query;
pub mod storage;
pub mod task;
pub mod transfer;
pub mod tui {
    pub mod board;
    pub mod board_run;
    pub mod colors;
}

use cli::Cli;
use clock::SystemClock;
use cmd::*;
use db::Database;
use error::Result;
use storage::FileStorage;

fn main() {
    // Tracing is opt-in via RUST_LOG and goes to stderr.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    // Completions need no store.
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return Ok(());
    }

    let data_dir = cli.resolve_data_dir();
    let storage = FileStorage::open(&data_dir)?;
    let mut db = Database::load(Box::new(storage), Box::new(SystemClock))?;

    match cli.command {
        Commands::Add {
            title,
            desc,
            due,
            priority,
            category,
            tags,
            parent,
            remind,
        } => cmd_add(&mut db, title, desc, due, priority, category, tags, parent, remind),

        Commands::Edit(args) => cmd_edit(&mut db, args),

        Commands::View { id } => cmd_view(&db, id),

        Commands::List { filter } => cmd_list(&db, filter),

        Commands::Done { id } => cmd_done(&mut db, id),

        Commands::Status { id, status } => cmd_status(&mut db, id, status),

        Commands::Delete {
            id,
            cascade,
            keep_children,
            yes,
        } => cmd_delete(&mut db, id, cascade, keep_children, yes),

        Commands::Category { action } => cmd_category(&mut db, action),

        Commands::Calendar { month, shift } => cmd_calendar(&db, month, shift),

        Commands::Kanban { filter } => cmd_kanban(&db, filter),

        Commands::Board { filter } => cmd_board(db, filter),

        Commands::Stats { months } => cmd_stats(&db, months),

        Commands::Export { output } => cmd_export(&db, output),

        Commands::Import { input, yes, no_backup } => cmd_import(&mut db, &data_dir, input, yes, no_backup),

        Commands::Theme { theme } => cmd_theme(&mut db, theme),

        Commands::Completions { .. } => Ok(()),
    }
}
