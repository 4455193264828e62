//! Command implementations for the CLI interface.
//!
//! This module contains the subcommand definitions and their handlers: task
//! and category editing, the list, calendar, kanban and statistics views,
//! import/export and the interactive board.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone};
use clap::{Args, Subcommand};
use clap_complete::{generate, Shell};

use crate::calendar::{self, month_grid, month_name, WEEKDAY_HEADERS};
use crate::db::*;
use crate::error::{Error, Result};
use crate::fields::*;
use crate::query::{self, MonthActivity, TaskFilter};
use crate::task::{split_tags, CategoryInput, Task, TaskInput};
use crate::transfer;
use crate::tui::board_run::run_board;

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "fri", "in 3d", optionally followed by HH:MM.
        #[arg(long)]
        due: Option<String>,
        /// Priority: critical | high | medium | low (or 1-4).
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Category ID or name.
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated tags. May be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Parent task ID or title; makes this a subtask.
        #[arg(long)]
        parent: Option<String>,
        /// Remind this many minutes before the due date.
        #[arg(long)]
        remind: Option<u32>,
    },

    /// Edit fields of an existing task.
    Edit(EditArgs),

    /// Show all fields of a task and its subtasks.
    View {
        /// Task ID, ID prefix or title.
        id: String,
    },

    /// List tasks, optionally filtered.
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Toggle a task between done and to do.
    Done {
        /// Task ID, ID prefix or title.
        id: String,
    },

    /// Move a task to a kanban column.
    Status {
        /// Task ID, ID prefix or title.
        id: String,
        /// Target status: todo | in-progress | done.
        #[arg(value_enum)]
        status: Status,
    },

    /// Delete a task.
    Delete {
        /// Task ID, ID prefix or title.
        id: String,
        /// Also delete the task's subtasks without asking.
        #[arg(long, conflicts_with = "keep_children")]
        cascade: bool,
        /// Delete only the task, leaving its subtasks in place.
        #[arg(long)]
        keep_children: bool,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },

    /// Manage categories.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Print a month calendar with the tasks due on each day.
    Calendar {
        /// Month to show as YYYY-MM (defaults to the current month).
        #[arg(long)]
        month: Option<String>,
        /// Months to move forward (or back, if negative) from --month.
        #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
        shift: i32,
    },

    /// Print tasks grouped into kanban columns.
    Kanban {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Launch the interactive kanban board.
    Board {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show task counters and monthly activity.
    Stats {
        /// Number of months of activity to show.
        #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=i64::from(query::MAX_ACTIVITY_MONTHS)))]
        months: u32,
    },

    /// Export all tasks and categories to a JSON file.
    Export {
        /// Output file (defaults to task-manager-export-<date>.json).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replace all tasks and categories with the contents of an export file.
    Import {
        /// Input JSON file path.
        input: PathBuf,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
        /// Skip creating a backup before import.
        #[arg(long)]
        no_backup: bool,
    },

    /// Show or set the colour theme used by the board.
    Theme {
        /// New theme; prints the current one when omitted.
        #[arg(value_enum)]
        theme: Option<Theme>,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID, ID prefix or title.
    pub id: String,
    /// New title.
    #[arg(long)]
    pub title: Option<String>,
    /// New description.
    #[arg(long)]
    pub desc: Option<String>,
    /// New due date.
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    /// New priority.
    #[arg(long, value_enum)]
    pub priority: Option<Priority>,
    /// New category ID or name.
    #[arg(long, conflicts_with = "clear_category")]
    pub category: Option<String>,
    /// Replace the tags (comma-separated, may be repeated).
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// New parent task ID or title.
    #[arg(long, conflicts_with = "clear_parent")]
    pub parent: Option<String>,
    /// Remind this many minutes before the due date.
    #[arg(long, conflicts_with = "clear_reminder")]
    pub remind: Option<u32>,
    /// Remove the due date.
    #[arg(long)]
    pub clear_due: bool,
    /// Remove the category.
    #[arg(long)]
    pub clear_category: bool,
    /// Remove all tags.
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,
    /// Make the task top level again.
    #[arg(long)]
    pub clear_parent: bool,
    /// Remove the reminder.
    #[arg(long)]
    pub clear_reminder: bool,
}

/// List filters shared by `list`, `kanban` and `board`.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Priority to show: all | critical | high | medium | low.
    #[arg(long, default_value = "all")]
    pub priority: PriorityFilter,
    /// Category to show: all | none | category ID or name.
    #[arg(long, default_value = "all")]
    pub category: String,
    /// Status to show: all | todo | in-progress | done.
    #[arg(long, default_value = "all")]
    pub status: StatusFilter,
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Create a category.
    Add {
        /// Category name.
        name: String,
        /// Parent category ID or name.
        #[arg(long)]
        parent: Option<String>,
        /// Colour as #rrggbb.
        #[arg(long)]
        color: Option<String>,
    },
    /// Rename, recolour or move a category.
    Edit {
        /// Category ID or name.
        id: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New parent category ID or name.
        #[arg(long, conflicts_with = "clear_parent")]
        parent: Option<String>,
        /// New colour as #rrggbb.
        #[arg(long)]
        color: Option<String>,
        /// Make the category top level.
        #[arg(long)]
        clear_parent: bool,
    },
    /// Delete a category. Its tasks and subcategories are kept.
    Delete {
        /// Category ID or name.
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// List categories as a tree.
    List,
}

/// Ask a yes/no question on stdin; anything but "y"/"yes" is no.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} (y/N): ");
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    let answer = response.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn parse_due(input: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_due_input(input, &Local::now()).ok_or_else(|| {
        Error::InvalidArgument(format!(
            "Invalid due date '{input}'. Use YYYY-MM-DD, today, tomorrow, a weekday or 'in 3d', optionally with HH:MM"
        ))
    })
}

fn parse_color(input: &str) -> Result<String> {
    let hex = input.trim();
    let valid = hex.len() == 7 && hex.starts_with('#') && hex[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(hex.to_lowercase())
    } else {
        Err(Error::InvalidArgument(format!("Invalid colour '{input}', expected #rrggbb")))
    }
}

impl FilterArgs {
    /// Resolve the category name, if any, and assemble the list filter.
    pub fn to_filter(&self, db: &Database) -> Result<TaskFilter> {
        let category = match self.category.parse::<CategoryFilter>().map_err(Error::InvalidArgument)? {
            CategoryFilter::Only(name) => CategoryFilter::Only(query::resolve_category(&db.categories, &name)?),
            other => other,
        };
        Ok(TaskFilter {
            priority: self.priority,
            category,
            status: self.status,
        })
    }
}

/// Add a new task to the store.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    db: &mut Database,
    title: String,
    desc: Option<String>,
    due: Option<String>,
    priority: Priority,
    category: Option<String>,
    tags: Vec<String>,
    parent: Option<String>,
    remind: Option<u32>,
) -> Result<()> {
    let due_date = due.as_deref().map(parse_due).transpose()?;
    if remind.is_some() && due_date.is_none() {
        eprintln!("Note: the reminder only takes effect once the task has a due date.");
    }
    let input = TaskInput {
        title,
        description: desc,
        due_date,
        priority,
        category_id: category
            .as_deref()
            .map(|c| query::resolve_category(&db.categories, c))
            .transpose()?,
        tags: split_tags(&tags),
        parent_id: parent
            .as_deref()
            .map(|p| query::resolve_parent(&db.tasks, p, None))
            .transpose()?,
        reminder_minutes: remind,
    };
    let id = db.create_task(input)?;
    if let Some(task) = db.task(&id) {
        println!("Added task {}: {}", short_id(&id), task.title);
    }
    Ok(())
}

/// Update an existing task's fields.
pub fn cmd_edit(db: &mut Database, args: EditArgs) -> Result<()> {
    let id = query::resolve_task(&db.tasks, &args.id)?;
    let Some(task) = db.task(&id) else {
        return Err(Error::TaskNotFound(id));
    };
    let mut input = TaskInput::from_task(task);

    if let Some(title) = args.title {
        input.title = title;
    }
    if let Some(desc) = args.desc {
        input.description = Some(desc);
    }
    if let Some(due) = args.due {
        input.due_date = Some(parse_due(&due)?);
    }
    if args.clear_due {
        input.due_date = None;
    }
    if let Some(priority) = args.priority {
        input.priority = priority;
    }
    if let Some(category) = args.category {
        input.category_id = Some(query::resolve_category(&db.categories, &category)?);
    }
    if args.clear_category {
        input.category_id = None;
    }
    if !args.tags.is_empty() {
        input.tags = split_tags(&args.tags);
    }
    if args.clear_tags {
        input.tags.clear();
    }
    if let Some(parent) = args.parent {
        input.parent_id = Some(query::resolve_parent(&db.tasks, &parent, Some(id.as_str()))?);
    }
    if args.clear_parent {
        input.parent_id = None;
    }
    if let Some(minutes) = args.remind {
        input.reminder_minutes = Some(minutes);
    }
    if args.clear_reminder {
        input.reminder_minutes = None;
    }

    db.update_task(&id, input)?;
    println!("Updated task {}.", short_id(&id));
    Ok(())
}

/// Print every field of a task followed by its subtasks.
pub fn cmd_view(db: &Database, id: String) -> Result<()> {
    let id = query::resolve_task(&db.tasks, &id)?;
    let Some(task) = db.task(&id) else {
        return Err(Error::TaskNotFound(id));
    };
    let now = Local::now();
    let parent = match task.parent_id.as_deref() {
        Some(pid) => match db.task(pid) {
            Some(p) => format!("{} ({})", short_id(pid), p.title),
            None => format!("{pid} (deleted)"),
        },
        None => "-".into(),
    };
    let reminder = match (task.reminder_minutes, task.reminder_time) {
        (Some(minutes), Some(at)) => format!("{} ({minutes} min before)", format_timestamp(Some(at))),
        (Some(minutes), None) => format!("{minutes} min before due (no due date)"),
        _ => "-".into(),
    };

    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", format_status(task.status));
    println!("Priority:     {}", format_priority(task.priority));
    println!("Due:          {}", format_due(task.due_date, now));
    println!("Reminder:     {reminder}");
    println!("Category:     {}", query::category_label(&db.categories, task.category_id.as_deref()));
    println!("Parent:       {parent}");
    println!("Tags:         {}", if task.tags.is_empty() { "-".into() } else { task.tags.join(",") });
    println!("Created:      {}", format_timestamp(Some(task.created_at)));
    println!("Completed:    {}", format_timestamp(task.completed_at));
    println!("Overdue:      {}", if query::is_overdue(task, db.now()) { "yes" } else { "no" });
    println!("Description:\n{}\n", task.description.as_deref().unwrap_or("-"));

    let children = query::children_of(&db.tasks, &task.id);
    println!("Subtasks:");
    if children.is_empty() {
        println!("  -");
    }
    for child in children {
        let check = if child.is_done() { "x" } else { " " };
        println!("  [{check}] {} (#{})", child.title, short_id(&child.id));
    }
    Ok(())
}

/// List tasks with the given filters.
pub fn cmd_list(db: &Database, filter: FilterArgs) -> Result<()> {
    let filter = filter.to_filter(db)?;
    let tasks = query::filtered_tasks(&db.tasks, &filter);
    if tasks.is_empty() {
        println!("No tasks match the filters.");
        return Ok(());
    }
    print_table(&tasks, db);
    Ok(())
}

/// Toggle a task's completion.
pub fn cmd_done(db: &mut Database, id: String) -> Result<()> {
    let id = query::resolve_task(&db.tasks, &id)?;
    let status = db.toggle_status(&id)?;
    println!("Task {} is now {}.", short_id(&id), format_status(status));
    Ok(())
}

/// Move a task to a kanban column.
pub fn cmd_status(db: &mut Database, id: String, status: Status) -> Result<()> {
    let id = query::resolve_task(&db.tasks, &id)?;
    if db.set_status(&id, status)? {
        println!("Moved task {} to {}.", short_id(&id), format_status(status));
    } else {
        println!("Task {} is already {}.", short_id(&id), format_status(status));
    }
    Ok(())
}

/// Delete a task, asking whether its subtasks go with it.
pub fn cmd_delete(db: &mut Database, id: String, cascade: bool, keep_children: bool, yes: bool) -> Result<()> {
    let id = query::resolve_task(&db.tasks, &id)?;
    let Some(task) = db.task(&id) else {
        return Err(Error::TaskNotFound(id));
    };
    let title = task.title.clone();
    let has_subtasks = db.has_subtasks(&id);

    if !yes && !confirm(&format!("Delete task '{title}'?"))? {
        println!("Delete cancelled.");
        return Ok(());
    }

    let with_children = if !has_subtasks || keep_children {
        false
    } else if cascade || yes {
        true
    } else if confirm("Task has subtasks. Delete them too?")? {
        true
    } else {
        println!("Delete cancelled.");
        return Ok(());
    };

    let removed = if with_children {
        db.delete_task_with_children(&id)?
    } else {
        db.delete_task_only(&id)?
    };
    println!("Deleted {removed} task(s).");
    Ok(())
}

/// Handle category management commands.
pub fn cmd_category(db: &mut Database, action: CategoryAction) -> Result<()> {
    match action {
        CategoryAction::Add { name, parent, color } => {
            let input = CategoryInput {
                name,
                parent_id: parent
                    .as_deref()
                    .map(|p| query::resolve_category(&db.categories, p))
                    .transpose()?,
                color: match color {
                    Some(c) => parse_color(&c)?,
                    None => CategoryInput::default().color,
                },
            };
            let id = db.create_category(input)?;
            println!("Added category {}", query::category_path_label(&db.categories, &id));
        }
        CategoryAction::Edit {
            id,
            name,
            parent,
            color,
            clear_parent,
        } => {
            let id = query::resolve_category(&db.categories, &id)?;
            let Some(category) = db.category(&id) else {
                return Err(Error::CategoryNotFound(id));
            };
            let mut input = CategoryInput::from_category(category);
            if let Some(name) = name {
                input.name = name;
            }
            if let Some(parent) = parent {
                input.parent_id = Some(query::resolve_category(&db.categories, &parent)?);
            }
            if clear_parent {
                input.parent_id = None;
            }
            if let Some(color) = color {
                input.color = parse_color(&color)?;
            }
            db.update_category(&id, input)?;
            println!("Updated category {}", query::category_path_label(&db.categories, &id));
        }
        CategoryAction::Delete { id, yes } => {
            let id = query::resolve_category(&db.categories, &id)?;
            let label = query::category_path_label(&db.categories, &id);
            if !yes && !confirm(&format!("Delete category '{label}'?"))? {
                println!("Delete cancelled.");
                return Ok(());
            }
            db.delete_category(&id)?;
            println!("Deleted category {label}.");
        }
        CategoryAction::List => {
            println!("{:<38} {:<9} {:>5}  Name", "ID", "Colour", "Tasks");
            for (depth, category) in query::category_tree(&db.categories) {
                let count = db
                    .tasks
                    .iter()
                    .filter(|t| t.category_id.as_deref() == Some(category.id.as_str()))
                    .count();
                println!(
                    "{:<38} {:<9} {:>5}  {}{}",
                    category.id,
                    category.color,
                    count,
                    "  ".repeat(depth),
                    category.name
                );
            }
        }
    }
    Ok(())
}

/// Render a month as a Monday-first grid, marking days with tasks due, then
/// list those tasks day by day.
pub fn render_month<Tz>(tasks: &[Task], year: i32, month: u32, today: NaiveDate, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    let Some(grid) = month_grid(year, month) else {
        return out;
    };

    let _ = writeln!(out, "{:^35}", format!("{} {year}", month_name(month)));
    for header in WEEKDAY_HEADERS {
        let _ = write!(out, "{header:>4} ");
    }
    out.push('\n');

    let mut agenda = Vec::new();
    for week in grid.chunks(7) {
        for cell in week {
            let due = if cell.in_month {
                query::tasks_for_day(tasks, cell.date, tz)
            } else {
                Vec::new()
            };
            let day = if cell.in_month {
                format!("{:>2}", cell.date.day())
            } else {
                "  ".to_string()
            };
            let marker = match (cell.date == today && cell.in_month, due.is_empty()) {
                (true, _) => '<',
                (false, false) => '*',
                (false, true) => ' ',
            };
            let count = if due.is_empty() { ' ' } else { char::from_digit(due.len().min(9) as u32, 10).unwrap_or('+') };
            let _ = write!(out, " {day}{marker}{count}");
            if !due.is_empty() {
                agenda.push((cell.date, due));
            }
        }
        out.push('\n');
    }

    for (date, due) in agenda {
        let _ = writeln!(out, "\n{}", date.format("%a %Y-%m-%d"));
        for task in due {
            let time = task
                .due_date
                .map(|d| d.with_timezone(tz).format("%H:%M").to_string())
                .unwrap_or_default();
            let check = if task.is_done() { "x" } else { " " };
            let _ = writeln!(out, "  [{check}] {time} {} (#{})", task.title, short_id(&task.id));
        }
    }
    out
}

/// Print the month calendar.
pub fn cmd_calendar(db: &Database, month: Option<String>, shift: i32) -> Result<()> {
    let now = Local::now();
    let (year, month) = match month {
        Some(m) => calendar::parse_month(&m)
            .ok_or_else(|| Error::InvalidArgument(format!("Invalid month '{m}', expected YYYY-MM")))?,
        None => (now.year(), now.month()),
    };
    let (year, month) = calendar::shift_month(year, month, shift)
        .ok_or_else(|| Error::InvalidArgument(format!("Month shift {shift} is out of range")))?;
    print!("{}", render_month(&db.tasks, year, month, now.date_naive(), &Local));
    Ok(())
}

/// Print the tasks of each kanban column.
pub fn cmd_kanban(db: &Database, filter: FilterArgs) -> Result<()> {
    let filter = filter.to_filter(db)?;
    let board = query::group_by_status(query::filtered_tasks(&db.tasks, &filter));
    let now = db.now();
    for status in Status::COLUMNS {
        let column = board.column(status);
        println!("== {} ({}) ==", format_status(status), column.len());
        for task in column {
            let overdue = if query::is_overdue(task, now) { " !" } else { "" };
            println!(
                "  #{} [{}] {}{overdue}",
                short_id(&task.id),
                format_priority(task.priority),
                task.title
            );
        }
        println!();
    }
    Ok(())
}

/// Launch the interactive board.
pub fn cmd_board(db: Database, filter: FilterArgs) -> Result<()> {
    let filter = filter.to_filter(&db)?;
    let theme = db.theme()?;
    run_board(db, filter, theme)?;
    Ok(())
}

/// Render created/completed counts per month as horizontal bars.
pub fn render_activity(activity: &[MonthActivity]) -> String {
    const BAR_WIDTH: usize = 30;
    let max = activity
        .iter()
        .map(|m| m.created.max(m.completed))
        .max()
        .unwrap_or(0)
        .max(1);
    let bar = |n: usize| "█".repeat((n * BAR_WIDTH).div_ceil(max));

    let mut out = String::new();
    for month in activity {
        let _ = writeln!(out, "{:<15} created   {:>4} {}", month.label(), month.created, bar(month.created));
        let _ = writeln!(out, "{:<15} completed {:>4} {}", "", month.completed, bar(month.completed));
    }
    out
}

/// Print statistics and monthly activity.
pub fn cmd_stats(db: &Database, months: u32) -> Result<()> {
    let stats = query::stats(&db.tasks, db.now());
    println!("Total tasks:     {}", stats.total);
    println!("Completed:       {}", stats.completed);
    println!("Overdue:         {}", stats.overdue);
    if months > 0 {
        println!("\nActivity in recent months:");
        let now: DateTime<Local> = db.now().with_timezone(&Local);
        print!("{}", render_activity(&query::monthly_activity(&db.tasks, &now, months)));
    }
    Ok(())
}

/// Write the export document.
pub fn cmd_export(db: &Database, output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from(transfer::export_file_name(Local::now().date_naive())));
    let document = transfer::export_document(db)?;
    fs::write(&path, document)?;
    println!(
        "Exported {} task(s) and {} categories to {}",
        db.tasks.len(),
        db.categories.len(),
        path.display()
    );
    Ok(())
}

/// Replace the store's contents with an export file, after a backup.
pub fn cmd_import(db: &mut Database, data_dir: &Path, input: PathBuf, yes: bool, no_backup: bool) -> Result<()> {
    let text = fs::read_to_string(&input)?;
    let document = transfer::parse_import(&text)?;

    if !yes
        && !confirm(&format!(
            "Replace {} task(s) and {} categories with {} task(s) and {} categories from {}?",
            db.tasks.len(),
            db.categories.len(),
            document.tasks.len(),
            document.categories.len(),
            input.display()
        ))?
    {
        println!("Import cancelled.");
        return Ok(());
    }

    if !no_backup {
        match transfer::create_backup(data_dir) {
            Ok(paths) => {
                for path in paths {
                    println!("Created backup: {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("Warning: Failed to create backup: {e}");
                if !yes && !confirm("Continue without backup?")? {
                    println!("Import cancelled.");
                    return Ok(());
                }
            }
        }
    }

    let (tasks, categories) = (document.tasks.len(), document.categories.len());
    db.replace_all(document.tasks, document.categories)?;
    println!("Imported {tasks} task(s) and {categories} categories.");
    Ok(())
}

/// Print or store the theme preference.
pub fn cmd_theme(db: &mut Database, theme: Option<Theme>) -> Result<()> {
    match theme {
        Some(theme) => {
            db.set_theme(theme)?;
            println!("Theme set to {}.", theme.as_str());
        }
        None => println!("{}", db.theme()?.as_str()),
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{at, fixture};
    use chrono::Utc;

    #[test]
    fn month_view_marks_due_days_and_lists_them() {
        let (mut db, _, _) = fixture(at(2024, 6, 1, 8, 0));
        db.create_task(TaskInput {
            title: "Dentist".into(),
            due_date: Some(at(2024, 6, 12, 9, 30)),
            ..TaskInput::default()
        })
        .unwrap();
        // Falls in the grid's trailing days, which never list tasks.
        db.create_task(TaskInput {
            title: "Holiday".into(),
            due_date: Some(at(2024, 7, 2, 9, 0)),
            ..TaskInput::default()
        })
        .unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let text = render_month(&db.tasks, 2024, 6, today, &Utc);
        assert!(text.contains("June 2024"));
        assert!(text.contains("12*1"));
        assert!(text.contains(" 3<"));
        assert!(text.contains("Wed 2024-06-12"));
        assert!(text.contains("09:30 Dentist"));
        assert!(!text.contains("Holiday"));
        // Title, weekday header and six weeks come before the agenda.
        assert_eq!(text.lines().position(str::is_empty), Some(8));
    }

    #[test]
    fn activity_bars_scale_to_the_busiest_month() {
        let activity = vec![
            MonthActivity { year: 2024, month: 5, created: 2, completed: 0 },
            MonthActivity { year: 2024, month: 6, created: 4, completed: 1 },
        ];
        let text = render_activity(&activity);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("May 2024"));
        assert!(lines[2].ends_with(&"█".repeat(30)));
        assert!(lines[1].trim_end().ends_with('0'));
    }

    #[test]
    fn filter_args_resolve_category_names() {
        let (db, _, _) = fixture(at(2024, 6, 1, 8, 0));
        let args = FilterArgs {
            priority: PriorityFilter::All,
            category: "programming".into(),
            status: StatusFilter::Only(Status::Done),
        };
        let filter = args.to_filter(&db).unwrap();
        assert_eq!(filter.category, CategoryFilter::Only("4".into()));
        assert_eq!(filter.status, StatusFilter::Only(Status::Done));

        let none = FilterArgs { category: "none".into(), ..args.clone() };
        assert_eq!(none.to_filter(&db).unwrap().category, CategoryFilter::Uncategorized);

        let missing = FilterArgs { category: "Garden".into(), ..args };
        assert!(matches!(missing.to_filter(&db), Err(Error::CategoryNotFound(_))));
    }

    #[test]
    fn colours_must_be_hex() {
        assert_eq!(parse_color("#3A86FF").unwrap(), "#3a86ff");
        assert!(parse_color("blue").is_err());
        assert!(parse_color("#12345").is_err());
    }
}
