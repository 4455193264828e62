//! The task store and display/parsing helpers.
//!
//! This module provides the `Database` struct that owns the task and category
//! collections and round-trips them through a [`Storage`], along with helper
//! functions for date parsing, formatting and table output.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::fields::*;
use crate::query;
use crate::storage::{Storage, CATEGORIES_KEY, TASKS_KEY, THEME_KEY};
use crate::task::{Category, Task};

/// UI colour scheme preference kept alongside the collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Owns the task and category collections.
///
/// Every mutation is followed by a full-collection save through the storage
/// capability; there is no batching.
pub struct Database {
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
    storage: Box<dyn Storage>,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("tasks", &self.tasks.len())
            .field("categories", &self.categories.len())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Load both collections, seeding the default category tree when no
    /// categories have ever been stored.
    pub fn load(storage: Box<dyn Storage>, clock: Box<dyn Clock>) -> Result<Self> {
        let tasks: Vec<Task> = read_collection(storage.as_ref(), TASKS_KEY)?.unwrap_or_default();
        let stored_categories: Option<Vec<Category>> = read_collection(storage.as_ref(), CATEGORIES_KEY)?;

        let mut db = Database {
            tasks,
            categories: Vec::new(),
            storage,
            clock,
        };
        match stored_categories {
            Some(categories) => db.categories = categories,
            None => {
                info!("no stored categories, seeding defaults");
                db.categories = default_categories();
                db.save_categories()?;
            }
        }
        debug!(tasks = db.tasks.len(), categories = db.categories.len(), "loaded store");
        Ok(db)
    }

    /// Persist the task collection as a complete snapshot.
    pub fn save_tasks(&mut self) -> Result<()> {
        write_collection(self.storage.as_mut(), TASKS_KEY, &self.tasks)
    }

    /// Persist the category collection as a complete snapshot.
    pub fn save_categories(&mut self) -> Result<()> {
        write_collection(self.storage.as_mut(), CATEGORIES_KEY, &self.categories)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Generate an identifier unused by any loaded task or category.
    pub fn next_id(&self) -> String {
        let taken: HashSet<&str> = self
            .tasks
            .iter()
            .map(|t| t.id.as_str())
            .chain(self.categories.iter().map(|c| c.id.as_str()))
            .collect();
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !taken.contains(id.as_str()) {
                return id;
            }
        }
    }

    /// Get a task by ID.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn category_mut(&mut self, id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.id == id)
    }

    /// Stored theme preference, `Light` when unset or unrecognised.
    pub fn theme(&self) -> Result<Theme> {
        let stored: Option<String> = read_collection(self.storage.as_ref(), THEME_KEY)?;
        Ok(match stored.as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        })
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        write_collection(self.storage.as_mut(), THEME_KEY, &theme.as_str())
    }
}

fn read_collection<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Result<Option<T>> {
    match storage.read(key)? {
        Some(data) => serde_json::from_str(&data).map(Some).map_err(|e| Error::persistence(key, e)),
        None => Ok(None),
    }
}

fn write_collection<T: Serialize + ?Sized>(storage: &mut dyn Storage, key: &str, value: &T) -> Result<()> {
    let data = serde_json::to_string(value).map_err(|e| Error::persistence(key, e))?;
    storage.write(key, &data)
}

/// The category tree a fresh store starts with.
pub fn default_categories() -> Vec<Category> {
    let category = |id: &str, name: &str, parent: Option<&str>, color: &str| Category {
        id: id.to_string(),
        name: name.to_string(),
        parent_id: parent.map(str::to_string),
        color: color.to_string(),
    };
    vec![
        category("1", "Work", None, "#3a86ff"),
        category("2", "Home", None, "#2ecc71"),
        category("3", "Projects", None, "#8338ec"),
        category("4", "Programming", Some("3"), "#4361ee"),
        category("5", "Design", Some("3"), "#7209b7"),
    ]
}

/// Parse human-readable due input into a point in time.
///
/// The date part supports:
/// - "today", "tomorrow", "yesterday"
/// - "mon".."sun", "next monday", "this friday"
/// - "end of week", "end of month"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD"
///
/// and may be followed by a time of day, either after a space or a `T`
/// ("2024-06-10T10:00", "tomorrow 09:30"). Without a time the task is due at
/// the end of that day. Relative words are resolved against `now` in its own
/// time zone.
pub fn parse_due_input<Tz: TimeZone>(s: &str, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let s = s.trim().to_lowercase();
    let (date_part, time) = split_time_of_day(&s);
    let date = parse_due_date(date_part, now.date_naive())?;
    let time = time.unwrap_or_else(end_of_day);
    now.timezone()
        .from_local_datetime(&NaiveDateTime::new(date, time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

fn split_time_of_day(s: &str) -> (&str, Option<NaiveTime>) {
    if let Some((date, time)) = s.split_once('t') {
        if let Some(t) = parse_time(time) {
            return (date, Some(t));
        }
    }
    if let Some((date, time)) = s.rsplit_once(' ') {
        if let Some(t) = parse_time(time) {
            return (date.trim_end(), Some(t));
        }
    }
    (s, None)
}

fn parse_due_date(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    match s {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let weekday = i64::from(today.weekday().num_days_from_monday());
            return Some(today + Duration::days(6 - weekday));
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 { (today.year() + 1, 1) } else { (today.year(), today.month() + 1) };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        _ => {}
    }

    // "in X" patterns
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return today.checked_add_signed(Duration::try_days(days)?);
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return today.checked_add_signed(Duration::try_weeks(weeks)?);
            }
        }
    }

    // Weekday patterns
    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current_day = i64::from(today.weekday().num_days_from_monday());
    for (day_name, target_day) in weekdays {
        let days_ahead = (target_day + 7 - current_day) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days_to_add = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days_to_add));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Format a due date in local time with a relative hint ("today", "2d late").
pub fn format_due(due: Option<DateTime<Utc>>, now: DateTime<Local>) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let local = d.with_timezone(&Local);
            let days = (local.date_naive() - now.date_naive()).num_days();
            let hint = match days {
                0 => "today".to_string(),
                1 => "tomorrow".to_string(),
                n if n > 1 => format!("in {n}d"),
                n => format!("{}d late", -n),
            };
            format!("{} ({hint})", local.format("%Y-%m-%d %H:%M"))
        }
    }
}

/// Format a timestamp in local time.
pub fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

/// Format a priority level for display.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Critical => "Critical",
        Priority::High => "High",
        Priority::Medium => "Medium",
        Priority::Low => "Low",
    }
}

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Todo => "To do",
        Status::InProgress => "In progress",
        Status::Done => "Done",
    }
}

/// Print tasks in a formatted table, subtasks indented under their parent title.
pub fn print_table(tasks: &[&Task], db: &Database) {
    println!(
        "{:<8} {:<11} {:<8} {:<26} {:<22} {}",
        "ID", "Status", "Pri", "Due", "Category", "Title [tags]"
    );
    let now = db.now();
    let local_now = now.with_timezone(&Local);
    for t in tasks {
        let tags = if t.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", t.tags.join(","))
        };
        let title = match t.parent_id.as_deref().and_then(|p| db.task(p)) {
            Some(parent) => format!("  ↳ {} (in {})", t.title, truncate(&parent.title, 20)),
            None => t.title.clone(),
        };
        let overdue = if query::is_overdue(t, now) { " !" } else { "" };
        let category = query::category_label(&db.categories, t.category_id.as_deref());
        println!(
            "{:<8} {:<11} {:<8} {:<26} {:<22} {}{}{}",
            short_id(&t.id),
            format_status(t.status),
            format_priority(t.priority),
            format_due(t.due_date, local_now),
            truncate(&category, 22),
            title,
            tags,
            overdue
        );
    }
}

/// First eight characters of an identifier, enough to tell tasks apart on screen.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
pub mod testing {
    use std::rc::Rc;

    use chrono::{DateTime, TimeZone, Utc};

    use super::Database;
    use crate::clock::testing::FixedClock;
    use crate::storage::testing::MemoryStorage;

    pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    /// A store over shared in-memory storage with a pinned clock.
    pub fn fixture(now: DateTime<Utc>) -> (Database, MemoryStorage, Rc<FixedClock>) {
        let storage = MemoryStorage::new();
        let clock = Rc::new(FixedClock::new(now));
        let db = Database::load(Box::new(storage.clone()), Box::new(clock.clone())).unwrap();
        (db, storage, clock)
    }

    pub fn reload(storage: &MemoryStorage, now: DateTime<Utc>) -> Database {
        Database::load(Box::new(storage.clone()), Box::new(FixedClock::new(now))).unwrap()
    }
}
