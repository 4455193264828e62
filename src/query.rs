//! Derived views over the task and category collections.
//!
//! Everything here is a pure function of the collections (and, where time
//! matters, an explicit `now`), so the list, calendar, kanban and statistics
//! views can be recomputed after every mutation.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use tracing::warn;

use crate::calendar::{month_name, shift_month};
use crate::error::{Error, Result};
use crate::fields::*;
use crate::task::{Category, Task};

/// Separator between category names in a path.
pub const PATH_SEPARATOR: &str = " → ";

/// List filter; the three conditions are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub priority: PriorityFilter,
    pub category: CategoryFilter,
    pub status: StatusFilter,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let priority_ok = match self.priority {
            PriorityFilter::All => true,
            PriorityFilter::Only(p) => task.priority == p,
        };
        let category_ok = match &self.category {
            CategoryFilter::All => true,
            CategoryFilter::Uncategorized => task.category_id.is_none(),
            CategoryFilter::Only(id) => task.category_id.as_deref() == Some(id.as_str()),
        };
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(s) => task.status == s,
        };
        priority_ok && category_ok && status_ok
    }
}

/// Tasks matching `filter`, in their original order.
pub fn filtered_tasks<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

/// Whether a task is past its due date and not done.
pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    task.status != Status::Done && task.due_date.is_some_and(|due| due < now)
}

/// Subtasks of `parent_id`, in original order.
pub fn children_of<'a>(tasks: &'a [Task], parent_id: &str) -> Vec<&'a Task> {
    tasks.iter().filter(|t| t.parent_id.as_deref() == Some(parent_id)).collect()
}

/// Tasks that may be chosen as a parent: top-level tasks other than `exclude`.
pub fn parent_candidates<'a>(tasks: &'a [Task], exclude: Option<&str>) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.parent_id.is_none() && Some(t.id.as_str()) != exclude)
        .collect()
}

/// Resolve a task identifier (id, id prefix of at least four characters, or
/// title) to a task id.
///
/// Titles match case-insensitively; several matches are reported so the user
/// can pick by id instead.
pub fn resolve_task(tasks: &[Task], identifier: &str) -> Result<String> {
    let identifier = identifier.trim();
    if let Some(t) = tasks.iter().find(|t| t.id == identifier) {
        return Ok(t.id.clone());
    }

    let mut matches: Vec<&Task> = Vec::new();
    if identifier.len() >= 4 {
        matches = tasks.iter().filter(|t| t.id.starts_with(identifier)).collect();
    }
    if matches.is_empty() {
        let lowered = identifier.to_lowercase();
        matches = tasks.iter().filter(|t| t.title.to_lowercase() == lowered).collect();
    }

    match matches.len() {
        0 => Err(Error::TaskNotFound(identifier.to_string())),
        1 => Ok(matches[0].id.clone()),
        _ => {
            let mut msg = format!("several tasks match '{identifier}':\n");
            for task in matches {
                msg.push_str(&format!("  {}: {}\n", task.id, task.title));
            }
            msg.push_str("Please use the specific ID instead.");
            Err(Error::InvalidArgument(msg))
        }
    }
}

/// Resolve a `--parent` identifier.
///
/// Top-level tasks win title and prefix matches, so a subtask sharing a title
/// with a possible parent does not make the choice ambiguous. Anything else
/// falls back to [`resolve_task`] and is judged when the task is written.
pub fn resolve_parent(tasks: &[Task], identifier: &str, exclude: Option<&str>) -> Result<String> {
    let candidates: Vec<Task> = parent_candidates(tasks, exclude).into_iter().cloned().collect();
    match resolve_task(&candidates, identifier) {
        Err(Error::TaskNotFound(_)) => resolve_task(tasks, identifier),
        found => found,
    }
}

/// Tasks due on `date` as seen in time zone `tz`.
pub fn tasks_for_day<'a, Tz: TimeZone>(tasks: &'a [Task], date: NaiveDate, tz: &Tz) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.due_date.is_some_and(|due| due.with_timezone(tz).date_naive() == date))
        .collect()
}

/// Names from the root category down to `category_id`.
///
/// A dangling parent link ends the walk as if the category were a root. An id
/// that does not resolve yields an empty path. Revisiting a category is a
/// [`Error::Cycle`].
pub fn category_path<'a>(categories: &'a [Category], category_id: &str) -> Result<Vec<&'a str>> {
    let by_id: HashMap<&str, &Category> = categories.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(category_id);

    while let Some(id) = current {
        let Some(category) = by_id.get(id) else { break };
        if !seen.insert(id) {
            return Err(Error::Cycle(category_id.to_string()));
        }
        path.push(category.name.as_str());
        current = category.parent_id.as_deref();
    }

    path.reverse();
    Ok(path)
}

/// Category path joined for display, or an empty string for an unknown id.
///
/// A cyclic hierarchy falls back to the category's own name.
pub fn category_path_label(categories: &[Category], category_id: &str) -> String {
    match category_path(categories, category_id) {
        Ok(path) => path.join(PATH_SEPARATOR),
        Err(e) => {
            warn!(category = category_id, "{e}");
            categories
                .iter()
                .find(|c| c.id == category_id)
                .map(|c| c.name.clone())
                .unwrap_or_default()
        }
    }
}

/// Display label of a task's category: its path, or "-" when the task is
/// uncategorized or points at a removed category.
pub fn category_label(categories: &[Category], category_id: Option<&str>) -> String {
    match category_id.map(|id| category_path_label(categories, id)) {
        Some(label) if !label.is_empty() => label,
        _ => "-".to_string(),
    }
}

/// Resolve a category by id or case-insensitive name.
pub fn resolve_category(categories: &[Category], identifier: &str) -> Result<String> {
    let identifier = identifier.trim();
    if let Some(c) = categories.iter().find(|c| c.id == identifier) {
        return Ok(c.id.clone());
    }
    let lowered = identifier.to_lowercase();
    let matches: Vec<&Category> = categories.iter().filter(|c| c.name.to_lowercase() == lowered).collect();
    match matches.as_slice() {
        [] => Err(Error::CategoryNotFound(identifier.to_string())),
        [only] => Ok(only.id.clone()),
        several => {
            let listed: Vec<String> = several
                .iter()
                .map(|c| format!("{} ({})", category_path_label(categories, &c.id), c.id))
                .collect();
            Err(Error::InvalidArgument(format!(
                "several categories are named '{identifier}': {}",
                listed.join(", ")
            )))
        }
    }
}

/// Whether `candidate` lies below `ancestor` in the category tree.
///
/// A cycle met on the way up is an error.
pub fn is_category_descendant(categories: &[Category], candidate: &str, ancestor: &str) -> Result<bool> {
    let by_id: HashMap<&str, &Category> = categories.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut seen = HashSet::new();
    let mut current = by_id.get(candidate).and_then(|c| c.parent_id.as_deref());

    while let Some(id) = current {
        if id == ancestor {
            return Ok(true);
        }
        if !seen.insert(id) {
            return Err(Error::Cycle(candidate.to_string()));
        }
        current = by_id.get(id).and_then(|c| c.parent_id.as_deref());
    }
    Ok(false)
}

/// Categories in tree order, paired with their depth.
///
/// Roots are categories without a parent or whose parent no longer exists.
/// Categories caught in a cycle are unreachable from any root and are listed
/// last at depth zero.
pub fn category_tree(categories: &[Category]) -> Vec<(usize, &Category)> {
    let ids: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    let mut children: BTreeMap<&str, Vec<&Category>> = BTreeMap::new();
    let mut roots = Vec::new();
    for c in categories {
        match c.parent_id.as_deref() {
            Some(p) if ids.contains(p) && p != c.id => children.entry(p).or_default().push(c),
            _ => roots.push(c),
        }
    }

    fn visit<'a>(
        category: &'a Category,
        depth: usize,
        children: &BTreeMap<&str, Vec<&'a Category>>,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<(usize, &'a Category)>,
    ) {
        if !seen.insert(category.id.as_str()) {
            return;
        }
        out.push((depth, category));
        if let Some(kids) = children.get(category.id.as_str()) {
            for &kid in kids {
                visit(kid, depth + 1, children, seen, out);
            }
        }
    }

    let mut out = Vec::with_capacity(categories.len());
    let mut seen = HashSet::new();
    for root in roots {
        visit(root, 0, &children, &mut seen, &mut out);
    }
    for c in categories {
        if !seen.contains(c.id.as_str()) {
            warn!(category = %c.id, "category unreachable from any root");
            visit(c, 0, &children, &mut seen, &mut out);
        }
    }
    out
}

/// Tasks partitioned into kanban columns, each keeping the input order.
#[derive(Debug, Default, PartialEq)]
pub struct KanbanBoard<'a> {
    pub todo: Vec<&'a Task>,
    pub in_progress: Vec<&'a Task>,
    pub done: Vec<&'a Task>,
}

impl<'a> KanbanBoard<'a> {
    pub fn column(&self, status: Status) -> &[&'a Task] {
        match status {
            Status::Todo => &self.todo,
            Status::InProgress => &self.in_progress,
            Status::Done => &self.done,
        }
    }
}

pub fn group_by_status<'a, I>(tasks: I) -> KanbanBoard<'a>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut board = KanbanBoard::default();
    for task in tasks {
        match task.status {
            Status::Todo => board.todo.push(task),
            Status::InProgress => board.in_progress.push(task),
            Status::Done => board.done.push(task),
        }
    }
    board
}

/// Headline counters shown above every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
}

pub fn stats(tasks: &[Task], now: DateTime<Utc>) -> Stats {
    Stats {
        total: tasks.len(),
        completed: tasks.iter().filter(|t| t.status == Status::Done).count(),
        overdue: tasks.iter().filter(|t| is_overdue(t, now)).count(),
    }
}

/// Tasks created and completed during one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthActivity {
    pub year: i32,
    pub month: u32,
    pub created: usize,
    pub completed: usize,
}

impl MonthActivity {
    pub fn label(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }
}

/// Longest activity history reported, in months.
pub const MAX_ACTIVITY_MONTHS: u32 = 1200;

/// Created/completed counts for the `month_count` months ending with the month
/// of `now`, oldest first. Months are calendar months in `now`'s time zone.
pub fn monthly_activity<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>, month_count: u32) -> Vec<MonthActivity> {
    let tz = now.timezone();
    let month_of = |at: &DateTime<Utc>| {
        let local = at.with_timezone(&tz);
        (local.year(), local.month())
    };

    (0..month_count.min(MAX_ACTIVITY_MONTHS))
        .rev()
        .filter_map(|back| {
            let back = i32::try_from(back).ok()?;
            let (year, month) = shift_month(now.year(), now.month(), -back)?;
            Some(MonthActivity {
                year,
                month,
                created: tasks.iter().filter(|t| month_of(&t.created_at) == (year, month)).count(),
                completed: tasks
                    .iter()
                    .filter(|t| t.completed_at.as_ref().is_some_and(|c| month_of(c) == (year, month)))
                    .count(),
            })
        })
        .collect()
}
