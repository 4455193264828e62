//! Create, edit, delete and status operations on the store.
//!
//! Each operation validates its input, mutates the in-memory collection and
//! then saves the affected collection before returning.

use std::collections::HashSet;

use tracing::info;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::fields::Status;
use crate::query;
use crate::task::{reminder_time, Category, CategoryInput, Task, TaskInput};

/// Trimmed, validated copy of a task input.
struct CleanTask {
    title: String,
    description: Option<String>,
    tags: Vec<String>,
}

fn clean_task(input: &TaskInput) -> Result<CleanTask> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(Error::Validation("Task title is required".into()));
    }
    Ok(CleanTask {
        title: title.to_string(),
        description: input
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        tags: input
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn clean_name(input: &CategoryInput) -> Result<String> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Category name is required".into()));
    }
    Ok(name.to_string())
}

impl Database {
    /// Only single-level subtasking: the parent must exist, must not be the
    /// task itself and must not be a subtask.
    fn check_task_parent(&self, task_id: Option<&str>, parent_id: Option<&str>) -> Result<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        if task_id == Some(parent_id) {
            return Err(Error::InvalidArgument("a task cannot be its own parent".into()));
        }
        let parent = self
            .task(parent_id)
            .ok_or_else(|| Error::TaskNotFound(parent_id.to_string()))?;
        if parent.is_subtask() {
            return Err(Error::NestedSubtask(parent_id.to_string()));
        }
        if let Some(id) = task_id {
            if !query::children_of(&self.tasks, id).is_empty() {
                return Err(Error::HasSubtasks(id.to_string()));
            }
        }
        Ok(())
    }

    fn check_category_ref(&self, category_id: Option<&str>) -> Result<()> {
        match category_id {
            Some(id) if self.category(id).is_none() => Err(Error::CategoryNotFound(id.to_string())),
            _ => Ok(()),
        }
    }

    /// Create a task in `todo` and return its id.
    pub fn create_task(&mut self, input: TaskInput) -> Result<String> {
        let clean = clean_task(&input)?;
        self.check_task_parent(None, input.parent_id.as_deref())?;
        self.check_category_ref(input.category_id.as_deref())?;

        let id = self.next_id();
        let task = Task {
            id: id.clone(),
            title: clean.title,
            description: clean.description,
            due_date: input.due_date,
            priority: input.priority,
            category_id: input.category_id,
            tags: clean.tags,
            parent_id: input.parent_id,
            status: Status::Todo,
            created_at: self.now(),
            completed_at: None,
            reminder_minutes: input.reminder_minutes,
            reminder_time: reminder_time(input.due_date, input.reminder_minutes),
        };
        self.tasks.push(task);
        self.save_tasks()?;
        info!(task = %id, "created task");
        Ok(id)
    }

    /// Replace the editable fields of a task.
    ///
    /// The id, status, creation and completion stamps are kept;
    /// `reminder_time` is derived again.
    pub fn update_task(&mut self, id: &str, input: TaskInput) -> Result<()> {
        let clean = clean_task(&input)?;
        let current = self.task(id).ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        // References kept from the stored task may dangle after a delete.
        if input.parent_id != current.parent_id {
            self.check_task_parent(Some(id), input.parent_id.as_deref())?;
        }
        if input.category_id != current.category_id {
            self.check_category_ref(input.category_id.as_deref())?;
        }

        let task = self.task_mut(id).ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        task.title = clean.title;
        task.description = clean.description;
        task.due_date = input.due_date;
        task.priority = input.priority;
        task.category_id = input.category_id;
        task.tags = clean.tags;
        task.parent_id = input.parent_id;
        task.reminder_minutes = input.reminder_minutes;
        task.reminder_time = reminder_time(input.due_date, input.reminder_minutes);
        self.save_tasks()?;
        info!(task = %id, "updated task");
        Ok(())
    }

    pub fn has_subtasks(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.parent_id.as_deref() == Some(id))
    }

    /// Remove a task, leaving its subtasks with a dangling `parent_id`.
    pub fn delete_task_only(&mut self, id: &str) -> Result<usize> {
        self.remove_tasks(|t| t.id == id, id)
    }

    /// Remove a task together with every task whose parent it is.
    pub fn delete_task_with_children(&mut self, id: &str) -> Result<usize> {
        self.remove_tasks(|t| t.id == id || t.parent_id.as_deref() == Some(id), id)
    }

    fn remove_tasks(&mut self, doomed: impl Fn(&Task) -> bool, id: &str) -> Result<usize> {
        if self.task(id).is_none() {
            return Err(Error::TaskNotFound(id.to_string()));
        }
        let before = self.tasks.len();
        self.tasks.retain(|t| !doomed(t));
        let removed = before - self.tasks.len();
        self.save_tasks()?;
        info!(task = %id, removed, "deleted tasks");
        Ok(removed)
    }

    /// Flip between `done` and `todo`, stamping or clearing `completed_at`.
    ///
    /// Any status other than `done` (including `in-progress`) becomes `done`.
    pub fn toggle_status(&mut self, id: &str) -> Result<Status> {
        let now = self.now();
        let task = self.task_mut(id).ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        if task.status == Status::Done {
            task.status = Status::Todo;
            task.completed_at = None;
        } else {
            task.status = Status::Done;
            task.completed_at = Some(now);
        }
        let status = task.status;
        self.save_tasks()?;
        info!(task = %id, %status, "toggled status");
        Ok(status)
    }

    /// Move a task to a kanban column. Returns false when it is already there.
    ///
    /// Moving into `done` stamps `completed_at`; moving out of `done` keeps the
    /// old stamp, unlike [`Database::toggle_status`].
    pub fn set_status(&mut self, id: &str, status: Status) -> Result<bool> {
        let now = self.now();
        let task = self.task_mut(id).ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        if task.status == status {
            return Ok(false);
        }
        task.status = status;
        if status == Status::Done {
            task.completed_at = Some(now);
        }
        self.save_tasks()?;
        info!(task = %id, %status, "moved task");
        Ok(true)
    }

    /// The parent must exist and must not be the category itself or lie below it.
    fn check_category_parent(&self, category_id: Option<&str>, parent_id: Option<&str>) -> Result<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        if self.category(parent_id).is_none() {
            return Err(Error::CategoryNotFound(parent_id.to_string()));
        }
        if let Some(id) = category_id {
            if id == parent_id || query::is_category_descendant(&self.categories, parent_id, id)? {
                return Err(Error::Cycle(id.to_string()));
            }
        }
        Ok(())
    }

    pub fn create_category(&mut self, input: CategoryInput) -> Result<String> {
        let name = clean_name(&input)?;
        self.check_category_parent(None, input.parent_id.as_deref())?;

        let id = self.next_id();
        self.categories.push(Category {
            id: id.clone(),
            name,
            parent_id: input.parent_id,
            color: input.color,
        });
        self.save_categories()?;
        info!(category = %id, "created category");
        Ok(id)
    }

    pub fn update_category(&mut self, id: &str, input: CategoryInput) -> Result<()> {
        let name = clean_name(&input)?;
        let current = self.category(id).ok_or_else(|| Error::CategoryNotFound(id.to_string()))?;
        if input.parent_id != current.parent_id {
            self.check_category_parent(Some(id), input.parent_id.as_deref())?;
        }

        let category = self.category_mut(id).ok_or_else(|| Error::CategoryNotFound(id.to_string()))?;
        category.name = name;
        category.parent_id = input.parent_id;
        category.color = input.color;
        self.save_categories()?;
        info!(category = %id, "updated category");
        Ok(())
    }

    /// Remove a category only.
    ///
    /// Tasks keep their `category_id` and child categories keep their
    /// `parent_id`; both now dangle and render as uncategorized / top level.
    pub fn delete_category(&mut self, id: &str) -> Result<()> {
        if self.category(id).is_none() {
            return Err(Error::CategoryNotFound(id.to_string()));
        }
        self.categories.retain(|c| c.id != id);
        self.save_categories()?;
        info!(category = %id, "deleted category");
        Ok(())
    }

    /// Swap in imported collections wholesale and persist both.
    pub fn replace_all(&mut self, tasks: Vec<Task>, categories: Vec<Category>) -> Result<()> {
        ensure_unique("task", tasks.iter().map(|t| t.id.as_str()))?;
        ensure_unique("category", categories.iter().map(|c| c.id.as_str()))?;
        self.tasks = tasks;
        self.categories = categories;
        self.save_tasks()?;
        self.save_categories()?;
        info!(tasks = self.tasks.len(), categories = self.categories.len(), "replaced all data");
        Ok(())
    }
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::ImportFormat(format!("duplicate {kind} id '{id}'")));
        }
    }
    Ok(())
}
