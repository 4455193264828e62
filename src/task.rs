//! Task and category data structures.
//!
//! This module defines the `Task` and `Category` records kept by the store and
//! the input shapes used to create or edit them. On disk both use camelCase
//! field names so exported documents stay readable by older data files.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::fields::{Priority, Status};

/// A unit of work with status, priority, optional schedule and category.
///
/// A task whose `parent_id` is set is a subtask. `completed_at` is set when the
/// task is moved to done and `reminder_time` is always derived from `due_date`
/// and `reminder_minutes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder_minutes: Option<u32>,
    #[serde(default)]
    pub reminder_time: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_subtask(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.status == Status::Done
    }
}

/// A named, hierarchical grouping label for tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub parent_id: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
}

/// Colour given to categories created without one.
pub const DEFAULT_COLOR: &str = "#3a86ff";

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// User-editable fields of a task, used by both create and update.
#[derive(Debug, Clone, Default)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub category_id: Option<String>,
    pub tags: Vec<String>,
    pub parent_id: Option<String>,
    pub reminder_minutes: Option<u32>,
}

impl TaskInput {
    /// Start an input from an existing task, for partial edits.
    pub fn from_task(task: &Task) -> Self {
        TaskInput {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
            priority: task.priority,
            category_id: task.category_id.clone(),
            tags: task.tags.clone(),
            parent_id: task.parent_id.clone(),
            reminder_minutes: task.reminder_minutes,
        }
    }
}

/// User-editable fields of a category.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub parent_id: Option<String>,
    pub color: String,
}

impl CategoryInput {
    pub fn from_category(category: &Category) -> Self {
        CategoryInput {
            name: category.name.clone(),
            parent_id: category.parent_id.clone(),
            color: category.color.clone(),
        }
    }
}

impl Default for CategoryInput {
    fn default() -> Self {
        CategoryInput {
            name: String::new(),
            parent_id: None,
            color: default_color(),
        }
    }
}

/// Moment a reminder fires: `reminder_minutes` before the due date.
///
/// A zero offset means no reminder.
pub fn reminder_time(due: Option<DateTime<Utc>>, minutes: Option<u32>) -> Option<DateTime<Utc>> {
    match (due, minutes) {
        (Some(due), Some(minutes)) if minutes > 0 => Some(due - Duration::minutes(i64::from(minutes))),
        _ => None,
    }
}

/// Split comma-separated tag input, trimming each piece.
///
/// Order and duplicates are kept; empty pieces are dropped.
pub fn split_tags(inputs: &[String]) -> Vec<String> {
    inputs
        .iter()
        .flat_map(|raw| raw.split(','))
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads `""` and `null` alike as an absent reference.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reminder_is_offset_before_due_date() {
        let due = Utc.with_ymd_and_hms(2024, 6, 10, 10, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap();
        assert_eq!(reminder_time(Some(due), Some(30)), Some(expected));
        assert_eq!(reminder_time(Some(due), None), None);
        assert_eq!(reminder_time(None, Some(30)), None);
        assert_eq!(reminder_time(Some(due), Some(0)), None);
    }

    #[test]
    fn split_tags_keeps_order_and_duplicates() {
        let tags = split_tags(&["home, urgent,,home".to_string(), " later ".to_string()]);
        assert_eq!(tags, vec!["home", "urgent", "home", "later"]);
    }

    #[test]
    fn empty_references_read_as_none() {
        let json = r##"{"id":"1","name":"Work","parentId":"","color":"#3a86ff"}"##;
        let category: Category = serde_json::from_str(json).unwrap();
        assert_eq!(category.parent_id, None);

        let json = r#"{"id":"9","title":"Write report","priority":2,"categoryId":"",
            "parentId":null,"status":"todo","createdAt":"2024-06-01T08:00:00.000Z","tags":[]}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.category_id, None);
        assert_eq!(task.parent_id, None);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn task_serializes_with_camel_case_keys() {
        let task = Task {
            id: "a".into(),
            title: "Plan sprint".into(),
            description: None,
            due_date: None,
            priority: Priority::Low,
            category_id: Some("3".into()),
            tags: vec![],
            parent_id: None,
            status: Status::InProgress,
            created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            completed_at: None,
            reminder_minutes: None,
            reminder_time: None,
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["categoryId"], "3");
        assert_eq!(value["status"], "in-progress");
        assert_eq!(value["priority"], 4);
        assert!(value.get("createdAt").is_some());
    }
}
