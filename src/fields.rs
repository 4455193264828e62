//! Enumerations and field types for task management.
//!
//! This module defines the structured values a task carries (priority and
//! workflow status) and the filter selections used by the list, calendar and
//! kanban views.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Importance of a task, stored on disk as the integer 1..=4.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    #[value(alias = "1")]
    Critical,
    #[value(alias = "2")]
    High,
    #[value(alias = "3")]
    Medium,
    #[value(alias = "4")]
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Critical, Priority::High, Priority::Medium, Priority::Low];

    /// Numeric rank, 1 being the most important.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 1,
            Priority::High => 2,
            Priority::Medium => 3,
            Priority::Low => 4,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Critical),
            2 => Ok(Priority::High),
            3 => Ok(Priority::Medium),
            4 => Ok(Priority::Low),
            other => Err(format!("priority must be between 1 and 4, got {other}")),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p.rank()
    }
}

/// Workflow stage of a task; also the kanban column it sits in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl Status {
    /// Kanban column order.
    pub const COLUMNS: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Ok(Status::Todo),
            "in-progress" | "inprogress" | "in_progress" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            other => Err(format!("unknown status '{other}' (expected todo, in-progress or done)")),
        }
    }
}

/// Priority selection of the list filter: `all` or one exact priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl FromStr for PriorityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(PriorityFilter::All);
        }
        Priority::from_str(s, true).map(PriorityFilter::Only)
    }
}

/// Category selection of the list filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Only tasks without a category.
    Uncategorized,
    Only(String),
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("category filter cannot be empty".into()),
            "all" => Ok(CategoryFilter::All),
            "none" => Ok(CategoryFilter::Uncategorized),
            id => Ok(CategoryFilter::Only(id.to_string())),
        }
    }
}

/// Status selection of the list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_round_trips_through_its_rank() {
        for p in Priority::ALL {
            assert_eq!(Priority::try_from(p.rank()), Ok(p));
        }
        assert!(Priority::try_from(0).is_err());
        assert!(Priority::try_from(5).is_err());
    }

    #[test]
    fn priority_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "2");
        let p: Priority = serde_json::from_str("4").unwrap();
        assert_eq!(p, Priority::Low);
        assert!(serde_json::from_str::<Priority>("7").is_err());
    }

    #[test]
    fn status_uses_kebab_case_on_disk() {
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in-progress\"");
        let s: Status = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(s, Status::Done);
    }

    #[test]
    fn filters_parse_keywords_and_values() {
        assert_eq!("all".parse::<PriorityFilter>(), Ok(PriorityFilter::All));
        assert_eq!("1".parse::<PriorityFilter>(), Ok(PriorityFilter::Only(Priority::Critical)));
        assert_eq!("low".parse::<PriorityFilter>(), Ok(PriorityFilter::Only(Priority::Low)));
        assert_eq!("none".parse::<CategoryFilter>(), Ok(CategoryFilter::Uncategorized));
        assert_eq!("4".parse::<CategoryFilter>(), Ok(CategoryFilter::Only("4".into())));
        assert_eq!("in-progress".parse::<StatusFilter>(), Ok(StatusFilter::Only(Status::InProgress)));
        assert!("later".parse::<StatusFilter>().is_err());
    }
}
