//! Error types for the task manager.
//!
//! Exit codes:
//! - 2: User error (validation, unknown id, malformed import)
//! - 3: Refused by policy (category cycle, nested subtask)
//! - 4: Operation failed (persistence, I/O)

use std::path::PathBuf;

use thiserror::Error;

/// Process exit codes for the `tm` binary.
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

#[derive(Error, Debug)]
pub enum Error {
    /// A required field was empty.
    #[error("{0}")]
    Validation(String),

    #[error("Task {0} not found")]
    TaskNotFound(String),

    #[error("Category {0} not found")]
    CategoryNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The document parsed as JSON but is not a task manager export.
    #[error("Import file does not contain task manager data: {0}")]
    ImportFormat(String),

    /// The document is not valid JSON.
    #[error("Could not parse import file: {0}")]
    ImportParse(#[source] serde_json::Error),

    /// Category parent links loop back on themselves.
    #[error("Category hierarchy cycle involving {0}")]
    Cycle(String),

    #[error("Task {0} is a subtask and cannot have subtasks of its own")]
    NestedSubtask(String),

    #[error("Task {0} has subtasks and cannot become a subtask")]
    HasSubtasks(String),

    /// Reading or writing a persisted collection failed.
    #[error("Persistence error on '{key}': {source}")]
    Persistence {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn persistence(key: &str, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Persistence {
            key: key.to_string(),
            source: source.into(),
        }
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_)
            | Error::TaskNotFound(_)
            | Error::CategoryNotFound(_)
            | Error::InvalidArgument(_)
            | Error::ImportFormat(_)
            | Error::ImportParse(_) => exit_codes::USER_ERROR,

            Error::Cycle(_) | Error::NestedSubtask(_) | Error::HasSubtasks(_) => exit_codes::POLICY_BLOCKED,

            Error::Persistence { .. } | Error::DataDir { .. } | Error::Io(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for task manager operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_group_error_kinds() {
        assert_eq!(Error::Validation("Title is required".into()).exit_code(), exit_codes::USER_ERROR);
        assert_eq!(Error::Cycle("3".into()).exit_code(), exit_codes::POLICY_BLOCKED);
        let err = Error::persistence("tasks", std::io::Error::other("disk full"));
        assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
        assert_eq!(err.to_string(), "Persistence error on 'tasks': disk full");
    }
}
