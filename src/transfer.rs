//! Import and export of the whole task/category state as one JSON document,
//! plus timestamped backups of the data directory taken before an import.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::storage::{CATEGORIES_KEY, TASKS_KEY};
use crate::task::{Category, Task};

/// The exported document: both collections, both required on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
}

/// Pretty-printed export of the current state.
pub fn export_document(db: &Database) -> Result<String> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        tasks: &'a [Task],
        categories: &'a [Category],
    }
    serde_json::to_string_pretty(&Borrowed {
        tasks: &db.tasks,
        categories: &db.categories,
    })
    .map_err(|e| Error::persistence("export", e))
}

/// `task-manager-export-YYYY-MM-DD.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("task-manager-export-{}.json", date.format("%Y-%m-%d"))
}

/// Parse an import document.
///
/// Text that is not JSON is an [`Error::ImportParse`]; JSON lacking either
/// collection, or holding malformed records, is an [`Error::ImportFormat`].
pub fn parse_import(text: &str) -> Result<ExportDocument> {
    let value: Value = serde_json::from_str(text).map_err(Error::ImportParse)?;
    let Some(object) = value.as_object() else {
        return Err(Error::ImportFormat("expected a JSON object".into()));
    };
    for field in ["tasks", "categories"] {
        match object.get(field) {
            Some(Value::Array(_)) => {}
            Some(_) => return Err(Error::ImportFormat(format!("'{field}' must be an array"))),
            None => return Err(Error::ImportFormat(format!("missing '{field}'"))),
        }
    }
    serde_json::from_value(value).map_err(|e| Error::ImportFormat(e.to_string()))
}

/// Copy the stored snapshots into `<dir>/backup/<timestamp>_<file>`.
///
/// Keys with nothing stored yet are skipped. Returns the backup paths.
pub fn create_backup(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let backup_dir = data_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let mut written = Vec::new();
    for key in [TASKS_KEY, CATEGORIES_KEY] {
        let file_name = format!("{key}.json");
        let source = data_dir.join(&file_name);
        if !source.exists() {
            continue;
        }
        let target = backup_dir.join(format!("{timestamp}_{file_name}"));
        fs::copy(&source, &target)?;
        info!(path = %target.display(), "created backup");
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::db::testing::{at, fixture};
    use crate::storage::FileStorage;
    use crate::task::TaskInput;
    use tempfile::TempDir;

    #[test]
    fn export_then_import_restores_state() {
        let (mut db, _, _) = fixture(at(2024, 6, 1, 8, 0));
        let parent = db
            .create_task(TaskInput {
                title: "Plan trip".into(),
                category_id: Some("2".into()),
                tags: vec!["travel".into()],
                ..TaskInput::default()
            })
            .unwrap();
        db.create_task(TaskInput {
            title: "Book hotel".into(),
            parent_id: Some(parent),
            due_date: Some(at(2024, 6, 20, 12, 0)),
            reminder_minutes: Some(15),
            ..TaskInput::default()
        })
        .unwrap();

        let doc = parse_import(&export_document(&db).unwrap()).unwrap();
        assert_eq!(doc.tasks, db.tasks);
        assert_eq!(doc.categories, db.categories);

        let (mut other, _, _) = fixture(at(2024, 6, 2, 8, 0));
        other.replace_all(doc.tasks, doc.categories).unwrap();
        assert_eq!(other.tasks, db.tasks);
        assert_eq!(other.categories, db.categories);
    }

    #[test]
    fn export_uses_camel_case_and_numeric_priority() {
        let (mut db, _, _) = fixture(at(2024, 6, 1, 8, 0));
        db.create_task(TaskInput {
            title: "Call".into(),
            ..TaskInput::default()
        })
        .unwrap();
        let text = export_document(&db).unwrap();
        assert!(text.contains("\"createdAt\""));
        assert!(text.contains("\"priority\": 3"));
        assert!(text.contains("\"status\": \"todo\""));
    }

    #[test]
    fn import_errors_are_classified() {
        assert!(matches!(parse_import("{not json"), Err(Error::ImportParse(_))));
        assert!(matches!(parse_import("[]"), Err(Error::ImportFormat(_))));
        assert!(matches!(parse_import(r#"{"tasks": []}"#), Err(Error::ImportFormat(_))));
        assert!(matches!(parse_import(r#"{"categories": []}"#), Err(Error::ImportFormat(_))));
        assert!(matches!(
            parse_import(r#"{"tasks": {}, "categories": []}"#),
            Err(Error::ImportFormat(_))
        ));
        assert!(matches!(
            parse_import(r#"{"tasks": [{"title": "no id"}], "categories": []}"#),
            Err(Error::ImportFormat(_))
        ));
        let empty = parse_import(r#"{"tasks": [], "categories": []}"#).unwrap();
        assert!(empty.tasks.is_empty() && empty.categories.is_empty());
    }

    #[test]
    fn import_accepts_empty_string_references() {
        let text = r##"{
            "tasks": [{
                "id": "1700000000000",
                "title": "Legacy",
                "description": "",
                "dueDate": null,
                "priority": 2,
                "categoryId": "",
                "tags": [],
                "parentId": "",
                "status": "in-progress",
                "createdAt": "2023-11-14T22:13:20.000Z",
                "completedAt": null
            }],
            "categories": [{"id": "1", "name": "Work", "parentId": null, "color": "#3a86ff"}]
        }"##;
        let doc = parse_import(text).unwrap();
        let task = &doc.tasks[0];
        assert_eq!(task.category_id, None);
        assert_eq!(task.parent_id, None);
        assert_eq!(task.description, None);
        assert_eq!(task.status, crate::fields::Status::InProgress);
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(export_file_name(date), "task-manager-export-2024-03-09.json");
    }

    #[test]
    fn backup_copies_existing_snapshots() {
        let dir = TempDir::new().unwrap();
        assert!(create_backup(dir.path()).unwrap().is_empty());

        let storage = FileStorage::open(dir.path()).unwrap();
        let mut db = Database::load(Box::new(storage), Box::new(SystemClock)).unwrap();
        db.save_categories().unwrap();

        let backups = create_backup(dir.path()).unwrap();
        assert_eq!(backups.len(), 1);
        let name = backups[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_categories.json"));
        assert_eq!(
            fs::read_to_string(&backups[0]).unwrap(),
            fs::read_to_string(dir.path().join("categories.json")).unwrap()
        );
    }
}
