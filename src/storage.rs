//! Key-value persistence for the task manager.
//!
//! Each key holds one complete JSON snapshot: `tasks`, `categories` and the UI
//! `theme`. Snapshots are replaced wholesale on every save.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

pub const TASKS_KEY: &str = "tasks";
pub const CATEGORIES_KEY: &str = "categories";
pub const THEME_KEY: &str = "theme";

/// Read/write capability over string values stored under string keys.
pub trait Storage {
    /// Returns `None` when nothing has been stored under `key` yet.
    fn read(&self, key: &str) -> Result<Option<String>>;

    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|source| Error::DataDir {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(FileStorage { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(data) => {
                debug!(path = %path.display(), bytes = data.len(), "read snapshot");
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::persistence(key, e)),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        // Atomic-ish write via temp + rename.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let write = || -> std::io::Result<()> {
            let mut f = File::create(&tmp)?;
            f.write_all(value.as_bytes())?;
            f.flush()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|e| Error::persistence(key, e))?;
        debug!(path = %path.display(), bytes = value.len(), "wrote snapshot");
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::Storage;
    use crate::error::{Error, Result};

    /// In-memory storage; clones share the same map.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryStorage {
        values: Rc<RefCell<HashMap<String, String>>>,
        fail_writes: Rc<RefCell<bool>>,
    }

    impl MemoryStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get(&self, key: &str) -> Option<String> {
            self.values.borrow().get(key).cloned()
        }

        pub fn set(&self, key: &str, value: &str) {
            self.values.borrow_mut().insert(key.to_string(), value.to_string());
        }

        pub fn fail_writes(&self, fail: bool) {
            *self.fail_writes.borrow_mut() = fail;
        }
    }

    impl Storage for MemoryStorage {
        fn read(&self, key: &str) -> Result<Option<String>> {
            Ok(self.get(key))
        }

        fn write(&mut self, key: &str, value: &str) -> Result<()> {
            if *self.fail_writes.borrow() {
                return Err(Error::persistence(key, std::io::Error::other("storage is read-only")));
            }
            self.set(key, value);
            Ok(())
        }
    }
}
