use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::error::{AppError, AppResult};

/// File-backed store: one JSON document per key under the profile's
/// store directory. Token material lands here, so files are written
/// owner-read-write only.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn key_file(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn storage_err(path: &Path, err: io::Error) -> AppError {
        AppError::Storage(format!("{}: {err}", path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.key_file(key);
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).map_err(|err| Self::storage_err(&path, err))?;
        Ok(Some(raw))
    }

    fn write(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.key_file(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Self::storage_err(parent, err))?;
        }

        fs::write(&path, value).map_err(|err| Self::storage_err(&path, err))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(&path)
                .map_err(|err| Self::storage_err(&path, err))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms).map_err(|err| Self::storage_err(&path, err))?;
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.key_file(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|err| Self::storage_err(&path, err))?;
        }

        Ok(())
    }
}
