use std::fs;
use std::path::PathBuf;

use crate::error::AppError;

/// Directory under the platform config dir holding all persisted state
const APP_DIR: &str = "gitswitch";

/// Gets the directory where all tool state lives
pub fn default_state_dir() -> Result<PathBuf, AppError> {
    let config_dir: PathBuf = dirs::config_dir().ok_or_else(|| {
        AppError::Validation("failed to find the config directory".to_string())
    })?;
    Ok(config_dir.join(APP_DIR))
}

/// Durable key-value state consumed by the registry and the resolver.
///
/// Values are whole serialized collections: callers read a key entirely at
/// initialization and rewrite it entirely on every mutation.
pub trait StateStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// File-backed state store keeping one `<key>.json` file per key.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Opens the store in the user's config directory
    pub fn open_default() -> Result<Self, AppError> {
        Ok(Self::new(default_state_dir()?))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.key_path(key), value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state"));
        assert!(store.get("accounts").unwrap().is_none());
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("state"));
        store.set("accounts", "[1, 2]").unwrap();
        assert_eq!(store.get("accounts").unwrap().as_deref(), Some("[1, 2]"));
    }

    #[test]
    fn empty_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf());
        std::fs::write(dir.path().join("mappings.json"), "  \n").unwrap();
        assert!(store.get("mappings").unwrap().is_none());
    }
}
