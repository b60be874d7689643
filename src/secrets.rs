use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::error::AppError;

/// Namespace prefix for token secrets, combined with the account id
pub const TOKEN_KEY_PREFIX: &str = "gitswitch.token.";

/// Builds the secret store key for an account's token.
pub fn token_key(account_id: &str) -> String {
    format!("{TOKEN_KEY_PREFIX}{account_id}")
}

/// Opaque key -> secret storage consumed by the account registry.
///
/// The registry treats this as a capability: tokens live here and only here,
/// keyed by [`token_key`].
pub trait SecretStore {
    fn store(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// Secret store backed by a single JSON file with owner-only permissions.
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Opens the secret file next to the rest of the tool state
    pub fn open_default() -> Result<Self, AppError> {
        Ok(Self::new(crate::store::default_state_dir()?.join("secrets.json")))
    }

    fn load(&self) -> Result<BTreeMap<String, String>, AppError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, secrets: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(secrets)?;
        fs::write(&self.path, json)?;

        // Secrets are plaintext on disk; keep the file owner-only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}

impl SecretStore for FileSecretStore {
    fn store(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut secrets = self.load()?;
        secrets.insert(key.to_string(), value.to_string());
        self.save(&secrets)
    }

    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut secrets = self.load()?;
        if secrets.remove(key).is_some() {
            self.save(&secrets)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("secrets.json"));

        store.store("gitswitch.token.abc", "hunter2").unwrap();
        assert_eq!(
            store.get("gitswitch.token.abc").unwrap().as_deref(),
            Some("hunter2")
        );

        store.delete("gitswitch.token.abc").unwrap();
        assert!(store.get("gitswitch.token.abc").unwrap().is_none());
    }

    #[test]
    fn delete_unknown_key_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("secrets.json"));
        store.delete("gitswitch.token.nope").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn secrets_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let store = FileSecretStore::new(path.clone());
        store.store("k", "v").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
