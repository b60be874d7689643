//! In-memory fakes for the capability traits, shared across unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::account::{Account, AccountDraft, AuthType};
use crate::error::AppError;
use crate::git::{GitAdapter, LocalIdentity};
use crate::secrets::SecretStore;
use crate::store::StateStore;

/// State store holding values in memory; clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    values: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Secret store stub; clones share state so tests can inspect it.
#[derive(Clone, Default)]
pub struct MemorySecretStore {
    secrets: Rc<RefCell<HashMap<String, String>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn store(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.secrets
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.secrets.borrow().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), AppError> {
        self.secrets.borrow_mut().remove(key);
        Ok(())
    }
}

/// Git adapter fake tracking identities and remotes per repository path.
#[derive(Clone, Default)]
pub struct FakeGit {
    identities: Rc<RefCell<HashMap<PathBuf, LocalIdentity>>>,
    remotes: Rc<RefCell<HashMap<PathBuf, String>>>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_remote(&self, path: &Path, url: &str) {
        self.remotes
            .borrow_mut()
            .insert(path.to_path_buf(), url.to_string());
    }

    pub fn remote(&self, path: &Path) -> Option<String> {
        self.remotes.borrow().get(path).cloned()
    }

    pub fn identity(&self, path: &Path) -> Option<LocalIdentity> {
        self.identities.borrow().get(path).cloned()
    }
}

impl GitAdapter for FakeGit {
    fn local_identity(&self, path: &Path) -> Result<Option<LocalIdentity>, AppError> {
        Ok(self.identity(path))
    }

    fn set_local_identity(&self, name: &str, email: &str, path: &Path) -> Result<(), AppError> {
        self.identities.borrow_mut().insert(
            path.to_path_buf(),
            LocalIdentity {
                name: name.to_string(),
                email: email.to_string(),
            },
        );
        Ok(())
    }

    fn remote_url(&self, path: &Path) -> Result<Option<String>, AppError> {
        Ok(self.remote(path))
    }

    fn set_remote_url(&self, url: &str, path: &Path) -> Result<(), AppError> {
        self.set_remote(path, url);
        Ok(())
    }

    fn is_repository(&self, path: &Path) -> Result<bool, AppError> {
        let _ = path;
        Ok(true)
    }

    fn toplevel(&self, path: &Path) -> Result<Option<PathBuf>, AppError> {
        Ok(Some(path.to_path_buf()))
    }
}

/// Token-account draft; username and email are deliberately identical across
/// drafts since only the name carries a uniqueness constraint.
pub fn draft(name: &str) -> AccountDraft {
    AccountDraft {
        name: name.to_string(),
        username: "alice".to_string(),
        email: "alice@co.com".to_string(),
        auth_type: AuthType::Token,
        ssh_key_path: None,
        ssh_host: None,
    }
}

pub fn ssh_draft(name: &str, ssh_host: &str) -> AccountDraft {
    AccountDraft {
        name: name.to_string(),
        username: "alice".to_string(),
        email: "alice@co.com".to_string(),
        auth_type: AuthType::Ssh,
        ssh_key_path: Some("~/.ssh/id_work".to_string()),
        ssh_host: Some(ssh_host.to_string()),
    }
}

pub fn ssh_account(name: &str, username: &str, email: &str, ssh_host: &str) -> Account {
    Account {
        id: format!("test-{}", name.to_lowercase()),
        name: name.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        auth_type: AuthType::Ssh,
        ssh_key_path: Some("~/.ssh/id_work".to_string()),
        ssh_host: Some(ssh_host.to_string()),
    }
}

pub fn token_account(name: &str, username: &str, email: &str) -> Account {
    Account {
        id: format!("test-{}", name.to_lowercase()),
        name: name.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        auth_type: AuthType::Token,
        ssh_key_path: None,
        ssh_host: None,
    }
}
