use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::account::{Account, AccountDraft, AccountUpdate, AuthType};
use crate::error::AppError;
use crate::secrets::{token_key, SecretStore};
use crate::store::StateStore;

/// State store key holding the full account list
const ACCOUNTS_KEY: &str = "accounts";

/// Owns the durable collection of accounts.
///
/// The whole list is held in memory, loaded once at open, and rewritten to
/// the state store on every mutation. Token secrets are delegated to the
/// injected [`SecretStore`] and never touch the account records.
pub struct AccountRegistry {
    store: Box<dyn StateStore>,
    secrets: Box<dyn SecretStore>,
    accounts: Vec<Account>,
}

impl AccountRegistry {
    /// Opens the registry, loading any persisted accounts.
    pub fn open(
        store: Box<dyn StateStore>,
        secrets: Box<dyn SecretStore>,
    ) -> Result<Self, AppError> {
        let accounts: Vec<Account> = match store.get(ACCOUNTS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        debug!(count = accounts.len(), "loaded accounts");
        Ok(Self {
            store,
            secrets,
            accounts,
        })
    }

    /// Adds a new account and returns it with its id populated.
    ///
    /// The name must be non-empty and unused (case-insensitive); callers are
    /// expected to pre-validate, but the registry is the authority. For token
    /// accounts the secret, when given, is stored under the new id.
    pub fn add(&mut self, draft: AccountDraft, secret: Option<&str>) -> Result<Account, AppError> {
        if draft.name.trim().is_empty() {
            return Err(AppError::Validation(
                "account name cannot be empty".to_string(),
            ));
        }
        if self.find_by_name(&draft.name).is_some() {
            return Err(AppError::Validation(format!(
                "account name '{}' already exists",
                draft.name
            )));
        }

        let account = Account {
            id: generate_id(),
            name: draft.name,
            username: draft.username,
            email: draft.email,
            auth_type: draft.auth_type,
            ssh_key_path: draft.ssh_key_path,
            ssh_host: draft.ssh_host,
        };
        self.accounts.push(account.clone());
        self.persist()?;

        if account.auth_type == AuthType::Token {
            if let Some(secret) = secret {
                self.secrets.store(&token_key(&account.id), secret)?;
            }
        }

        info!(id = %account.id, name = %account.name, "account added");
        Ok(account)
    }

    /// Removes an account by id; returns whether a record was found.
    ///
    /// Removing a token account also deletes its secret. Unknown ids report
    /// not-found without error, so removal is idempotent.
    pub fn remove(&mut self, id: &str) -> Result<bool, AppError> {
        let Some(index) = self.accounts.iter().position(|account| account.id == id) else {
            return Ok(false);
        };

        let removed = self.accounts.remove(index);
        self.persist()?;

        if removed.auth_type == AuthType::Token {
            self.secrets.delete(&token_key(&removed.id))?;
        }

        info!(id = %removed.id, name = %removed.name, "account removed");
        Ok(true)
    }

    /// Merges the provided fields into an existing account and persists.
    ///
    /// Secrets are not touched. Returns whether the id was found.
    pub fn update(&mut self, id: &str, fields: AccountUpdate) -> Result<bool, AppError> {
        if let Some(new_name) = &fields.name {
            let taken = self
                .accounts
                .iter()
                .any(|account| account.id != id && account.name.to_lowercase() == new_name.to_lowercase());
            if taken {
                return Err(AppError::Validation(format!(
                    "account name '{new_name}' already exists"
                )));
            }
        }

        let Some(account) = self.accounts.iter_mut().find(|account| account.id == id) else {
            return Ok(false);
        };

        if let Some(name) = fields.name {
            account.name = name;
        }
        if let Some(username) = fields.username {
            account.username = username;
        }
        if let Some(email) = fields.email {
            account.email = email;
        }
        if let Some(auth_type) = fields.auth_type {
            account.auth_type = auth_type;
        }
        if let Some(ssh_key_path) = fields.ssh_key_path {
            account.ssh_key_path = Some(ssh_key_path);
        }
        if let Some(ssh_host) = fields.ssh_host {
            account.ssh_host = Some(ssh_host);
        }

        self.persist()?;
        debug!(id, "account updated");
        Ok(true)
    }

    /// Returns a copy of all accounts, safe for the caller to mutate.
    pub fn list(&self) -> Vec<Account> {
        self.accounts.clone()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    /// Finds an account by display name, case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&Account> {
        let needle = name.to_lowercase();
        self.accounts
            .iter()
            .find(|account| account.name.to_lowercase() == needle)
    }

    fn persist(&self) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(&self.accounts)?;
        self.store.set(ACCOUNTS_KEY, &json)
    }
}

/// Generates a fresh account id from a timestamp and a random component.
///
/// Uniqueness must hold across the process lifetime even under rapid
/// successive calls; the random suffix covers same-millisecond creations.
fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{millis:x}-{}", &suffix[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{draft, ssh_draft, MemorySecretStore, MemoryStateStore};

    fn registry() -> (AccountRegistry, MemorySecretStore) {
        let secrets = MemorySecretStore::new();
        let registry = AccountRegistry::open(
            Box::new(MemoryStateStore::new()),
            Box::new(secrets.clone()),
        )
        .unwrap();
        (registry, secrets)
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(generate_id()));
        }
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let (mut registry, _) = registry();
        let added = registry.add(draft("Work"), None).unwrap();

        let found = registry.find_by_name("wOrK").unwrap();
        assert_eq!(found.id, added.id);
    }

    #[test]
    fn duplicate_name_differing_only_in_case_is_rejected() {
        let (mut registry, _) = registry();
        registry.add(draft("Work"), None).unwrap();

        let result = registry.add(draft("WORK"), None);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn empty_name_is_rejected() {
        let (mut registry, _) = registry();
        let result = registry.add(draft("  "), None);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn duplicate_username_and_email_are_allowed() {
        let (mut registry, _) = registry();
        registry.add(draft("Work"), None).unwrap();
        registry.add(draft("Personal"), None).unwrap();

        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn remove_then_find_by_id_is_absent() {
        let (mut registry, _) = registry();
        let added = registry.add(draft("Work"), None).unwrap();

        assert!(registry.remove(&added.id).unwrap());
        assert!(registry.find_by_id(&added.id).is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let (mut registry, _) = registry();
        let added = registry.add(draft("Work"), None).unwrap();

        assert!(registry.remove(&added.id).unwrap());
        assert!(!registry.remove(&added.id).unwrap());
        assert!(!registry.remove("no-such-id").unwrap());
    }

    #[test]
    fn removing_token_account_deletes_its_secret() {
        let (mut registry, secrets) = registry();
        let added = registry.add(draft("Work"), Some("hunter2")).unwrap();
        assert_eq!(
            secrets.get(&token_key(&added.id)).unwrap().as_deref(),
            Some("hunter2")
        );

        registry.remove(&added.id).unwrap();
        assert!(secrets.get(&token_key(&added.id)).unwrap().is_none());
    }

    #[test]
    fn removing_ssh_account_leaves_secrets_alone() {
        let (mut registry, secrets) = registry();
        secrets.store("gitswitch.token.other", "keep").unwrap();
        let added = registry.add(ssh_draft("Work", "github.com-work"), None).unwrap();

        registry.remove(&added.id).unwrap();
        assert_eq!(
            secrets.get("gitswitch.token.other").unwrap().as_deref(),
            Some("keep")
        );
    }

    #[test]
    fn update_merges_only_provided_fields() {
        let (mut registry, _) = registry();
        let added = registry.add(ssh_draft("Work", "github.com-work"), None).unwrap();

        let found = registry
            .update(
                &added.id,
                AccountUpdate {
                    email: Some("new@co.com".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(found);

        let account = registry.find_by_id(&added.id).unwrap();
        assert_eq!(account.email, "new@co.com");
        assert_eq!(account.name, "Work");
        assert_eq!(account.ssh_host.as_deref(), Some("github.com-work"));
    }

    #[test]
    fn update_unknown_id_reports_not_found() {
        let (mut registry, _) = registry();
        let found = registry.update("no-such-id", AccountUpdate::default()).unwrap();
        assert!(!found);
    }

    #[test]
    fn update_rejects_name_collision() {
        let (mut registry, _) = registry();
        registry.add(draft("Work"), None).unwrap();
        let other = registry.add(draft("Personal"), None).unwrap();

        let result = registry.update(
            &other.id,
            AccountUpdate {
                name: Some("work".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn accounts_survive_reopen() {
        let store = MemoryStateStore::new();
        let secrets = MemorySecretStore::new();
        let id = {
            let mut registry =
                AccountRegistry::open(Box::new(store.clone()), Box::new(secrets.clone())).unwrap();
            registry.add(draft("Work"), None).unwrap().id
        };

        let reopened =
            AccountRegistry::open(Box::new(store), Box::new(secrets)).unwrap();
        assert_eq!(reopened.find_by_id(&id).unwrap().name, "Work");
    }
}
