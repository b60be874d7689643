use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::git::GitAdapter;
use crate::registry::AccountRegistry;
use crate::store::StateStore;

/// State store key holding the full mapping table
const MAPPINGS_KEY: &str = "mappings";

/// Per-repository override file, committed alongside the code
pub const REPO_ACCOUNT_FILE: &str = ".gitaccount";

/// Persisted association from a repository to an account.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RepoMapping {
    /// Absolute working-tree path; primary key, one mapping per path.
    pub repo_path: String,
    /// Referenced account id. May dangle after account removal; lookups
    /// then resolve to absent rather than failing.
    pub account_id: String,
    /// Optional substring matched against the repository's remote URL,
    /// letting one mapping cover every clone of the same remote.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_pattern: Option<String>,
}

/// Contents of the `.gitaccount` override file.
#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct RepoAccountFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account_name: Option<String>,
}

/// Resolves which account applies to a repository.
///
/// Owns the persisted repository -> account mapping table; account records
/// stay with the registry, which is consulted per lookup.
pub struct RepoResolver {
    store: Box<dyn StateStore>,
    git: Box<dyn GitAdapter>,
    mappings: Vec<RepoMapping>,
}

impl RepoResolver {
    /// Opens the resolver, loading any persisted mappings.
    pub fn open(store: Box<dyn StateStore>, git: Box<dyn GitAdapter>) -> Result<Self, AppError> {
        let mappings: Vec<RepoMapping> = match store.get(MAPPINGS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };
        debug!(count = mappings.len(), "loaded repo mappings");
        Ok(Self {
            store,
            git,
            mappings,
        })
    }

    /// Detects the account for a repository; first matching strategy wins.
    ///
    /// 1. `.gitaccount` file in the repository root (committed, shareable);
    /// 2. mapping whose remote pattern matches the repository's remote URL;
    /// 3. mapping keyed exactly by the repository path.
    ///
    /// Detection never fails: unreadable files, unknown accounts, and git
    /// errors all degrade to "no match", and `None` means the caller must
    /// fall back to manual selection.
    pub fn detect(&self, registry: &AccountRegistry, repo_path: &Path) -> Option<String> {
        if let Some(id) = self.detect_from_file(registry, repo_path) {
            debug!(%id, "account resolved from repo file");
            return Some(id);
        }

        if let Some(id) = self.detect_from_remote(repo_path) {
            debug!(%id, "account resolved from remote pattern");
            return Some(id);
        }

        let key = repo_path.to_string_lossy();
        if let Some(mapping) = self.mappings.iter().find(|m| m.repo_path == key) {
            debug!(id = %mapping.account_id, "account resolved from path mapping");
            return Some(mapping.account_id.clone());
        }

        None
    }

    fn detect_from_file(&self, registry: &AccountRegistry, repo_path: &Path) -> Option<String> {
        let file = read_repo_account_file(repo_path)?;

        if let Some(id) = &file.account_id {
            if let Some(account) = registry.find_by_id(id) {
                return Some(account.id.clone());
            }
        }
        if let Some(name) = &file.account_name {
            if let Some(account) = registry.find_by_name(name) {
                return Some(account.id.clone());
            }
        }
        None
    }

    fn detect_from_remote(&self, repo_path: &Path) -> Option<String> {
        let url = self.git.remote_url(repo_path).ok().flatten()?;
        self.mappings
            .iter()
            .find(|m| {
                m.remote_pattern
                    .as_deref()
                    .is_some_and(|pattern| !pattern.is_empty() && url.contains(pattern))
            })
            .map(|m| m.account_id.clone())
    }

    /// Upserts the mapping for a repository path and persists the table.
    pub fn set_mapping(
        &mut self,
        repo_path: &Path,
        account_id: &str,
        remote_pattern: Option<String>,
    ) -> Result<(), AppError> {
        let key = repo_path.to_string_lossy().into_owned();
        match self.mappings.iter_mut().find(|m| m.repo_path == key) {
            Some(mapping) => {
                mapping.account_id = account_id.to_string();
                mapping.remote_pattern = remote_pattern;
            }
            None => self.mappings.push(RepoMapping {
                repo_path: key,
                account_id: account_id.to_string(),
                remote_pattern,
            }),
        }
        self.persist()
    }

    /// Removes the mapping for a repository path, if any.
    pub fn remove_mapping(&mut self, repo_path: &Path) -> Result<bool, AppError> {
        let key = repo_path.to_string_lossy();
        let initial_len = self.mappings.len();
        self.mappings.retain(|m| m.repo_path != key);
        if self.mappings.len() == initial_len {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Returns the mapping table in first-registered order.
    pub fn mappings(&self) -> &[RepoMapping] {
        &self.mappings
    }

    /// Writes the `.gitaccount` override file for a repository.
    ///
    /// Records both the account id and name so clones can resolve by either;
    /// overwrites any existing file, establishing the highest-precedence
    /// override for that repository.
    pub fn write_repo_account_file(
        &self,
        registry: &AccountRegistry,
        repo_path: &Path,
        account_id: &str,
    ) -> Result<(), AppError> {
        let account = registry
            .find_by_id(account_id)
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))?;

        let file = RepoAccountFile {
            account_id: Some(account.id.clone()),
            account_name: Some(account.name.clone()),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(repo_path.join(REPO_ACCOUNT_FILE), json)?;
        Ok(())
    }

    fn persist(&self) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(&self.mappings)?;
        self.store.set(MAPPINGS_KEY, &json)
    }
}

/// Reads `.gitaccount` from a repository root; anything unreadable or
/// malformed is treated as absent.
fn read_repo_account_file(repo_path: &Path) -> Option<RepoAccountFile> {
    let path = repo_path.join(REPO_ACCOUNT_FILE);
    let contents = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(file) => Some(file),
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring malformed repo account file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{draft, FakeGit, MemorySecretStore, MemoryStateStore};

    fn registry_with(names: &[&str]) -> (AccountRegistry, Vec<String>) {
        let mut registry = AccountRegistry::open(
            Box::new(MemoryStateStore::new()),
            Box::new(MemorySecretStore::new()),
        )
        .unwrap();
        let ids = names
            .iter()
            .map(|name| registry.add(draft(name), None).unwrap().id)
            .collect();
        (registry, ids)
    }

    fn resolver(git: FakeGit) -> RepoResolver {
        RepoResolver::open(Box::new(MemoryStateStore::new()), Box::new(git)).unwrap()
    }

    #[test]
    fn detect_with_nothing_configured_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry_with(&["Work"]);
        let resolver = resolver(FakeGit::new());

        assert!(resolver.detect(&registry, dir.path()).is_none());
    }

    #[test]
    fn repo_file_beats_direct_path_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, ids) = registry_with(&["A", "B"]);

        let mut resolver = resolver(FakeGit::new());
        resolver.set_mapping(dir.path(), &ids[1], None).unwrap();
        resolver
            .write_repo_account_file(&registry, dir.path(), &ids[0])
            .unwrap();

        assert_eq!(resolver.detect(&registry, dir.path()), Some(ids[0].clone()));
    }

    #[test]
    fn remote_pattern_beats_direct_path_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, ids) = registry_with(&["A", "B"]);

        let git = FakeGit::new();
        git.set_remote(dir.path(), "git@github.com:acme/widget.git");

        let mut resolver = resolver(git);
        resolver.set_mapping(dir.path(), &ids[1], None).unwrap();
        resolver
            .set_mapping(
                Path::new("/somewhere/else"),
                &ids[0],
                Some("acme/widget".to_string()),
            )
            .unwrap();

        assert_eq!(resolver.detect(&registry, dir.path()), Some(ids[0].clone()));
    }

    #[test]
    fn direct_path_mapping_matches_when_nothing_else_does() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, ids) = registry_with(&["Work"]);

        let mut resolver = resolver(FakeGit::new());
        resolver.set_mapping(dir.path(), &ids[0], None).unwrap();

        assert_eq!(resolver.detect(&registry, dir.path()), Some(ids[0].clone()));
    }

    #[test]
    fn repo_file_round_trips_through_detect() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, ids) = registry_with(&["Work"]);
        let resolver = resolver(FakeGit::new());

        resolver
            .write_repo_account_file(&registry, dir.path(), &ids[0])
            .unwrap();

        assert_eq!(resolver.detect(&registry, dir.path()), Some(ids[0].clone()));
    }

    #[test]
    fn repo_file_resolves_by_name_when_id_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry_with(&["Work"]);

        let contents = r#"{
  "accountId": "gone",
  "accountName": "work"
}"#;
        fs::write(dir.path().join(REPO_ACCOUNT_FILE), contents).unwrap();

        let resolver = resolver(FakeGit::new());
        let id = resolver.detect(&registry, dir.path()).unwrap();
        assert_eq!(id, registry.find_by_name("Work").unwrap().id);
    }

    #[test]
    fn malformed_repo_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, ids) = registry_with(&["Work"]);

        fs::write(dir.path().join(REPO_ACCOUNT_FILE), "{not json").unwrap();

        let mut resolver = resolver(FakeGit::new());
        resolver.set_mapping(dir.path(), &ids[0], None).unwrap();

        // Falls through to the path mapping instead of erroring.
        assert_eq!(resolver.detect(&registry, dir.path()), Some(ids[0].clone()));
    }

    #[test]
    fn dangling_mapping_resolves_to_the_stale_id() {
        // Mappings referencing removed accounts are kept as-is; the caller
        // discovers the account is gone at lookup time.
        let dir = tempfile::tempdir().unwrap();
        let (mut registry, ids) = registry_with(&["Work"]);

        let mut resolver = resolver(FakeGit::new());
        resolver.set_mapping(dir.path(), &ids[0], None).unwrap();
        registry.remove(&ids[0]).unwrap();

        let detected = resolver.detect(&registry, dir.path()).unwrap();
        assert_eq!(detected, ids[0]);
        assert!(registry.find_by_id(&detected).is_none());
    }

    #[test]
    fn first_registered_remote_pattern_wins() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, ids) = registry_with(&["A", "B"]);

        let git = FakeGit::new();
        git.set_remote(dir.path(), "git@github.com:acme/widget.git");

        let mut resolver = resolver(git);
        resolver
            .set_mapping(Path::new("/one"), &ids[0], Some("acme".to_string()))
            .unwrap();
        resolver
            .set_mapping(Path::new("/two"), &ids[1], Some("acme/widget".to_string()))
            .unwrap();

        assert_eq!(resolver.detect(&registry, dir.path()), Some(ids[0].clone()));
    }

    #[test]
    fn empty_remote_pattern_never_matches() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, ids) = registry_with(&["A"]);

        let git = FakeGit::new();
        git.set_remote(dir.path(), "git@github.com:acme/widget.git");

        let mut resolver = resolver(git);
        resolver
            .set_mapping(Path::new("/one"), &ids[0], Some(String::new()))
            .unwrap();

        assert!(resolver.detect(&registry, dir.path()).is_none());
    }

    #[test]
    fn set_mapping_upserts_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let (_, ids) = registry_with(&["A", "B"]);

        let mut resolver = resolver(FakeGit::new());
        resolver.set_mapping(dir.path(), &ids[0], None).unwrap();
        resolver
            .set_mapping(dir.path(), &ids[1], Some("acme".to_string()))
            .unwrap();

        assert_eq!(resolver.mappings().len(), 1);
        assert_eq!(resolver.mappings()[0].account_id, ids[1]);
        assert_eq!(resolver.mappings()[0].remote_pattern.as_deref(), Some("acme"));
    }

    #[test]
    fn remove_mapping_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let (_, ids) = registry_with(&["A"]);

        let mut resolver = resolver(FakeGit::new());
        resolver.set_mapping(dir.path(), &ids[0], None).unwrap();

        assert!(resolver.remove_mapping(dir.path()).unwrap());
        assert!(!resolver.remove_mapping(dir.path()).unwrap());
    }

    #[test]
    fn write_repo_account_file_requires_known_account() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, _) = registry_with(&["Work"]);
        let resolver = resolver(FakeGit::new());

        let result = resolver.write_repo_account_file(&registry, dir.path(), "no-such-id");
        assert!(matches!(result, Err(AppError::AccountNotFound(_))));
        assert!(!dir.path().join(REPO_ACCOUNT_FILE).exists());
    }

    #[test]
    fn repo_account_file_uses_camel_case_and_two_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, ids) = registry_with(&["Work"]);
        let resolver = resolver(FakeGit::new());

        resolver
            .write_repo_account_file(&registry, dir.path(), &ids[0])
            .unwrap();

        let contents = fs::read_to_string(dir.path().join(REPO_ACCOUNT_FILE)).unwrap();
        assert!(contents.contains(&format!("  \"accountId\": \"{}\"", ids[0])));
        assert!(contents.contains("  \"accountName\": \"Work\""));
    }

    #[test]
    fn mappings_survive_reopen_in_order() {
        let store = MemoryStateStore::new();
        let (_, ids) = registry_with(&["A", "B"]);
        {
            let mut resolver =
                RepoResolver::open(Box::new(store.clone()), Box::new(FakeGit::new())).unwrap();
            resolver
                .set_mapping(Path::new("/one"), &ids[0], Some("one".to_string()))
                .unwrap();
            resolver
                .set_mapping(Path::new("/two"), &ids[1], Some("two".to_string()))
                .unwrap();
        }

        let reopened =
            RepoResolver::open(Box::new(store), Box::new(FakeGit::new())).unwrap();
        let paths: Vec<&str> = reopened.mappings().iter().map(|m| m.repo_path.as_str()).collect();
        assert_eq!(paths, vec!["/one", "/two"]);
    }
}
