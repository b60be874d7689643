//! Applies a chosen account to a repository: local identity config, remote
//! URL routing through an SSH host alias, and the alias itself.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::account::{Account, AuthType};
use crate::error::AppError;
use crate::git::GitAdapter;
use crate::ssh;

/// Side-effecting half of account switching.
///
/// Writes go to the repository's git config, its `origin` remote, and the
/// user's SSH client config; each write is sequential and a failure surfaces
/// without rolling back earlier writes.
pub struct IdentityApplier {
    git: Box<dyn GitAdapter>,
    ssh_config: PathBuf,
}

impl IdentityApplier {
    pub fn new(git: Box<dyn GitAdapter>) -> Result<Self, AppError> {
        Ok(Self {
            git,
            ssh_config: ssh::default_ssh_config_path()?,
        })
    }

    /// Builds an applier writing to a specific SSH config path.
    pub fn with_ssh_config(git: Box<dyn GitAdapter>, ssh_config: PathBuf) -> Self {
        Self { git, ssh_config }
    }

    /// Applies the account's identity to the repository.
    ///
    /// Sets `user.name` and `user.email`, then for SSH accounts rewrites the
    /// remote host through the account's alias. A repository with no remote
    /// is left alone; non-shorthand remote URLs (HTTPS and friends) are never
    /// rewritten.
    pub fn apply_identity(&self, account: &Account, repo_path: &Path) -> Result<(), AppError> {
        self.git
            .set_local_identity(&account.username, &account.email, repo_path)?;
        info!(account = %account.name, path = %repo_path.display(), "local identity set");

        if account.auth_type != AuthType::Ssh {
            return Ok(());
        }
        let Some(alias) = account.ssh_host.as_deref() else {
            return Err(AppError::Validation(format!(
                "ssh account '{}' has no host alias",
                account.name
            )));
        };

        let Some(url) = self.git.remote_url(repo_path)? else {
            debug!(path = %repo_path.display(), "repository has no remote, skipping rewrite");
            return Ok(());
        };

        match rewrite_ssh_host(&url, alias) {
            Some(rewritten) if rewritten != url => {
                self.git.set_remote_url(&rewritten, repo_path)?;
                info!(from = %url, to = %rewritten, "remote url rewritten");
            }
            Some(_) => debug!(%url, "remote already routed through alias"),
            None => debug!(%url, "remote url is not ssh shorthand, leaving unmodified"),
        }
        Ok(())
    }

    /// Makes sure the SSH config has a `Host` block for the account's alias.
    ///
    /// No-op for token accounts and for aliases already declared; otherwise
    /// appends a block pointing the alias at the account's key. Repeated
    /// calls leave exactly one block in place.
    pub fn ensure_ssh_alias(&self, account: &Account) -> Result<(), AppError> {
        if account.auth_type != AuthType::Ssh {
            return Ok(());
        }
        let (Some(alias), Some(key_path)) =
            (account.ssh_host.as_deref(), account.ssh_key_path.as_deref())
        else {
            return Err(AppError::Validation(format!(
                "ssh account '{}' is missing its host alias or key path",
                account.name
            )));
        };

        if ssh::host_alias_exists(&self.ssh_config, alias)? {
            debug!(alias, "ssh host alias already present");
            return Ok(());
        }
        ssh::append_host_alias(&self.ssh_config, alias, key_path)
    }
}

/// Rewrites the host segment of an SSH shorthand URL (`user@host:path`) to
/// `alias`, leaving the user and path segments untouched.
///
/// Returns `None` for anything that is not shorthand; URLs with an explicit
/// scheme fall through so HTTPS remotes are never rewritten.
pub fn rewrite_ssh_host(url: &str, alias: &str) -> Option<String> {
    if url.contains("://") {
        return None;
    }
    let (user, rest) = url.split_once('@')?;
    let (host, path) = rest.split_once(':')?;
    if user.is_empty() || host.is_empty() {
        return None;
    }
    Some(format!("{user}@{alias}:{path}"))
}
