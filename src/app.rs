//! Command-level glue wiring the core components together for the CLI.

use std::env;
use std::path::PathBuf;

use colored::Colorize;

use crate::account::{Account, AccountDraft, AccountUpdate, AuthType};
use crate::apply::IdentityApplier;
use crate::error::AppError;
use crate::git::{CommandGit, GitAdapter};
use crate::registry::AccountRegistry;
use crate::resolver::RepoResolver;
use crate::secrets::FileSecretStore;
use crate::store::JsonFileStore;

/// The assembled tool: registry, resolver and applier over the real
/// file-backed stores and the `git` binary.
pub struct App {
    registry: AccountRegistry,
    resolver: RepoResolver,
    applier: IdentityApplier,
    git: CommandGit,
}

impl App {
    pub fn open() -> Result<Self, AppError> {
        let registry = AccountRegistry::open(
            Box::new(JsonFileStore::open_default()?),
            Box::new(FileSecretStore::open_default()?),
        )?;
        let resolver =
            RepoResolver::open(Box::new(JsonFileStore::open_default()?), Box::new(CommandGit))?;
        let applier = IdentityApplier::new(Box::new(CommandGit))?;
        Ok(Self {
            registry,
            resolver,
            applier,
            git: CommandGit,
        })
    }

    /// Returns a copy of all accounts, for menus and listings.
    pub fn accounts(&self) -> Vec<Account> {
        self.registry.list()
    }

    /// Root of the repository containing the current directory.
    fn current_repo(&self) -> Result<PathBuf, AppError> {
        let cwd = env::current_dir()?;
        if !self.git.is_repository(&cwd)? {
            return Err(AppError::NotARepository(cwd.display().to_string()));
        }
        self.git
            .toplevel(&cwd)?
            .ok_or_else(|| AppError::NotARepository(cwd.display().to_string()))
    }

    /// Switches the current repository to the named account and remembers
    /// the choice as a direct path mapping.
    pub fn use_account(&mut self, name: &str) -> Result<(), AppError> {
        let account = self
            .registry
            .find_by_name(name)
            .cloned()
            .ok_or_else(|| AppError::AccountNotFound(name.to_string()))?;
        let repo = self.current_repo()?;

        self.applier.ensure_ssh_alias(&account)?;
        self.applier.apply_identity(&account, &repo)?;
        self.resolver.set_mapping(&repo, &account.id, None)?;

        println!("{} {}", "switched to account:".green(), account.name);
        Ok(())
    }

    /// Shows the account resolved for the current repository.
    ///
    /// The active account is a derived view: it is recomputed from the
    /// resolver on every call, never cached.
    pub fn status(&self) -> Result<(), AppError> {
        let repo = self.current_repo()?;

        match self.resolver.detect(&self.registry, &repo) {
            Some(id) => match self.registry.find_by_id(&id) {
                Some(account) => {
                    println!("{} {}", "active account:".blue(), account.name);
                }
                None => {
                    println!(
                        "{} {}",
                        "configured account no longer exists:".yellow(),
                        id
                    );
                }
            },
            None => println!("{}", "no account configured for this repository".yellow()),
        }

        if let Some(identity) = self.git.local_identity(&repo)? {
            println!(
                "{} {} <{}>",
                "repository identity:".blue(),
                identity.name,
                identity.email
            );
        }
        Ok(())
    }

    /// Adds a new account; a token, when given, goes to the secret store.
    pub fn add_account(
        &mut self,
        draft: AccountDraft,
        token: Option<&str>,
    ) -> Result<(), AppError> {
        let account = self.registry.add(draft, token)?;
        println!("{} {}", "account added:".green(), account.name);
        Ok(())
    }

    /// Removes the named account (and its token secret, if any).
    pub fn remove_account(&mut self, name: &str) -> Result<(), AppError> {
        let id = self
            .registry
            .find_by_name(name)
            .map(|account| account.id.clone())
            .ok_or_else(|| AppError::AccountNotFound(name.to_string()))?;

        self.registry.remove(&id)?;
        println!("{} {}", "account removed:".green(), name);
        Ok(())
    }

    /// Updates fields of the named account.
    pub fn update_account(&mut self, name: &str, fields: AccountUpdate) -> Result<(), AppError> {
        let id = self
            .registry
            .find_by_name(name)
            .map(|account| account.id.clone())
            .ok_or_else(|| AppError::AccountNotFound(name.to_string()))?;

        self.registry.update(&id, fields)?;
        println!("{} {}", "account updated:".green(), name);
        Ok(())
    }

    /// Lists all accounts
    pub fn list_accounts(&self) -> Result<(), AppError> {
        let accounts = self.registry.list();
        if accounts.is_empty() {
            println!("{}", "no accounts to show".red());
            return Ok(());
        }

        for account in accounts {
            let auth = match account.auth_type {
                AuthType::Ssh => format!(
                    "ssh via {}",
                    account.ssh_host.as_deref().unwrap_or("<no alias>")
                ),
                AuthType::Token => "token".to_string(),
            };
            println!(
                "{} {} <{}> [{}]",
                account.name.blue(),
                account.username,
                account.email,
                auth
            );
        }
        Ok(())
    }

    /// Maps the current repository to the named account, optionally by a
    /// remote URL pattern covering all clones of the same remote.
    pub fn map_repo(&mut self, name: &str, remote_pattern: Option<String>) -> Result<(), AppError> {
        let id = self
            .registry
            .find_by_name(name)
            .map(|account| account.id.clone())
            .ok_or_else(|| AppError::AccountNotFound(name.to_string()))?;
        let repo = self.current_repo()?;

        self.resolver.set_mapping(&repo, &id, remote_pattern)?;
        println!("{} {}", "repository mapped to account:".green(), name);
        Ok(())
    }

    /// Forgets the mapping for the current repository.
    pub fn unmap_repo(&mut self) -> Result<(), AppError> {
        let repo = self.current_repo()?;
        if self.resolver.remove_mapping(&repo)? {
            println!("{}", "repository mapping removed".green());
        } else {
            println!("{}", "no mapping for this repository".yellow());
        }
        Ok(())
    }

    /// Pins the named account for the current repository by writing a
    /// `.gitaccount` file, the highest-precedence override.
    pub fn pin_account(&mut self, name: &str) -> Result<(), AppError> {
        let id = self
            .registry
            .find_by_name(name)
            .map(|account| account.id.clone())
            .ok_or_else(|| AppError::AccountNotFound(name.to_string()))?;
        let repo = self.current_repo()?;

        self.resolver
            .write_repo_account_file(&self.registry, &repo, &id)?;
        println!("{} {}", "account pinned via .gitaccount:".green(), name);
        Ok(())
    }
}
