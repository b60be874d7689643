use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use crate::error::AppError;

/// Local identity configured for a repository (user.name / user.email).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub name: String,
    pub email: String,
}

/// Capability for talking to the Git executable.
///
/// Reads degrade to `Ok(None)` / `Ok(false)` when Git cannot answer (missing
/// config key, no remote, not a repository); writes surface any non-zero exit
/// as [`AppError::GitCommand`] carrying Git's stderr text.
pub trait GitAdapter {
    fn local_identity(&self, path: &Path) -> Result<Option<LocalIdentity>, AppError>;
    fn set_local_identity(&self, name: &str, email: &str, path: &Path) -> Result<(), AppError>;
    fn remote_url(&self, path: &Path) -> Result<Option<String>, AppError>;
    fn set_remote_url(&self, url: &str, path: &Path) -> Result<(), AppError>;
    fn is_repository(&self, path: &Path) -> Result<bool, AppError>;
    /// Root of the working tree containing `path`, or `None` outside a repo.
    fn toplevel(&self, path: &Path) -> Result<Option<PathBuf>, AppError>;
}

/// Adapter shelling out to the `git` binary.
pub struct CommandGit;

impl CommandGit {
    /// Executes a Git command against the repository at `path`
    fn run(&self, path: &Path, args: &[&str]) -> Result<Output, AppError> {
        debug!(path = %path.display(), ?args, "running git");
        let output: Output = Command::new("git")
            .arg("-C")
            .arg(path)
            .args(args)
            .output()?;
        Ok(output)
    }

    /// Executes a mutating Git command; non-zero exit is an error
    fn run_checked(&self, path: &Path, args: &[&str]) -> Result<(), AppError> {
        let output = self.run(path, args)?;
        if !output.status.success() {
            return Err(AppError::GitCommand(
                String::from_utf8(output.stderr)?.trim().to_string(),
            ));
        }
        Ok(())
    }

    /// Executes a read-only Git command; non-zero exit reads as absent
    fn run_query(&self, path: &Path, args: &[&str]) -> Result<Option<String>, AppError> {
        let output = self.run(path, args)?;
        if !output.status.success() {
            return Ok(None);
        }
        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() {
            return Ok(None);
        }
        Ok(Some(value))
    }
}

impl GitAdapter for CommandGit {
    fn local_identity(&self, path: &Path) -> Result<Option<LocalIdentity>, AppError> {
        let name = self.run_query(path, &["config", "--get", "user.name"])?;
        let email = self.run_query(path, &["config", "--get", "user.email"])?;
        match (name, email) {
            (Some(name), Some(email)) => Ok(Some(LocalIdentity { name, email })),
            _ => Ok(None),
        }
    }

    fn set_local_identity(&self, name: &str, email: &str, path: &Path) -> Result<(), AppError> {
        self.run_checked(path, &["config", "user.name", name])?;
        self.run_checked(path, &["config", "user.email", email])?;
        Ok(())
    }

    fn remote_url(&self, path: &Path) -> Result<Option<String>, AppError> {
        self.run_query(path, &["remote", "get-url", "origin"])
    }

    fn set_remote_url(&self, url: &str, path: &Path) -> Result<(), AppError> {
        self.run_checked(path, &["remote", "set-url", "origin", url])
    }

    fn is_repository(&self, path: &Path) -> Result<bool, AppError> {
        let value = self.run_query(path, &["rev-parse", "--is-inside-work-tree"])?;
        Ok(value.as_deref() == Some("true"))
    }

    fn toplevel(&self, path: &Path) -> Result<Option<PathBuf>, AppError> {
        let value = self.run_query(path, &["rev-parse", "--show-toplevel"])?;
        Ok(value.map(PathBuf::from))
    }
}
