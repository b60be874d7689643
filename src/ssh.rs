use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::AppError;

/// Real host every alias resolves to
const SSH_HOSTNAME: &str = "github.com";
/// SSH user for Git transport
const SSH_USER: &str = "git";

/// Gets the path to the user's SSH client config
pub fn default_ssh_config_path() -> Result<PathBuf, AppError> {
    let home_dir: PathBuf = dirs::home_dir().ok_or_else(|| {
        AppError::Validation("failed to find the home directory".to_string())
    })?;
    Ok(home_dir.join(".ssh").join("config"))
}

/// Checks whether a `Host` declaration for `alias` already exists.
///
/// Scans line by line; a missing config file reads as "no aliases".
pub fn host_alias_exists(config_path: &Path, alias: &str) -> Result<bool, AppError> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err.into()),
    };

    for line in contents.lines() {
        let mut fields = line.split_whitespace();
        if fields
            .next()
            .is_some_and(|keyword| keyword.eq_ignore_ascii_case("Host"))
            && fields.any(|pattern| pattern == alias)
        {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Appends a `Host` block routing `alias` to github.com with the given key.
///
/// Creates the parent directory owner-only if missing. Existing config
/// content is never rewritten, only appended to.
pub fn append_host_alias(config_path: &Path, alias: &str, key_path: &str) -> Result<(), AppError> {
    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
            }
            debug!(dir = %parent.display(), "created ssh directory");
        }
    }

    let block = format!(
        "\nHost {alias}\n  HostName {SSH_HOSTNAME}\n  User {SSH_USER}\n  IdentityFile {key_path}\n  IdentitiesOnly yes\n"
    );

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config_path)?;
    file.write_all(block.as_bytes())?;

    info!(alias, config = %config_path.display(), "appended ssh host alias");
    Ok(())
}
