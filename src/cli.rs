use clap::{Parser, Subcommand};

/// CLI arguments parser using `clap`
#[derive(Parser, Debug)]
#[command(name = "gitswitch", version, about)]
pub struct Cli {
    /// Subcommand chosen to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Switches the current repository to the named account
    Use {
        /// Name of the account to switch to
        name: String,
    },
    /// Adds a new account
    Add {
        /// Unique display name for the account
        name: String,
        /// Git username
        username: String,
        /// Git email
        email: String,
        /// Path to the SSH private key for this account
        #[arg(long, requires = "ssh_host")]
        ssh_key: Option<String>,
        /// SSH host alias substituted into remote URLs
        #[arg(long, requires = "ssh_key")]
        ssh_host: Option<String>,
        /// Personal access token, kept in the secret store only
        #[arg(long, conflicts_with_all = ["ssh_key", "ssh_host"])]
        token: Option<String>,
    },
    /// Removes an account
    Remove {
        /// Name of the account to remove
        name: String,
    },
    /// Updates fields of an existing account
    Update {
        /// Name of the account to update
        name: String,
        /// New display name
        #[arg(long)]
        new_name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        ssh_key: Option<String>,
        #[arg(long)]
        ssh_host: Option<String>,
    },
    /// Displays all stored accounts
    List,
    /// Shows the account resolved for the current repository
    Status,
    /// Remembers the named account for the current repository
    Map {
        /// Name of the account to map
        name: String,
        /// Remote URL substring so the mapping covers every clone
        #[arg(long)]
        remote_pattern: Option<String>,
    },
    /// Forgets the mapping for the current repository
    Unmap,
    /// Writes a .gitaccount file pinning the named account
    Pin {
        /// Name of the account to pin
        name: String,
    },
}
