use serde::{Deserialize, Serialize};

/// How an account authenticates against the Git remote.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// SSH key routed through a host alias in the SSH client config.
    Ssh,
    /// Personal access token, held in the secret store only.
    Token,
}

/// A stored Git account profile.
///
/// `ssh_key_path` and `ssh_host` are only meaningful when `auth_type` is
/// [`AuthType::Ssh`]; a token is never stored on the record itself.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Account {
    /// Opaque unique id, assigned at creation, never reused.
    pub id: String,
    /// Display label, unique among accounts (case-insensitive).
    pub name: String,
    /// Git username (user.name)
    pub username: String,
    /// Git email address (user.email)
    pub email: String,
    pub auth_type: AuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_host: Option<String>,
}

/// Input for creating an account; the registry assigns the id.
#[derive(Debug, Clone)]
pub struct AccountDraft {
    pub name: String,
    pub username: String,
    pub email: String,
    pub auth_type: AuthType,
    pub ssh_key_path: Option<String>,
    pub ssh_host: Option<String>,
}

/// Partial update for an existing account; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub auth_type: Option<AuthType>,
    pub ssh_key_path: Option<String>,
    pub ssh_host: Option<String>,
}
