//! Local account identity. Every feed operation takes the owner explicitly;
//! there is no process-wide "current user".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a signed-in local account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credentials for one signed-in account. Each account gets its own feed
/// controller instance; lists are never merged across accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Instance hostname, e.g. `misskey.example`
    pub host: String,
    /// API token used for both the paginated fetch and the stream channel
    pub api_token: String,
}

impl Account {
    pub fn new(id: impl Into<String>, host: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            id: AccountId::new(id),
            host: host.into(),
            api_token: api_token.into(),
        }
    }
}
