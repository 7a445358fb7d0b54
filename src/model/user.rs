//! Actor reference carried by every notification.

use serde::{Deserialize, Serialize};

/// The account that triggered a notification (reacted, followed, replied, ...).
///
/// Remote actors carry a `host`; local actors do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: String,
    /// Display name; may be absent or empty, fall back to `username`
    #[serde(default)]
    pub name: Option<String>,
    pub username: String,
    /// Instance hostname for federated actors, `None` for local ones
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl UserRef {
    /// Name to show in a cell or a push title: `name` when set, else `username`.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }

    /// Fully qualified handle: `username@host` for remote actors, bare
    /// `username` for local ones.
    pub fn acct(&self) -> String {
        match self.host.as_deref() {
            Some(host) if !host.is_empty() => format!("{}@{}", self.username, host),
            _ => self.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: Option<&str>, host: Option<&str>) -> UserRef {
        UserRef {
            id: "u1".to_string(),
            name: name.map(String::from),
            username: "alice".to_string(),
            host: host.map(String::from),
            avatar_url: None,
        }
    }

    #[test]
    fn test_display_name_prefers_name() {
        assert_eq!(user(Some("Alice"), None).display_name(), "Alice");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(user(None, None).display_name(), "alice");
        assert_eq!(user(Some(""), None).display_name(), "alice");
    }

    #[test]
    fn test_acct_with_host() {
        assert_eq!(user(None, Some("example.com")).acct(), "alice@example.com");
    }

    #[test]
    fn test_acct_local() {
        assert_eq!(user(None, None).acct(), "alice");
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = r#"{"id":"u1","name":null,"username":"alice","host":"example.com","avatarUrl":"https://example.com/a.png"}"#;
        let parsed: UserRef = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.avatar_url.as_deref(), Some("https://example.com/a.png"));
    }
}
