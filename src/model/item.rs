//! The unified notification cell model produced by the normalizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::note::{CustomEmoji, Note};
use super::user::UserRef;

/// Normalized notification kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Follow,
    Reply,
    Mention,
    Renote,
    Quote,
    Reaction,
}

impl NotificationKind {
    /// Parse the wire discriminator. Unknown kinds return `None` and the
    /// record is skipped.
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "follow" => Some(Self::Follow),
            "reply" => Some(Self::Reply),
            "mention" => Some(Self::Mention),
            "renote" => Some(Self::Renote),
            "quote" => Some(Self::Quote),
            "reaction" => Some(Self::Reaction),
            _ => None,
        }
    }
}

/// Auxiliary note attached to Reply/Mention/Quote items.
///
/// `wraps_note` is set for quotes so a renderer knows the context note wraps
/// another note rather than standing alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextNote {
    pub note: Note,
    pub wraps_note: bool,
}

impl ContextNote {
    pub fn plain(note: Note) -> Self {
        Self { note, wraps_note: false }
    }

    pub fn quoting(note: Note) -> Self {
        Self { note, wraps_note: true }
    }
}

/// One entry of the in-memory notification list.
///
/// The kind fully determines which optional fields are populated:
///
/// | kind           | primary_note       | context_note     | reaction |
/// |----------------|--------------------|------------------|----------|
/// | Follow         | -                  | -                | -        |
/// | Reply/Mention  | reply-parent note  | the target note  | -        |
/// | Renote         | inner renoted note | -                | -        |
/// | Quote          | inner quoted note  | the quoting note | -        |
/// | Reaction       | reacted-to note    | -                | token    |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    /// Source-assigned id; unique within one account's list after dedup,
    /// doubles as the pagination cursor
    pub id: String,
    pub kind: NotificationKind,
    pub from_user: UserRef,
    pub primary_note: Option<Note>,
    pub context_note: Option<ContextNote>,
    /// Raw reaction token: default emoji text or a custom-emoji reference
    pub reaction: Option<String>,
    /// Custom emoji referenced by the nested notes, possibly from a
    /// federated instance whose emoji are not locally known
    pub external_emojis: Vec<CustomEmoji>,
    pub created_at: DateTime<Utc>,
    /// The local account this notification belongs to
    pub owner: AccountId,
}

impl NotificationItem {
    /// One-line human-readable summary, used by the CLI tail view.
    pub fn summary(&self) -> String {
        let actor = self.from_user.display_name();
        match self.kind {
            NotificationKind::Follow => format!("{} followed you", self.from_user.acct()),
            NotificationKind::Reply | NotificationKind::Mention => {
                let text = self
                    .context_note
                    .as_ref()
                    .and_then(|c| c.note.text.as_deref())
                    .unwrap_or_default();
                format!("{actor} replied: {text}")
            }
            NotificationKind::Renote => format!("{actor} renoted your note"),
            NotificationKind::Quote => {
                let text = self
                    .context_note
                    .as_ref()
                    .and_then(|c| c.note.text.as_deref())
                    .unwrap_or_default();
                format!("{actor} quote-renoted: {text}")
            }
            NotificationKind::Reaction => {
                let reaction = self.reaction.as_deref().unwrap_or_default();
                format!("{actor} reacted with {reaction}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_wire() {
        assert_eq!(NotificationKind::from_wire("reaction"), Some(NotificationKind::Reaction));
        assert_eq!(NotificationKind::from_wire("quote"), Some(NotificationKind::Quote));
        assert_eq!(NotificationKind::from_wire("pollEnded"), None);
    }

    #[test]
    fn test_follow_summary_uses_full_handle() {
        let item = NotificationItem {
            id: "1".to_string(),
            kind: NotificationKind::Follow,
            from_user: UserRef {
                id: "u1".to_string(),
                name: Some("Alice".to_string()),
                username: "alice".to_string(),
                host: Some("remote.example".to_string()),
                avatar_url: None,
            },
            primary_note: None,
            context_note: None,
            reaction: None,
            external_emojis: Vec::new(),
            created_at: Utc::now(),
            owner: AccountId::new("acct-1"),
        };
        assert_eq!(item.summary(), "alice@remote.example followed you");
    }
}
