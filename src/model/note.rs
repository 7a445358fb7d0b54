//! Note payloads as they appear inside raw notification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserRef;

/// Custom emoji definition shipped alongside a note.
///
/// Needed because a note may originate from a federated instance whose emoji
/// are not locally known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomEmoji {
    pub name: String,
    pub url: String,
}

/// A note as nested inside a notification record.
///
/// `renote` holds the inner note for renotes and quotes; `reply` holds the
/// parent note a reply targets. Both are one level deep on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub renote: Option<Box<Note>>,
    #[serde(default)]
    pub reply: Option<Box<Note>>,
    #[serde(default)]
    pub emojis: Vec<CustomEmoji>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Note {
    /// Whether the note carries authored text. A renote wrapper with no text
    /// of its own is a plain renote; with text it is a quote.
    pub fn has_text(&self) -> bool {
        self.text.as_deref().map(|t| !t.is_empty()).unwrap_or(false)
    }
}
