//! Raw notification records as delivered by the two upstream sources.
//!
//! The REST fetch and the live stream carry the same semantic fields under
//! different shapes. The ingestion boundary models this as an explicit tagged
//! union so the normalizer can pattern-match on the source instead of
//! structurally guessing what it was handed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::note::Note;
use super::user::UserRef;

/// REST-shaped notification object from the paginated fetch endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNotification {
    pub id: String,
    /// Wire kind discriminator: mention, reply, renote, quote, reaction, follow
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub note: Option<Note>,
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Stream-shaped notification event from the main channel.
///
/// Unlike the REST shape the kind tag is optional here: reaction events are
/// recognized by the presence of the `reaction` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamNotification {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub note: Option<Note>,
    #[serde(default)]
    pub reaction: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A raw record from either source, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RawNotificationRecord {
    /// Paginated REST fetch
    Fetch(ApiNotification),
    /// Stream delivery of a bare note with a mention/reply kind hint
    StreamNote(Note),
    /// Stream delivery of a notification event
    StreamNotification(StreamNotification),
}

impl RawNotificationRecord {
    /// Source-assigned id, used as dedup-independent identity and as the
    /// pagination cursor. Stream events may lack one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Fetch(n) => Some(&n.id),
            Self::StreamNote(note) => Some(&note.id),
            Self::StreamNotification(n) => n.id.as_deref(),
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Fetch(n) => n.created_at,
            Self::StreamNote(note) => note.created_at,
            Self::StreamNotification(n) => n.created_at,
        }
    }
}
