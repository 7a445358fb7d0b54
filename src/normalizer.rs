//! Notification normalizer - pure mapping from a raw record (either source)
//! to the unified `NotificationItem`. No I/O.
//!
//! Returns `None` when a record lacks a required field for its kind (missing
//! actor, missing note where one is required). Callers skip such records
//! silently; one malformed record must never abort a batch.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::{
    AccountId, ApiNotification, ContextNote, Note, NotificationItem, NotificationKind,
    RawNotificationRecord, StreamNotification, UserRef,
};

/// Normalize a raw record into the unified cell model.
pub fn normalize(raw: &RawNotificationRecord, owner: &AccountId) -> Option<NotificationItem> {
    match raw {
        RawNotificationRecord::Fetch(n) => normalize_fetch(n, owner),
        RawNotificationRecord::StreamNote(note) => normalize_stream_note(note, owner),
        RawNotificationRecord::StreamNotification(n) => normalize_stream_notification(n, owner),
    }
}

fn normalize_fetch(n: &ApiNotification, owner: &AccountId) -> Option<NotificationItem> {
    let Some(kind) = NotificationKind::from_wire(&n.kind) else {
        debug!(id = %n.id, kind = %n.kind, "skipping notification of unknown kind");
        return None;
    };
    let user = n.user.clone()?;

    if kind == NotificationKind::Follow {
        return Some(follow_item(n.id.clone(), user, n.created_at, owner));
    }

    let note = n.note.as_ref()?;
    build(kind, n.id.clone(), user, note, n.reaction.clone(), n.created_at, owner)
}

/// A bare note delivered over the stream with a mention/reply kind hint.
/// The note itself is the reply; its parent is the note of ours it targets.
fn normalize_stream_note(note: &Note, owner: &AccountId) -> Option<NotificationItem> {
    let user = note.user.clone()?;
    build(
        NotificationKind::Reply,
        note.id.clone(),
        user,
        note,
        None,
        note.created_at,
        owner,
    )
}

fn normalize_stream_notification(
    n: &StreamNotification,
    owner: &AccountId,
) -> Option<NotificationItem> {
    let id = n.id.clone()?;
    let user = n.user.clone()?;

    // Reaction events are recognized by field presence; the kind tag is not
    // reliable on this shape.
    let kind = if n.reaction.is_some() {
        NotificationKind::Reaction
    } else {
        let wire = n.kind.as_deref()?;
        let Some(kind) = NotificationKind::from_wire(wire) else {
            debug!(id = %id, kind = %wire, "skipping stream event of unknown kind");
            return None;
        };
        kind
    };

    if kind == NotificationKind::Follow {
        return Some(follow_item(id, user, n.created_at, owner));
    }

    let note = n.note.as_ref()?;
    build(kind, id, user, note, n.reaction.clone(), n.created_at, owner)
}

fn follow_item(
    id: String,
    from_user: UserRef,
    created_at: Option<DateTime<Utc>>,
    owner: &AccountId,
) -> NotificationItem {
    NotificationItem {
        id,
        kind: NotificationKind::Follow,
        from_user,
        primary_note: None,
        context_note: None,
        reaction: None,
        external_emojis: Vec::new(),
        created_at: created_at.unwrap_or_else(Utc::now),
        owner: owner.clone(),
    }
}

/// Kind-to-field mapping for all note-carrying kinds, shared by both wire
/// shapes. `note` is the outer note of the raw record.
fn build(
    kind: NotificationKind,
    id: String,
    from_user: UserRef,
    note: &Note,
    reaction: Option<String>,
    created_at: Option<DateTime<Utc>>,
    owner: &AccountId,
) -> Option<NotificationItem> {
    // External emoji always come from the outer note of the raw record.
    let external_emojis = note.emojis.clone();

    let (kind, primary_note, context_note, reaction) = match kind {
        NotificationKind::Reply | NotificationKind::Mention => {
            // The target note is the context; the note of ours it replies to
            // is the primary.
            let parent = note.reply.as_deref()?.clone();
            (
                kind,
                Some(parent),
                Some(ContextNote::plain(note.clone())),
                None,
            )
        }
        NotificationKind::Renote | NotificationKind::Quote => {
            // Unwrap one level into the renoted note. Whether the outer note
            // carries its own text decides renote vs quote, regardless of
            // the wire tag.
            let inner = note.renote.as_deref()?.clone();
            if note.has_text() {
                (
                    NotificationKind::Quote,
                    Some(inner),
                    Some(ContextNote::quoting(note.clone())),
                    None,
                )
            } else {
                (NotificationKind::Renote, Some(inner), None, None)
            }
        }
        NotificationKind::Reaction => {
            let token = reaction?;
            (
                NotificationKind::Reaction,
                Some(note.clone()),
                None,
                Some(token),
            )
        }
        // Handled before build()
        NotificationKind::Follow => return None,
    };

    Some(NotificationItem {
        id,
        kind,
        from_user,
        primary_note,
        context_note,
        reaction,
        external_emojis,
        created_at: created_at.unwrap_or_else(Utc::now),
        owner: owner.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CustomEmoji;

    fn owner() -> AccountId {
        AccountId::new("acct-1")
    }

    fn user() -> UserRef {
        UserRef {
            id: "u1".to_string(),
            name: Some("Alice".to_string()),
            username: "alice".to_string(),
            host: None,
            avatar_url: None,
        }
    }

    fn note(id: &str, text: Option<&str>) -> Note {
        Note {
            id: id.to_string(),
            user: None,
            text: text.map(String::from),
            renote: None,
            reply: None,
            emojis: Vec::new(),
            created_at: None,
        }
    }

    fn fetch(kind: &str, target: Option<Note>, reaction: Option<&str>) -> RawNotificationRecord {
        RawNotificationRecord::Fetch(ApiNotification {
            id: "notif-1".to_string(),
            kind: kind.to_string(),
            user: Some(user()),
            note: target,
            reaction: reaction.map(String::from),
            created_at: None,
        })
    }

    #[test]
    fn test_follow_has_no_notes_and_no_reaction() {
        let item = normalize(&fetch("follow", None, None), &owner()).unwrap();
        assert_eq!(item.kind, NotificationKind::Follow);
        assert!(item.primary_note.is_none());
        assert!(item.context_note.is_none());
        assert!(item.reaction.is_none());
    }

    #[test]
    fn test_reaction_populates_primary_and_token_only() {
        let item = normalize(
            &fetch("reaction", Some(note("n1", Some("my note"))), Some(":cat:")),
            &owner(),
        )
        .unwrap();
        assert_eq!(item.kind, NotificationKind::Reaction);
        assert_eq!(item.primary_note.as_ref().unwrap().id, "n1");
        assert_eq!(item.reaction.as_deref(), Some(":cat:"));
        assert!(item.context_note.is_none());
    }

    #[test]
    fn test_reaction_without_token_is_skipped() {
        assert!(normalize(&fetch("reaction", Some(note("n1", None)), None), &owner()).is_none());
    }

    #[test]
    fn test_reply_swaps_note_roles() {
        let mut target = note("reply-note", Some("nice post!"));
        target.reply = Some(Box::new(note("my-note", Some("original"))));

        let item = normalize(&fetch("reply", Some(target), None), &owner()).unwrap();
        assert_eq!(item.kind, NotificationKind::Reply);
        assert_eq!(item.primary_note.as_ref().unwrap().id, "my-note");
        let context = item.context_note.as_ref().unwrap();
        assert_eq!(context.note.id, "reply-note");
        assert!(!context.wraps_note);
    }

    #[test]
    fn test_reply_without_parent_is_skipped() {
        let target = note("reply-note", Some("nice post!"));
        assert!(normalize(&fetch("reply", Some(target), None), &owner()).is_none());
    }

    #[test]
    fn test_plain_renote_unwraps_inner_note() {
        let mut outer = note("outer", None);
        outer.renote = Some(Box::new(note("inner", Some("original"))));

        let item = normalize(&fetch("renote", Some(outer), None), &owner()).unwrap();
        assert_eq!(item.kind, NotificationKind::Renote);
        assert_eq!(item.primary_note.as_ref().unwrap().id, "inner");
        assert!(item.context_note.is_none());
    }

    #[test]
    fn test_renote_with_outer_text_becomes_quote() {
        let mut outer = note("outer", Some("check this out"));
        outer.renote = Some(Box::new(note("inner", Some("original"))));

        let item = normalize(&fetch("renote", Some(outer), None), &owner()).unwrap();
        assert_eq!(item.kind, NotificationKind::Quote);
        assert_eq!(item.primary_note.as_ref().unwrap().id, "inner");
        let context = item.context_note.as_ref().unwrap();
        assert_eq!(context.note.id, "outer");
        assert!(context.wraps_note);
    }

    #[test]
    fn test_quote_without_inner_note_is_skipped() {
        let outer = note("outer", Some("check this out"));
        assert!(normalize(&fetch("quote", Some(outer), None), &owner()).is_none());
    }

    #[test]
    fn test_missing_actor_is_skipped() {
        let raw = RawNotificationRecord::Fetch(ApiNotification {
            id: "notif-1".to_string(),
            kind: "follow".to_string(),
            user: None,
            note: None,
            reaction: None,
            created_at: None,
        });
        assert!(normalize(&raw, &owner()).is_none());
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        assert!(normalize(&fetch("pollEnded", Some(note("n1", None)), None), &owner()).is_none());
    }

    #[test]
    fn test_external_emojis_read_from_outer_note() {
        let mut target = note("n1", Some("my note"));
        target.emojis = vec![CustomEmoji {
            name: "party_cat".to_string(),
            url: "https://remote.example/party.png".to_string(),
        }];

        let item = normalize(&fetch("reaction", Some(target), None), &owner());
        // Missing reaction token, still skipped.
        assert!(item.is_none());

        let mut target = note("n1", Some("my note"));
        target.emojis = vec![CustomEmoji {
            name: "party_cat".to_string(),
            url: "https://remote.example/party.png".to_string(),
        }];
        let item = normalize(&fetch("reaction", Some(target), Some(":party_cat:")), &owner()).unwrap();
        assert_eq!(item.external_emojis.len(), 1);
        assert_eq!(item.external_emojis[0].name, "party_cat");
    }

    #[test]
    fn test_stream_note_shape_normalizes_as_reply() {
        let mut reply = note("reply-note", Some("hey"));
        reply.user = Some(user());
        reply.reply = Some(Box::new(note("my-note", Some("original"))));

        let item = normalize(&RawNotificationRecord::StreamNote(reply), &owner()).unwrap();
        assert_eq!(item.kind, NotificationKind::Reply);
        assert_eq!(item.id, "reply-note");
        assert_eq!(item.primary_note.as_ref().unwrap().id, "my-note");
        assert_eq!(item.context_note.as_ref().unwrap().note.id, "reply-note");
    }

    #[test]
    fn test_stream_reaction_recognized_by_field_presence() {
        let raw = RawNotificationRecord::StreamNotification(StreamNotification {
            id: Some("notif-2".to_string()),
            kind: None,
            user: Some(user()),
            note: Some(note("n1", Some("my note"))),
            reaction: Some("👍".to_string()),
            created_at: None,
        });
        let item = normalize(&raw, &owner()).unwrap();
        assert_eq!(item.kind, NotificationKind::Reaction);
        assert_eq!(item.reaction.as_deref(), Some("👍"));
        assert!(item.context_note.is_none());
    }

    #[test]
    fn test_stream_renote_unwraps_like_fetch() {
        let mut outer = note("outer", None);
        outer.renote = Some(Box::new(note("inner", Some("original"))));
        let raw = RawNotificationRecord::StreamNotification(StreamNotification {
            id: Some("notif-3".to_string()),
            kind: Some("renote".to_string()),
            user: Some(user()),
            note: Some(outer),
            reaction: None,
            created_at: None,
        });
        let item = normalize(&raw, &owner()).unwrap();
        assert_eq!(item.kind, NotificationKind::Renote);
        assert_eq!(item.primary_note.as_ref().unwrap().id, "inner");
    }

    #[test]
    fn test_owner_is_attached() {
        let item = normalize(&fetch("follow", None, None), &AccountId::new("acct-9")).unwrap();
        assert_eq!(item.owner, AccountId::new("acct-9"));
    }
}
