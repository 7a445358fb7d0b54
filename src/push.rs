//! Push-notification content formatter.
//!
//! Stateless, best-effort collaborator for the push delivery system: given a
//! raw server payload of shape `{"type": "notification", "body": {...}}` it
//! renders a human-readable `(title, body)` pair using the same
//! kind-to-field mapping as the normalizer. Invoked by push delivery, never
//! by the feed controller.

use serde::Deserialize;

use crate::model::{Note, UserRef};

/// Rendered push text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushContent {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct PushEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    body: Option<PushBody>,
}

#[derive(Debug, Deserialize)]
struct PushBody {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    user: Option<UserRef>,
    #[serde(default)]
    note: Option<Note>,
    #[serde(default)]
    reaction: Option<String>,
}

/// Render the payload, or `None` when it is not a notification envelope or
/// the kind has no push rendering.
pub fn generate_contents(raw_payload: &str) -> Option<PushContent> {
    let envelope: PushEnvelope = serde_json::from_str(raw_payload).ok()?;
    if envelope.kind != "notification" {
        return None;
    }
    let body = envelope.body?;
    let user = body.user.as_ref()?;
    let actor = user.display_name().to_string();

    match body.kind.as_str() {
        "reaction" => {
            let reaction = body.reaction?;
            let note = body.note?;
            Some(PushContent {
                title: format!("{actor} reacted with \"{reaction}\""),
                body: note.text.unwrap_or_default(),
            })
        }
        "follow" => Some(PushContent {
            title: String::new(),
            body: format!("{} followed you", user.acct()),
        }),
        "reply" | "mention" => {
            let note = body.note?;
            Some(PushContent {
                title: format!("{actor}'s reply:"),
                body: note.text.unwrap_or_default(),
            })
        }
        "renote" | "quote" => {
            let note = body.note?;
            // A renote wrapper without authored text is a plain renote; the
            // body then comes from the inner renoted note.
            if note.text.is_none() {
                Some(PushContent {
                    title: format!("{actor} renoted"),
                    body: note
                        .renote
                        .and_then(|inner| inner.text)
                        .unwrap_or_default(),
                })
            } else {
                Some(PushContent {
                    title: format!("{actor} quote-renoted"),
                    body: note.text.unwrap_or_default(),
                })
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_payload() {
        let payload = r#"{
            "type": "notification",
            "body": {
                "type": "reaction",
                "user": {"id": "u1", "name": "Alice", "username": "alice"},
                "note": {"id": "n1", "text": "my note"},
                "reaction": ":party_cat:"
            }
        }"#;
        let content = generate_contents(payload).unwrap();
        assert_eq!(content.title, "Alice reacted with \":party_cat:\"");
        assert_eq!(content.body, "my note");
    }

    #[test]
    fn test_follow_payload_uses_handle_and_empty_title() {
        let payload = r#"{
            "type": "notification",
            "body": {
                "type": "follow",
                "user": {"id": "u1", "username": "alice", "host": "remote.example"}
            }
        }"#;
        let content = generate_contents(payload).unwrap();
        assert_eq!(content.title, "");
        assert_eq!(content.body, "alice@remote.example followed you");
    }

    #[test]
    fn test_reply_payload() {
        let payload = r#"{
            "type": "notification",
            "body": {
                "type": "reply",
                "user": {"id": "u1", "username": "alice"},
                "note": {"id": "n1", "text": "good point"}
            }
        }"#;
        let content = generate_contents(payload).unwrap();
        assert_eq!(content.title, "alice's reply:");
        assert_eq!(content.body, "good point");
    }

    #[test]
    fn test_plain_renote_reads_inner_text() {
        let payload = r#"{
            "type": "notification",
            "body": {
                "type": "renote",
                "user": {"id": "u1", "username": "alice"},
                "note": {"id": "outer", "text": null, "renote": {"id": "inner", "text": "original"}}
            }
        }"#;
        let content = generate_contents(payload).unwrap();
        assert_eq!(content.title, "alice renoted");
        assert_eq!(content.body, "original");
    }

    #[test]
    fn test_quote_renote_reads_outer_text() {
        let payload = r#"{
            "type": "notification",
            "body": {
                "type": "renote",
                "user": {"id": "u1", "username": "alice"},
                "note": {"id": "outer", "text": "look at this", "renote": {"id": "inner", "text": "original"}}
            }
        }"#;
        let content = generate_contents(payload).unwrap();
        assert_eq!(content.title, "alice quote-renoted");
        assert_eq!(content.body, "look at this");
    }

    #[test]
    fn test_non_notification_envelope_is_ignored() {
        assert!(generate_contents(r#"{"type": "readAllNotifications", "body": {}}"#).is_none());
    }

    #[test]
    fn test_unknown_kind_is_ignored() {
        let payload = r#"{
            "type": "notification",
            "body": {"type": "pollEnded", "user": {"id": "u1", "username": "alice"}}
        }"#;
        assert!(generate_contents(payload).is_none());
    }

    #[test]
    fn test_garbage_payload_is_ignored() {
        assert!(generate_contents("not json").is_none());
    }
}
