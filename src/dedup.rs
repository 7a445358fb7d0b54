//! Duplicate detection and the deduplicated in-memory list.
//!
//! A remote actor repeatedly updating the same reaction or the same note
//! produces multiple notification events for what the user perceives as one
//! logical event. Two items are duplicates iff they agree on actor, primary
//! note, kind and (when both carry one) context note. Reaction text is
//! deliberately not part of the key: changing the emoji on the same note
//! replaces the older notification.
//!
//! The list keeps a keyed index for O(1) duplicate lookup instead of a
//! linear scan, with the replace policy: the candidate always carries fresher
//! state, so the existing entry is removed and the candidate takes the
//! position the operation dictates.

use std::collections::HashMap;

use crate::model::{NotificationItem, NotificationKind};

/// Identity of one logical notification event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    from_user_id: String,
    primary_note_id: String,
    kind: NotificationKind,
    context_note_id: Option<String>,
}

impl DedupKey {
    /// Key of an item, or `None` for items that never participate in dedup
    /// (Follow carries no primary note).
    pub fn of(item: &NotificationItem) -> Option<Self> {
        let primary = item.primary_note.as_ref()?;
        Some(Self {
            from_user_id: item.from_user.id.clone(),
            primary_note_id: primary.id.clone(),
            kind: item.kind,
            context_note_id: item.context_note.as_ref().map(|c| c.note.id.clone()),
        })
    }
}

/// Whether `candidate` is a duplicate of `existing`.
pub fn is_duplicate_of(candidate: &NotificationItem, existing: &NotificationItem) -> bool {
    match (DedupKey::of(candidate), DedupKey::of(existing)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Ordered, duplicate-free notification list (newest first).
///
/// Maintains a `DedupKey -> id` index alongside the vector; all inserts go
/// through the duplicate check so the id-uniqueness invariant holds at every
/// instant.
#[derive(Debug, Default)]
pub struct FeedList {
    items: Vec<NotificationItem>,
    index: HashMap<DedupKey, String>,
}

impl FeedList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[NotificationItem] {
        &self.items
    }

    /// Clone of the current list, for publishing to consumers.
    pub fn snapshot(&self) -> Vec<NotificationItem> {
        self.items.clone()
    }

    /// Id of the newest entry (head), the reload cursor.
    pub fn newest_id(&self) -> Option<&str> {
        self.items.first().map(|i| i.id.as_str())
    }

    /// Id of the oldest entry (tail), the backward-pagination cursor.
    pub fn oldest_id(&self) -> Option<&str> {
        self.items.last().map(|i| i.id.as_str())
    }

    /// Insert at the head (stream events, reconcile merges).
    pub fn push_front(&mut self, item: NotificationItem) {
        self.remove_superseded(&item);
        self.record(&item);
        self.items.insert(0, item);
    }

    /// Append at the tail (initial load and backward pagination, preserving
    /// fetch order).
    pub fn push_back(&mut self, item: NotificationItem) {
        self.remove_superseded(&item);
        self.record(&item);
        self.items.push(item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    /// Remove any existing entry the candidate supersedes: same logical
    /// event key, or the same source-assigned id (re-delivery).
    fn remove_superseded(&mut self, candidate: &NotificationItem) {
        if let Some(key) = DedupKey::of(candidate) {
            if let Some(old_id) = self.index.remove(&key) {
                self.remove_by_id(&old_id);
            }
        }
        self.remove_by_id(&candidate.id);
    }

    fn record(&mut self, item: &NotificationItem) {
        if let Some(key) = DedupKey::of(item) {
            self.index.insert(key, item.id.clone());
        }
    }

    fn remove_by_id(&mut self, id: &str) {
        if let Some(pos) = self.items.iter().position(|i| i.id == id) {
            let removed = self.items.remove(pos);
            if let Some(key) = DedupKey::of(&removed) {
                // Only drop the index entry if it still points at this item.
                if self.index.get(&key).map(String::as_str) == Some(id) {
                    self.index.remove(&key);
                }
            }
        }
    }
}
