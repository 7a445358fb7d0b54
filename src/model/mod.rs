//! Data model: raw wire records, nested note payloads and the unified
//! notification item the pipeline produces.

pub mod account;
pub mod item;
pub mod note;
pub mod raw;
pub mod user;

pub use account::{Account, AccountId};
pub use item::{ContextNote, NotificationItem, NotificationKind};
pub use note::{CustomEmoji, Note};
pub use raw::{ApiNotification, RawNotificationRecord, StreamNotification};
pub use user::UserRef;
