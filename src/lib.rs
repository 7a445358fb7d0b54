//! Notification feed engine for a federated microblogging client.
//!
//! Ingests raw notification events from two sources - a paginated REST fetch
//! and a live stream channel - normalizes the heterogeneous payload shapes
//! into one unified cell model, merges both sources into a single ordered,
//! duplicate-free list, and extends that list in both directions while a
//! consumer renders it.

pub mod config;
pub mod dedup;
pub mod error;
pub mod feed;
pub mod fetch;
pub mod model;
pub mod normalizer;
pub mod push;
pub mod stream;

pub use config::{CliConfig, FeedConfig, RetryConfig};
pub use dedup::{is_duplicate_of, DedupKey, FeedList};
pub use error::{FeedError, StreamError, TransportError};
pub use feed::{ConnectionState, FeedController, FeedPhase};
pub use fetch::{HttpNotificationSource, NotificationSource, PaginationFetcher};
pub use model::{
    Account, AccountId, ApiNotification, ContextNote, CustomEmoji, Note, NotificationItem,
    NotificationKind, RawNotificationRecord, StreamNotification, UserRef,
};
pub use normalizer::normalize;
pub use push::{generate_contents, PushContent};
pub use stream::{ChannelStreamSource, PollingStreamSource, StreamHandle, StreamSignal, StreamSource};
