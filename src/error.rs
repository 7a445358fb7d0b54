//! Error taxonomy of the feed pipeline.
//!
//! Three families with different propagation policies:
//! - `TransportError` is surfaced to the caller so a retry affordance can be
//!   shown.
//! - `StreamError` triggers the automatic reconcile-and-resubscribe flow and
//!   only becomes user-visible when reconnecting repeatedly fails.
//! - Malformed records are not an error type at all: normalization returns
//!   `None` and the record is dropped with a debug log, so one bad record
//!   never aborts a batch.

use thiserror::Error;

/// Network or auth failure from the paginated fetch endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("host unreachable: {0}")]
    Unreachable(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    Body(String),
}

/// Transport-level stream failure, surfaced as a distinguishable signal
/// instead of the stream silently stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("cannot connect to stream")]
    CannotConnect,
    #[error("stream connection lost")]
    NoConnection,
    #[error("stream closed")]
    Closed,
}

/// Errors returned by feed controller operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("feed controller has been shut down")]
    ShutDown,
}
