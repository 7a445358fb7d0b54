//! Stream subscriber - wraps the live push channel.
//!
//! A subscription yields raw records one at a time in arrival order. On a
//! transport-level disconnect the handle surfaces a distinguishable
//! `Disconnected` signal instead of silently stopping; reconnecting is the
//! feed controller's job, never the subscriber's.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::fetch::PaginationFetcher;
use crate::model::{Account, RawNotificationRecord};

/// One delivery from a stream subscription.
#[derive(Debug, Clone)]
pub enum StreamSignal {
    Event(RawNotificationRecord),
    Disconnected(StreamError),
}

/// Cancellable handle to one live subscription.
///
/// Single consumer; events are processed one at a time in arrival order.
pub struct StreamHandle {
    rx: mpsc::Receiver<StreamSignal>,
    task: Option<JoinHandle<()>>,
}

impl StreamHandle {
    /// Handle over a plain channel, no backing task.
    pub fn from_receiver(rx: mpsc::Receiver<StreamSignal>) -> Self {
        Self { rx, task: None }
    }

    /// Handle whose events are produced by a background task; closing the
    /// handle aborts the task.
    pub fn with_task(rx: mpsc::Receiver<StreamSignal>, task: JoinHandle<()>) -> Self {
        Self { rx, task: Some(task) }
    }

    /// Next signal, or `None` once the source is gone.
    pub async fn recv(&mut self) -> Option<StreamSignal> {
        self.rx.recv().await
    }

    /// Cancel the subscription. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Upstream live event channel, fixed to the main notification channel.
#[async_trait]
pub trait StreamSource: Send + Sync {
    async fn subscribe(&self, owner: &Account) -> Result<StreamHandle, StreamError>;
}

/// In-process stream source backed by a channel.
///
/// Used by tests and by embedders that already own a socket: push raw
/// records in with `send_event`, signal transport loss with `disconnect`.
/// Each `subscribe` call opens a fresh channel; only the most recent
/// subscription receives events.
#[derive(Clone, Default)]
pub struct ChannelStreamSource {
    current: Arc<Mutex<Option<mpsc::Sender<StreamSignal>>>>,
    subscriptions: Arc<AtomicUsize>,
}

impl ChannelStreamSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `subscribe` was called. Lets tests assert that a
    /// reconcile flow actually re-subscribed.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    /// Deliver a raw record to the current subscriber. Returns `false` when
    /// nobody is subscribed.
    pub async fn send_event(&self, record: RawNotificationRecord) -> bool {
        self.send(StreamSignal::Event(record)).await
    }

    /// Signal a transport-level disconnect to the current subscriber.
    pub async fn disconnect(&self, error: StreamError) -> bool {
        self.send(StreamSignal::Disconnected(error)).await
    }

    async fn send(&self, signal: StreamSignal) -> bool {
        let tx = self.current.lock().expect("stream source lock poisoned").clone();
        match tx {
            Some(tx) => tx.send(signal).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl StreamSource for ChannelStreamSource {
    async fn subscribe(&self, owner: &Account) -> Result<StreamHandle, StreamError> {
        let (tx, rx) = mpsc::channel(64);
        *self.current.lock().expect("stream source lock poisoned") = Some(tx);
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        debug!(owner = %owner.id, "opened channel stream subscription");
        Ok(StreamHandle::from_receiver(rx))
    }
}

/// Stream source that emulates a push channel by polling the paginated
/// endpoint in reload mode. For deployments without a persistent socket.
pub struct PollingStreamSource {
    fetcher: PaginationFetcher,
    interval: Duration,
}

impl PollingStreamSource {
    pub fn new(fetcher: PaginationFetcher, interval: Duration) -> Self {
        Self { fetcher, interval }
    }
}

#[async_trait]
impl StreamSource for PollingStreamSource {
    async fn subscribe(&self, owner: &Account) -> Result<StreamHandle, StreamError> {
        // Establish the baseline cursor up front so connect failures are
        // reported as such instead of as a later disconnect.
        let baseline = self
            .fetcher
            .fetch_older_than(owner, None)
            .await
            .map_err(|e| {
                warn!(owner = %owner.id, error = %e, "polling stream could not connect");
                StreamError::CannotConnect
            })?;
        let mut last_id: Option<String> = baseline
            .first()
            .and_then(|r| r.id())
            .map(String::from);

        let (tx, rx) = mpsc::channel(64);
        let fetcher = self.fetcher.clone();
        let owner = owner.clone();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let result = match last_id.as_deref() {
                    Some(cursor) => fetcher.fetch_newer_than(&owner, cursor).await,
                    None => fetcher.fetch_older_than(&owner, None).await,
                };

                match result {
                    Ok(newer) => {
                        if let Some(id) = newer.first().and_then(|r| r.id()) {
                            last_id = Some(id.to_string());
                        }
                        // Deliver oldest-first so head insertion ends up
                        // newest-first.
                        for record in newer.into_iter().rev() {
                            if tx.send(StreamSignal::Event(record)).await.is_err() {
                                return; // subscriber went away
                            }
                        }
                    }
                    Err(e) => {
                        debug!(owner = %owner.id, error = %e, "polling stream lost its source");
                        let _ = tx.send(StreamSignal::Disconnected(StreamError::NoConnection)).await;
                        return;
                    }
                }
            }
        });

        Ok(StreamHandle::with_task(rx, task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApiNotification;

    fn record(id: &str) -> RawNotificationRecord {
        RawNotificationRecord::Fetch(ApiNotification {
            id: id.to_string(),
            kind: "follow".to_string(),
            user: None,
            note: None,
            reaction: None,
            created_at: None,
        })
    }

    fn owner() -> Account {
        Account::new("acct-1", "misskey.example", "token")
    }

    #[tokio::test]
    async fn test_channel_source_delivers_in_order() {
        let source = ChannelStreamSource::new();
        let mut handle = source.subscribe(&owner()).await.unwrap();

        assert!(source.send_event(record("1")).await);
        assert!(source.send_event(record("2")).await);

        match handle.recv().await {
            Some(StreamSignal::Event(r)) => assert_eq!(r.id(), Some("1")),
            other => panic!("unexpected signal: {other:?}"),
        }
        match handle.recv().await {
            Some(StreamSignal::Event(r)) => assert_eq!(r.id(), Some("2")),
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_channel_source_signals_disconnect() {
        let source = ChannelStreamSource::new();
        let mut handle = source.subscribe(&owner()).await.unwrap();

        assert!(source.disconnect(StreamError::NoConnection).await);
        match handle.recv().await {
            Some(StreamSignal::Disconnected(StreamError::NoConnection)) => {}
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_without_subscriber_reports_false() {
        let source = ChannelStreamSource::new();
        assert!(!source.send_event(record("1")).await);
    }

    #[tokio::test]
    async fn test_subscription_count_tracks_resubscribes() {
        let source = ChannelStreamSource::new();
        assert_eq!(source.subscription_count(), 0);
        let _first = source.subscribe(&owner()).await.unwrap();
        let _second = source.subscribe(&owner()).await.unwrap();
        assert_eq!(source.subscription_count(), 2);
    }

    #[tokio::test]
    async fn test_closed_handle_stops_receiving() {
        let source = ChannelStreamSource::new();
        let mut handle = source.subscribe(&owner()).await.unwrap();
        handle.close();
        // Channel is closed; the buffered queue drains to None.
        assert!(handle.recv().await.is_none());
    }
}
