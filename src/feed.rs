//! Notification feed controller.
//!
//! Owns the in-memory ordered list for one account: initial load via the
//! pagination fetcher, live merge of stream events, backward pagination, and
//! reconcile-and-resubscribe after stream disconnects. Every raw record from
//! either source runs through the same normalize + dedup pipeline before it
//! touches the list.
//!
//! Concurrency model: one controller per account; all list mutations are
//! serialized behind a single async mutex. The fetcher's network call and the
//! stream pump run on their own tasks, but the mutation they trigger is the
//! serialization point. A generation counter plus a liveness flag guarantee
//! that no background work writes into a controller after shutdown.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::dedup::FeedList;
use crate::error::{FeedError, TransportError};
use crate::fetch::{NotificationSource, PaginationFetcher};
use crate::model::{Account, NotificationItem, RawNotificationRecord};
use crate::normalizer::normalize;
use crate::stream::{StreamSignal, StreamSource};

/// Lifecycle of the list itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Empty,
    Loading,
    Ready,
}

/// Orthogonal stream-connection state, for online/offline indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

struct FeedState {
    list: FeedList,
    phase: FeedPhase,
    /// Set once backward pagination hits an empty page; cleared by `reload`.
    exhausted: bool,
}

struct FeedInner {
    owner: Account,
    fetcher: PaginationFetcher,
    stream: Arc<dyn StreamSource>,
    config: FeedConfig,
    state: Mutex<FeedState>,
    /// Rejects reentrant `load_older` calls without touching the state lock.
    loading_older: AtomicBool,
    /// Bumped on every (re)connect and on shutdown; a pump task only writes
    /// while its generation is current.
    generation: AtomicU64,
    alive: AtomicBool,
    list_tx: watch::Sender<Vec<NotificationItem>>,
    conn_tx: watch::Sender<ConnectionState>,
    pump: std::sync::Mutex<Option<JoinHandle<()>>>,
}

/// Feed controller for one signed-in account.
pub struct FeedController {
    inner: Arc<FeedInner>,
}

impl FeedController {
    pub fn new(
        owner: Account,
        source: Arc<dyn NotificationSource>,
        stream: Arc<dyn StreamSource>,
        config: FeedConfig,
    ) -> Self {
        let fetcher = PaginationFetcher::new(source, config.page_limit);
        let (list_tx, _) = watch::channel(Vec::new());
        let (conn_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(FeedInner {
                owner,
                fetcher,
                stream,
                config,
                state: Mutex::new(FeedState {
                    list: FeedList::new(),
                    phase: FeedPhase::Empty,
                    exhausted: false,
                }),
                loading_older: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                alive: AtomicBool::new(true),
                list_tx,
                conn_tx,
                pump: std::sync::Mutex::new(None),
            }),
        }
    }

    /// Load the first page, publish it, then open the stream subscription.
    ///
    /// A `TransportError` is surfaced to the caller; the list stays empty
    /// and the phase stays `Empty` so the UI can offer a retry.
    pub async fn initial_load(&self) -> Result<(), FeedError> {
        let inner = &self.inner;
        if !inner.alive.load(Ordering::SeqCst) {
            return Err(FeedError::ShutDown);
        }

        {
            let mut st = inner.state.lock().await;
            st.phase = FeedPhase::Loading;
            let page = match inner.fetcher.fetch_older_than(&inner.owner, None).await {
                Ok(page) => page,
                Err(e) => {
                    st.phase = if st.list.is_empty() { FeedPhase::Empty } else { FeedPhase::Ready };
                    return Err(e.into());
                }
            };
            if !inner.alive.load(Ordering::SeqCst) {
                return Err(FeedError::ShutDown);
            }

            let mut skipped = 0usize;
            for raw in &page {
                match normalize(raw, &inner.owner.id) {
                    Some(item) => st.list.push_back(item),
                    None => skipped += 1,
                }
            }
            if skipped > 0 {
                debug!(owner = %inner.owner.id, skipped, "skipped malformed records in initial page");
            }
            st.phase = FeedPhase::Ready;
            info!(owner = %inner.owner.id, count = st.list.len(), "initial load complete");
            inner.publish(&st);
        }

        self.connect_stream();
        Ok(())
    }

    /// Fetch the page older than the current oldest item and append it.
    ///
    /// No-op when another `load_older` is in flight, when the list is empty
    /// (nothing to page from), or when a previous call exhausted the feed.
    pub async fn load_older(&self) -> Result<(), FeedError> {
        let inner = &self.inner;
        if !inner.alive.load(Ordering::SeqCst) {
            return Err(FeedError::ShutDown);
        }
        if inner.loading_older.swap(true, Ordering::SeqCst) {
            debug!(owner = %inner.owner.id, "load_older already in flight");
            return Ok(());
        }
        let result = inner.load_older_locked().await;
        inner.loading_older.store(false, Ordering::SeqCst);
        result
    }

    /// Run one raw stream record through the pipeline and insert at the head.
    /// Malformed records are dropped silently.
    pub async fn on_stream_event(&self, raw: &RawNotificationRecord) -> Result<(), FeedError> {
        if !self.inner.alive.load(Ordering::SeqCst) {
            return Err(FeedError::ShutDown);
        }
        let gen = self.inner.generation.load(Ordering::SeqCst);
        self.inner.apply_stream_event(raw, gen).await;
        Ok(())
    }

    /// Full refresh: clear the list and the exhausted flag, then run the
    /// initial load again (which also reopens the stream).
    pub async fn reload(&self) -> Result<(), FeedError> {
        let inner = &self.inner;
        if !inner.alive.load(Ordering::SeqCst) {
            return Err(FeedError::ShutDown);
        }
        {
            let mut st = inner.state.lock().await;
            st.list.clear();
            st.exhausted = false;
            st.phase = FeedPhase::Empty;
            inner.publish(&st);
        }
        self.initial_load().await
    }

    /// Manual reconnect trigger, for after the automatic retries have been
    /// exhausted and the connection state is stuck on `Disconnected`.
    pub fn retry_connect(&self) -> Result<(), FeedError> {
        if !self.inner.alive.load(Ordering::SeqCst) {
            return Err(FeedError::ShutDown);
        }
        self.connect_stream();
        Ok(())
    }

    /// Current ordered list, as a push interface: the receiver observes every
    /// published change.
    pub fn subscribe_list(&self) -> watch::Receiver<Vec<NotificationItem>> {
        self.inner.list_tx.subscribe()
    }

    /// Connection-state notifications for online/offline indicators.
    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionState> {
        self.inner.conn_tx.subscribe()
    }

    pub async fn snapshot(&self) -> Vec<NotificationItem> {
        self.inner.state.lock().await.list.snapshot()
    }

    pub async fn phase(&self) -> FeedPhase {
        self.inner.state.lock().await.phase
    }

    pub async fn is_exhausted(&self) -> bool {
        self.inner.state.lock().await.exhausted
    }

    pub fn owner(&self) -> &Account {
        &self.inner.owner
    }

    /// Tear down: cancel the pump task and invalidate all in-flight work.
    /// No background task writes into the list after this returns.
    pub fn shutdown(&self) {
        self.inner.alive.store(false, Ordering::SeqCst);
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.inner.pump.lock().expect("pump lock poisoned").take() {
            task.abort();
        }
    }

    /// Spawn a fresh pump task at a new generation, replacing any old one.
    fn connect_stream(&self) {
        let inner = Arc::clone(&self.inner);
        let gen = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let task = tokio::spawn(FeedInner::run_stream(Arc::clone(&inner), gen));
        if let Some(old) = inner.pump.lock().expect("pump lock poisoned").replace(task) {
            old.abort();
        };
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl FeedInner {
    fn live(&self, gen: u64) -> bool {
        self.alive.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == gen
    }

    fn publish(&self, st: &FeedState) {
        self.list_tx.send_replace(st.list.snapshot());
    }

    async fn load_older_locked(&self) -> Result<(), FeedError> {
        let mut st = self.state.lock().await;
        if st.exhausted || st.list.is_empty() {
            return Ok(());
        }
        let cursor = st.list.oldest_id().map(String::from);
        let page = self
            .fetcher
            .fetch_older_than(&self.owner, cursor.as_deref())
            .await?;
        if !self.alive.load(Ordering::SeqCst) {
            return Err(FeedError::ShutDown);
        }
        if page.is_empty() {
            info!(owner = %self.owner.id, "no older notifications; feed exhausted");
            st.exhausted = true;
            return Ok(());
        }
        for raw in &page {
            match normalize(raw, &self.owner.id) {
                Some(item) => st.list.push_back(item),
                None => debug!(owner = %self.owner.id, "dropping malformed record from older page"),
            }
        }
        self.publish(&st);
        Ok(())
    }

    async fn apply_stream_event(&self, raw: &RawNotificationRecord, gen: u64) {
        let mut st = self.state.lock().await;
        if !self.live(gen) {
            return;
        }
        let Some(item) = normalize(raw, &self.owner.id) else {
            debug!(owner = %self.owner.id, "dropping malformed stream record");
            return;
        };
        st.list.push_front(item);
        self.publish(&st);
    }

    /// Close the gap a disconnect window may have produced: fetch everything
    /// newer than the current newest item and merge it at the head.
    async fn reconcile(&self, gen: u64) -> Result<(), TransportError> {
        let mut st = self.state.lock().await;
        if !self.live(gen) {
            return Ok(());
        }
        let Some(newest) = st.list.newest_id().map(String::from) else {
            // Nothing displayed yet, nothing to reconcile against.
            return Ok(());
        };
        let newer = self.fetcher.fetch_newer_than(&self.owner, &newest).await?;
        if !self.live(gen) {
            return Ok(());
        }
        if newer.is_empty() {
            return Ok(());
        }
        // The batch is newest-first; insert oldest-first so the head ends up
        // newest-first.
        let mut merged = 0usize;
        for raw in newer.iter().rev() {
            match normalize(raw, &self.owner.id) {
                Some(item) => {
                    st.list.push_front(item);
                    merged += 1;
                }
                None => debug!(owner = %self.owner.id, "dropping malformed record in reconcile"),
            }
        }
        info!(owner = %self.owner.id, merged, "reconciled feed after stream gap");
        self.publish(&st);
        Ok(())
    }

    /// Stream pump: subscribe, forward events into the pipeline, and on any
    /// disconnect run reconcile-then-resubscribe with bounded exponential
    /// backoff. After the retry budget is spent the connection state stays
    /// `Disconnected` until `retry_connect` is called.
    async fn run_stream(inner: Arc<FeedInner>, gen: u64) {
        let max_retries = inner.config.reconnect.max_retries;
        let mut attempt: u32 = 0;
        let mut needs_reconcile = false;

        loop {
            if !inner.live(gen) {
                return;
            }

            if needs_reconcile {
                if let Err(e) = inner.reconcile(gen).await {
                    warn!(owner = %inner.owner.id, error = %e, "reconcile after disconnect failed");
                    attempt += 1;
                    if attempt > max_retries {
                        info!(owner = %inner.owner.id, "reconnect retries exhausted; staying disconnected");
                        return;
                    }
                    tokio::time::sleep(inner.config.reconnect.backoff(attempt)).await;
                    continue;
                }
                needs_reconcile = false;
            }

            match inner.stream.subscribe(&inner.owner).await {
                Ok(mut handle) => {
                    inner.conn_tx.send_replace(ConnectionState::Connected);
                    loop {
                        match handle.recv().await {
                            Some(StreamSignal::Event(raw)) => {
                                // A delivered event proves the connection is
                                // healthy again.
                                attempt = 0;
                                inner.apply_stream_event(&raw, gen).await;
                                if !inner.live(gen) {
                                    return;
                                }
                            }
                            Some(StreamSignal::Disconnected(err)) => {
                                warn!(owner = %inner.owner.id, error = %err, "stream disconnected");
                                break;
                            }
                            None => break,
                        }
                    }
                    handle.close();
                }
                Err(err) => {
                    warn!(owner = %inner.owner.id, error = %err, "stream subscribe failed");
                }
            }

            inner.conn_tx.send_replace(ConnectionState::Disconnected);
            attempt += 1;
            if attempt > max_retries {
                info!(owner = %inner.owner.id, "reconnect retries exhausted; staying disconnected");
                return;
            }
            tokio::time::sleep(inner.config.reconnect.backoff(attempt)).await;
            needs_reconcile = true;
        }
    }
}
