//! Pagination fetcher - wraps the paginated REST source.
//!
//! Pages are newest-first. An empty page means nothing older exists and is
//! not an error. Reload mode fetches newest-first and stops consuming the
//! page at the first record that is already displayed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::TransportError;
use crate::model::{Account, ApiNotification, RawNotificationRecord};

/// Upstream paginated record source. Implemented by the HTTP client below
/// and by in-memory mocks in tests.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Fetch up to `limit` records strictly older than `until_id`
    /// (newest-first). `None` cursor means the most recent page.
    async fn fetch_page(
        &self,
        owner: &Account,
        limit: usize,
        until_id: Option<&str>,
    ) -> Result<Vec<RawNotificationRecord>, TransportError>;
}

/// Cursor-based access on top of a `NotificationSource`.
#[derive(Clone)]
pub struct PaginationFetcher {
    source: Arc<dyn NotificationSource>,
    limit: usize,
}

impl PaginationFetcher {
    pub fn new(source: Arc<dyn NotificationSource>, limit: usize) -> Self {
        Self { source, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Page strictly older than `cursor`; `None` for the initial page.
    pub async fn fetch_older_than(
        &self,
        owner: &Account,
        cursor: Option<&str>,
    ) -> Result<Vec<RawNotificationRecord>, TransportError> {
        self.source.fetch_page(owner, self.limit, cursor).await
    }

    /// Reload mode: everything newer than `last_known_id`. Consumes the
    /// newest page and stops at the first already-known record; if the
    /// cursor never shows up the entire page is new.
    pub async fn fetch_newer_than(
        &self,
        owner: &Account,
        last_known_id: &str,
    ) -> Result<Vec<RawNotificationRecord>, TransportError> {
        let page = self.source.fetch_page(owner, self.limit, None).await?;
        let new: Vec<RawNotificationRecord> = page
            .into_iter()
            .take_while(|record| record.id().map_or(true, |id| id != last_known_id))
            .collect();
        debug!(owner = %owner.id, count = new.len(), "reload fetch found new records");
        Ok(new)
    }
}

/// HTTP implementation against the `POST /api/i/notifications` endpoint.
pub struct HttpNotificationSource {
    client: reqwest::Client,
}

impl HttpNotificationSource {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpNotificationSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSource for HttpNotificationSource {
    async fn fetch_page(
        &self,
        owner: &Account,
        limit: usize,
        until_id: Option<&str>,
    ) -> Result<Vec<RawNotificationRecord>, TransportError> {
        let url = format!("https://{}/api/i/notifications", owner.host);
        let mut body = serde_json::json!({
            "i": owner.api_token,
            "limit": limit,
        });
        if let Some(cursor) = until_id {
            body["untilId"] = serde_json::Value::String(cursor.to_string());
        }

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(TransportError::Unauthorized);
        }
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let page: Vec<ApiNotification> = response
            .json()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(page.into_iter().map(RawNotificationRecord::Fetch).collect())
    }
}
