//! Data source abstraction over the hosted backend.
//!
//! All persistence, auth and realtime plumbing belongs to the hosted
//! service; this crate only consumes it. The [`DataSource`] trait is the
//! seam: a REST implementation for the real service and an in-memory one
//! for tests and offline mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

pub mod memory;
pub mod rest;

pub use memory::MemorySource;
pub use rest::{RestSource, RestSourceConfig};

/// Errors from the hosted data service.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid source configuration: {0}")]
    Config(String),
}

/// A change notification for one table.
///
/// Carries no row payload: a delivery means "something in this table
/// changed, re-fetch". Coalesced or lagged deliveries are equivalent to a
/// single change.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub table: String,
}

/// Query shape accepted by [`DataSource::fetch_all`]. The order is a hint
/// for the service; callers that need a guaranteed order sort client-side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowQuery {
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Column equals value (values compared as their string form).
    Eq(String, String),

    /// Column contains the substring, case-insensitively.
    Contains(String, String),

    /// Column value is one of the given values.
    AnyOf(String, Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl RowQuery {
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push(Filter::Eq(column.to_string(), value.to_string()));
        self
    }

    pub fn contains(mut self, column: &str, value: &str) -> Self {
        self.filters
            .push(Filter::Contains(column.to_string(), value.to_string()));
        self
    }

    pub fn any_of(mut self, column: &str, values: Vec<String>) -> Self {
        self.filters.push(Filter::AnyOf(column.to_string(), values));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            descending: false,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Trait for hosted-backend implementations.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &'static str;

    /// Bulk read of one table.
    async fn fetch_all(&self, table: &str, query: &RowQuery) -> Result<Vec<Value>, SourceError>;

    /// Patch every row matching the query's filters.
    async fn update(&self, table: &str, query: &RowQuery, patch: Value)
        -> Result<(), SourceError>;

    /// Register for change notifications on one table. Dropping the
    /// subscription (or calling [`Subscription::unsubscribe`]) releases it.
    fn subscribe(&self, table: &str) -> Subscription;

    /// Store an object and return its public URL.
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SourceError>;

    /// Delete an object. Deleting an absent object is not an error.
    async fn delete_object(&self, bucket: &str, path: &str) -> Result<(), SourceError>;

    /// Check whether the service is reachable.
    async fn health_check(&self) -> Result<bool, SourceError>;
}

/// Fetch and decode rows, skipping any row that does not decode.
///
/// Missing numeric fields decode as zero through the row types' defaults;
/// a structurally broken row is logged and dropped, never fatal.
pub async fn fetch_rows<T: DeserializeOwned>(
    source: &dyn DataSource,
    table: &str,
    query: &RowQuery,
) -> Result<Vec<T>, SourceError> {
    let rows = source.fetch_all(table, query).await?;

    let mut decoded = Vec::with_capacity(rows.len());
    for row in rows {
        match serde_json::from_value::<T>(row) {
            Ok(value) => decoded.push(value),
            Err(e) => warn!("Skipping undecodable row in {}: {}", table, e),
        }
    }

    Ok(decoded)
}

/// An active change-notification registration.
pub struct Subscription {
    table: String,
    receiver: broadcast::Receiver<ChangeEvent>,
    registry: Arc<ChannelRegistry>,
}

impl Subscription {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Wait for the next change. Returns `None` once the channel is closed.
    /// A lagged receiver collapses the missed deliveries into one change,
    /// which is all invalidate-and-refetch consumers need.
    pub async fn changed(&mut self) -> Option<ChangeEvent> {
        match self.receiver.recv().await {
            Ok(event) => Some(event),
            Err(broadcast::error::RecvError::Lagged(_)) => Some(ChangeEvent {
                table: self.table.clone(),
            }),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Release the registration explicitly. Dropping has the same effect.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.release(&self.table);
    }
}

/// Per-table broadcast channels shared by source implementations.
///
/// Tracks subscriber counts so a source can stop producing notifications
/// for tables nobody watches.
#[derive(Default)]
pub(crate) struct ChannelRegistry {
    channels: Mutex<HashMap<String, TableChannel>>,
    // Subscription ids are only used for logging; counts drive lifecycle.
    next_id: AtomicU64,
}

struct TableChannel {
    sender: broadcast::Sender<ChangeEvent>,
    subscribers: usize,
}

impl ChannelRegistry {
    pub(crate) fn subscribe(self: &Arc<Self>, table: &str) -> Subscription {
        let mut channels = self.channels.lock().expect("channel registry poisoned");
        let channel = channels
            .entry(table.to_string())
            .or_insert_with(|| TableChannel {
                sender: broadcast::channel(16).0,
                subscribers: 0,
            });
        channel.subscribers += 1;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("subscription #{} opened on {}", id, table);

        Subscription {
            table: table.to_string(),
            receiver: channel.sender.subscribe(),
            registry: Arc::clone(self),
        }
    }

    /// Notify all subscribers of a table. A table without subscribers is a
    /// no-op.
    pub(crate) fn notify(&self, table: &str) {
        let channels = self.channels.lock().expect("channel registry poisoned");
        if let Some(channel) = channels.get(table) {
            // Send only fails when every receiver is gone, which release()
            // will clean up shortly.
            let _ = channel.sender.send(ChangeEvent {
                table: table.to_string(),
            });
        }
    }

    pub(crate) fn has_subscribers(&self, table: &str) -> bool {
        let channels = self.channels.lock().expect("channel registry poisoned");
        channels.get(table).map(|c| c.subscribers > 0).unwrap_or(false)
    }

    fn release(&self, table: &str) {
        let mut channels = self.channels.lock().expect("channel registry poisoned");
        if let Some(channel) = channels.get_mut(table) {
            channel.subscribers = channel.subscribers.saturating_sub(1);
            if channel.subscribers == 0 {
                channels.remove(table);
            }
        }
    }
}
