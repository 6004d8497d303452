//! Live view synchronization.
//!
//! Every view follows one policy: subscribe to a table's change channel
//! and, on any notification, discard the in-memory collection and re-run
//! the full fetch. There is no incremental merging; the write path and
//! conflict semantics belong to the hosted service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::source::{SourceError, Subscription};

mod directory;
mod duels;
mod leaderboard;

pub use directory::{PlayerDirectory, PROFILES_TABLE};
pub use duels::{DuelFeedView, DUELS_TABLE, DUEL_FEED_LIMIT};
pub use leaderboard::{LeaderboardView, PLAYER_STATS_TABLE};

/// Errors surfaced by views.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Data source error: {0}")]
    Source(#[from] SourceError),
}

/// Serializes fetch-and-replace for one view.
///
/// Every refresh takes a token; the fetched snapshot is installed only if
/// no newer refresh has started in the meantime, so a slow early fetch can
/// never overwrite a later one's result.
#[derive(Debug, Default)]
pub(crate) struct RefreshGuard {
    sequence: AtomicU64,
}

impl RefreshGuard {
    pub(crate) fn begin(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_current(&self, token: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == token
    }
}

/// Seam between the watch loop and a concrete view.
#[async_trait]
pub(crate) trait Refetch: Send + Sync {
    fn table(&self) -> &'static str;

    async fn refetch(&self) -> Result<(), ViewError>;
}

/// Drive a subscription: every change notification triggers one full
/// refetch. A failed refetch keeps the previous snapshot. The loop ends
/// (releasing the subscription) when the change channel closes or the
/// task is aborted.
pub(crate) fn spawn_watch(
    mut subscription: Subscription,
    view: Arc<dyn Refetch>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while subscription.changed().await.is_some() {
            if let Err(e) = view.refetch().await {
                warn!(
                    "{} refetch failed, keeping last snapshot: {}",
                    view.table(),
                    e
                );
            }
        }
        debug!("{} change channel closed", view.table());
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_guard_current_token() {
        let guard = RefreshGuard::default();
        let token = guard.begin();
        assert!(guard.is_current(token));
    }

    #[test]
    fn test_refresh_guard_invalidates_older_tokens() {
        let guard = RefreshGuard::default();
        let slow = guard.begin();
        let fast = guard.begin();

        // The slow fetch finished after the fast one started: discard it.
        assert!(!guard.is_current(slow));
        assert!(guard.is_current(fast));
    }
}
