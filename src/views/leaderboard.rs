//! Live leaderboard over the `player_stats` table.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{spawn_watch, Refetch, RefreshGuard, ViewError};
use crate::models::PlayerStats;
use crate::ranking::{rank, RankedEntry, SortKey};
use crate::source::{fetch_rows, DataSource, RowQuery};

pub const PLAYER_STATS_TABLE: &str = "player_stats";

/// Holds the fetched `player_stats` collection and renders it through the
/// ranker on demand. The snapshot is replaced wholesale on every refresh;
/// nothing here mutates counters.
pub struct LeaderboardView {
    source: Arc<dyn DataSource>,
    players: RwLock<Vec<PlayerStats>>,
    guard: RefreshGuard,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl LeaderboardView {
    pub fn new(source: Arc<dyn DataSource>) -> Arc<Self> {
        Arc::new(Self {
            source,
            players: RwLock::new(Vec::new()),
            guard: RefreshGuard::default(),
            watcher: Mutex::new(None),
        })
    }

    /// Discard the collection and re-run the full fetch.
    pub async fn refresh(&self) -> Result<(), ViewError> {
        let token = self.guard.begin();

        let rows = fetch_rows::<PlayerStats>(
            self.source.as_ref(),
            PLAYER_STATS_TABLE,
            &RowQuery::default().order_desc("wins"),
        )
        .await?;

        if self.guard.is_current(token) {
            *self.players.write().await = rows;
        } else {
            debug!("Dropping stale leaderboard fetch");
        }
        Ok(())
    }

    /// Start live updates: any change to the table triggers a refetch.
    pub fn watch(self: &Arc<Self>) {
        let subscription = self.source.subscribe(PLAYER_STATS_TABLE);
        let handle = spawn_watch(subscription, Arc::clone(self) as Arc<dyn Refetch>);
        if let Some(previous) = self
            .watcher
            .lock()
            .expect("watcher slot poisoned")
            .replace(handle)
        {
            previous.abort();
        }
    }

    /// Rank the current snapshot by the given key.
    pub async fn ranked(&self, key: SortKey) -> Vec<RankedEntry<PlayerStats>> {
        rank(self.players.read().await.clone(), key)
    }

    pub async fn player_count(&self) -> usize {
        self.players.read().await.len()
    }

    /// Stop live updates and release the subscription.
    pub fn shutdown(&self) {
        if let Some(handle) = self.watcher.lock().expect("watcher slot poisoned").take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl Refetch for LeaderboardView {
    fn table(&self) -> &'static str {
        PLAYER_STATS_TABLE
    }

    async fn refetch(&self) -> Result<(), ViewError> {
        self.refresh().await
    }
}
