//! Live duel feed with participant profiles joined in.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use super::directory::PROFILES_TABLE;
use super::{spawn_watch, Refetch, RefreshGuard, ViewError};
use crate::models::{Duel, DuelWithPlayers, Profile};
use crate::source::{fetch_rows, DataSource, RowQuery};

pub const DUELS_TABLE: &str = "duels";

/// How many recent duels the feed keeps.
pub const DUEL_FEED_LIMIT: usize = 50;

/// The most recent duels, newest first, each joined against the profile
/// directory in one bulk lookup.
pub struct DuelFeedView {
    source: Arc<dyn DataSource>,
    feed: RwLock<Vec<DuelWithPlayers>>,
    guard: RefreshGuard,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl DuelFeedView {
    pub fn new(source: Arc<dyn DataSource>) -> Arc<Self> {
        Arc::new(Self {
            source,
            feed: RwLock::new(Vec::new()),
            guard: RefreshGuard::default(),
            watcher: Mutex::new(None),
        })
    }

    /// Discard the feed and re-run the full fetch-and-join.
    pub async fn refresh(&self) -> Result<(), ViewError> {
        let token = self.guard.begin();

        let duels = fetch_rows::<Duel>(
            self.source.as_ref(),
            DUELS_TABLE,
            &RowQuery::default()
                .order_desc("created_at")
                .limit(DUEL_FEED_LIMIT),
        )
        .await?;

        let mut player_ids: Vec<Uuid> = duels
            .iter()
            .flat_map(|d| [d.player1_id, d.player2_id])
            .collect();
        player_ids.sort_unstable();
        player_ids.dedup();

        let profiles: HashMap<Uuid, Profile> = if player_ids.is_empty() {
            HashMap::new()
        } else {
            fetch_rows::<Profile>(
                self.source.as_ref(),
                PROFILES_TABLE,
                &RowQuery::default().any_of(
                    "user_id",
                    player_ids.iter().map(Uuid::to_string).collect(),
                ),
            )
            .await?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect()
        };

        let joined: Vec<DuelWithPlayers> = duels
            .into_iter()
            .map(|duel| DuelWithPlayers::resolve(duel, &profiles))
            .collect();

        if self.guard.is_current(token) {
            *self.feed.write().await = joined;
        } else {
            debug!("Dropping stale duel feed fetch");
        }
        Ok(())
    }

    /// Start live updates: any change to the duels table triggers a
    /// refetch.
    pub fn watch(self: &Arc<Self>) {
        let subscription = self.source.subscribe(DUELS_TABLE);
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

    /// The current feed, newest first.
    pub async fn recent(&self) -> Vec<DuelWithPlayers> {
        self.feed.read().await.clone()
    }

    /// Stop live updates and release the subscription.
    pub fn shutdown(&self) {
        if let Some(handle) = self.watcher.lock().expect("watcher slot poisoned").take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl Refetch for DuelFeedView {
    fn table(&self) -> &'static str {
        DUELS_TABLE
    }

    async fn refetch(&self) -> Result<(), ViewError> {
        self.refresh().await
    }
}
