use std::sync::Arc;

use crate::auth::SessionContext;
use crate::content::ContentCatalog;
use crate::source::DataSource;
use crate::views::{DuelFeedView, LeaderboardView, PlayerDirectory};

/// Avatar upload policy, taken from configuration.
#[derive(Debug, Clone)]
pub struct AvatarPolicy {
    pub bucket: String,
    pub max_bytes: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn DataSource>,
    /// Absent when serving without a configured auth service.
    pub session: Option<Arc<SessionContext>>,
    pub leaderboard: Arc<LeaderboardView>,
    pub duels: Arc<DuelFeedView>,
    pub directory: Arc<PlayerDirectory>,
    pub catalog: Arc<ContentCatalog>,
    pub avatars: AvatarPolicy,
}

impl AppState {
    /// Wire the standard view set over one source.
    pub fn new(
        source: Arc<dyn DataSource>,
        session: Option<Arc<SessionContext>>,
        avatars: AvatarPolicy,
    ) -> Self {
        Self {
            leaderboard: LeaderboardView::new(Arc::clone(&source)),
            duels: DuelFeedView::new(Arc::clone(&source)),
            directory: Arc::new(PlayerDirectory::new(Arc::clone(&source))),
            catalog: Arc::new(ContentCatalog::builtin()),
            source,
            session,
            avatars,
        }
    }
}
