//! Route handlers, one module per resource.

use std::sync::Arc;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::auth::SessionContext;

pub mod auth;
pub mod content;
pub mod duels;
pub mod health;
pub mod leaderboard;
pub mod players;
pub mod profile;

/// The session context, or a clean error when serving without auth.
pub(crate) fn session_context(state: &AppState) -> Result<Arc<SessionContext>, ApiError> {
    state
        .session
        .clone()
        .ok_or_else(|| ApiError::BadRequest("Authentication is not configured".to_string()))
}
