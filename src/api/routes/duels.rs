use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{format_duration, DuelParticipant, DuelWithPlayers};
use crate::views::DUEL_FEED_LIMIT;

#[derive(Debug, Deserialize)]
pub struct DuelFeedParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DuelEntry {
    pub id: Uuid,
    pub arena: Option<String>,
    pub duration_seconds: Option<u32>,
    pub duration_display: String,
    pub created_at: DateTime<Utc>,
    pub player1: DuelParticipant,
    pub player2: DuelParticipant,
}

impl From<DuelWithPlayers> for DuelEntry {
    fn from(duel: DuelWithPlayers) -> Self {
        Self {
            id: duel.id,
            duration_display: format_duration(duel.duration_seconds),
            arena: duel.arena,
            duration_seconds: duel.duration_seconds,
            created_at: duel.created_at,
            player1: duel.player1,
            player2: duel.player2,
        }
    }
}

pub async fn recent_duels(
    State(state): State<AppState>,
    Query(params): Query<DuelFeedParams>,
) -> Result<Json<Vec<DuelEntry>>, ApiError> {
    let limit = params.limit.unwrap_or(DUEL_FEED_LIMIT).clamp(1, DUEL_FEED_LIMIT);
    let feed = state.duels.recent().await;
    Ok(Json(
        feed.into_iter().take(limit).map(DuelEntry::from).collect(),
    ))
}
