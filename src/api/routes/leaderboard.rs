use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::{ApiError, Pagination, PaginationMeta};
use crate::models::PlayerStats;
use crate::ranking::{RankBadge, RankedEntry, SortKey, WinRateBand};

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub sort: Option<SortKey>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub badge: RankBadge,
    pub id: Uuid,
    pub minecraft_username: String,
    pub avatar_url: String,
    pub wins: u32,
    pub losses: u32,
    pub kills: u32,
    pub deaths: u32,
    pub total_duels: u32,
    pub best_win_streak: u32,
    pub kd_ratio: f64,
    pub win_rate_percent: f64,
    pub win_rate_band: WinRateBand,
}

impl From<RankedEntry<PlayerStats>> for LeaderboardRow {
    fn from(entry: RankedEntry<PlayerStats>) -> Self {
        let player = entry.record;
        Self {
            rank: entry.rank,
            badge: RankBadge::for_rank(entry.rank),
            avatar_url: player.avatar_url(),
            id: player.id,
            minecraft_username: player.minecraft_username,
            wins: player.wins,
            losses: player.losses,
            kills: player.kills,
            deaths: player.deaths,
            total_duels: player.total_duels,
            best_win_streak: player.best_win_streak,
            kd_ratio: entry.metrics.kd_ratio,
            win_rate_percent: entry.metrics.win_rate_percent,
            win_rate_band: WinRateBand::from_percent(entry.metrics.win_rate_percent),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub sort: SortKey,
    pub entries: Vec<LeaderboardRow>,
    pub pagination: PaginationMeta,
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let sort = params.sort.unwrap_or_default();
    let entries = state.leaderboard.ranked(sort).await;

    let pagination = Pagination::new(params.page, params.page_size);
    let total = entries.len() as u32;
    let rows: Vec<LeaderboardRow> = entries
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.page_size as usize)
        .map(LeaderboardRow::from)
        .collect();

    Ok(Json(LeaderboardResponse {
        sort,
        entries: rows,
        pagination: PaginationMeta::new(&pagination, total),
    }))
}
