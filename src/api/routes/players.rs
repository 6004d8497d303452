use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{minecraft_avatar_url, Profile};
use crate::ranking::{is_champion, on_hot_streak, DerivedMetrics, WinRateBand};

#[derive(Debug, Deserialize)]
pub struct PlayerSearchParams {
    pub search: Option<String>,
}

/// Directory card for one player.
#[derive(Debug, Serialize)]
pub struct PlayerCard {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub total_wins: u32,
    pub total_duels: u32,
    pub kd_ratio: f64,
    pub win_rate_percent: f64,
    pub win_rate_band: WinRateBand,
    pub win_streak: u32,
    pub hot_streak: bool,
}

impl From<Profile> for PlayerCard {
    fn from(profile: Profile) -> Self {
        let metrics = DerivedMetrics::from_counters(&profile);
        Self {
            user_id: profile.user_id,
            display_name: profile.display_name().to_string(),
            avatar_url: profile
                .avatar_url
                .clone()
                .or_else(|| profile.username.as_deref().map(minecraft_avatar_url)),
            username: profile.username,
            total_wins: profile.total_wins,
            total_duels: profile.total_duels,
            kd_ratio: metrics.kd_ratio,
            win_rate_percent: metrics.win_rate_percent,
            win_rate_band: WinRateBand::from_percent(metrics.win_rate_percent),
            win_streak: profile.win_streak,
            hot_streak: on_hot_streak(profile.win_streak),
        }
    }
}

/// Full public profile for the player page.
#[derive(Debug, Serialize)]
pub struct PlayerDetail {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub total_kills: u32,
    pub total_deaths: u32,
    pub total_wins: u32,
    pub total_duels: u32,
    pub win_streak: u32,
    pub best_win_streak: u32,
    pub kd_ratio: f64,
    pub win_rate_percent: f64,
    pub win_rate_band: WinRateBand,
    pub hot_streak: bool,
    pub champion: bool,
}

impl From<Profile> for PlayerDetail {
    fn from(profile: Profile) -> Self {
        let metrics = DerivedMetrics::from_counters(&profile);
        Self {
            user_id: profile.user_id,
            display_name: profile.display_name().to_string(),
            avatar_url: profile
                .avatar_url
                .clone()
                .or_else(|| profile.username.as_deref().map(minecraft_avatar_url)),
            username: profile.username,
            total_kills: profile.total_kills,
            total_deaths: profile.total_deaths,
            total_wins: profile.total_wins,
            total_duels: profile.total_duels,
            win_streak: profile.win_streak,
            best_win_streak: profile.best_win_streak,
            kd_ratio: metrics.kd_ratio,
            win_rate_percent: metrics.win_rate_percent,
            win_rate_band: WinRateBand::from_percent(metrics.win_rate_percent),
            hot_streak: on_hot_streak(profile.win_streak),
            champion: is_champion(profile.best_win_streak),
        }
    }
}

pub async fn list_players(
    State(state): State<AppState>,
    Query(params): Query<PlayerSearchParams>,
) -> Result<Json<Vec<PlayerCard>>, ApiError> {
    let profiles = state
        .directory
        .search(params.search.as_deref().unwrap_or(""))
        .await?;
    Ok(Json(profiles.into_iter().map(PlayerCard::from).collect()))
}

pub async fn player_detail(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PlayerDetail>, ApiError> {
    let profile = state
        .directory
        .find_by_user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No player with id {}", user_id)))?;
    Ok(Json(PlayerDetail::from(profile)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::AvatarPolicy;
    use crate::source::MemorySource;
    use crate::views::PROFILES_TABLE;
    use serde_json::json;
    use std::sync::Arc;

    fn state_with_profiles() -> (AppState, Uuid) {
        let source = Arc::new(MemorySource::new());
        let champion_id = Uuid::new_v4();
        source.replace_table(
            PROFILES_TABLE,
            vec![
                json!({
                    "id": Uuid::new_v4(),
                    "user_id": champion_id,
                    "username": "KralKiller",
                    "avatar_url": null,
                    "total_kills": 50, "total_deaths": 10,
                    "total_wins": 30, "total_duels": 40,
                    "win_streak": 4, "best_win_streak": 8
                }),
                json!({
                    "id": Uuid::new_v4(),
                    "user_id": Uuid::new_v4(),
                    "username": "TurboFighter",
                    "avatar_url": "https://example.com/custom.png",
                    "total_kills": 5, "total_deaths": 20,
                    "total_wins": 4, "total_duels": 20,
                    "win_streak": 0, "best_win_streak": 1
                }),
            ],
        );

        let state = AppState::new(
            source,
            None,
            AvatarPolicy {
                bucket: "avatars".to_string(),
                max_bytes: 1024,
            },
        );
        (state, champion_id)
    }

    #[tokio::test]
    async fn test_list_players_search() {
        let (state, _) = state_with_profiles();

        let all = list_players(
            State(state.clone()),
            Query(PlayerSearchParams { search: None }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(all.len(), 2);
        // Best record first.
        assert_eq!(all[0].display_name, "KralKiller");
        assert!(all[0].hot_streak);
        assert_eq!(all[0].win_rate_band, WinRateBand::High);
        assert_eq!(all[1].win_rate_band, WinRateBand::Low);

        let hits = list_players(
            State(state),
            Query(PlayerSearchParams {
                search: Some("turbo".to_string()),
            }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(hits.len(), 1);
        // A custom avatar overrides the in-game head fallback.
        assert_eq!(
            hits[0].avatar_url.as_deref(),
            Some("https://example.com/custom.png")
        );
    }

    #[tokio::test]
    async fn test_player_detail_badges() {
        let (state, champion_id) = state_with_profiles();

        let detail = player_detail(State(state), Path(champion_id)).await.unwrap().0;
        assert!(detail.champion);
        assert!(detail.hot_streak);
        assert_eq!(detail.kd_ratio, 5.0);
        assert_eq!(detail.win_rate_percent, 75.0);
        // No custom avatar: fall back to the in-game head.
        assert_eq!(
            detail.avatar_url.as_deref(),
            Some("https://mc-heads.net/avatar/KralKiller/128")
        );
    }

    #[tokio::test]
    async fn test_player_detail_not_found() {
        let (state, _) = state_with_profiles();
        let result = player_detail(State(state), Path(Uuid::new_v4())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
