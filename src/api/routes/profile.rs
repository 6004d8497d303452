use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use super::session_context;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::ranking::{is_champion, on_hot_streak, DerivedMetrics, PlayerCounters};

/// The merged counters shown on the account page: the live game-server row
/// when one matches, otherwise the mirrored profile counters.
#[derive(Debug, Default, Serialize)]
pub struct OwnStats {
    pub kills: u32,
    pub deaths: u32,
    pub wins: u32,
    pub losses: u32,
    pub total_duels: u32,
    pub win_streak: u32,
    pub best_win_streak: u32,
}

impl PlayerCounters for OwnStats {
    fn kills(&self) -> u32 {
        self.kills
    }

    fn deaths(&self) -> u32 {
        self.deaths
    }

    fn wins(&self) -> u32 {
        self.wins
    }

    fn total_duels(&self) -> u32 {
        self.total_duels
    }
}

#[derive(Debug, Serialize)]
pub struct OwnProfileResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub stats: OwnStats,
    pub kd_ratio: f64,
    pub win_rate_percent: f64,
    /// True when the counters come from the live `player_stats` row.
    pub live: bool,
    pub hot_streak: bool,
    pub champion: bool,
}

pub async fn own_profile(
    State(state): State<AppState>,
) -> Result<Json<OwnProfileResponse>, ApiError> {
    let session = session_context(&state)?.require().await?;

    let profile = state.directory.find_by_user(session.user.id).await?;
    let username = profile.as_ref().and_then(|p| p.username.clone());

    let stats_row = state
        .directory
        .find_player_stats(session.user.email.as_deref(), username.as_deref())
        .await?;
    let live = stats_row.is_some();

    let stats = match (stats_row, &profile) {
        (Some(row), _) => OwnStats {
            kills: row.kills,
            deaths: row.deaths,
            wins: row.wins,
            losses: row.losses,
            total_duels: row.total_duels,
            win_streak: row.win_streak,
            best_win_streak: row.best_win_streak,
        },
        (None, Some(p)) => OwnStats {
            kills: p.total_kills,
            deaths: p.total_deaths,
            wins: p.total_wins,
            // The profile mirror does not track losses.
            losses: 0,
            total_duels: p.total_duels,
            win_streak: p.win_streak,
            best_win_streak: p.best_win_streak,
        },
        (None, None) => OwnStats::default(),
    };

    let metrics = DerivedMetrics::from_counters(&stats);

    Ok(Json(OwnProfileResponse {
        user_id: session.user.id,
        email: session.user.email,
        username,
        avatar_url: profile.and_then(|p| p.avatar_url),
        kd_ratio: metrics.kd_ratio,
        win_rate_percent: metrics.win_rate_percent,
        live,
        hot_streak: on_hot_streak(stats.win_streak),
        champion: is_champion(stats.best_win_streak),
        stats,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUsernameRequest {
    pub username: String,
}

pub async fn update_username(
    State(state): State<AppState>,
    Json(request): Json<UpdateUsernameRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = session_context(&state)?.require().await?;

    let username = request.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username must not be empty".to_string()));
    }

    state.directory.set_username(session.user.id, username).await?;
    Ok(Json(json!({ "username": username })))
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = session_context(&state)?.require().await?;

    if body.is_empty() {
        return Err(ApiError::BadRequest("Avatar image is empty".to_string()));
    }
    if body.len() > state.avatars.max_bytes {
        return Err(ApiError::BadRequest(format!(
            "Avatar must be smaller than {} bytes",
            state.avatars.max_bytes
        )));
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let extension = extension_for(&content_type).ok_or_else(|| {
        ApiError::BadRequest("Only JPG, PNG, GIF and WebP images are supported".to_string())
    })?;

    let previous = state
        .directory
        .find_by_user(session.user.id)
        .await?
        .and_then(|p| p.avatar_url);

    // Extension comes from the MIME type, never from a client filename.
    let path = format!("{}/{}.{}", session.user.id, Uuid::new_v4(), extension);
    let avatar_url = state
        .source
        .upload_object(&state.avatars.bucket, &path, &content_type, body.to_vec())
        .await?;

    state
        .directory
        .set_avatar_url(session.user.id, &avatar_url)
        .await?;

    // Drop the replaced object; a failure here only leaks an orphan.
    if let Some(old_url) = previous {
        if let Some(old_path) = object_path_in_bucket(&old_url, &state.avatars.bucket) {
            if let Err(e) = state
                .source
                .delete_object(&state.avatars.bucket, &old_path)
                .await
            {
                warn!("Failed to delete replaced avatar {}: {}", old_path, e);
            }
        }
    }

    Ok(Json(json!({ "avatar_url": avatar_url })))
}

/// File extension for an allowed avatar MIME type.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// The object path inside a bucket, extracted from a public URL.
fn object_path_in_bucket(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{}/", bucket);
    url.splitn(2, &marker).nth(1).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::AvatarPolicy;
    use crate::auth::{AuthConfig, AuthUser, Session, SessionContext};
    use crate::source::{DataSource, MemorySource};
    use crate::views::{PLAYER_STATS_TABLE, PROFILES_TABLE};
    use std::sync::Arc;
    use url::Url;

    fn signed_in_state(user_id: Uuid, email: &str) -> (AppState, Arc<MemorySource>) {
        let source = Arc::new(MemorySource::new());
        let config = AuthConfig::new(Url::parse("http://localhost:54321").unwrap(), "anon");
        let session = Session {
            access_token: "jwt".to_string(),
            user: AuthUser {
                id: user_id,
                email: Some(email.to_string()),
            },
        };
        let ctx = Arc::new(SessionContext::with_session(config, session).unwrap());

        let state = AppState::new(
            source.clone(),
            Some(ctx),
            AvatarPolicy {
                bucket: "avatars".to_string(),
                max_bytes: 64,
            },
        );
        (state, source)
    }

    fn png_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "image/png".parse().unwrap());
        headers
    }

    #[test]
    fn test_extension_for_allowed_types() {
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("image/svg+xml"), None);
        assert_eq!(extension_for(""), None);
    }

    #[test]
    fn test_object_path_in_bucket() {
        assert_eq!(
            object_path_in_bucket(
                "http://localhost:54321/storage/v1/object/public/avatars/u1/a.png",
                "avatars"
            ),
            Some("u1/a.png".to_string())
        );
        assert_eq!(
            object_path_in_bucket("memory://avatars/u1/a.png", "avatars"),
            Some("u1/a.png".to_string())
        );
        assert_eq!(
            object_path_in_bucket("https://elsewhere.example/image.png", "avatars"),
            None
        );
    }

    #[tokio::test]
    async fn test_own_profile_requires_session() {
        let source = Arc::new(MemorySource::new());
        let state = AppState::new(
            source,
            None,
            AvatarPolicy {
                bucket: "avatars".to_string(),
                max_bytes: 64,
            },
        );

        let result = own_profile(State(state)).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_own_profile_prefers_live_stats() {
        let user_id = Uuid::new_v4();
        let (state, source) = signed_in_state(user_id, "pro@example.com");

        source.replace_table(
            PROFILES_TABLE,
            vec![serde_json::json!({
                "id": Uuid::new_v4(),
                "user_id": user_id,
                "username": "xPro_Gamer47",
                "total_kills": 1, "total_deaths": 1,
                "total_wins": 1, "total_duels": 1
            })],
        );
        source.replace_table(
            PLAYER_STATS_TABLE,
            vec![serde_json::json!({
                "id": Uuid::new_v4(),
                "minecraft_username": "xPro_Gamer47",
                "email": "pro@example.com",
                "kills": 80, "deaths": 20, "wins": 30, "losses": 10,
                "total_duels": 40, "win_streak": 5, "best_win_streak": 7
            })],
        );

        let response = own_profile(State(state)).await.unwrap().0;
        assert!(response.live);
        assert_eq!(response.stats.kills, 80);
        assert_eq!(response.kd_ratio, 4.0);
        assert_eq!(response.win_rate_percent, 75.0);
        assert!(response.hot_streak);
        assert!(response.champion);
    }

    #[tokio::test]
    async fn test_own_profile_falls_back_to_profile_counters() {
        let user_id = Uuid::new_v4();
        let (state, source) = signed_in_state(user_id, "casual@example.com");

        source.replace_table(
            PROFILES_TABLE,
            vec![serde_json::json!({
                "id": Uuid::new_v4(),
                "user_id": user_id,
                "username": "Casual",
                "total_kills": 6, "total_deaths": 3,
                "total_wins": 2, "total_duels": 4
            })],
        );

        let response = own_profile(State(state)).await.unwrap().0;
        assert!(!response.live);
        assert_eq!(response.stats.kills, 6);
        assert_eq!(response.stats.losses, 0);
        assert_eq!(response.kd_ratio, 2.0);
        assert_eq!(response.win_rate_percent, 50.0);
    }

    #[tokio::test]
    async fn test_update_username_rejects_blank() {
        let (state, _source) = signed_in_state(Uuid::new_v4(), "a@example.com");

        let result = update_username(
            State(state),
            Json(UpdateUsernameRequest {
                username: "   ".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_username_trims_and_saves() {
        let user_id = Uuid::new_v4();
        let (state, source) = signed_in_state(user_id, "a@example.com");
        source.replace_table(
            PROFILES_TABLE,
            vec![serde_json::json!({
                "id": Uuid::new_v4(),
                "user_id": user_id,
                "username": "Old"
            })],
        );

        update_username(
            State(state.clone()),
            Json(UpdateUsernameRequest {
                username: "  NewName  ".to_string(),
            }),
        )
        .await
        .unwrap();

        let profile = state.directory.find_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(profile.username.as_deref(), Some("NewName"));
    }

    #[tokio::test]
    async fn test_upload_avatar_validates_size_and_type() {
        let (state, _source) = signed_in_state(Uuid::new_v4(), "a@example.com");

        // Too large (policy caps at 64 bytes).
        let result = upload_avatar(
            State(state.clone()),
            png_headers(),
            Bytes::from(vec![0u8; 65]),
        )
        .await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        // Unsupported type.
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        let result = upload_avatar(State(state.clone()), headers, Bytes::from_static(b"hi")).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));

        // Empty body.
        let result = upload_avatar(State(state), png_headers(), Bytes::new()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_upload_avatar_replaces_old_object() {
        let user_id = Uuid::new_v4();
        let (state, source) = signed_in_state(user_id, "a@example.com");
        source.replace_table(
            PROFILES_TABLE,
            vec![serde_json::json!({
                "id": Uuid::new_v4(),
                "user_id": user_id,
                "username": "Player",
                "avatar_url": "memory://avatars/old/path.png"
            })],
        );
        source
            .upload_object("avatars", "old/path.png", "image/png", vec![1])
            .await
            .unwrap();
        assert_eq!(source.object_count(), 1);

        let response = upload_avatar(
            State(state.clone()),
            png_headers(),
            Bytes::from_static(&[1, 2, 3]),
        )
        .await
        .unwrap();

        let new_url = response.0["avatar_url"].as_str().unwrap().to_string();
        assert!(new_url.starts_with("memory://avatars/"));
        assert!(new_url.ends_with(".png"));

        // Old object deleted, new one stored, profile updated.
        assert_eq!(source.object_count(), 1);
        let profile = state.directory.find_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(profile.avatar_url.as_deref(), Some(new_url.as_str()));
    }
}
