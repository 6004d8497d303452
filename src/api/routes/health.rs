use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub source: &'static str,
    pub available: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let available = state.source.health_check().await.unwrap_or(false);
    Json(HealthResponse {
        status: if available { "ok" } else { "degraded" },
        source: state.source.name(),
        available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::AvatarPolicy;
    use crate::source::MemorySource;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_with_memory_source() {
        let state = AppState::new(
            Arc::new(MemorySource::new()),
            None,
            AvatarPolicy {
                bucket: "avatars".to_string(),
                max_bytes: 1024,
            },
        );

        let response = health(State(state)).await.0;
        assert_eq!(response.status, "ok");
        assert_eq!(response.source, "memory");
        assert!(response.available);
    }
}
