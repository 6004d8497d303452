use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::session_context;
use crate::api::state::AppState;
use crate::api::ApiError;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    fn validate(&self) -> Result<(), ApiError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ApiError::BadRequest(
                "Email and password are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionResponse>, ApiError> {
    credentials.validate()?;
    let session = session_context(&state)?
        .sign_up(credentials.email.trim(), &credentials.password)
        .await?;
    Ok(Json(SessionResponse {
        user_id: session.user.id,
        email: session.user.email,
    }))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SessionResponse>, ApiError> {
    credentials.validate()?;
    let session = session_context(&state)?
        .sign_in(credentials.email.trim(), &credentials.password)
        .await?;
    Ok(Json(SessionResponse {
        user_id: session.user.id,
        email: session.user.email,
    }))
}

pub async fn sign_out(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    session_context(&state)?.sign_out().await;
    Ok(Json(json!({ "signed_out": true })))
}
