use axum::extract::State;
use axum::Json;

use crate::api::state::AppState;
use crate::content::{Arena, Feature, GameCommand, Kit, StaffMember};

pub async fn features(State(state): State<AppState>) -> Json<Vec<Feature>> {
    Json(state.catalog.features().to_vec())
}

pub async fn kits(State(state): State<AppState>) -> Json<Vec<Kit>> {
    Json(state.catalog.kits().to_vec())
}

pub async fn arenas(State(state): State<AppState>) -> Json<Vec<Arena>> {
    Json(state.catalog.arenas().to_vec())
}

pub async fn staff(State(state): State<AppState>) -> Json<Vec<StaffMember>> {
    Json(state.catalog.staff().to_vec())
}

pub async fn commands(State(state): State<AppState>) -> Json<Vec<GameCommand>> {
    Json(state.catalog.commands().to_vec())
}
