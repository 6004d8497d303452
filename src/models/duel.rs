//! Duel match records and their profile-joined presentation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Profile;

/// One row of the `duels` table, written by the game server when a match
/// ends. `winner_id` is absent for a draw or an aborted match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duel {
    pub id: Uuid,
    pub player1_id: Uuid,
    pub player2_id: Uuid,

    #[serde(default)]
    pub winner_id: Option<Uuid>,

    #[serde(default)]
    pub player1_kills: u32,

    #[serde(default)]
    pub player2_kills: u32,

    #[serde(default)]
    pub arena: Option<String>,

    #[serde(default)]
    pub duration_seconds: Option<u32>,

    pub created_at: DateTime<Utc>,
}

/// One side of a duel, resolved against the profile directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuelParticipant {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub kills: u32,
    pub winner: bool,
}

/// A duel with both participants resolved. Players that deleted their
/// account keep their id but lose name and avatar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuelWithPlayers {
    pub id: Uuid,
    pub arena: Option<String>,
    pub duration_seconds: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub player1: DuelParticipant,
    pub player2: DuelParticipant,
}

impl DuelWithPlayers {
    /// Join a duel against profiles keyed by `user_id`.
    pub fn resolve(duel: Duel, profiles: &HashMap<Uuid, Profile>) -> Self {
        let winner_id = duel.winner_id;
        let side = |user_id: Uuid, kills: u32| {
            let profile = profiles.get(&user_id);
            DuelParticipant {
                user_id,
                username: profile.and_then(|p| p.username.clone()),
                avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                kills,
                winner: winner_id == Some(user_id),
            }
        };

        let player1 = side(duel.player1_id, duel.player1_kills);
        let player2 = side(duel.player2_id, duel.player2_kills);

        Self {
            id: duel.id,
            arena: duel.arena,
            duration_seconds: duel.duration_seconds,
            created_at: duel.created_at,
            player1,
            player2,
        }
    }
}

/// Render a duel duration as `m:ss`, or "N/A" when the server did not
/// record one.
pub fn format_duration(seconds: Option<u32>) -> String {
    match seconds {
        None => "N/A".to_string(),
        Some(s) => format!("{}:{:02}", s / 60, s % 60),
    }
}
