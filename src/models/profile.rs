//! Site account profiles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the `profiles` table: a registered site account with its
/// mirrored lifetime counters.
///
/// The counters duplicate a subset of `player_stats` and may lag behind it;
/// the profile view prefers the live `player_stats` row when one matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,

    /// Auth user this profile belongs to.
    pub user_id: Uuid,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub avatar_url: Option<String>,

    #[serde(default)]
    pub total_kills: u32,

    #[serde(default)]
    pub total_deaths: u32,

    #[serde(default)]
    pub total_wins: u32,

    #[serde(default)]
    pub total_duels: u32,

    #[serde(default)]
    pub win_streak: u32,

    #[serde(default)]
    pub best_win_streak: u32,
}

impl Profile {
    /// Display name with the placeholder used across the site for accounts
    /// that never picked a username.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("Unknown player")
    }

    /// Case-insensitive substring match on the username, for directory
    /// search. A profile without a username never matches.
    pub fn matches_search(&self, query: &str) -> bool {
        match &self.username {
            Some(name) => name.to_lowercase().contains(&query.to_lowercase()),
            None => false,
        }
    }
}
