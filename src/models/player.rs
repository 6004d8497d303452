//! Player statistics rows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the `player_stats` table.
///
/// Counters are written exclusively by the game server plugin; this crate
/// only reads them. Every counter defaults to zero so a row with missing
/// fields still decodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub id: Uuid,

    /// In-game name, also the key for head-avatar rendering.
    pub minecraft_username: String,

    /// Set when the player linked their site account.
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub kills: u32,

    #[serde(default)]
    pub deaths: u32,

    #[serde(default)]
    pub wins: u32,

    #[serde(default)]
    pub losses: u32,

    #[serde(default)]
    pub total_duels: u32,

    /// Current run of consecutive wins.
    #[serde(default)]
    pub win_streak: u32,

    /// Highest win streak ever reached. The writer keeps
    /// `win_streak <= best_win_streak`.
    #[serde(default)]
    pub best_win_streak: u32,
}

impl PlayerStats {
    /// Head-avatar image for this player's in-game name.
    pub fn avatar_url(&self) -> String {
        minecraft_avatar_url(&self.minecraft_username)
    }
}

/// 2D head avatar for a Minecraft username.
pub fn minecraft_avatar_url(username: &str) -> String {
    format!("https://mc-heads.net/avatar/{}/128", username)
}

/// 3D head render for a Minecraft username.
pub fn minecraft_head_url(username: &str) -> String {
    format!("https://mc-heads.net/head/{}/128", username)
}
