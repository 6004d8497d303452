//! Player directory: profile reads and account-owned writes.
//!
//! Unlike the two live feeds, the directory reads per activation; there is
//! no subscription to release.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::ViewError;
use crate::models::{PlayerStats, Profile};
use crate::source::{fetch_rows, DataSource, RowQuery};
use crate::views::leaderboard::PLAYER_STATS_TABLE;

pub const PROFILES_TABLE: &str = "profiles";

pub struct PlayerDirectory {
    source: Arc<dyn DataSource>,
}

impl PlayerDirectory {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// All profiles, best record first.
    pub async fn list(&self) -> Result<Vec<Profile>, ViewError> {
        Ok(fetch_rows::<Profile>(
            self.source.as_ref(),
            PROFILES_TABLE,
            &RowQuery::default().order_desc("total_wins"),
        )
        .await?)
    }

    /// Profiles whose username contains the query, case-insensitively.
    /// Accounts that never picked a username are not listed.
    pub async fn search(&self, query: &str) -> Result<Vec<Profile>, ViewError> {
        let mut profiles = self.list().await?;
        profiles.retain(|p| p.matches_search(query.trim()));
        Ok(profiles)
    }

    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Profile>, ViewError> {
        let hits = fetch_rows::<Profile>(
            self.source.as_ref(),
            PROFILES_TABLE,
            &RowQuery::default().eq("user_id", user_id).limit(1),
        )
        .await?;
        Ok(hits.into_iter().next())
    }

    /// The live `player_stats` row for an account: matched by email first,
    /// then by the linked in-game username.
    pub async fn find_player_stats(
        &self,
        email: Option<&str>,
        username: Option<&str>,
    ) -> Result<Option<PlayerStats>, ViewError> {
        if let Some(email) = email {
            let hits = fetch_rows::<PlayerStats>(
                self.source.as_ref(),
                PLAYER_STATS_TABLE,
                &RowQuery::default().eq("email", email).limit(1),
            )
            .await?;
            if let Some(stats) = hits.into_iter().next() {
                return Ok(Some(stats));
            }
        }

        if let Some(username) = username {
            let hits = fetch_rows::<PlayerStats>(
                self.source.as_ref(),
                PLAYER_STATS_TABLE,
                &RowQuery::default().eq("minecraft_username", username).limit(1),
            )
            .await?;
            if let Some(stats) = hits.into_iter().next() {
                return Ok(Some(stats));
            }
        }

        Ok(None)
    }

    pub async fn set_username(&self, user_id: Uuid, username: &str) -> Result<(), ViewError> {
        self.source
            .update(
                PROFILES_TABLE,
                &RowQuery::default().eq("user_id", user_id),
                json!({ "username": username }),
            )
            .await?;
        Ok(())
    }

    pub async fn set_avatar_url(&self, user_id: Uuid, url: &str) -> Result<(), ViewError> {
        self.source
            .update(
                PROFILES_TABLE,
                &RowQuery::default().eq("user_id", user_id),
                json!({ "avatar_url": url }),
            )
            .await?;
        Ok(())
    }
}
