//! # Duelboard
//!
//! Community stats and leaderboard backend for a Minecraft duels server.
//! All persistence, auth, realtime change feeds and object storage belong
//! to a hosted backend service; this crate consumes it and derives what
//! the site shows.
//!
//! ## Architecture
//!
//! - **models**: row types mirrored from the hosted data store
//! - **ranking**: derived metrics and deterministic leaderboard ordering
//! - **source**: the hosted-backend abstraction (REST and in-memory)
//! - **views**: invalidate-and-refetch live views over the source
//! - **auth**: injected session context over the hosted auth service
//! - **api**: REST endpoints
//! - **content**: static site catalog (features, kits, arenas, staff, commands)
//! - **config**: configuration loading and validation

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod models;
pub mod ranking;
pub mod source;
pub mod views;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "30m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    Some(Duration::from_secs(num * multiplier))
}
