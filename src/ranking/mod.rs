//! Player ranking engine.
//!
//! Turns raw duel counters into the ordered leaderboard every stats view
//! renders:
//! - K/D ratio and win-rate derivation
//! - Descending order by a selectable sort key, stable on ties
//! - Rank badges, win-rate bands and streak flags for presentation

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{PlayerStats, Profile};

/// Raw duel counters, independent of which table a row came from.
///
/// Both `player_stats` and `profiles` carry the same counters under
/// different column names; ranking works on either through this trait.
pub trait PlayerCounters {
    fn kills(&self) -> u32;
    fn deaths(&self) -> u32;
    fn wins(&self) -> u32;
    fn total_duels(&self) -> u32;
}

impl PlayerCounters for PlayerStats {
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

impl PlayerCounters for Profile {
    fn kills(&self) -> u32 {
        self.total_kills
    }

    fn deaths(&self) -> u32 {
        self.total_deaths
    }

    fn wins(&self) -> u32 {
        self.total_wins
    }

    fn total_duels(&self) -> u32 {
        self.total_duels
    }
}

/// Metrics derived from raw counters. Recomputed on every fetch, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub kd_ratio: f64,
    pub win_rate_percent: f64,
}

impl DerivedMetrics {
    /// Derive metrics from one record.
    ///
    /// A player who never died compares by raw kill count, not an infinite
    /// ratio: 3 kills / 0 deaths ranks as 3.0, below a finite 4.0. A player
    /// with no duels has a 0% win rate.
    pub fn from_counters<C: PlayerCounters>(counters: &C) -> Self {
        let kd_ratio = if counters.deaths() > 0 {
            counters.kills() as f64 / counters.deaths() as f64
        } else {
            counters.kills() as f64
        };

        let win_rate_percent = if counters.total_duels() > 0 {
            (counters.wins() as f64 / counters.total_duels() as f64) * 100.0
        } else {
            0.0
        };

        Self {
            kd_ratio,
            win_rate_percent,
        }
    }
}

/// Leaderboard sort key. Wire names match the sort buttons the site shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "wins")]
    Wins,

    #[serde(rename = "kills")]
    Kills,

    #[serde(rename = "kd")]
    KdRatio,

    #[serde(rename = "winrate")]
    WinRate,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Wins => "wins",
            SortKey::Kills => "kills",
            SortKey::KdRatio => "kd",
            SortKey::WinRate => "winrate",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wins" => Ok(SortKey::Wins),
            "kills" => Ok(SortKey::Kills),
            "kd" => Ok(SortKey::KdRatio),
            "winrate" => Ok(SortKey::WinRate),
            other => Err(format!(
                "unknown sort key '{}' (expected wins, kills, kd or winrate)",
                other
            )),
        }
    }
}

/// A record with its derived metrics and 0-based leaderboard position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry<T> {
    pub rank: usize,
    pub metrics: DerivedMetrics,
    pub record: T,
}

/// Order records descending by `key` and assign contiguous 0-based ranks.
///
/// Ties keep the input order (stable sort, no secondary key). Counters are
/// taken as-is; inconsistent rows sort by whatever their arithmetic yields.
pub fn rank<T: PlayerCounters>(records: Vec<T>, key: SortKey) -> Vec<RankedEntry<T>> {
    let mut scored: Vec<(T, DerivedMetrics)> = records
        .into_iter()
        .map(|record| {
            let metrics = DerivedMetrics::from_counters(&record);
            (record, metrics)
        })
        .collect();

    scored.sort_by(|a, b| descending(a, b, key));

    scored
        .into_iter()
        .enumerate()
        .map(|(rank, (record, metrics))| RankedEntry {
            rank,
            metrics,
            record,
        })
        .collect()
}

fn descending<T: PlayerCounters>(
    a: &(T, DerivedMetrics),
    b: &(T, DerivedMetrics),
    key: SortKey,
) -> Ordering {
    match key {
        SortKey::Wins => b.0.wins().cmp(&a.0.wins()),
        SortKey::Kills => b.0.kills().cmp(&a.0.kills()),
        SortKey::KdRatio => b.1.kd_ratio.total_cmp(&a.1.kd_ratio),
        SortKey::WinRate => b.1.win_rate_percent.total_cmp(&a.1.win_rate_percent),
    }
}

/// Podium decoration for a leaderboard position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "position", rename_all = "lowercase")]
pub enum RankBadge {
    Crown,
    Medal,
    Award,
    Position(u32),
}

impl RankBadge {
    /// Badge for a 0-based rank: the top three get crown, medal and award,
    /// everyone else their 1-based position number.
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            0 => RankBadge::Crown,
            1 => RankBadge::Medal,
            2 => RankBadge::Award,
            n => RankBadge::Position(n as u32 + 1),
        }
    }
}

/// Win-rate classification behind the colored badge on player cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WinRateBand {
    High,
    Mid,
    Low,
}

impl WinRateBand {
    pub fn from_percent(win_rate_percent: f64) -> Self {
        if win_rate_percent >= 60.0 {
            WinRateBand::High
        } else if win_rate_percent >= 40.0 {
            WinRateBand::Mid
        } else {
            WinRateBand::Low
        }
    }
}

/// Streak length that shows the hot-streak flame on player cards.
pub const HOT_STREAK_MIN: u32 = 3;

/// Best-streak length that grants the champion badge.
pub const CHAMPION_STREAK_MIN: u32 = 5;

pub fn on_hot_streak(win_streak: u32) -> bool {
    win_streak >= HOT_STREAK_MIN
}

pub fn is_champion(best_win_streak: u32) -> bool {
    best_win_streak >= CHAMPION_STREAK_MIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn player(name: &str, kills: u32, deaths: u32, wins: u32, total_duels: u32) -> PlayerStats {
        PlayerStats {
            id: Uuid::new_v4(),
            minecraft_username: name.to_string(),
            email: None,
            kills,
            deaths,
            wins,
            losses: total_duels.saturating_sub(wins),
            total_duels,
            win_streak: 0,
            best_win_streak: 0,
        }
    }

    fn names(entries: &[RankedEntry<PlayerStats>]) -> Vec<&str> {
        entries
            .iter()
            .map(|e| e.record.minecraft_username.as_str())
            .collect()
    }

    #[test]
    fn test_kd_ratio_with_deaths() {
        let m = DerivedMetrics::from_counters(&player("a", 10, 4, 0, 0));
        assert_eq!(m.kd_ratio, 2.5);
    }

    #[test]
    fn test_kd_ratio_zero_deaths_equals_kill_count() {
        let m = DerivedMetrics::from_counters(&player("a", 7, 0, 0, 0));
        assert_eq!(m.kd_ratio, 7.0);
    }

    #[test]
    fn test_win_rate_zero_duels_is_zero() {
        let m = DerivedMetrics::from_counters(&player("a", 0, 0, 0, 0));
        assert_eq!(m.win_rate_percent, 0.0);
    }

    #[test]
    fn test_win_rate_percent() {
        let m = DerivedMetrics::from_counters(&player("a", 0, 0, 9, 12));
        assert_eq!(m.win_rate_percent, 75.0);
    }

    #[test]
    fn test_rank_empty_input() {
        let entries = rank(Vec::<PlayerStats>::new(), SortKey::Wins);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_rank_positions_are_contiguous() {
        let entries = rank(
            vec![
                player("a", 5, 1, 3, 4),
                player("b", 2, 2, 8, 9),
                player("c", 9, 3, 1, 6),
                player("d", 0, 0, 0, 0),
            ],
            SortKey::WinRate,
        );

        let ranks: Vec<usize> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let records = vec![
            player("a", 5, 1, 3, 4),
            player("b", 2, 2, 8, 9),
            player("c", 9, 3, 1, 6),
        ];

        let first = rank(records.clone(), SortKey::KdRatio);
        let second = rank(records, SortKey::KdRatio);
        assert_eq!(first, second);
    }

    #[test]
    fn test_sort_by_wins_preserves_input_order_on_ties() {
        // A and B tie on wins; A entered first and must stay first.
        let entries = rank(
            vec![
                player("A", 5, 5, 10, 12),
                player("B", 20, 4, 10, 15),
                player("C", 1, 1, 3, 4),
            ],
            SortKey::Wins,
        );

        assert_eq!(names(&entries), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_sort_by_kills() {
        let entries = rank(
            vec![
                player("low", 2, 1, 9, 9),
                player("high", 30, 1, 0, 1),
                player("mid", 15, 1, 4, 8),
            ],
            SortKey::Kills,
        );

        assert_eq!(names(&entries), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_sort_by_kd_zero_deaths_ranks_by_kill_count() {
        // X never died: its ratio is its kill count (4), which beats Y's 3.0
        // but would lose to any finite ratio above 4.
        let entries = rank(
            vec![player("X", 4, 0, 0, 0), player("Y", 3, 1, 0, 0)],
            SortKey::KdRatio,
        );

        assert_eq!(entries[0].metrics.kd_ratio, 4.0);
        assert_eq!(entries[1].metrics.kd_ratio, 3.0);
        assert_eq!(names(&entries), vec!["X", "Y"]);
    }

    #[test]
    fn test_sort_by_kd_zero_deaths_is_not_infinite() {
        let entries = rank(
            vec![player("undying", 3, 0, 0, 0), player("slayer", 45, 9, 0, 0)],
            SortKey::KdRatio,
        );

        // 45/9 = 5.0 beats the 3-kill zero-death ratio of 3.0.
        assert_eq!(names(&entries), vec!["slayer", "undying"]);
    }

    #[test]
    fn test_sort_by_win_rate_zero_duels_sorts_as_zero() {
        let entries = rank(
            vec![
                player("fresh", 0, 0, 0, 0),
                player("veteran", 0, 0, 6, 10),
            ],
            SortKey::WinRate,
        );

        assert_eq!(names(&entries), vec!["veteran", "fresh"]);
        assert_eq!(entries[1].metrics.win_rate_percent, 0.0);
    }

    #[test]
    fn test_rank_works_on_profile_rows() {
        let mut a = Profile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            username: Some("a".to_string()),
            avatar_url: None,
            total_kills: 4,
            total_deaths: 2,
            total_wins: 2,
            total_duels: 4,
            win_streak: 0,
            best_win_streak: 0,
        };
        let mut b = a.clone();
        b.username = Some("b".to_string());
        b.total_wins = 7;
        b.total_duels = 8;
        a.user_id = Uuid::new_v4();

        let entries = rank(vec![a, b], SortKey::Wins);
        assert_eq!(entries[0].record.username.as_deref(), Some("b"));
        assert_eq!(entries[0].rank, 0);
    }

    #[test]
    fn test_sort_key_round_trip() {
        for key in [
            SortKey::Wins,
            SortKey::Kills,
            SortKey::KdRatio,
            SortKey::WinRate,
        ] {
            assert_eq!(key.as_str().parse::<SortKey>().unwrap(), key);
        }

        assert!("elo".parse::<SortKey>().is_err());
        assert_eq!(SortKey::default(), SortKey::Wins);
    }

    #[test]
    fn test_sort_key_wire_names() {
        assert_eq!(serde_json::to_string(&SortKey::KdRatio).unwrap(), "\"kd\"");
        assert_eq!(
            serde_json::from_str::<SortKey>("\"winrate\"").unwrap(),
            SortKey::WinRate
        );
    }

    #[test]
    fn test_rank_badges() {
        assert_eq!(RankBadge::for_rank(0), RankBadge::Crown);
        assert_eq!(RankBadge::for_rank(1), RankBadge::Medal);
        assert_eq!(RankBadge::for_rank(2), RankBadge::Award);
        assert_eq!(RankBadge::for_rank(3), RankBadge::Position(4));
        assert_eq!(RankBadge::for_rank(41), RankBadge::Position(42));
    }

    #[test]
    fn test_win_rate_bands() {
        assert_eq!(WinRateBand::from_percent(75.0), WinRateBand::High);
        assert_eq!(WinRateBand::from_percent(60.0), WinRateBand::High);
        assert_eq!(WinRateBand::from_percent(59.9), WinRateBand::Mid);
        assert_eq!(WinRateBand::from_percent(40.0), WinRateBand::Mid);
        assert_eq!(WinRateBand::from_percent(12.5), WinRateBand::Low);
    }

    #[test]
    fn test_streak_flags() {
        assert!(!on_hot_streak(2));
        assert!(on_hot_streak(3));
        assert!(!is_champion(4));
        assert!(is_champion(5));
    }
}
