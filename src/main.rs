use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use uuid::Uuid;

use duelboard::api::state::{AppState, AvatarPolicy};
use duelboard::auth::{AuthConfig, SessionContext};
use duelboard::config::AppConfig;
use duelboard::ranking::SortKey;
use duelboard::source::{DataSource, MemorySource, RestSource, RestSourceConfig};
use duelboard::views::{LeaderboardView, DUELS_TABLE, PLAYER_STATS_TABLE, PROFILES_TABLE};

#[derive(Parser)]
#[command(name = "duelboard")]
#[command(about = "Community stats and leaderboard backend for a Minecraft duels server")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Serve seeded demo data without the hosted service
        #[arg(long)]
        offline: bool,
    },

    /// Print the leaderboard and exit
    Leaderboard {
        /// Sort key: wins, kills, kd or winrate
        #[arg(long, default_value = "wins")]
        sort: String,

        /// Number of rows to print
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Rank seeded demo data instead of the hosted service
        #[arg(long)]
        offline: bool,
    },

    /// Probe the data service
    Health {
        /// Probe the in-memory demo source instead
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting duelboard v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli.config);

    match cli.command {
        Commands::Serve {
            host,
            port,
            offline,
        } => {
            let source = select_source(&config, offline)?;
            let session = if offline {
                None
            } else {
                Some(Arc::new(SessionContext::new(auth_config(&config)?)?))
            };

            let state = AppState::new(
                source,
                session,
                AvatarPolicy {
                    bucket: config.avatars.bucket.clone(),
                    max_bytes: config.avatars.max_bytes,
                },
            );

            // First load; an unreachable service leaves the views empty
            // until a later change notification.
            if let Err(e) = state.leaderboard.refresh().await {
                tracing::warn!("Initial leaderboard fetch failed: {}", e);
            }
            if let Err(e) = state.duels.refresh().await {
                tracing::warn!("Initial duel feed fetch failed: {}", e);
            }
            state.leaderboard.watch();
            state.duels.watch();

            let app = duelboard::api::build_router(state, &config.server.cors_origin);
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Leaderboard {
            sort,
            limit,
            offline,
        } => {
            let key: SortKey = sort.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let source = select_source(&config, offline)?;
            let view = LeaderboardView::new(source);
            view.refresh().await?;
            let entries = view.ranked(key).await;

            println!("=== Leaderboard (by {}) ===\n", key);
            println!(
                "{:<5} {:<20} {:>6} {:>8} {:>7} {:>7} {:>7} {:>8} {:>7}",
                "#", "Player", "Wins", "Losses", "Kills", "Deaths", "K/D", "Win %", "Streak"
            );
            for entry in entries.iter().take(limit) {
                println!(
                    "{:<5} {:<20} {:>6} {:>8} {:>7} {:>7} {:>7.2} {:>7.1}% {:>7}",
                    entry.rank + 1,
                    entry.record.minecraft_username,
                    entry.record.wins,
                    entry.record.losses,
                    entry.record.kills,
                    entry.record.deaths,
                    entry.metrics.kd_ratio,
                    entry.metrics.win_rate_percent,
                    entry.record.best_win_streak,
                );
            }
            if entries.is_empty() {
                println!("No player data yet.");
            }
        }
        Commands::Health { offline } => {
            let source = select_source(&config, offline)?;
            let available = source.health_check().await?;
            println!(
                "{}: {}",
                source.name(),
                if available { "available" } else { "unreachable" }
            );
            if !available {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn load_config(path: &str) -> AppConfig {
    let path_buf = std::path::PathBuf::from(path);
    if path_buf.exists() {
        match AppConfig::from_file(&path_buf) {
            Ok(config) => return config,
            Err(e) => tracing::warn!("Ignoring config file {}: {}", path, e),
        }
    }
    AppConfig::default()
}

fn auth_config(config: &AppConfig) -> Result<AuthConfig> {
    let base_url = Url::parse(&config.service.base_url)?;
    let api_key = config.service.api_key().unwrap_or_default();
    Ok(AuthConfig::new(base_url, api_key))
}

/// Pick the data source: the hosted service, or seeded demo data.
fn select_source(config: &AppConfig, offline: bool) -> Result<Arc<dyn DataSource>> {
    if offline {
        tracing::info!("Using in-memory source with demo data");
        return Ok(Arc::new(seeded_demo_source()));
    }

    let base_url = Url::parse(&config.service.base_url)?;
    let api_key = config.service.api_key().unwrap_or_else(|| {
        tracing::warn!(
            "{} is not set; requests to the data service will be anonymous",
            config.service.api_key_env
        );
        String::new()
    });

    let mut rest_config = RestSourceConfig::new(base_url, api_key);
    if let Some(interval) = config.service.poll_interval_duration() {
        rest_config.poll_interval = interval;
    }

    tracing::info!("Using data service at {}", config.service.base_url);
    Ok(Arc::new(RestSource::new(rest_config)?))
}

/// Demo roster and matches for offline serving.
fn seeded_demo_source() -> MemorySource {
    let source = MemorySource::new();

    // name, wins, losses, kills, deaths, streak, best streak
    let roster: [(&str, u32, u32, u32, u32, u32, u32); 5] = [
        ("xPro_Gamer47", 2847, 912, 6120, 2204, 12, 38),
        ("Shadow_Warrior", 2156, 1003, 4877, 2450, 0, 25),
        ("KralKiller", 1924, 1101, 4310, 2671, 3, 21),
        ("TurboFighter", 1678, 1240, 3502, 2933, 1, 17),
        ("Lightning_PvP", 1543, 1377, 3119, 3021, 5, 19),
    ];

    let mut stats_rows = Vec::new();
    let mut profile_rows = Vec::new();
    let mut user_ids = Vec::new();

    for (name, wins, losses, kills, deaths, streak, best) in roster {
        let user_id = Uuid::new_v4();
        user_ids.push(user_id);

        stats_rows.push(json!({
            "id": Uuid::new_v4(),
            "minecraft_username": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "kills": kills,
            "deaths": deaths,
            "wins": wins,
            "losses": losses,
            "total_duels": wins + losses,
            "win_streak": streak,
            "best_win_streak": best,
        }));
        profile_rows.push(json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "username": name,
            "avatar_url": null,
            "total_kills": kills,
            "total_deaths": deaths,
            "total_wins": wins,
            "total_duels": wins + losses,
            "win_streak": streak,
            "best_win_streak": best,
        }));
    }

    let arenas = ["Desert Arena", "North Pole", "Nether Arena", "End Dimension"];
    let mut duel_rows = Vec::new();
    for i in 0..8usize {
        let p1 = user_ids[i % user_ids.len()];
        let p2 = user_ids[(i + 1) % user_ids.len()];
        let winner = if i % 3 == 0 { p2 } else { p1 };
        duel_rows.push(json!({
            "id": Uuid::new_v4(),
            "player1_id": p1,
            "player2_id": p2,
            "winner_id": winner,
            "player1_kills": (i % 4) as u32,
            "player2_kills": (i % 3) as u32,
            "arena": arenas[i % arenas.len()],
            "duration_seconds": 45 + (i as u32) * 37,
            "created_at": format!("2025-11-0{}T1{}:30:00Z", (i % 7) + 1, i % 10),
        }));
    }

    source.replace_table(PLAYER_STATS_TABLE, stats_rows);
    source.replace_table(PROFILES_TABLE, profile_rows);
    source.replace_table(DUELS_TABLE, duel_rows);
    source
}
