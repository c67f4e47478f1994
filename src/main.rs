//! Sheep Arena - headless match runner
//!
//! Runs `SHEEP_ROUNDS` matches back to back with an idle player and logs
//! each report as JSON.

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sheep_arena::config::Config;
use sheep_arena::game::{GameMatch, MatchCommand, Pace, World};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!(
        mode = ?config.mode,
        rounds = config.rounds,
        realtime = config.realtime,
        "Starting Sheep Arena"
    );

    let tuning = config.tuning();
    let rules = config.rules();
    let obstacles = config.obstacles(&tuning)?;
    let base_seed = config.seed.unwrap_or_else(rand::random);
    let pace = if config.realtime {
        Pace::RealTime
    } else {
        Pace::Unpaced
    };

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    for round in 0..config.rounds {
        let seed = base_seed.wrapping_add(round as u64);
        let world = World::new(tuning.clone(), rules.clone(), obstacles.clone(), seed)?;
        let (game_match, handle) = GameMatch::new(world, pace, Some(config.max_ticks));

        info!(round = round + 1, match_id = %handle.id, seed, "Round starting");
        let mut task = tokio::spawn(game_match.run());

        let (report, interrupted) = tokio::select! {
            joined = &mut task => (joined?, false),
            _ = &mut shutdown => {
                handle.send(MatchCommand::Stop);
                (task.await?, true)
            }
        };

        match serde_json::to_string(&report) {
            Ok(json) => info!(round = round + 1, report = %json, "Round report"),
            Err(e) => error!(error = %e, "Failed to serialize match report"),
        }

        if interrupted {
            break;
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping");
        }
        _ = terminate => {
            info!("Received terminate signal, stopping");
        }
    }
}
