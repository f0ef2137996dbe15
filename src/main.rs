//! Avalon engine binary: plays one match with bots and prints the final view.

use std::env;

use anyhow::Context;
use avalon_engine::{
    Game, GameConfig,
    services::simulation::{BotStrategy, simulate},
};
use rand::{SeedableRng, rngs::StdRng};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = GameConfig::load();
    let players = env::var("AVALON_PLAYERS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(7);
    let mut rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_os_rng(),
    };

    let game = Game::new(config).context("creating game")?;
    game.on(|event| {
        info!(
            phase = ?event.phase,
            pending = ?event.pending_phase,
            version = event.version,
            "state changed"
        );
    });

    let report = simulate(&game, players, BotStrategy::Random, &mut rng)
        .await
        .context("simulating match")?;
    info!(outcome = ?report.outcome, "match finished");

    let json = serde_json::to_string_pretty(&report.view).context("serializing final view")?;
    println!("{json}");

    Ok(())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,avalon_engine=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
