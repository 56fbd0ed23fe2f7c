//! # Marketsim — Simulated Stock Market Backend
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  every TICK_INTERVAL_MS   ┌───────────────────────────┐
//!  │ Price        │ ─────────────────────────▶│ AppState (coordinator)    │
//!  │ Simulator    │   advance_market()        │ ├─ instruments            │
//!  └──────────────┘                           │ ├─ ledger (holdings, txs) │
//!                                             │ ├─ auto-trade rules       │
//!  ┌──────────────┐  POST /api/trades         │ │    └─ [Evaluator] ──────┼──▶ ledger
//!  │  View        │  POST /api/rules ...      │ └─ broadcast_tx ──────┐   │
//!  │  (browser)   │ ─────────────────────────▶└───────────────────────┼───┘
//!  │              │ ◀──────────────────────────────────────────────────┘
//!  └──────────────┘  ws://host/ws/monitor
//! ```
//!
//! ## Environment Variables
//!
//! | Variable                 | Default         | Description                          |
//! |--------------------------|-----------------|--------------------------------------|
//! | `BIND_ADDR`              | `0.0.0.0:3000`  | Address Axum listens on              |
//! | `TICK_INTERVAL_MS`       | `3000`          | Price simulation period              |
//! | `MAX_TICK_DELTA`         | `1.0`           | Max price move per tick              |
//! | `PRICE_FLOOR`            | `1.0`           | Lowest simulated price               |
//! | `SIM_SEED`               | —               | Fixed RNG seed                       |
//! | `HISTORY_DISPLAY_LIMIT`  | `10`            | Transactions per snapshot            |
//! | `LEGACY_UNCOVERED_SELLS` | `false`         | Allow selling more than is held      |
//! | `RUST_LOG`               | `marketsim=debug` | Tracing filter                     |

use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod engine;
mod error;
mod events;
mod models;
mod routes;
mod state;

use config::Config;
use state::build_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("marketsim=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════╗
  ║        MARKETSIM — Stock Market Simulator     ║
  ║     Prices · Portfolio · Auto-Trade Rules     ║
  ╚═══════════════════════════════════════════════╝"#);

    // ── 3. Config ─────────────────────────────────────────────────────────────
    let config = Config::from_env().context("Failed to load config")?;
    info!(
        bind      = %config.bind_addr,
        interval  = ?config.simulation.tick_interval,
        seed      = ?config.simulation.seed,
        legacy    = config.legacy_uncovered_sells,
        "Config loaded"
    );

    // ── 4. Shared state + simulation task ─────────────────────────────────────
    let state = build_state(&config);
    let simulation = engine::ticker::start(state.clone(), &config.simulation);

    // ── 5. Router ─────────────────────────────────────────────────────────────
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // ── 6. Bind & Serve ───────────────────────────────────────────────────────
    info!(addr = %config.bind_addr, "🚀 Marketsim server starting");
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // ── 7. Stop the price feed ────────────────────────────────────────────────
    simulation.stop().await;
    info!("👋 Marketsim stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
