//! HTTP surface of the coordinator.

pub mod market;
pub mod monitor;
pub mod portfolio;
pub mod rules;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        // ── Monitor Loop ──────────────────────────────────────────────────────
        .route("/health",                get(monitor::health_check))
        .route("/api/snapshot",          get(monitor::get_snapshot))
        .route("/ws/monitor",            get(monitor::ws_monitor))
        // ── Market ────────────────────────────────────────────────────────────
        .route("/api/market",            get(market::list_instruments))
        .route("/api/market/:symbol",    get(market::get_instrument))
        // ── Trading / Portfolio ───────────────────────────────────────────────
        .route("/api/trades",            post(portfolio::place_trade))
        .route("/api/transactions",      get(portfolio::list_transactions))
        .route("/api/portfolio",         get(portfolio::get_portfolio))
        // ── Auto-Trade Rules ──────────────────────────────────────────────────
        .route("/api/rules",             get(rules::list_rules).post(rules::create_rule))
        .route("/api/rules/:id/toggle",  post(rules::toggle_rule))
        .route("/api/rules/:id",         delete(rules::delete_rule))
        .with_state(state)
}
