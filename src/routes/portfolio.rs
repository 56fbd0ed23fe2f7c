//! # routes::portfolio
//!
//! Manual trading, holdings and transaction history.
//!
//! | Method | Path                 | Description                                 |
//! |--------|----------------------|---------------------------------------------|
//! | POST   | `/api/trades`        | Buy or sell at the current price            |
//! | GET    | `/api/transactions`  | History, newest first (`?limit=N`)          |
//! | GET    | `/api/portfolio`     | Holdings valued at live prices + summary    |

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::{error::AppError, models::TradeRequest, state::SharedState};

// ─── POST /api/trades ─────────────────────────────────────────────────────────

/// ### Request body
/// ```json
/// { "symbol": "AAPL", "side": "buy", "quantity": 10 }
/// ```
pub async fn place_trade(
    State(state): State<SharedState>,
    Json(request): Json<TradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = state.request_trade(&request).await.map_err(|e| {
        warn!(error = %e, symbol = ?request.symbol, "Trade rejected");
        e
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok":          true,
            "message":     transaction.summary(),
            "transaction": transaction,
        })),
    ))
}

// ─── GET /api/transactions ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn list_transactions(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(state.history_limit);
    let records = state.transactions(limit).await;

    Json(json!({
        "ok":      true,
        "count":   records.len(),
        "records": records,
    }))
}

// ─── GET /api/portfolio ───────────────────────────────────────────────────────

pub async fn get_portfolio(State(state): State<SharedState>) -> impl IntoResponse {
    let (holdings, summary) = state.portfolio().await;
    Json(json!({
        "ok":       true,
        "summary":  summary,
        "holdings": holdings,
    }))
}
