//! # routes::market
//!
//! Read-only views of the simulated instruments.
//!
//! | Method | Path                   | Description             |
//! |--------|------------------------|-------------------------|
//! | GET    | `/api/market`          | All instruments         |
//! | GET    | `/api/market/:symbol`  | One instrument          |

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{error::AppError, state::SharedState};

/// GET /api/market
pub async fn list_instruments(State(state): State<SharedState>) -> impl IntoResponse {
    let instruments = state.instruments().await;
    Json(json!({
        "ok":          true,
        "count":       instruments.len(),
        "instruments": instruments,
    }))
}

/// GET /api/market/:symbol
pub async fn get_instrument(
    State(state): State<SharedState>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let instrument = state.instrument(&symbol).await?;
    Ok(Json(json!({ "ok": true, "instrument": instrument })))
}
