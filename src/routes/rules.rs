//! # routes::rules
//!
//! Auto-trade rule management.
//!
//! | Method | Path                      | Description                     |
//! |--------|---------------------------|---------------------------------|
//! | GET    | `/api/rules`              | All rules with their condition  |
//! | POST   | `/api/rules`              | Create an armed rule            |
//! | POST   | `/api/rules/:id/toggle`   | Arm / disarm                    |
//! | DELETE | `/api/rules/:id`          | Delete                          |

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::{error::AppError, models::RuleRequest, state::SharedState};

pub async fn list_rules(State(state): State<SharedState>) -> impl IntoResponse {
    let rules = state.rules().await;
    Json(json!({
        "ok":    true,
        "count": rules.len(),
        "rules": rules,
    }))
}

/// ### Request body
/// ```json
/// { "symbol": "TSLA", "side": "buy", "trigger_price": 240.0, "quantity": 2 }
/// ```
pub async fn create_rule(
    State(state): State<SharedState>,
    Json(request): Json<RuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rule = state.create_rule(&request).await.map_err(|e| {
        warn!(error = %e, "Rule rejected");
        e
    })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok":      true,
            "message": "Auto-trade rule created",
            "rule":    rule,
        })),
    ))
}

pub async fn toggle_rule(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rule = state.toggle_rule(id).await?;
    Ok(Json(json!({ "ok": true, "rule": rule })))
}

pub async fn delete_rule(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rule = state.remove_rule(id).await?;
    Ok(Json(json!({
        "ok":      true,
        "rule_id": rule.id,
        "message": "Auto-trade rule removed",
    })))
}
