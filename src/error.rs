//! # error
//!
//! Centralised application error type.
//!
//! Every coordinator operation and handler returns `Result<_, AppError>`.
//! Axum's `IntoResponse` impl turns these into `{ "ok": false, "error": ... }`
//! bodies so a view can show the message next to the offending action.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required field was missing, empty, or not a valid number.
    #[error("{0}")]
    Validation(String),

    /// Unknown symbol or rule id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A sell asked for more shares than the position holds.
    #[error("Insufficient holdings for {symbol}: requested {requested}, held {held}")]
    InsufficientHoldings {
        symbol: String,
        requested: u64,
        held: u64,
    },

    /// Internal state disagrees with itself, e.g. a buy booked for a symbol the
    /// market does not track.
    #[error("Data integrity error: {0}")]
    Integrity(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientHoldings { .. } => StatusCode::CONFLICT,
            AppError::Integrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "ok":    false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
