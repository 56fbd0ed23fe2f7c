//! # models::request
//!
//! Raw view → coordinator payloads and their validation.
//!
//! Views post form values, so numeric fields arrive either as JSON numbers or
//! as the strings a text input produced. Nothing here touches state: a
//! request either validates into a typed order/rule or yields
//! [`AppError::Validation`] with a message the view can show as-is.

use serde::Deserialize;

use crate::error::AppError;
use crate::models::Side;

pub const MSG_FILL_ALL_FIELDS: &str = "Please fill all fields";
pub const MSG_INVALID_QUANTITY: &str = "Please enter a valid quantity";
pub const MSG_INVALID_TRIGGER: &str = "Please enter a valid trigger price";

/// A form value: number or text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    fn is_blank(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.trim().is_empty())
    }

    fn as_quantity(&self) -> Option<u64> {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && *n >= 1.0 && *n <= u64::MAX as f64 => {
                Some(*n as u64)
            }
            FieldValue::Number(_) => None,
            FieldValue::Text(s) => s.trim().parse::<u64>().ok().filter(|q| *q > 0),
        }
    }

    fn as_price(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (value.is_finite() && value > 0.0).then_some(value)
    }
}

fn text(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn value(field: &Option<FieldValue>) -> Option<&FieldValue> {
    field.as_ref().filter(|v| !v.is_blank())
}

fn parse_side(raw: &str) -> Result<Side, AppError> {
    raw.parse::<Side>().map_err(AppError::Validation)
}

// ─── Trade ────────────────────────────────────────────────────────────────────

/// Body of `POST /api/trades`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TradeRequest {
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub quantity: Option<FieldValue>,
}

/// A manual order that passed validation; the price is filled in at execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOrder {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
}

impl TradeRequest {
    pub fn validate(&self) -> Result<TradeOrder, AppError> {
        let (Some(symbol), Some(side), Some(quantity)) =
            (text(&self.symbol), text(&self.side), value(&self.quantity))
        else {
            return Err(AppError::Validation(MSG_FILL_ALL_FIELDS.into()));
        };

        Ok(TradeOrder {
            symbol: symbol.to_ascii_uppercase(),
            side: parse_side(side)?,
            quantity: quantity
                .as_quantity()
                .ok_or_else(|| AppError::Validation(MSG_INVALID_QUANTITY.into()))?,
        })
    }
}

// ─── Rule ─────────────────────────────────────────────────────────────────────

/// Body of `POST /api/rules`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleRequest {
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub trigger_price: Option<FieldValue>,
    pub quantity: Option<FieldValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleSpec {
    pub symbol: String,
    pub side: Side,
    pub trigger_price: f64,
    pub quantity: u64,
}

impl RuleRequest {
    pub fn validate(&self) -> Result<RuleSpec, AppError> {
        let (Some(symbol), Some(side), Some(trigger), Some(quantity)) = (
            text(&self.symbol),
            text(&self.side),
            value(&self.trigger_price),
            value(&self.quantity),
        ) else {
            return Err(AppError::Validation(MSG_FILL_ALL_FIELDS.into()));
        };

        Ok(RuleSpec {
            symbol: symbol.to_ascii_uppercase(),
            side: parse_side(side)?,
            trigger_price: trigger
                .as_price()
                .ok_or_else(|| AppError::Validation(MSG_INVALID_TRIGGER.into()))?,
            quantity: quantity
                .as_quantity()
                .ok_or_else(|| AppError::Validation(MSG_INVALID_QUANTITY.into()))?,
        })
    }
}
