//! # models::trade
//!
//! [`Side`], the [`TradeIntent`] handed to the ledger, and the immutable
//! [`Transaction`] it produces.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Side ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Past-tense verb used in log lines and confirmation messages.
    pub fn past_tense(self) -> &'static str {
        match self {
            Side::Buy => "Bought",
            Side::Sell => "Sold",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("Unknown side '{other}'. Use 'buy' or 'sell'")),
        }
    }
}

// ─── TradeIntent ──────────────────────────────────────────────────────────────

/// A fully-priced order waiting to be booked by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeIntent {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub price: f64,
}

impl TradeIntent {
    #[inline]
    pub fn total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

// ─── Transaction ──────────────────────────────────────────────────────────────

/// One booked trade. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub price: f64,
    /// `price × quantity`
    pub total: f64,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn from_intent(intent: &TradeIntent) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: intent.symbol.clone(),
            side: intent.side,
            quantity: intent.quantity,
            price: intent.price,
            total: intent.total(),
            timestamp: Utc::now(),
        }
    }

    /// e.g. `"Bought 10 shares of AAPL"`.
    pub fn summary(&self) -> String {
        format!(
            "{} {} shares of {}",
            self.side.past_tense(),
            self.quantity,
            self.symbol
        )
    }
}
