//! # models::holding
//!
//! Defines [`Holding`] (an open position in one symbol) and the valuation
//! types the portfolio endpoints return.
//!
//! ## Stored vs. live fields
//! A holding keeps the descriptive fields of its instrument as they were when
//! the position was opened. Valuation never trusts that copy: it re-joins the
//! live instrument by symbol and only falls back to the stored price when the
//! instrument is no longer tracked.

use serde::{Deserialize, Serialize};

use crate::models::instrument::{self, Instrument};

// ─── Holding ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Instrument fields copied at the first buy.
    #[serde(flatten)]
    pub instrument: Instrument,

    /// Shares held. Always `> 0` while the holding exists.
    pub quantity: u64,

    /// Weighted-average cost per share.
    pub average_cost: f64,
}

impl Holding {
    pub fn open(instrument: &Instrument, quantity: u64, price: f64) -> Self {
        Self {
            instrument: instrument.clone(),
            quantity,
            average_cost: price,
        }
    }

    #[inline]
    pub fn symbol(&self) -> &str {
        &self.instrument.symbol
    }

    /// Total money paid for the shares currently held.
    #[inline]
    pub fn cost_basis(&self) -> f64 {
        self.average_cost * self.quantity as f64
    }

    /// Blends a new buy into the weighted average.
    pub fn absorb_buy(&mut self, quantity: u64, total: f64) {
        let new_quantity = self.quantity + quantity;
        self.average_cost = (self.cost_basis() + total) / new_quantity as f64;
        self.quantity = new_quantity;
    }

    /// Values the holding against the live instrument list.
    pub fn valuation(&self, live: &[Instrument]) -> HoldingValuation {
        let current_price = instrument::find(live, self.symbol())
            .map(|i| i.price)
            .unwrap_or(self.instrument.price);

        let market_value = current_price * self.quantity as f64;
        let cost_basis = self.cost_basis();
        let gain = market_value - cost_basis;

        HoldingValuation {
            symbol: self.symbol().to_string(),
            name: self.instrument.name.clone(),
            quantity: self.quantity,
            average_cost: self.average_cost,
            current_price,
            market_value,
            cost_basis,
            gain,
            gain_percent: percent_of(gain, cost_basis),
        }
    }
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

// ─── Valuation ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingValuation {
    pub symbol: String,
    pub name: String,
    pub quantity: u64,
    pub average_cost: f64,
    pub current_price: f64,
    pub market_value: f64,
    pub cost_basis: f64,
    pub gain: f64,
    pub gain_percent: f64,
}

/// Aggregate figures shown above the holdings list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain: f64,
    pub total_gain_percent: f64,
    pub positions: usize,
}

impl PortfolioSummary {
    pub fn from_valuations(valuations: &[HoldingValuation]) -> Self {
        let total_value: f64 = valuations.iter().map(|v| v.market_value).sum();
        let total_cost: f64 = valuations.iter().map(|v| v.cost_basis).sum();
        let total_gain = total_value - total_cost;

        Self {
            total_value,
            total_cost,
            total_gain,
            total_gain_percent: percent_of(total_gain, total_cost),
            positions: valuations.len(),
        }
    }
}
