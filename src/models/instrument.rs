//! # models::instrument
//!
//! Defines [`Instrument`], one tracked equity in the simulated market, and the
//! seed list the market opens with.
//!
//! The price fields are replaced on every simulator tick; `symbol` never
//! changes and is the only key used to join instruments with holdings, rules
//! and transactions.

use serde::{Deserialize, Serialize};

/// A tradable symbol with its live simulated quote and descriptive metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Ticker, e.g. `"AAPL"`.
    pub symbol: String,

    /// Display name, e.g. `"Apple Inc."`.
    pub name: String,

    /// Current simulated price. Always `>= PRICE_FLOOR`.
    pub price: f64,

    /// Absolute change against the session-open reference price.
    pub change: f64,

    /// `change` expressed as a percentage of the session-open reference.
    pub change_percent: f64,

    pub volume: u64,

    /// Pre-formatted market capitalisation label, e.g. `"2.8T"`.
    pub market_cap: String,
}

impl Instrument {
    pub fn new(
        symbol: &str,
        name: &str,
        price: f64,
        change: f64,
        change_percent: f64,
        volume: u64,
        market_cap: &str,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            price,
            change,
            change_percent,
            volume,
            market_cap: market_cap.to_string(),
        }
    }

    /// The fixed price that `change` is measured against.
    #[inline]
    pub fn reference_price(&self) -> f64 {
        self.price - self.change
    }
}

/// Finds an instrument by symbol.
pub fn find<'a>(instruments: &'a [Instrument], symbol: &str) -> Option<&'a Instrument> {
    instruments.iter().find(|i| i.symbol == symbol)
}

// ─── Seed Market ──────────────────────────────────────────────────────────────

/// The instruments every session opens with.
pub fn seed_instruments() -> Vec<Instrument> {
    vec![
        Instrument::new("AAPL",  "Apple Inc.",      178.45,  2.34,  1.33, 52_340_000, "2.8T"),
        Instrument::new("GOOGL", "Alphabet Inc.",   142.87, -1.12, -0.78, 24_560_000, "1.8T"),
        Instrument::new("MSFT",  "Microsoft Corp.", 412.34,  5.67,  1.39, 28_920_000, "3.1T"),
        Instrument::new("AMZN",  "Amazon.com Inc.", 178.23,  3.45,  1.98, 45_120_000, "1.9T"),
        Instrument::new("TSLA",  "Tesla Inc.",      242.56, -4.23, -1.71, 98_760_000, "771B"),
        Instrument::new("NVDA",  "NVIDIA Corp.",    495.32,  8.91,  1.83, 42_310_000, "1.2T"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_symbols_are_unique() {
        let seed = seed_instruments();
        let mut symbols: Vec<_> = seed.iter().map(|i| i.symbol.as_str()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        assert_eq!(symbols.len(), seed.len());
    }

    #[test]
    fn test_find_by_symbol() {
        let seed = seed_instruments();
        assert_eq!(find(&seed, "TSLA").map(|i| i.price), Some(242.56));
        assert!(find(&seed, "IBM").is_none());
    }
}
