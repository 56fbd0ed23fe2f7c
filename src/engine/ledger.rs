//! # engine::ledger
//!
//! **Ledger / Portfolio Accountant** — books a [`TradeIntent`] as an immutable
//! [`Transaction`] and updates holdings with weighted-average-cost accounting.
//!
//! ## Booking order
//! ```text
//! 1. Preconditions  → quantity > 0, price finite and > 0
//! 2. Plan           → compute the holding change, fail here or never
//! 3. Record         → prepend transaction (history is newest-first)
//! 4. Apply          → buy:  open holding or blend average cost
//!                     sell: reduce quantity, drop holding at 0
//! ```
//!
//! Every check happens before anything is written, so a failed call leaves
//! the ledger exactly as it was.

use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::request::MSG_INVALID_QUANTITY;
use crate::models::{instrument, Holding, Instrument, Side, TradeIntent, Transaction};

// ─── Sell Policy ──────────────────────────────────────────────────────────────

/// How a sell larger than the position is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SellPolicy {
    /// Reject with [`AppError::InsufficientHoldings`].
    #[default]
    Covered,
    /// Book the transaction anyway; the holding (if any) is removed.
    Uncovered,
}

// ─── Ledger ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    holdings: Vec<Holding>,
    /// Newest first.
    transactions: Vec<Transaction>,
    sell_policy: SellPolicy,
}

/// What booking an intent will do to the holdings collection.
enum HoldingChange {
    Open(Holding),
    Blend { index: usize },
    Reduce { index: usize },
    Close { index: usize },
    Untouched,
}

impl Ledger {
    pub fn new(sell_policy: SellPolicy) -> Self {
        Self {
            sell_policy,
            ..Self::default()
        }
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    #[cfg(test)]
    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.symbol() == symbol)
    }

    /// Full history, newest first.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The `limit` most recent transactions.
    pub fn recent(&self, limit: usize) -> &[Transaction] {
        &self.transactions[..limit.min(self.transactions.len())]
    }

    /// Books one trade. `instruments` is the live market, used to copy the
    /// descriptive fields when a buy opens a new holding.
    pub fn execute_trade(
        &mut self,
        intent: &TradeIntent,
        instruments: &[Instrument],
    ) -> Result<Transaction, AppError> {
        if intent.quantity == 0 {
            return Err(AppError::Validation(MSG_INVALID_QUANTITY.into()));
        }
        if !(intent.price.is_finite() && intent.price > 0.0) {
            return Err(AppError::Validation(format!(
                "Invalid execution price {} for {}",
                intent.price, intent.symbol
            )));
        }

        let change = self.plan(intent, instruments)?;

        let transaction = Transaction::from_intent(intent);
        self.transactions.insert(0, transaction.clone());

        match change {
            HoldingChange::Open(holding) => {
                debug!(symbol = %intent.symbol, quantity = intent.quantity, "Opening holding");
                self.holdings.push(holding);
            }
            HoldingChange::Blend { index } => {
                self.holdings[index].absorb_buy(intent.quantity, transaction.total);
            }
            HoldingChange::Reduce { index } => {
                self.holdings[index].quantity -= intent.quantity;
            }
            HoldingChange::Close { index } => {
                debug!(symbol = %intent.symbol, "Holding fully liquidated");
                self.holdings.remove(index);
            }
            HoldingChange::Untouched => {}
        }

        info!(
            transaction_id = %transaction.id,
            symbol         = %transaction.symbol,
            side           = %transaction.side,
            quantity       = transaction.quantity,
            price          = transaction.price,
            total          = transaction.total,
            "📒 {}",
            transaction.summary()
        );

        Ok(transaction)
    }

    fn plan(
        &self,
        intent: &TradeIntent,
        instruments: &[Instrument],
    ) -> Result<HoldingChange, AppError> {
        let index = self
            .holdings
            .iter()
            .position(|h| h.symbol() == intent.symbol);

        match (intent.side, index) {
            (Side::Buy, Some(index)) => {
                let held = self.holdings[index].quantity;
                if held.checked_add(intent.quantity).is_none() {
                    return Err(AppError::Validation(format!(
                        "Buying {} more {} would exceed the largest position size",
                        intent.quantity, intent.symbol
                    )));
                }
                Ok(HoldingChange::Blend { index })
            }

            (Side::Buy, None) => {
                let live = instrument::find(instruments, &intent.symbol).ok_or_else(|| {
                    AppError::Integrity(format!(
                        "cannot open a holding for untracked symbol {}",
                        intent.symbol
                    ))
                })?;
                Ok(HoldingChange::Open(Holding::open(
                    live,
                    intent.quantity,
                    intent.price,
                )))
            }

            (Side::Sell, index) => {
                let held = index.map(|i| self.holdings[i].quantity).unwrap_or(0);

                if intent.quantity > held && self.sell_policy == SellPolicy::Covered {
                    warn!(
                        symbol    = %intent.symbol,
                        requested = intent.quantity,
                        held,
                        "Sell exceeds position, rejected"
                    );
                    return Err(AppError::InsufficientHoldings {
                        symbol: intent.symbol.clone(),
                        requested: intent.quantity,
                        held,
                    });
                }

                Ok(match index {
                    Some(index) if intent.quantity < held => HoldingChange::Reduce { index },
                    Some(index) => HoldingChange::Close { index },
                    None => HoldingChange::Untouched,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instrument::seed_instruments;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn intent(symbol: &str, side: Side, quantity: u64, price: f64) -> TradeIntent {
        TradeIntent {
            symbol: symbol.into(),
            side,
            quantity,
            price,
        }
    }

    #[test]
    fn test_weighted_average_scenario() {
        let market = seed_instruments();
        let mut ledger = Ledger::default();

        ledger.execute_trade(&intent("AAPL", Side::Buy, 10, 178.45), &market).unwrap();
        let h = ledger.holding("AAPL").unwrap();
        assert_eq!(h.quantity, 10);
        assert_relative_eq!(h.average_cost, 178.45);

        ledger.execute_trade(&intent("AAPL", Side::Buy, 5, 180.0), &market).unwrap();
        let h = ledger.holding("AAPL").unwrap();
        assert_eq!(h.quantity, 15);
        assert_relative_eq!(h.average_cost, (178.45 * 10.0 + 180.0 * 5.0) / 15.0, epsilon = 1e-9);
        assert_relative_eq!(h.average_cost, 178.9666666, epsilon = 1e-6);
    }

    #[test]
    fn test_full_sell_removes_holding() {
        let market = seed_instruments();
        let mut ledger = Ledger::default();
        ledger.execute_trade(&intent("AAPL", Side::Buy, 15, 179.0), &market).unwrap();

        ledger.execute_trade(&intent("AAPL", Side::Sell, 15, 1.0), &market).unwrap();

        assert!(ledger.holding("AAPL").is_none());
        assert!(ledger.holdings().is_empty());
        assert_eq!(ledger.transactions().len(), 2);
    }

    #[test]
    fn test_partial_sell_keeps_average_cost() {
        let market = seed_instruments();
        let mut ledger = Ledger::default();
        ledger.execute_trade(&intent("MSFT", Side::Buy, 10, 400.0), &market).unwrap();

        ledger.execute_trade(&intent("MSFT", Side::Sell, 4, 450.0), &market).unwrap();

        let h = ledger.holding("MSFT").unwrap();
        assert_eq!(h.quantity, 6);
        assert_relative_eq!(h.average_cost, 400.0);
    }

    #[test]
    fn test_history_is_newest_first() {
        let market = seed_instruments();
        let mut ledger = Ledger::default();
        ledger.execute_trade(&intent("AAPL", Side::Buy, 1, 10.0), &market).unwrap();
        let last = ledger.execute_trade(&intent("TSLA", Side::Buy, 3, 20.0), &market).unwrap();

        assert_eq!(ledger.transactions()[0], last);
        assert_eq!(last.total, 60.0);
        assert_eq!(ledger.recent(1).len(), 1);
        assert_eq!(ledger.recent(50).len(), 2);
    }

    #[test]
    fn test_holding_copies_instrument_fields() {
        let market = seed_instruments();
        let mut ledger = Ledger::default();
        ledger.execute_trade(&intent("NVDA", Side::Buy, 1, 495.32), &market).unwrap();

        let h = ledger.holding("NVDA").unwrap();
        assert_eq!(h.instrument.name, "NVIDIA Corp.");
        assert_eq!(h.instrument.market_cap, "1.2T");
    }

    #[test]
    fn test_buy_of_untracked_symbol_is_integrity_error() {
        let mut ledger = Ledger::default();
        let err = ledger
            .execute_trade(&intent("IBM", Side::Buy, 1, 100.0), &seed_instruments())
            .unwrap_err();

        assert!(matches!(err, AppError::Integrity(_)));
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn test_uncovered_sell_rejected_without_side_effects() {
        let market = seed_instruments();
        let mut ledger = Ledger::default();
        ledger.execute_trade(&intent("AMZN", Side::Buy, 2, 170.0), &market).unwrap();

        let err = ledger
            .execute_trade(&intent("AMZN", Side::Sell, 3, 180.0), &market)
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientHoldings { requested: 3, held: 2, .. }
        ));

        let err = ledger
            .execute_trade(&intent("GOOGL", Side::Sell, 1, 140.0), &market)
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientHoldings { held: 0, .. }));

        assert_eq!(ledger.transactions().len(), 1);
        assert_eq!(ledger.holding("AMZN").unwrap().quantity, 2);
    }

    #[test]
    fn test_legacy_uncovered_sells() {
        let market = seed_instruments();
        let mut ledger = Ledger::new(SellPolicy::Uncovered);
        ledger.execute_trade(&intent("AMZN", Side::Buy, 2, 170.0), &market).unwrap();

        ledger.execute_trade(&intent("AMZN", Side::Sell, 3, 180.0), &market).unwrap();
        assert!(ledger.holding("AMZN").is_none());

        ledger.execute_trade(&intent("GOOGL", Side::Sell, 1, 140.0), &market).unwrap();
        assert!(ledger.holdings().is_empty());
        assert_eq!(ledger.transactions().len(), 3);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut ledger = Ledger::default();
        let err = ledger
            .execute_trade(&intent("AAPL", Side::Buy, 0, 178.45), &seed_instruments())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn test_buy_overflowing_position_rejected_without_side_effects() {
        let market = seed_instruments();
        let mut ledger = Ledger::default();
        ledger.execute_trade(&intent("AAPL", Side::Buy, u64::MAX, 1.0), &market).unwrap();

        let err = ledger
            .execute_trade(&intent("AAPL", Side::Buy, 1, 1.0), &market)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let h = ledger.holding("AAPL").unwrap();
        assert_eq!(h.quantity, u64::MAX);
        assert_relative_eq!(h.average_cost, 1.0);
        assert_eq!(ledger.transactions().len(), 1);
    }

    proptest! {
        #[test]
        fn prop_average_cost_is_spend_over_shares(
            buys in prop::collection::vec((1u64..500, 1.0f64..1000.0), 1..20)
        ) {
            let market = seed_instruments();
            let mut ledger = Ledger::default();

            let mut spent = 0.0;
            let mut shares = 0u64;
            for (quantity, price) in &buys {
                ledger.execute_trade(&intent("TSLA", Side::Buy, *quantity, *price), &market).unwrap();
                spent += *quantity as f64 * price;
                shares += quantity;
            }

            let h = ledger.holding("TSLA").unwrap();
            prop_assert_eq!(h.quantity, shares);
            prop_assert!((h.average_cost - spent / shares as f64).abs() < 1e-6);
        }
    }
}
