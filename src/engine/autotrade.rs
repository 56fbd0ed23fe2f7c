//! # engine::autotrade
//!
//! **Auto-Trade Evaluator** — runs after every price tick and every rule
//! change.
//!
//! ## Per-pass order
//! ```text
//! for each rule:
//!   1. enabled?                      → no: skip
//!   2. instrument tracked?           → no: skip quietly
//!   3. buy:  price <= trigger
//!      sell: price >= trigger        → no: skip
//!   4. disarm rule (enabled = false)
//!   5. book intent at the live price → ledger
//! ```
//!
//! The rule is disarmed in the same pass that fires it, so the next pass can
//! never see it armed on the same condition. A rejected booking does not
//! re-arm it.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::ledger::Ledger;
use crate::models::{instrument, AutoTradeRule, Instrument, TradeIntent, Transaction};

// ─── Signals ──────────────────────────────────────────────────────────────────

/// A rule whose trigger holds against the current snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFiring {
    pub rule_id: Uuid,
    pub intent: TradeIntent,
}

/// What happened to one fired rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Executed {
        rule_id: Uuid,
        transaction: Transaction,
    },
    /// The ledger refused the trade; the rule is disarmed regardless.
    Failed { rule_id: Uuid, reason: String },
}

// ─── Core Evaluation ──────────────────────────────────────────────────────────

/// Lists the rules that would fire against `instruments`. Pure.
pub fn evaluate(rules: &[AutoTradeRule], instruments: &[Instrument]) -> Vec<RuleFiring> {
    rules
        .iter()
        .filter(|rule| rule.enabled)
        .filter_map(|rule| {
            let Some(live) = instrument::find(instruments, &rule.symbol) else {
                debug!(rule_id = %rule.id, symbol = %rule.symbol, "Symbol not tracked, rule skipped");
                return None;
            };

            if !rule.is_triggered_by(live.price) {
                return None;
            }

            Some(RuleFiring {
                rule_id: rule.id,
                intent: TradeIntent {
                    symbol: rule.symbol.clone(),
                    side: rule.side,
                    quantity: rule.quantity,
                    price: live.price,
                },
            })
        })
        .collect()
}

/// Evaluates, disarms, and books every triggered rule.
pub fn run_pass(
    rules: &mut [AutoTradeRule],
    ledger: &mut Ledger,
    instruments: &[Instrument],
) -> Vec<RuleOutcome> {
    let firings = evaluate(rules, instruments);

    firings
        .into_iter()
        .map(|firing| {
            if let Some(rule) = rules.iter_mut().find(|r| r.id == firing.rule_id) {
                rule.enabled = false;
            }

            match ledger.execute_trade(&firing.intent, instruments) {
                Ok(transaction) => {
                    info!(
                        rule_id  = %firing.rule_id,
                        symbol   = %firing.intent.symbol,
                        side     = %firing.intent.side,
                        quantity = firing.intent.quantity,
                        price    = firing.intent.price,
                        "🎯 Auto-trade rule fired"
                    );
                    RuleOutcome::Executed {
                        rule_id: firing.rule_id,
                        transaction,
                    }
                }
                Err(e) => {
                    warn!(rule_id = %firing.rule_id, error = %e, "Auto-trade rule fired but trade was rejected");
                    RuleOutcome::Failed {
                        rule_id: firing.rule_id,
                        reason: e.to_string(),
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;

    fn tsla_at(price: f64) -> Vec<Instrument> {
        vec![Instrument::new("TSLA", "Tesla Inc.", price, 0.0, 0.0, 0, "771B")]
    }

    #[test]
    fn test_dip_buy_fires_once() {
        let mut rules = vec![AutoTradeRule::new("TSLA", Side::Buy, 240.0, 2)];
        let mut ledger = Ledger::default();

        let outcomes = run_pass(&mut rules, &mut ledger, &tsla_at(239.99));
        assert_eq!(outcomes.len(), 1);
        assert!(!rules[0].enabled);

        let tx = &ledger.transactions()[0];
        assert_eq!(tx.side, Side::Buy);
        assert_eq!(tx.quantity, 2);
        assert_eq!(tx.price, 239.99);

        // Further drop: rule is disarmed, nothing happens.
        assert!(run_pass(&mut rules, &mut ledger, &tsla_at(235.0)).is_empty());
        assert!(run_pass(&mut rules, &mut ledger, &tsla_at(239.99)).is_empty());
        assert_eq!(ledger.transactions().len(), 1);

        // Re-armed by the user: fires again.
        rules[0].enabled = true;
        assert_eq!(run_pass(&mut rules, &mut ledger, &tsla_at(235.0)).len(), 1);
        assert_eq!(ledger.holding("TSLA").unwrap().quantity, 4);
    }

    #[test]
    fn test_disabled_rule_never_fires() {
        let mut rule = AutoTradeRule::new("TSLA", Side::Buy, 1000.0, 1);
        rule.enabled = false;

        assert!(evaluate(&[rule], &tsla_at(1.0)).is_empty());
    }

    #[test]
    fn test_condition_not_met() {
        let rules = [
            AutoTradeRule::new("TSLA", Side::Buy, 240.0, 1),
            AutoTradeRule::new("TSLA", Side::Sell, 260.0, 1),
        ];
        assert!(evaluate(&rules, &tsla_at(250.0)).is_empty());
    }

    #[test]
    fn test_untracked_symbol_is_skipped() {
        let rules = [AutoTradeRule::new("IBM", Side::Buy, 1000.0, 1)];
        assert!(evaluate(&rules, &tsla_at(10.0)).is_empty());
    }

    #[test]
    fn test_target_sell_uses_live_price() {
        let rules = [AutoTradeRule::new("TSLA", Side::Sell, 250.0, 3)];
        let firings = evaluate(&rules, &tsla_at(251.5));

        assert_eq!(firings.len(), 1);
        assert_eq!(firings[0].intent.price, 251.5);
        assert_eq!(firings[0].intent.quantity, 3);
    }

    #[test]
    fn test_rejected_trade_still_disarms() {
        let mut rules = vec![AutoTradeRule::new("TSLA", Side::Sell, 250.0, 3)];
        let mut ledger = Ledger::default();

        let outcomes = run_pass(&mut rules, &mut ledger, &tsla_at(255.0));

        assert!(matches!(outcomes[0], RuleOutcome::Failed { .. }));
        assert!(!rules[0].enabled);
        assert!(ledger.transactions().is_empty());
    }
}
