//! # models::rule
//!
//! Defines [`AutoTradeRule`], a standing one-shot conditional order.
//!
//! * **Buy** rules fire when the price has fallen to or below the trigger.
//! * **Sell** rules fire when the price has risen to or above the trigger.
//!
//! A rule that fires is disabled on the spot and stays in the list until the
//! user re-enables or deletes it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::trade::Side;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoTradeRule {
    pub id: Uuid,
    pub symbol: String,
    pub side: Side,
    pub trigger_price: f64,
    pub quantity: u64,
    pub enabled: bool,
}

impl AutoTradeRule {
    /// New rules start armed.
    pub fn new(symbol: &str, side: Side, trigger_price: f64, quantity: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            side,
            trigger_price,
            quantity,
            enabled: true,
        }
    }

    /// Whether `price` satisfies this rule's trigger, ignoring `enabled`.
    #[inline]
    pub fn is_triggered_by(&self, price: f64) -> bool {
        match self.side {
            Side::Buy => price <= self.trigger_price,
            Side::Sell => price >= self.trigger_price,
        }
    }

    /// Human-readable trigger, e.g. `"price <= 240.00"`.
    pub fn condition(&self) -> String {
        let op = match self.side {
            Side::Buy => "<=",
            Side::Sell => ">=",
        };
        format!("price {op} {:.2}", self.trigger_price)
    }
}

/// Serialized form with the condition label the rule list displays.
#[derive(Debug, Clone, Serialize)]
pub struct RuleView {
    #[serde(flatten)]
    pub rule: AutoTradeRule,
    pub condition: String,
}

impl From<&AutoTradeRule> for RuleView {
    fn from(rule: &AutoTradeRule) -> Self {
        Self {
            rule: rule.clone(),
            condition: rule.condition(),
        }
    }
}
