//! # events
//!
//! Defines [`WsEvent`]: everything the coordinator pushes to connected views
//! over `/ws/monitor`.
//!
//! Events travel through a `tokio::sync::broadcast::Sender<String>` as
//! pre-serialized JSON so every subscriber shares one encoding.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Instrument, RuleView, Transaction};
use crate::state::MarketSnapshot;

/// Who asked for a trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeOrigin {
    Manual,
    AutoTrade { rule_id: Uuid },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WsEvent {
    /// Full view state; sent on connect and after every change.
    Snapshot {
        snapshot: Box<MarketSnapshot>,
    },

    /// The simulator replaced the instrument list.
    PricesUpdated {
        tick:        u64,
        instruments: Vec<Instrument>,
    },

    TradeExecuted {
        transaction: Box<Transaction>,
        origin:      TradeOrigin,
        message:     String,
    },

    RuleCreated {
        rule: RuleView,
    },

    RuleToggled {
        rule: RuleView,
    },

    RuleRemoved {
        rule_id: Uuid,
    },

    /// A rule's condition held; it is now disarmed.
    RuleFired {
        rule_id:        Uuid,
        transaction_id: Uuid,
    },

    /// A rule fired but the ledger refused the trade; it is disarmed anyway.
    RuleFailed {
        rule_id: Uuid,
        reason:  String,
    },
}

impl WsEvent {
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}
