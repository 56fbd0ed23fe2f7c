//! Domain models shared across the simulator, ledger and rule engine.

pub mod holding;
pub mod instrument;
pub mod request;
pub mod rule;
pub mod trade;

pub use holding::{Holding, HoldingValuation, PortfolioSummary};
pub use instrument::Instrument;
pub use request::{RuleRequest, TradeRequest};
pub use rule::{AutoTradeRule, RuleView};
pub use trade::{Side, TradeIntent, Transaction};
