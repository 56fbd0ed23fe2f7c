//! # state
//!
//! The **coordinator** — sole owner of the simulated market. Handlers, the
//! tick task and tests all go through [`AppState`]; nothing else mutates a
//! [`Market`].
//!
//! ## Transitions
//! Every mutation runs under the write lock as one event:
//!
//! ```text
//! lock → clone current market → apply event → swap in  → unlock → broadcast
//!                                    │
//!                                    └─ Err: nothing swapped, state unchanged
//! ```
//!
//! Readers either see the whole previous market or the whole next one.
//! Price ticks, rule creation and rule toggling are followed by an
//! auto-trade pass inside the same transition.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::autotrade::{self, RuleOutcome};
use crate::engine::ledger::{Ledger, SellPolicy};
use crate::engine::simulator::PriceSimulator;
use crate::error::AppError;
use crate::events::{TradeOrigin, WsEvent};
use crate::models::{
    instrument, AutoTradeRule, HoldingValuation, Instrument, PortfolioSummary, RuleRequest,
    RuleView, TradeIntent, TradeRequest, Transaction,
};

// ─── Market ───────────────────────────────────────────────────────────────────

/// Everything a session knows: instruments, holdings and history, rules.
#[derive(Debug, Clone)]
pub struct Market {
    pub instruments: Vec<Instrument>,
    pub ledger: Ledger,
    pub rules: Vec<AutoTradeRule>,
}

impl Market {
    pub fn new(instruments: Vec<Instrument>, sell_policy: SellPolicy) -> Self {
        Self {
            instruments,
            ledger: Ledger::new(sell_policy),
            rules: Vec::new(),
        }
    }

    fn rule_index(&self, id: Uuid) -> Result<usize, AppError> {
        self.rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("auto-trade rule {id}")))
    }

    fn require_instrument(&self, symbol: &str) -> Result<&Instrument, AppError> {
        instrument::find(&self.instruments, symbol)
            .ok_or_else(|| AppError::NotFound(format!("instrument {symbol}")))
    }

    fn run_rules(&mut self) -> Vec<RuleOutcome> {
        autotrade::run_pass(&mut self.rules, &mut self.ledger, &self.instruments)
    }

    pub fn valuations(&self) -> Vec<HoldingValuation> {
        self.ledger
            .holdings()
            .iter()
            .map(|h| h.valuation(&self.instruments))
            .collect()
    }

    pub fn snapshot(&self, tick: u64, history_limit: usize) -> MarketSnapshot {
        let holdings = self.valuations();
        MarketSnapshot {
            tick,
            instruments: self.instruments.clone(),
            summary: PortfolioSummary::from_valuations(&holdings),
            holdings,
            transactions: self.ledger.recent(history_limit).to_vec(),
            transaction_count: self.ledger.transactions().len(),
            rules: self.rules.iter().map(RuleView::from).collect(),
        }
    }
}

/// What a view renders.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSnapshot {
    pub tick: u64,
    pub instruments: Vec<Instrument>,
    pub holdings: Vec<HoldingValuation>,
    pub summary: PortfolioSummary,
    /// Most recent first, capped at the display limit.
    pub transactions: Vec<Transaction>,
    pub transaction_count: usize,
    pub rules: Vec<RuleView>,
}

/// Result of one simulator tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    pub executed: usize,
    pub failed: usize,
}

// ─── AppState ─────────────────────────────────────────────────────────────────

/// Top-level shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<RwLock<Market>>,

    /// Pre-serialized [`WsEvent`]s for `/ws/monitor` subscribers.
    pub broadcast_tx: broadcast::Sender<String>,

    // ── Metrics ───────────────────────────────────────────────────────────────
    pub tick_count:  Arc<AtomicU64>,
    pub trade_count: Arc<AtomicU64>,

    /// Set while the simulation task is running.
    pub simulation_running: Arc<AtomicBool>,

    /// Transactions carried by each snapshot.
    pub history_limit: usize,
}

impl AppState {
    pub fn new(market: Market, history_limit: usize) -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);

        Self {
            market: Arc::new(RwLock::new(market)),
            broadcast_tx,
            tick_count: Arc::new(AtomicU64::new(0)),
            trade_count: Arc::new(AtomicU64::new(0)),
            simulation_running: Arc::new(AtomicBool::new(false)),
            history_limit,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let policy = if config.legacy_uncovered_sells {
            SellPolicy::Uncovered
        } else {
            SellPolicy::Covered
        };
        Self::new(
            Market::new(instrument::seed_instruments(), policy),
            config.history_display_limit,
        )
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Sends to every subscriber. No subscribers is not an error.
    pub fn broadcast(&self, event: &WsEvent) {
        let _ = self.broadcast_tx.send(event.to_json());
    }

    /// Applies `event` to a copy of the market and swaps it in on success.
    async fn transition<T, F>(&self, event: F) -> Result<(T, MarketSnapshot), AppError>
    where
        F: FnOnce(&mut Market) -> Result<T, AppError>,
    {
        let mut guard = self.market.write().await;
        let mut next = guard.clone();
        let out = event(&mut next)?;
        *guard = next;

        let snapshot = guard.snapshot(self.tick_count.load(Ordering::Relaxed), self.history_limit);
        Ok((out, snapshot))
    }

    fn publish_snapshot(&self, snapshot: MarketSnapshot) {
        self.broadcast(&WsEvent::Snapshot {
            snapshot: Box::new(snapshot),
        });
    }

    /// Broadcasts rule outcomes and returns `(executed, failed)`.
    fn publish_outcomes(&self, outcomes: Vec<RuleOutcome>) -> (usize, usize) {
        let (mut executed, mut failed) = (0, 0);

        for outcome in outcomes {
            match outcome {
                RuleOutcome::Executed { rule_id, transaction } => {
                    executed += 1;
                    self.trade_count.fetch_add(1, Ordering::Relaxed);
                    self.broadcast(&WsEvent::RuleFired {
                        rule_id,
                        transaction_id: transaction.id,
                    });
                    self.broadcast(&WsEvent::TradeExecuted {
                        message: transaction.summary(),
                        transaction: Box::new(transaction),
                        origin: TradeOrigin::AutoTrade { rule_id },
                    });
                }
                RuleOutcome::Failed { rule_id, reason } => {
                    failed += 1;
                    self.broadcast(&WsEvent::RuleFailed { rule_id, reason });
                }
            }
        }

        (executed, failed)
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    pub async fn snapshot(&self) -> MarketSnapshot {
        let market = self.market.read().await;
        market.snapshot(self.tick_count.load(Ordering::Relaxed), self.history_limit)
    }

    pub async fn instruments(&self) -> Vec<Instrument> {
        self.market.read().await.instruments.clone()
    }

    pub async fn instrument(&self, symbol: &str) -> Result<Instrument, AppError> {
        let market = self.market.read().await;
        market
            .require_instrument(&symbol.to_ascii_uppercase())
            .cloned()
    }

    pub async fn transactions(&self, limit: usize) -> Vec<Transaction> {
        self.market.read().await.ledger.recent(limit).to_vec()
    }

    pub async fn portfolio(&self) -> (Vec<HoldingValuation>, PortfolioSummary) {
        let holdings = self.market.read().await.valuations();
        let summary = PortfolioSummary::from_valuations(&holdings);
        (holdings, summary)
    }

    pub async fn rules(&self) -> Vec<RuleView> {
        self.market.read().await.rules.iter().map(RuleView::from).collect()
    }

    // ── Simulator → Coordinator ───────────────────────────────────────────────

    /// Moves every price one step, then lets the rules react.
    pub async fn advance_market(&self, simulator: &mut PriceSimulator) -> TickReport {
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;

        let result = self
            .transition(|market| {
                market.instruments = simulator.step(&market.instruments);
                Ok(market.run_rules())
            })
            .await;

        // The tick transition itself never fails.
        let Ok((outcomes, snapshot)) = result else {
            return TickReport { tick, ..TickReport::default() };
        };

        self.broadcast(&WsEvent::PricesUpdated {
            tick,
            instruments: snapshot.instruments.clone(),
        });
        let (executed, failed) = self.publish_outcomes(outcomes);
        self.publish_snapshot(snapshot);

        debug!(tick, executed, failed, "📈 Prices updated");
        TickReport { tick, executed, failed }
    }

    // ── View → Coordinator ────────────────────────────────────────────────────

    /// Executes a manual order at the instrument's current price.
    pub async fn request_trade(&self, request: &TradeRequest) -> Result<Transaction, AppError> {
        let order = request.validate()?;

        let (transaction, snapshot) = self
            .transition(|market| {
                let price = market.require_instrument(&order.symbol)?.price;
                let intent = TradeIntent {
                    symbol: order.symbol.clone(),
                    side: order.side,
                    quantity: order.quantity,
                    price,
                };
                market.ledger.execute_trade(&intent, &market.instruments)
            })
            .await?;

        self.trade_count.fetch_add(1, Ordering::Relaxed);
        self.broadcast(&WsEvent::TradeExecuted {
            message: transaction.summary(),
            transaction: Box::new(transaction.clone()),
            origin: TradeOrigin::Manual,
        });
        self.publish_snapshot(snapshot);

        Ok(transaction)
    }

    /// Adds an armed rule. Returns the rule as it stands after the immediate
    /// auto-trade pass, so a rule whose condition already holds comes back
    /// disarmed.
    pub async fn create_rule(&self, request: &RuleRequest) -> Result<RuleView, AppError> {
        let spec = request.validate()?;

        let ((rule, outcomes), snapshot) = self
            .transition(|market| {
                market.require_instrument(&spec.symbol)?;
                let rule = AutoTradeRule::new(&spec.symbol, spec.side, spec.trigger_price, spec.quantity);
                let id = rule.id;
                market.rules.push(rule);

                let outcomes = market.run_rules();
                let index = market.rule_index(id)?;
                Ok((RuleView::from(&market.rules[index]), outcomes))
            })
            .await?;

        info!(
            rule_id   = %rule.rule.id,
            symbol    = %rule.rule.symbol,
            side      = %rule.rule.side,
            condition = %rule.condition,
            quantity  = rule.rule.quantity,
            "⚡ Auto-trade rule created"
        );

        self.broadcast(&WsEvent::RuleCreated { rule: rule.clone() });
        self.publish_outcomes(outcomes);
        self.publish_snapshot(snapshot);

        Ok(rule)
    }

    /// Flips `enabled`. Re-arming runs an auto-trade pass straight away.
    pub async fn toggle_rule(&self, id: Uuid) -> Result<RuleView, AppError> {
        let ((rule, outcomes), snapshot) = self
            .transition(|market| {
                let index = market.rule_index(id)?;
                market.rules[index].enabled = !market.rules[index].enabled;
                let armed = market.rules[index].enabled;

                let outcomes = market.run_rules();
                info!(rule_id = %id, armed, "Auto-trade rule toggled");
                Ok((RuleView::from(&market.rules[index]), outcomes))
            })
            .await?;

        self.broadcast(&WsEvent::RuleToggled { rule: rule.clone() });
        self.publish_outcomes(outcomes);
        self.publish_snapshot(snapshot);

        Ok(rule)
    }

    pub async fn remove_rule(&self, id: Uuid) -> Result<AutoTradeRule, AppError> {
        let (rule, snapshot) = self
            .transition(|market| {
                let index = market.rule_index(id)?;
                Ok(market.rules.remove(index))
            })
            .await?;

        info!(rule_id = %id, symbol = %rule.symbol, "🗑️ Auto-trade rule removed");

        self.broadcast(&WsEvent::RuleRemoved { rule_id: id });
        self.publish_snapshot(snapshot);

        Ok(rule)
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

pub fn build_state(config: &Config) -> SharedState {
    Arc::new(AppState::from_config(config))
}
