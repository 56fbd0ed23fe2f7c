//! # engine::ticker
//!
//! The periodic task that drives the [`PriceSimulator`].
//!
//! [`start`] spawns the loop and hands back a [`SimulationHandle`]; the loop
//! runs until [`SimulationHandle::stop`] is awaited. Ticks missed while the
//! runtime was busy are skipped, never replayed.

use std::sync::atomic::Ordering;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::engine::simulator::PriceSimulator;
use crate::state::SharedState;

pub struct SimulationHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SimulationHandle {
    /// Signals the loop and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Simulation task did not shut down cleanly");
        }
    }
}

pub fn start(state: SharedState, config: &SimulationConfig) -> SimulationHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);
    let mut simulator = PriceSimulator::new(config);
    let period = config.tick_interval;

    let task = tokio::spawn(async move {
        // First tick one period after start, like a browser interval.
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        state.simulation_running.store(true, Ordering::Relaxed);
        info!(?period, "⏱️ Price simulation started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = state.advance_market(&mut simulator).await;
                    if report.executed + report.failed > 0 {
                        info!(
                            tick     = report.tick,
                            executed = report.executed,
                            failed   = report.failed,
                            "Auto-trade rules fired on tick"
                        );
                    }
                }
                changed = shutdown_rx.changed() => {
                    // Err means the handle was dropped; stop either way.
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        state.simulation_running.store(false, Ordering::Relaxed);
        info!(
            ticks = state.tick_count.load(Ordering::Relaxed),
            "⏹️ Price simulation stopped"
        );
    });

    SimulationHandle { shutdown, task }
}
