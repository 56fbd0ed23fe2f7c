//! # config
//!
//! Runtime settings read from environment variables.
//!
//! `main` calls [`Config::from_env`] once after `dotenvy` has loaded `.env`.
//! Unset variables fall back to defaults; set-but-malformed values are an
//! error so a typo never silently becomes a default.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context};

#[derive(Debug, Clone)]
pub struct Config {
    /// Address axum listens on.
    pub bind_addr: SocketAddr,
    pub simulation: SimulationConfig,
    /// How many transactions a snapshot carries.
    pub history_display_limit: usize,
    /// Book sells that exceed the held quantity instead of rejecting them.
    /// The excess is dropped along with the holding.
    pub legacy_uncovered_sells: bool,
}

/// Settings for the price feed.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Tick period.
    pub tick_interval: Duration,
    /// Each tick moves a price by a uniform draw from `(-max_delta, max_delta)`.
    pub max_delta: f64,
    /// Prices never drop below this.
    pub price_floor: f64,
    /// Fixed RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(3000),
            max_delta: 1.0,
            price_floor: 1.0,
            seed: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            simulation: SimulationConfig::default(),
            history_display_limit: 10,
            legacy_uncovered_sells: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let bind_addr = parse_or(&lookup, "BIND_ADDR", defaults.bind_addr)?;

        let interval_ms: u64 = parse_or(
            &lookup,
            "TICK_INTERVAL_MS",
            defaults.simulation.tick_interval.as_millis() as u64,
        )?;
        if interval_ms == 0 {
            bail!("TICK_INTERVAL_MS must be greater than zero");
        }

        let max_delta: f64 = parse_or(&lookup, "MAX_TICK_DELTA", defaults.simulation.max_delta)?;
        if !(max_delta.is_finite() && max_delta > 0.0) {
            bail!("MAX_TICK_DELTA must be a positive number, got {max_delta}");
        }

        let price_floor: f64 = parse_or(&lookup, "PRICE_FLOOR", defaults.simulation.price_floor)?;
        if !(price_floor.is_finite() && price_floor > 0.0) {
            bail!("PRICE_FLOOR must be a positive number, got {price_floor}");
        }

        let seed = match lookup("SIM_SEED") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("SIM_SEED must be an unsigned integer, got '{raw}'"))?,
            ),
            None => None,
        };

        let legacy_uncovered_sells = lookup("LEGACY_UNCOVERED_SELLS")
            .map(|v| parse_flag(&v))
            .transpose()?
            .unwrap_or(defaults.legacy_uncovered_sells);

        Ok(Self {
            bind_addr,
            simulation: SimulationConfig {
                tick_interval: Duration::from_millis(interval_ms),
                max_delta,
                price_floor,
                seed,
            },
            history_display_limit: parse_or(
                &lookup,
                "HISTORY_DISPLAY_LIMIT",
                defaults.history_display_limit,
            )?,
            legacy_uncovered_sells,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}: cannot parse '{raw}': {e}")),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("Expected a boolean flag, got '{other}'"),
    }
}
