//! # engine::simulator
//!
//! **Price Simulator** — produces the next instrument snapshot on every tick.
//!
//! ```text
//! delta        ~ U(-max_delta, max_delta)
//! new_price    = max(price + delta, price_floor)
//! new_change   = new_price - (price - change)      // vs. session-open reference
//! change_pct   = new_change / reference × 100      // 0 when reference == 0
//! ```
//!
//! Instruments are independent of each other. The simulator never mutates the
//! slice it is given; the caller swaps the returned snapshot in whole.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;
use crate::models::Instrument;

pub struct PriceSimulator {
    rng: StdRng,
    max_delta: f64,
    price_floor: f64,
}

impl PriceSimulator {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng,
            max_delta: config.max_delta,
            price_floor: config.price_floor,
        }
    }

    /// Draws one delta per instrument and returns the moved snapshot.
    pub fn step(&mut self, instruments: &[Instrument]) -> Vec<Instrument> {
        instruments
            .iter()
            .map(|instrument| {
                let delta = self.draw_delta();
                apply_delta(instrument, delta, self.price_floor)
            })
            .collect()
    }

    /// Uniform draw from the open interval `(-max_delta, max_delta)`.
    fn draw_delta(&mut self) -> f64 {
        loop {
            let delta = self.rng.gen_range(-self.max_delta..self.max_delta);
            if delta != -self.max_delta {
                return delta;
            }
        }
    }
}

/// Moves one instrument by `delta`, keeping `change` anchored to the
/// session-open reference price.
pub fn apply_delta(instrument: &Instrument, delta: f64, price_floor: f64) -> Instrument {
    let reference = instrument.reference_price();
    let price = (instrument.price + delta).max(price_floor);
    let change = price - reference;

    // price - change == reference; a zero reference has no meaningful percentage.
    let change_percent = if reference != 0.0 {
        change / reference * 100.0
    } else {
        0.0
    };

    Instrument {
        price,
        change,
        change_percent,
        ..instrument.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instrument::seed_instruments;
    use approx::assert_relative_eq;

    fn seeded(seed: u64) -> PriceSimulator {
        PriceSimulator::new(&SimulationConfig {
            seed: Some(seed),
            ..SimulationConfig::default()
        })
    }

    #[test]
    fn test_change_tracks_session_open() {
        // AAPL opened at 178.45 - 2.34 = 176.11
        let aapl = seed_instruments().remove(0);
        let moved = apply_delta(&aapl, 0.5, 1.0);

        assert_relative_eq!(moved.price, 178.95, epsilon = 1e-9);
        assert_relative_eq!(moved.change, 2.84, epsilon = 1e-9);
        assert_relative_eq!(moved.change_percent, 2.84 / 176.11 * 100.0, epsilon = 1e-9);
        assert_relative_eq!(moved.reference_price(), aapl.reference_price(), epsilon = 1e-9);
    }

    #[test]
    fn test_price_floor() {
        let penny = Instrument::new("PNY", "Penny Co.", 1.2, 0.2, 20.0, 0, "1M");
        let moved = apply_delta(&penny, -0.9, 1.0);

        assert_eq!(moved.price, 1.0);
        assert_relative_eq!(moved.change, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_reference_has_zero_percent() {
        // price == change means the reference price is 0
        let odd = Instrument::new("ODD", "Odd Inc.", 5.0, 5.0, 0.0, 0, "0");
        let moved = apply_delta(&odd, 0.25, 1.0);

        assert_eq!(moved.change_percent, 0.0);
        assert!(moved.change_percent.is_finite());
    }

    #[test]
    fn test_step_is_bounded_and_keeps_identity() {
        let market = seed_instruments();
        let mut sim = seeded(7);

        let next = sim.step(&market);
        assert_eq!(next.len(), market.len());

        for (before, after) in market.iter().zip(&next) {
            assert_eq!(before.symbol, after.symbol);
            assert_eq!(before.volume, after.volume);
            assert!((after.price - before.price).abs() < 1.0);
            assert!(after.price >= 1.0);
        }
    }

    #[test]
    fn test_delta_stays_inside_open_interval() {
        let mut sim = PriceSimulator::new(&SimulationConfig {
            seed: Some(11),
            max_delta: 0.5,
            ..SimulationConfig::default()
        });

        for _ in 0..10_000 {
            let delta = sim.draw_delta();
            assert!(delta > -0.5 && delta < 0.5, "delta {delta} escaped (-0.5, 0.5)");
        }
    }

    #[test]
    fn test_same_seed_same_path() {
        let market = seed_instruments();
        let a = seeded(99).step(&market);
        let b = seeded(99).step(&market);
        assert_eq!(a, b);
    }
}
