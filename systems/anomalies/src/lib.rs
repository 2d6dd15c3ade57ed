#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Anomaly system that owns the session's pseudo-random source.
//!
//! The system decides where anomalies appear on construction and reset, and
//! on every simulated tick rolls an independent corruption trial for each
//! active anomaly. It never mutates the world directly: placements feed a
//! [`Command::Reset`] and successful trials become [`Command::CorruptCell`]
//! requests.

use pattern_loom_core::{
    AnomalyView, CellColor, CellCoord, Command, Event, DEFAULT_ANOMALY_COUNT,
    DEFAULT_CORRUPTION_CHANCE, GRID_SIDE,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Tuning knobs controlling how many anomalies spawn and how often they act.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnomalyTuning {
    count: usize,
    corruption_chance: f64,
}

impl AnomalyTuning {
    /// Largest anomaly count accepted: one per grid cell.
    pub const MAX_COUNT: usize = (GRID_SIDE * GRID_SIDE) as usize;

    /// Creates tuning with an explicit anomaly count and per-tick corruption chance.
    ///
    /// The count may not exceed [`AnomalyTuning::MAX_COUNT`] and the chance
    /// must be a finite probability in `0.0..=1.0`.
    pub fn new(count: usize, corruption_chance: f64) -> Result<Self, TuningError> {
        if count > Self::MAX_COUNT {
            return Err(TuningError::InvalidCount { count });
        }
        if !(0.0..=1.0).contains(&corruption_chance) {
            return Err(TuningError::InvalidChance {
                chance: corruption_chance,
            });
        }

        Ok(Self {
            count,
            corruption_chance,
        })
    }

    /// Number of anomalies spawned on construction and reset.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Probability that an active anomaly corrupts its cell on a single tick.
    #[must_use]
    pub const fn corruption_chance(&self) -> f64 {
        self.corruption_chance
    }
}

impl Default for AnomalyTuning {
    fn default() -> Self {
        Self {
            count: DEFAULT_ANOMALY_COUNT,
            corruption_chance: DEFAULT_CORRUPTION_CHANCE,
        }
    }
}

/// Reasons anomaly tuning may be rejected.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum TuningError {
    /// More anomalies were requested than the grid has cells.
    #[error(
        "anomaly count must not exceed {} (received {count})",
        AnomalyTuning::MAX_COUNT
    )]
    InvalidCount {
        /// Rejected value.
        count: usize,
    },
    /// The corruption chance is not a probability.
    #[error("corruption chance must lie within 0.0..=1.0 (received {chance})")]
    InvalidChance {
        /// Rejected value.
        chance: f64,
    },
}

/// Pure system that places anomalies and rolls their corruption.
#[derive(Debug)]
pub struct Anomalies<R = ChaCha8Rng> {
    tuning: AnomalyTuning,
    rng: R,
}

impl Anomalies<ChaCha8Rng> {
    /// Creates a system driven by a ChaCha generator seeded with `seed`.
    #[must_use]
    pub fn seeded(seed: u64, tuning: AnomalyTuning) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed), tuning)
    }
}

impl<R: Rng> Anomalies<R> {
    /// Creates a system driven by the provided random source.
    #[must_use]
    pub fn with_rng(rng: R, tuning: AnomalyTuning) -> Self {
        Self { tuning, rng }
    }

    /// Tuning the system was configured with.
    #[must_use]
    pub const fn tuning(&self) -> &AnomalyTuning {
        &self.tuning
    }

    /// Draws spawn cells for a fresh anomaly set.
    ///
    /// Each anomaly lands on a grid cell chosen uniformly and independently,
    /// so several anomalies may share a cell.
    #[must_use]
    pub fn placements(&mut self) -> Vec<CellCoord> {
        (0..self.tuning.count)
            .map(|_| {
                let column = self.rng.gen_range(0..GRID_SIDE);
                let row = self.rng.gen_range(0..GRID_SIDE);
                CellCoord::new(column, row)
            })
            .collect()
    }

    /// Consumes events and the anomaly view to emit corruption commands.
    ///
    /// One independent trial is rolled per active anomaly for every
    /// [`Event::TimeAdvanced`] in `events`, in anomaly identifier order.
    pub fn handle(&mut self, events: &[Event], anomalies: &AnomalyView, out: &mut Vec<Command>) {
        let ticks = events
            .iter()
            .filter(|event| matches!(event, Event::TimeAdvanced { .. }))
            .count();

        for _ in 0..ticks {
            for anomaly in anomalies.active() {
                if !self.rng.gen_bool(self.tuning.corruption_chance) {
                    continue;
                }

                let color = self.corruption_color();
                out.push(Command::CorruptCell {
                    anomaly: anomaly.id,
                    color,
                });
            }
        }
    }

    fn corruption_color(&mut self) -> CellColor {
        CellColor::PALETTE
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(CellColor::Red)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_rejects_probabilities_outside_unit_interval() {
        assert!(AnomalyTuning::new(2, 1.5).is_err());
        assert!(AnomalyTuning::new(2, -0.1).is_err());
        assert!(AnomalyTuning::new(2, f64::NAN).is_err());
        assert!(AnomalyTuning::new(2, 1.0).is_ok());
        assert!(AnomalyTuning::new(0, 0.0).is_ok());
    }

    #[test]
    fn tuning_rejects_more_anomalies_than_cells() {
        assert!(AnomalyTuning::new(AnomalyTuning::MAX_COUNT, 0.05).is_ok());
        assert_eq!(
            AnomalyTuning::new(26, 0.05),
            Err(TuningError::InvalidCount { count: 26 })
        );
        assert_eq!(
            AnomalyTuning::new(usize::MAX, 0.05),
            Err(TuningError::InvalidCount { count: usize::MAX })
        );
    }

    #[test]
    fn default_tuning_matches_gameplay_constants() {
        let tuning = AnomalyTuning::default();
        assert_eq!(tuning.count(), 2);
        assert!((tuning.corruption_chance() - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn corruption_color_is_always_painted() {
        let mut anomalies = Anomalies::seeded(3, AnomalyTuning::default());
        for _ in 0..64 {
            assert!(anomalies.corruption_color().is_painted());
        }
    }
}
