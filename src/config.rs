use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::field::{validate_dims, validate_probability};

pub const DEFAULT_SEED: u64 = 42;

/// Run parameters. Missing fields in a JSON config fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // Grid
    pub rows: usize,
    pub cols: usize,

    // Monte Carlo
    pub runs: usize,
    pub seed: u64,
    pub probabilities: Vec<f64>,

    // Snapshot
    pub snapshot_p: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            rows: 100,
            cols: 100,
            runs: 100,
            seed: DEFAULT_SEED,
            probabilities: default_probabilities(),
            snapshot_p: 0.6,
        }
    }
}

impl Params {
    /// Check everything up front so a bad value fails before any work starts.
    pub fn validate(&self) -> Result<()> {
        validate_dims(self.rows, self.cols)?;
        validate_runs(self.runs)?;
        validate_sequence(&self.probabilities)?;
        validate_probability(self.snapshot_p)
    }
}

pub fn validate_runs(runs: usize) -> Result<()> {
    if runs == 0 {
        return Err(Error::InvalidRunCount(runs));
    }
    Ok(())
}

pub fn validate_sequence(probabilities: &[f64]) -> Result<()> {
    match probabilities
        .iter()
        .enumerate()
        .find(|(_, p)| !(0.0..=1.0).contains(*p))
    {
        Some((index, &value)) => Err(Error::InvalidProbabilitySequence { index, value }),
        None => Ok(()),
    }
}

/// `count` evenly spaced values from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { hi } else { lo + step * i as f64 })
                .collect()
        }
    }
}

/// 50 values over [0.01, 0.99].
pub fn default_probabilities() -> Vec<f64> {
    linspace(0.01, 0.99, 50)
}
