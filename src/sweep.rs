use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_SEED, Params, validate_runs, validate_sequence};
use crate::error::{Error, Result};
use crate::field::{Field, fill_field, validate_dims};
use crate::label::Labeler;
use crate::rng::{stream, trial_seed};
use crate::theory::theory;

/// Shared flag checked between trials.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Averages for one probability value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub p: f64,
    pub island_density: f64,
    pub pool_density: f64,
}

impl SweepRow {
    #[inline]
    pub fn difference(&self) -> f64 {
        self.island_density - self.pool_density
    }

    #[inline]
    pub fn theory(&self) -> f64 {
        theory(self.p)
    }

    /// |simulated difference − theory|
    #[inline]
    pub fn deviation(&self) -> f64 {
        (self.difference() - self.theory()).abs()
    }
}

/// Full sweep output plus the parameters that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepTable {
    pub rows: usize,
    pub cols: usize,
    pub runs: usize,
    pub seed: u64,
    pub results: Vec<SweepRow>,
}

impl SweepTable {
    pub fn to_csv(&self) -> String {
        let mut out = String::from("p,island_density,pool_density,difference,theory\n");
        for r in &self.results {
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                r.p,
                r.island_density,
                r.pool_density,
                r.difference(),
                r.theory()
            ));
        }
        out
    }

    /// Largest deviation from theory over rows with p in [lo, hi].
    pub fn max_deviation(&self, lo: f64, hi: f64) -> Option<f64> {
        self.results
            .iter()
            .filter(|r| r.p >= lo && r.p <= hi)
            .map(SweepRow::deviation)
            .reduce(f64::max)
    }
}

/// Per-worker scratch: one field and one labeler, reused for every trial.
struct TrialBuffers {
    field: Field,
    labeler: Labeler,
}

impl TrialBuffers {
    fn new(w: usize, h: usize) -> Self {
        Self {
            field: Field::new(w, h),
            labeler: Labeler::new(w, h),
        }
    }

    /// (islands, pools) of one fresh field.
    fn run(&mut self, p: f64, seed: u64) -> (u64, u64) {
        let mut rng = stream(seed);
        fill_field(&mut self.field, p, &mut rng);
        let islands = self.labeler.label(&self.field, true) as u64;
        let pools = self.labeler.label(&self.field, false) as u64;
        (islands, pools)
    }
}

/// Monte Carlo estimator of island and pool density over a probability sweep.
///
/// Every (probability, trial) pair owns a stream seeded from
/// [`trial_seed`], and counts are summed as integers, so the table does not
/// depend on how rayon splits the work or on the thread count.
#[derive(Clone, Debug)]
pub struct Sweep {
    rows: usize,
    cols: usize,
    runs: usize,
    seed: u64,
    probabilities: Vec<f64>,
    threads: Option<usize>,
    cancel: CancelToken,
}

impl Sweep {
    pub fn new(rows: usize, cols: usize, runs: usize) -> Self {
        let defaults = Params::default();
        Self {
            rows,
            cols,
            runs,
            seed: defaults.seed,
            probabilities: defaults.probabilities,
            threads: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn from_params(params: &Params) -> Self {
        Self::new(params.rows, params.cols, params.runs)
            .seed(params.seed)
            .probabilities(params.probabilities.clone())
    }

    pub fn probabilities(mut self, probabilities: Vec<f64>) -> Self {
        self.probabilities = probabilities;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run on a dedicated pool of `n` workers instead of the global one.
    pub fn threads(mut self, n: usize) -> Self {
        self.threads = Some(n);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn run(&self) -> Result<SweepTable> {
        validate_dims(self.rows, self.cols)?;
        validate_runs(self.runs)?;
        validate_sequence(&self.probabilities)?;

        match self.threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| Error::WorkerPool(e.to_string()))?;
                pool.install(|| self.run_trials())
            }
            None => self.run_trials(),
        }
    }

    fn run_trials(&self) -> Result<SweepTable> {
        let (w, h, runs) = (self.cols, self.rows, self.runs);
        let np = self.probabilities.len();
        info!(
            rows = h,
            cols = w,
            runs,
            probabilities = np,
            seed = self.seed,
            "starting sweep"
        );

        // Flatten (probability, trial) so workers keep their buffers across
        // probability values. Each fold carries a per-probability partial sum.
        let totals = (0..np * runs)
            .into_par_iter()
            .try_fold(
                || (TrialBuffers::new(w, h), vec![(0u64, 0u64); np]),
                |(mut buf, mut acc), k| {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    let (p_index, trial) = (k / runs, k % runs);
                    let p = self.probabilities[p_index];
                    let (islands, pools) = buf.run(p, trial_seed(self.seed, p_index, trial));
                    acc[p_index].0 += islands;
                    acc[p_index].1 += pools;
                    Some((buf, acc))
                },
            )
            .map(|partial| partial.map(|(_, acc)| acc))
            .try_reduce(
                || vec![(0u64, 0u64); np],
                |mut a, b| {
                    for (sum, part) in a.iter_mut().zip(b) {
                        sum.0 += part.0;
                        sum.1 += part.1;
                    }
                    Some(a)
                },
            );

        let Some(totals) = totals else {
            warn!("sweep cancelled before completion");
            return Err(Error::Cancelled);
        };

        let denom = runs as f64 * (w * h) as f64;
        let results: Vec<SweepRow> = self
            .probabilities
            .iter()
            .zip(totals)
            .map(|(&p, (islands, pools))| {
                let row = SweepRow {
                    p,
                    island_density: islands as f64 / denom,
                    pool_density: pools as f64 / denom,
                };
                debug!(
                    p,
                    island_density = row.island_density,
                    pool_density = row.pool_density,
                    "probability done"
                );
                row
            })
            .collect();

        info!(rows = results.len(), "sweep finished");
        Ok(SweepTable {
            rows: h,
            cols: w,
            runs,
            seed: self.seed,
            results,
        })
    }
}

/// Sweep with the default seed. Output is one row per probability, in order.
pub fn run_sweep(
    rows: usize,
    cols: usize,
    runs: usize,
    probabilities: &[f64],
) -> Result<Vec<SweepRow>> {
    Sweep::new(rows, cols, runs)
        .seed(DEFAULT_SEED)
        .probabilities(probabilities.to_vec())
        .run()
        .map(|t| t.results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extremes() {
        let rows = run_sweep(8, 6, 3, &[0.0, 1.0]).unwrap();
        // all water: one pool, no islands
        assert_eq!(rows[0].island_density, 0.0);
        assert_eq!(rows[0].pool_density, 1.0 / 48.0);
        // all land: one island, no pools
        assert_eq!(rows[1].island_density, 1.0 / 48.0);
        assert_eq!(rows[1].pool_density, 0.0);
    }

    #[test]
    fn rejects_bad_input_before_work() {
        assert_eq!(
            run_sweep(0, 5, 1, &[0.5]),
            Err(Error::InvalidDimension { rows: 0, cols: 5 })
        );
        assert_eq!(run_sweep(5, 5, 0, &[0.5]), Err(Error::InvalidRunCount(0)));
        assert_eq!(
            run_sweep(5, 5, 1, &[0.5, -0.1]),
            Err(Error::InvalidProbabilitySequence { index: 1, value: -0.1 })
        );
    }

    #[test]
    fn empty_sequence_gives_empty_table() {
        assert!(run_sweep(4, 4, 2, &[]).unwrap().is_empty());
    }

    #[test]
    fn keeps_probability_order() {
        let ps = vec![0.9, 0.1, 0.5];
        let rows = run_sweep(10, 10, 4, &ps).unwrap();
        let got: Vec<f64> = rows.iter().map(|r| r.p).collect();
        assert_eq!(got, ps);
    }

    #[test]
    fn same_seed_same_table_any_thread_count() {
        let base = Sweep::new(16, 12, 10)
            .probabilities(vec![0.3, 0.6])
            .seed(11);
        let one = base.clone().threads(1).run().unwrap();
        let four = base.clone().threads(4).run().unwrap();
        let global = base.run().unwrap();
        assert_eq!(one, four);
        assert_eq!(one, global);
    }

    #[test]
    fn different_seeds_differ() {
        let a = Sweep::new(20, 20, 5).probabilities(vec![0.5]).seed(1).run().unwrap();
        let b = Sweep::new(20, 20, 5).probabilities(vec![0.5]).seed(2).run().unwrap();
        assert_ne!(a.results, b.results);
    }

    #[test]
    fn cancelled_sweep_returns_no_table() {
        let token = CancelToken::new();
        token.cancel();
        let r = Sweep::new(10, 10, 10).cancel_token(token).run();
        assert_eq!(r, Err(Error::Cancelled));
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let table = Sweep::new(6, 6, 2).probabilities(vec![0.2, 0.4]).run().unwrap();
        let csv = table.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "p,island_density,pool_density,difference,theory");
        assert!(lines[1].starts_with("0.2,"));
    }

    #[test]
    fn max_deviation_filters_range() {
        let table = SweepTable {
            rows: 1,
            cols: 1,
            runs: 1,
            seed: 0,
            results: vec![
                SweepRow { p: 0.0, island_density: 0.5, pool_density: 0.0 },
                SweepRow { p: 1.0, island_density: 0.0, pool_density: 0.0 },
            ],
        };
        assert_eq!(table.max_deviation(0.9, 1.0), Some(0.0));
        assert_eq!(table.max_deviation(0.0, 1.0), Some(0.5));
        assert_eq!(table.max_deviation(0.3, 0.4), None);
    }
}
