pub mod config;
pub mod error;
pub mod field;
pub mod grid;
pub mod label;
pub mod render;
pub mod rng;
pub mod snapshot;
pub mod sweep;
pub mod theory;

use std::time::Instant;

use config::Params;
use snapshot::Snapshot;
use sweep::{CancelToken, Sweep, SweepTable};

pub use error::{Error, Result};
pub use field::{Field, generate};
pub use grid::{Adjacency, Grid};
pub use label::{Labeler, Labeling, label};
pub use sweep::{SweepRow, run_sweep};
pub use theory::{INV_PHI, theory};

/// Everything one full run produces.
pub struct Report {
    pub snapshot: Snapshot,
    pub sweep: SweepTable,
}

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// Validate `params`, capture the snapshot, then run the sweep.
pub fn simulate(params: &Params, cancel: CancelToken) -> Result<(Report, Vec<Timing>)> {
    params.validate()?;
    let mut timings = Vec::new();
    let total_start = Instant::now();

    // 1. Single field for the snapshot images
    let t = Instant::now();
    let snapshot = Snapshot::capture(params.rows, params.cols, params.snapshot_p, params.seed)?;
    timings.push(Timing {
        name: "snapshot",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Monte Carlo sweep
    let t = Instant::now();
    let sweep = Sweep::from_params(params).cancel_token(cancel).run()?;
    timings.push(Timing {
        name: "sweep",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    timings.push(Timing {
        name: "TOTAL",
        ms: total_start.elapsed().as_secs_f64() * 1000.0,
    });

    Ok((Report { snapshot, sweep }, timings))
}
