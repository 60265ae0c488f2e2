use tracing::trace;

use crate::error::Result;
use crate::field::{Field, generate};
use crate::label::{Labeling, label};
use crate::rng::{SALT_SNAPSHOT, splitmix64, stream};

/// One field and both of its labelings, kept for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub p: f64,
    pub seed: u64,
    pub field: Field,
    pub islands: Labeling,
    pub pools: Labeling,
}

impl Snapshot {
    pub fn capture(rows: usize, cols: usize, p: f64, seed: u64) -> Result<Self> {
        let mut rng = stream(splitmix64(seed ^ SALT_SNAPSHOT));
        let field = generate(rows, cols, p, &mut rng)?;
        let islands = label(&field, true);
        let pools = label(&field, false);
        trace!(p, seed, islands = islands.count, pools = pools.count, "snapshot");
        Ok(Self {
            p,
            seed,
            field,
            islands,
            pools,
        })
    }

    /// (#islands − #pools) / cells for this one field.
    pub fn difference(&self) -> f64 {
        (self.islands.count as f64 - self.pools.count as f64) / self.field.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::grid::Adjacency;

    #[test]
    fn reproducible_for_fixed_seed() {
        let a = Snapshot::capture(30, 40, 0.6, 7).unwrap();
        let b = Snapshot::capture(30, 40, 0.6, 7).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.field, Snapshot::capture(30, 40, 0.6, 8).unwrap().field);
    }

    #[test]
    fn labelings_partition_the_field() {
        let s = Snapshot::capture(25, 25, 0.5, 3).unwrap();
        assert_eq!(s.islands.adjacency(), Adjacency::Orthogonal);
        assert_eq!(s.pools.adjacency(), Adjacency::OrthogonalDiagonal);
        for i in 0..s.field.len() {
            let land = s.field.data[i];
            assert_eq!(s.islands.labels.data[i] != 0, land);
            assert_eq!(s.pools.labels.data[i] != 0, !land);
        }
    }

    #[test]
    fn invalid_probability_is_reported() {
        assert_eq!(
            Snapshot::capture(5, 5, 2.0, 1),
            Err(Error::InvalidProbability(2.0))
        );
    }
}
