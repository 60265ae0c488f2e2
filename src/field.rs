use rand::Rng;

use crate::error::{Error, Result};
use crate::grid::Grid;

/// true = land, false = water.
pub type Field = Grid<bool>;

pub fn validate_dims(rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimension { rows, cols });
    }
    Ok(())
}

pub fn validate_probability(p: f64) -> Result<()> {
    // NaN fails both comparisons
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidProbability(p));
    }
    Ok(())
}

/// Random m×n field, each cell land with probability `p`.
///
/// Draws exactly `rows * cols` uniform values from `rng` in row-major order.
pub fn generate<R: Rng + ?Sized>(rows: usize, cols: usize, p: f64, rng: &mut R) -> Result<Field> {
    validate_dims(rows, cols)?;
    validate_probability(p)?;
    let mut field = Field::new(cols, rows);
    fill_field(&mut field, p, rng);
    Ok(field)
}

/// Refill an existing field in place. Caller has validated `p`.
pub fn fill_field<R: Rng + ?Sized>(field: &mut Field, p: f64, rng: &mut R) {
    for cell in &mut field.data {
        *cell = rng.random::<f64>() < p;
    }
}
