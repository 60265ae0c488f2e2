use crate::error::Result;
use crate::field::validate_probability;

/// Golden ratio φ.
pub const PHI: f64 = 1.618_033_988_749_895;

/// 1/φ = φ − 1, the balance point between island and pool density.
pub const INV_PHI: f64 = 0.618_033_988_749_895;

/// Infinite-grid limit of (E[#islands] − E[#pools]) / (m·n).
#[inline]
pub fn theory(p: f64) -> f64 {
    p * (1.0 - p) * ((1.0 - p) - p * p)
}

pub fn try_theory(p: f64) -> Result<f64> {
    validate_probability(p)?;
    Ok(theory(p))
}
