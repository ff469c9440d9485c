//! L2 normalization of embedding vectors.

use crate::error::{RagError, Result};

/// Euclidean length of `vector`, accumulated in `f64`.
pub fn l2_norm(vector: &[f32]) -> f64 {
    vector.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt()
}

/// Scale `vector` to unit length.
///
/// # Errors
///
/// Returns [`RagError::DegenerateVector`] when the vector is empty, all zeros,
/// or contains non-finite components. Dividing by such a norm would produce
/// NaNs that poison every later distance comparison.
pub fn normalize(vector: &[f32]) -> Result<Vec<f32>> {
    let norm = l2_norm(vector);
    if vector.is_empty() || norm == 0.0 || !norm.is_finite() {
        return Err(RagError::DegenerateVector { dimensions: vector.len() });
    }
    Ok(vector.iter().map(|x| (f64::from(*x) / norm) as f32).collect())
}
