use crate::errors::PlonkError;
use ark_ff::FftField;
use ark_std::One;
use ruc::*;

/// Fold the public inputs into the boundary value the grand product wraps
/// to:
///
/// delta = prod_j (pi_j + beta * root^{j+1} + gamma)
///       / prod_j (pi_j - beta * root^{j+1} + gamma)
///
/// Both widget halves recompute this from the transcript's public-input
/// vector. A single inversion of the running denominator replaces the
/// per-term divisions.
pub fn compute_public_input_delta<F: FftField>(
    public_inputs: &[F],
    beta: &F,
    gamma: &F,
    root: &F,
) -> Result<F> {
    let mut numerator = F::one();
    let mut denominator = F::one();
    let mut work_root = *root;
    for public_input in public_inputs {
        let t0 = *public_input + gamma;
        let t1 = work_root * beta;
        numerator *= t0 + t1;
        denominator *= t0 - t1;
        work_root *= root;
    }
    let denominator_inv = denominator
        .inverse()
        .ok_or_else(|| eg!(PlonkError::DivisionByZero))?;
    Ok(numerator * denominator_inv)
}
