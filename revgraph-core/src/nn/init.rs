use crate::error::RevGraphError;
use crate::tensor::Tensor;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Fills the input `Tensor` with samples from `N(mean, std²)` drawn from `rng`.
///
/// # Errors
/// `InvalidArgument` if `std` is negative or not finite.
pub fn normal_<R: Rng + ?Sized>(tensor: &mut Tensor, mean: f32, std: f32, rng: &mut R) -> Result<(), RevGraphError> {
    let dist = Normal::new(mean, std)
        .map_err(|e| RevGraphError::invalid_argument("normal_", e.to_string()))?;
    if !std.is_finite() {
        return Err(RevGraphError::invalid_argument("normal_", "standard deviation must be finite"));
    }
    for v in tensor.data_mut() {
        *v = dist.sample(rng);
    }
    Ok(())
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
