use crate::autograd::graph::{Graph, NodeId};
use crate::error::RevGraphError;
use crate::tensor::Tensor;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for input tensor at index {input_index}, element index {element_index}: Analytical grad {analytical_grad:?} != Numerical grad {numerical_grad:?}. Difference: {difference:?}")]
    GradientMismatch {
        input_index: usize,
        element_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
        difference: f64,
    },
    #[error("Forward graph construction failed during gradient check: {0}")]
    ForwardPassError(RevGraphError),
    #[error("Gradient construction or evaluation failed during gradient check: {0}")]
    BackwardPassError(RevGraphError),
    #[error("Output gradient shape {actual:?} does not match output shape {expected:?}")]
    OutputGradShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },
    #[error("Numerical gradient is NaN or infinite for input {input_index}, element {element_index}. Details: Loss+: {loss_plus:?}, Loss-: {loss_minus:?}")]
    NumericalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },
    #[error("Analytical gradient is NaN or infinite for input {input_index}, element {element_index}. Value: {value:?}")]
    AnalyticalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        value: f64,
    },
    #[error("Tensor error during intermediate calculation: {0}")]
    TensorError(RevGraphError),
}

impl From<RevGraphError> for GradCheckError {
    fn from(err: RevGraphError) -> Self {
        GradCheckError::TensorError(err)
    }
}

/// Finite-difference settings. An element passes when
/// `|analytical - numerical| <= abs_tolerance + rel_tolerance * max(|analytical|, |numerical|)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradCheckConfig {
    pub epsilon: f64,
    pub abs_tolerance: f64,
    pub rel_tolerance: f64,
}

impl Default for GradCheckConfig {
    /// Sized for `f32` evaluation: smaller steps drown in rounding error.
    fn default() -> Self {
        GradCheckConfig {
            epsilon: 1e-2,
            abs_tolerance: 1e-2,
            rel_tolerance: 1e-2,
        }
    }
}

/// Checks analytical gradients against numerical gradients using central differences.
///
/// `func` receives a fresh graph and one mutable leaf per input and returns the
/// output node. The output is reduced to the scalar `Σ output ⊙ output_grad`;
/// analytical gradients come from [`Graph::grad`] on that scalar, numerical ones
/// from perturbing each input element through [`Graph::update`].
pub fn check_grad<F>(
    func: F,
    inputs: &[Tensor],
    output_grad: &Tensor,
    config: &GradCheckConfig,
) -> Result<(), GradCheckError>
where
    F: Fn(&mut Graph, &[NodeId]) -> Result<NodeId, RevGraphError>,
{
    let mut graph = Graph::new();
    let leaves: Vec<NodeId> = inputs.iter().map(|t| graph.val(t.clone())).collect();
    let output = func(&mut graph, &leaves).map_err(GradCheckError::ForwardPassError)?;

    let output_shape = graph.shape(output)?.to_vec();
    if output_shape != output_grad.shape() {
        return Err(GradCheckError::OutputGradShapeMismatch {
            expected: output_shape,
            actual: output_grad.shape().to_vec(),
        });
    }

    // --- Analytical gradients ---
    let flat = graph.reshape(output, &[-1])?;
    let weights = graph.constant(output_grad.clone().reshaped(vec![output_grad.numel()])?);
    let loss = graph.dot_vv(flat, weights)?;
    let mut analytical = Vec::with_capacity(leaves.len());
    for &leaf in &leaves {
        let g = graph.grad(loss, leaf).map_err(GradCheckError::BackwardPassError)?;
        analytical.push(graph.eval(g).map_err(GradCheckError::BackwardPassError)?);
    }

    // --- Numerical gradients ---
    for (input_index, input) in inputs.iter().enumerate() {
        let leaf = leaves[input_index];
        for element_index in 0..input.numel() {
            let original = input.data()[element_index];
            let up = original + config.epsilon as f32;
            let down = original - config.epsilon as f32;

            let loss_plus = perturbed_loss(&mut graph, leaf, input, element_index, up, output, output_grad)?;
            let loss_minus = perturbed_loss(&mut graph, leaf, input, element_index, down, output, output_grad)?;
            // Divide by the step actually representable in f32.
            let numerical_grad = (loss_plus - loss_minus) / (up as f64 - down as f64);

            if !numerical_grad.is_finite() {
                return Err(GradCheckError::NumericalGradNaNOrInfinite {
                    input_index,
                    element_index,
                    loss_plus,
                    loss_minus,
                });
            }
            let analytical_grad = analytical[input_index].data()[element_index] as f64;
            if !analytical_grad.is_finite() {
                return Err(GradCheckError::AnalyticalGradNaNOrInfinite {
                    input_index,
                    element_index,
                    value: analytical_grad,
                });
            }

            let difference = (analytical_grad - numerical_grad).abs();
            let scale = analytical_grad.abs().max(numerical_grad.abs());
            if difference > config.abs_tolerance + config.rel_tolerance * scale {
                return Err(GradCheckError::GradientMismatch {
                    input_index,
                    element_index,
                    analytical_grad,
                    numerical_grad,
                    difference,
                });
            }
        }
        graph.update(leaf, input.clone())?;
    }
    Ok(())
}

fn perturbed_loss(
    graph: &mut Graph,
    leaf: NodeId,
    input: &Tensor,
    element_index: usize,
    value: f32,
    output: NodeId,
    output_grad: &Tensor,
) -> Result<f64, GradCheckError> {
    let mut perturbed = input.clone();
    perturbed.data_mut()[element_index] = value;
    graph.update(leaf, perturbed)?;
    let out = graph.eval(output).map_err(GradCheckError::BackwardPassError)?;
    Ok(out
        .data()
        .iter()
        .zip(output_grad.data())
        .map(|(&o, &w)| o as f64 * w as f64)
        .sum())
}

#[cfg(test)]
#[path = "grad_check_test.rs"]
mod tests;
