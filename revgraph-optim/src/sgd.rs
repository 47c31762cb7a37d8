use crate::Optimizer;
use log::debug;
use revgraph_core::{Graph, NodeId, RevGraphError, Tensor};

/// Implements plain gradient descent.
///
/// Updates parameters `p` according to the rule:
/// `p = p - lr * grad(p)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    lr: f32,
    steps: u64,
}

impl Sgd {
    /// Creates a new SGD optimizer instance.
    ///
    /// # Errors
    /// `InvalidArgument` if `lr` is negative or not finite.
    pub fn new(lr: f32) -> Result<Self, RevGraphError> {
        if !lr.is_finite() || lr < 0.0 {
            return Err(RevGraphError::InvalidArgument {
                operation: "sgd".to_string(),
                reason: format!("learning rate must be finite and non-negative, got {}", lr),
            });
        }
        Ok(Sgd { lr, steps: 0 })
    }

    pub fn lr(&self) -> f32 {
        self.lr
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, graph: &mut Graph, loss: NodeId, params: &[NodeId]) -> Result<(), RevGraphError> {
        let mut updated = Vec::with_capacity(params.len());
        for &param in params {
            let grad_node = graph.grad(loss, param)?;
            let grad = graph.eval(grad_node)?;
            let value = graph.eval(param)?;
            let data = value
                .data()
                .iter()
                .zip(grad.data())
                .map(|(&p, &g)| p - self.lr * g)
                .collect();
            updated.push(Tensor::new(data, value.shape().to_vec())?);
        }

        for (&param, value) in params.iter().zip(updated) {
            graph.update(param, value)?;
        }
        self.steps += 1;
        debug!("sgd step {} updated {} parameters (lr = {})", self.steps, params.len(), self.lr);
        Ok(())
    }
}
