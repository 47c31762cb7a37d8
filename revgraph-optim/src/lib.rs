//! Optimizers for parameters held as mutable leaves of a revgraph [`Graph`].
//!
//! An optimizer reads each parameter's gradient through [`Graph::grad`] and
//! writes the new value back with [`Graph::update`], which invalidates every
//! cached value downstream of the parameter.

use revgraph_core::{Graph, NodeId, RevGraphError};

pub mod sgd;

pub use sgd::Sgd;

/// Trait for optimization algorithms.
pub trait Optimizer {
    /// Performs a single optimization step on `params` for the scalar `loss`.
    ///
    /// Every gradient is evaluated before any parameter is written, so all
    /// parameters move according to the same pre-step state.
    fn step(&mut self, graph: &mut Graph, loss: NodeId, params: &[NodeId]) -> Result<(), RevGraphError>;
}
