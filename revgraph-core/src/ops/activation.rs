//! Activation functions.
//!
//! Piecewise activations differentiate through an explicit derivative operator
//! (`relu_prime`, `leaky_relu_prime`, `elu_prime`) so their gradient stays a graph
//! expression. Smooth ones express the derivative from existing nodes.

use super::{misrouted, LocalGrad, Op};
use crate::autograd::graph::{Graph, IntoNode, NodeId};
use crate::error::RevGraphError;
use crate::kernels::{reduce, scalar};
use crate::shape;
use crate::tensor::Tensor;

impl Graph {
    pub fn sigmoid(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::Sigmoid, x)
    }

    pub fn tanh(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::Tanh, x)
    }

    /// `ln(1 + e^(beta·x)) / beta`
    pub fn softplus(&mut self, x: impl IntoNode, beta: f32) -> Result<NodeId, RevGraphError> {
        if beta <= 0.0 || !beta.is_finite() {
            return Err(RevGraphError::invalid_argument("softplus", format!("beta must be positive, got {}", beta)));
        }
        self.unary_same_shape(Op::Softplus { beta }, x)
    }

    pub fn relu(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::Relu, x)
    }

    /// `1[x > 0]`
    pub fn relu_prime(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::ReluPrime, x)
    }

    pub fn leaky_relu(&mut self, x: impl IntoNode, alpha: f32) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::LeakyRelu { alpha }, x)
    }

    pub fn leaky_relu_prime(&mut self, x: impl IntoNode, alpha: f32) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::LeakyReluPrime { alpha }, x)
    }

    pub fn elu(&mut self, x: impl IntoNode, alpha: f32) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::Elu { alpha }, x)
    }

    pub fn elu_prime(&mut self, x: impl IntoNode, alpha: f32) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::EluPrime { alpha }, x)
    }

    /// Row-wise softmax of a matrix. Has no gradient of its own; see
    /// [`Graph::cross_entropy_loss`] for the fused form.
    pub fn softmax(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        shape::matrix("softmax", self.shape(x)?)?;
        self.unary_same_shape(Op::Softmax, x)
    }
}

pub(super) fn forward(op: &Op, inputs: &[&Tensor]) -> Result<Tensor, RevGraphError> {
    let x = inputs[0];
    let out = match *op {
        Op::Sigmoid => x.map(scalar::sigmoid),
        Op::Tanh => x.map(f32::tanh),
        Op::Softplus { beta } => x.map(|v| scalar::softplus(v, beta)),
        Op::Relu => x.map(scalar::relu),
        Op::ReluPrime => x.map(scalar::relu_prime),
        Op::LeakyRelu { alpha } => x.map(|v| scalar::leaky_relu(v, alpha)),
        Op::LeakyReluPrime { alpha } => x.map(|v| scalar::leaky_relu_prime(v, alpha)),
        Op::Elu { alpha } => x.map(|v| scalar::elu(v, alpha)),
        Op::EluPrime { alpha } => x.map(|v| scalar::elu_prime(v, alpha)),
        Op::Softmax => reduce::softmax_rows(x),
        _ => return Err(misrouted(op)),
    };
    Ok(out)
}

pub(super) fn local_grad(graph: &mut Graph, op: &Op, ctx: &LocalGrad) -> Result<NodeId, RevGraphError> {
    let (x, y, dout) = (ctx.operand(0), ctx.node, ctx.dout);
    let derivative = match *op {
        Op::Sigmoid => {
            // y * (1 - y)
            let neg = graph.neg(y)?;
            let one_minus = graph.add_scalar(neg, 1.0)?;
            graph.mul(y, one_minus)?
        }
        Op::Tanh => {
            // 1 - y²
            let sq = graph.mul(y, y)?;
            let neg = graph.neg(sq)?;
            graph.add_scalar(neg, 1.0)?
        }
        Op::Softplus { beta } => {
            let scaled = graph.mul_scalar(x, beta)?;
            graph.sigmoid(scaled)?
        }
        Op::Relu => graph.relu_prime(x)?,
        Op::LeakyRelu { alpha } => graph.leaky_relu_prime(x, alpha)?,
        Op::Elu { alpha } => graph.elu_prime(x, alpha)?,
        Op::ReluPrime | Op::LeakyReluPrime { .. } | Op::EluPrime { .. } | Op::Softmax => {
            return Err(RevGraphError::unsupported_gradient(op.name()))
        }
        _ => return Err(misrouted(op)),
    };
    graph.mul(dout, derivative)
}

#[cfg(test)]
#[path = "activation_test.rs"]
mod tests;
