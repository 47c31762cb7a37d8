//! Operator catalog.
//!
//! Every operator kind is a variant of [`Op`]. Each family module provides the
//! builders (as `Graph` methods), the forward rule and the local gradient rule
//! for its variants; this module dispatches to them.

pub mod activation;
pub mod arithmetic;
pub mod broadcast;
pub mod conv;
pub mod elementwise;
pub mod linalg;
pub mod loss;
pub mod pool;
pub mod view;

use crate::autograd::graph::{Graph, NodeId};
use crate::config::ConvAlgorithm;
use crate::error::RevGraphError;
use crate::shape::{Conv2dParams, Pool2dParams};
use crate::tensor::Tensor;

/// Operator kind of a graph node, together with its fixed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Leaf holding caller-supplied data. Only mutable leaves accept updates.
    Val { mutable: bool },

    Add,
    Sub,
    Mul,
    Div,
    Neg,

    VsAdd,
    VsMul,
    VsDiv,

    Exp,
    Log,
    Sign,

    Sigmoid,
    Tanh,
    Softplus { beta: f32 },
    Relu,
    ReluPrime,
    LeakyRelu { alpha: f32 },
    LeakyReluPrime { alpha: f32 },
    Elu { alpha: f32 },
    EluPrime { alpha: f32 },
    Softmax,

    DotVV,
    DotMV,
    DotMtV,
    DotMM,
    DotMtM,
    DotMMt,
    Outer,
    Norm1,

    Reshape,
    Sum3,
    ExpandDims { axis: usize, size: usize },
    AddBias,

    Conv2d { params: Conv2dParams, algorithm: ConvAlgorithm },
    Conv2dDx { params: Conv2dParams, algorithm: ConvAlgorithm },
    Conv2dDk { params: Conv2dParams, algorithm: ConvAlgorithm },
    Conv2dBiasAdd,
    Conv2dBiasAddGrad,

    MaxPool { params: Pool2dParams },
    MaxPoolGrad { params: Pool2dParams },

    MaeLoss,
    MseLoss,
    BceLoss,
    CrossEntropyLoss,
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Val { .. } => "val",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Mul => "mul",
            Op::Div => "div",
            Op::Neg => "neg",
            Op::VsAdd => "vsadd",
            Op::VsMul => "vsmul",
            Op::VsDiv => "vsdiv",
            Op::Exp => "exp",
            Op::Log => "log",
            Op::Sign => "sign",
            Op::Sigmoid => "sigmoid",
            Op::Tanh => "tanh",
            Op::Softplus { .. } => "softplus",
            Op::Relu => "relu",
            Op::ReluPrime => "relu_prime",
            Op::LeakyRelu { .. } => "leaky_relu",
            Op::LeakyReluPrime { .. } => "leaky_relu_prime",
            Op::Elu { .. } => "elu",
            Op::EluPrime { .. } => "elu_prime",
            Op::Softmax => "softmax",
            Op::DotVV => "dotvv",
            Op::DotMV => "dotmv",
            Op::DotMtV => "dotmtv",
            Op::DotMM => "dotmm",
            Op::DotMtM => "dotmtm",
            Op::DotMMt => "dotmmt",
            Op::Outer => "outer",
            Op::Norm1 => "norm1",
            Op::Reshape => "reshape",
            Op::Sum3 => "sum3",
            Op::ExpandDims { .. } => "expanddims",
            Op::AddBias => "addbias",
            Op::Conv2d { .. } => "conv2d",
            Op::Conv2dDx { .. } => "conv2ddx",
            Op::Conv2dDk { .. } => "conv2ddk",
            Op::Conv2dBiasAdd => "conv2d_bias_add",
            Op::Conv2dBiasAddGrad => "conv2d_bias_add_grad",
            Op::MaxPool { .. } => "maxpooling",
            Op::MaxPoolGrad { .. } => "maxpoolinggrad",
            Op::MaeLoss => "mae_loss",
            Op::MseLoss => "mse_loss",
            Op::BceLoss => "bce_loss",
            Op::CrossEntropyLoss => "cross_entropy_loss",
        }
    }

    /// Computes the node value from its evaluated operands. `shape` is the node's own shape.
    pub(crate) fn forward(&self, inputs: &[&Tensor], shape: &[usize]) -> Result<Tensor, RevGraphError> {
        match self {
            Op::Val { .. } => Err(RevGraphError::InternalError(
                "leaf nodes hold their value and are never evaluated".to_string(),
            )),
            Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Neg => arithmetic::forward(self, inputs),
            Op::VsAdd | Op::VsMul | Op::VsDiv => broadcast::forward(self, inputs),
            Op::Exp | Op::Log | Op::Sign => elementwise::forward(self, inputs),
            Op::Sigmoid
            | Op::Tanh
            | Op::Softplus { .. }
            | Op::Relu
            | Op::ReluPrime
            | Op::LeakyRelu { .. }
            | Op::LeakyReluPrime { .. }
            | Op::Elu { .. }
            | Op::EluPrime { .. }
            | Op::Softmax => activation::forward(self, inputs),
            Op::DotVV | Op::DotMV | Op::DotMtV | Op::DotMM | Op::DotMtM | Op::DotMMt | Op::Outer | Op::Norm1 => {
                linalg::forward(self, inputs)
            }
            Op::Reshape | Op::Sum3 | Op::ExpandDims { .. } | Op::AddBias => view::forward(self, inputs, shape),
            Op::Conv2d { .. }
            | Op::Conv2dDx { .. }
            | Op::Conv2dDk { .. }
            | Op::Conv2dBiasAdd
            | Op::Conv2dBiasAddGrad => conv::forward(self, inputs, shape),
            Op::MaxPool { .. } | Op::MaxPoolGrad { .. } => pool::forward(self, inputs),
            Op::MaeLoss | Op::MseLoss | Op::BceLoss | Op::CrossEntropyLoss => loss::forward(self, inputs),
        }
    }
}

/// One local gradient request: the contribution of operand `slot` of `node`,
/// given the upstream gradient `dout` of `node`.
#[derive(Debug, Clone)]
pub(crate) struct LocalGrad {
    pub node: NodeId,
    pub preds: Vec<NodeId>,
    pub slot: usize,
    pub dout: NodeId,
}

impl LocalGrad {
    pub fn operand(&self, i: usize) -> NodeId {
        self.preds[i]
    }

    /// The operand of a binary node that is not in `slot`.
    pub fn other(&self) -> NodeId {
        self.preds[1 - self.slot]
    }
}

/// Builds `d(node)/d(operand slot) · dout` as new graph nodes, dispatching on the node's operator.
pub(crate) fn local_grad(graph: &mut Graph, ctx: &LocalGrad) -> Result<NodeId, RevGraphError> {
    let op = graph.node(ctx.node)?.op().clone();
    match op {
        Op::Val { .. } => Err(RevGraphError::InternalError(
            "leaf nodes have no operands".to_string(),
        )),
        Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Neg => arithmetic::local_grad(graph, &op, ctx),
        Op::VsAdd | Op::VsMul | Op::VsDiv => broadcast::local_grad(graph, &op, ctx),
        Op::Exp | Op::Log | Op::Sign => elementwise::local_grad(graph, &op, ctx),
        Op::Sigmoid
        | Op::Tanh
        | Op::Softplus { .. }
        | Op::Relu
        | Op::ReluPrime
        | Op::LeakyRelu { .. }
        | Op::LeakyReluPrime { .. }
        | Op::Elu { .. }
        | Op::EluPrime { .. }
        | Op::Softmax => activation::local_grad(graph, &op, ctx),
        Op::DotVV | Op::DotMV | Op::DotMtV | Op::DotMM | Op::DotMtM | Op::DotMMt | Op::Outer | Op::Norm1 => {
            linalg::local_grad(graph, &op, ctx)
        }
        Op::Reshape | Op::Sum3 | Op::ExpandDims { .. } | Op::AddBias => view::local_grad(graph, &op, ctx),
        Op::Conv2d { .. } | Op::Conv2dDx { .. } | Op::Conv2dDk { .. } | Op::Conv2dBiasAdd | Op::Conv2dBiasAddGrad => {
            conv::local_grad(graph, &op, ctx)
        }
        Op::MaxPool { .. } | Op::MaxPoolGrad { .. } => pool::local_grad(graph, &op, ctx),
        Op::MaeLoss | Op::MseLoss | Op::BceLoss | Op::CrossEntropyLoss => loss::local_grad(graph, &op, ctx),
    }
}

/// Error for a variant routed to a family module that does not own it.
fn misrouted(op: &Op) -> RevGraphError {
    RevGraphError::InternalError(format!("operator {} dispatched to the wrong family", op.name()))
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
