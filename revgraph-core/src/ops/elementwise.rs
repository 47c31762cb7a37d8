use super::{misrouted, LocalGrad, Op};
use crate::autograd::graph::{Graph, IntoNode, NodeId};
use crate::error::RevGraphError;
use crate::kernels::scalar;
use crate::tensor::Tensor;

impl Graph {
    pub fn exp(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::Exp, x)
    }

    /// Natural logarithm.
    pub fn log(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::Log, x)
    }

    /// -1, 0 or 1 per element. Not differentiable.
    pub fn sign(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::Sign, x)
    }
}

pub(super) fn forward(op: &Op, inputs: &[&Tensor]) -> Result<Tensor, RevGraphError> {
    let x = inputs[0];
    let out = match op {
        Op::Exp => x.map(f32::exp),
        Op::Log => x.map(f32::ln),
        Op::Sign => x.map(scalar::sign),
        _ => return Err(misrouted(op)),
    };
    Ok(out)
}

pub(super) fn local_grad(graph: &mut Graph, op: &Op, ctx: &LocalGrad) -> Result<NodeId, RevGraphError> {
    match op {
        Op::Exp => graph.mul(ctx.dout, ctx.node),
        Op::Log => graph.div(ctx.dout, ctx.operand(0)),
        Op::Sign => Err(RevGraphError::unsupported_gradient(op.name())),
        _ => Err(misrouted(op)),
    }
}
