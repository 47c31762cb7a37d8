use super::{misrouted, LocalGrad, Op};
use crate::autograd::graph::{Graph, IntoNode, NodeId};
use crate::error::RevGraphError;
use crate::kernels::pool;
use crate::shape::{self, Pool2dParams};
use crate::tensor::Tensor;

impl Graph {
    /// Max over each strided `(kh, kw)` window of a `(n, c, h, w)` tensor. No padding.
    pub fn max_pool(&mut self, x: impl IntoNode, params: Pool2dParams) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let shape = shape::max_pool(self.shape(x)?, &params)?;
        Ok(self.push(Op::MaxPool { params }, vec![x], shape))
    }

    /// Routes `dout` back to the positions of `x` that hold the maximum of
    /// their window in `y = max_pool(x)`. Tied positions each receive the
    /// full upstream value.
    pub fn max_pool_grad(
        &mut self,
        x: impl IntoNode,
        y: impl IntoNode,
        dout: impl IntoNode,
        params: Pool2dParams,
    ) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let y = y.into_node(self)?;
        let dout = dout.into_node(self)?;
        let shape = shape::max_pool_grad(self.shape(x)?, self.shape(y)?, self.shape(dout)?, &params)?;
        Ok(self.push(Op::MaxPoolGrad { params }, vec![x, y, dout], shape))
    }
}

pub(super) fn forward(op: &Op, inputs: &[&Tensor]) -> Result<Tensor, RevGraphError> {
    match op {
        Op::MaxPool { params } => Ok(pool::max_pool(inputs[0], params)),
        Op::MaxPoolGrad { params } => Ok(pool::max_pool_grad(inputs[0], inputs[1], inputs[2], params)),
        _ => Err(misrouted(op)),
    }
}

pub(super) fn local_grad(graph: &mut Graph, op: &Op, ctx: &LocalGrad) -> Result<NodeId, RevGraphError> {
    match op {
        Op::MaxPool { params } => graph.max_pool_grad(ctx.operand(0), ctx.node, ctx.dout, *params),
        Op::MaxPoolGrad { .. } => Err(RevGraphError::unsupported_gradient(op.name())),
        _ => Err(misrouted(op)),
    }
}
