//! Scalar losses.
//!
//! Every loss is a sum over elements, not a mean. `bce_loss` and
//! `cross_entropy_loss` take logits and fold the sigmoid / softmax into both
//! the forward pass and a closed-form gradient.

use super::{misrouted, LocalGrad, Op};
use crate::autograd::graph::{Graph, IntoNode, NodeId};
use crate::error::RevGraphError;
use crate::kernels::reduce;
use crate::shape;
use crate::tensor::Tensor;

impl Graph {
    /// `Σ |t - p|` over two vectors.
    pub fn mae_loss(&mut self, pred: impl IntoNode, target: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.vector_loss(Op::MaeLoss, pred, target)
    }

    /// `Σ (t - p)²` over two vectors.
    pub fn mse_loss(&mut self, pred: impl IntoNode, target: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.vector_loss(Op::MseLoss, pred, target)
    }

    /// [`mse_loss`](Graph::mse_loss) of two tensors of any (equal) shape, flattened first.
    pub fn mse_loss_nd(&mut self, pred: impl IntoNode, target: impl IntoNode) -> Result<NodeId, RevGraphError> {
        let pred = pred.into_node(self)?;
        let target = target.into_node(self)?;
        shape::elementwise("mse_loss_nd", self.shape(pred)?, self.shape(target)?)?;
        let p = self.reshape(pred, &[-1])?;
        let t = self.reshape(target, &[-1])?;
        self.mse_loss(p, t)
    }

    /// Binary cross-entropy of logits `pred` against targets in `[0, 1]`.
    pub fn bce_loss(&mut self, pred: impl IntoNode, target: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.vector_loss(Op::BceLoss, pred, target)
    }

    /// Cross-entropy of row-wise softmax over logits `pred (batch, classes)`
    /// against target distributions of the same shape.
    pub fn cross_entropy_loss(&mut self, pred: impl IntoNode, target: impl IntoNode) -> Result<NodeId, RevGraphError> {
        let pred = pred.into_node(self)?;
        let target = target.into_node(self)?;
        let shape = shape::matrix_loss("cross_entropy_loss", self.shape(pred)?, self.shape(target)?)?;
        Ok(self.push(Op::CrossEntropyLoss, vec![pred, target], shape))
    }

    fn vector_loss(&mut self, op: Op, pred: impl IntoNode, target: impl IntoNode) -> Result<NodeId, RevGraphError> {
        let pred = pred.into_node(self)?;
        let target = target.into_node(self)?;
        let shape = shape::vector_loss(op.name(), self.shape(pred)?, self.shape(target)?)?;
        Ok(self.push(op, vec![pred, target], shape))
    }
}

pub(super) fn forward(op: &Op, inputs: &[&Tensor]) -> Result<Tensor, RevGraphError> {
    let (p, t) = (inputs[0], inputs[1]);
    let pairs = p.data().iter().zip(t.data());
    let total: f32 = match op {
        Op::MaeLoss => pairs.map(|(&p, &t)| (t - p).abs()).sum(),
        Op::MseLoss => pairs.map(|(&p, &t)| (t - p) * (t - p)).sum(),
        // max(x, 0) - x·t + ln(1 + e^-|x|)
        Op::BceLoss => pairs
            .map(|(&x, &t)| x.max(0.0) - x * t + (-x.abs()).exp().ln_1p())
            .sum(),
        Op::CrossEntropyLoss => {
            let lse = reduce::log_sum_exp_rows(p);
            reduce::rows(p)
                .zip(reduce::rows(t))
                .zip(lse)
                .map(|((x, t), l)| x.iter().zip(t).map(|(&x, &t)| t * (l - x)).sum::<f32>())
                .sum()
        }
        _ => return Err(misrouted(op)),
    };
    Ok(Tensor::scalar(total))
}

pub(super) fn local_grad(graph: &mut Graph, op: &Op, ctx: &LocalGrad) -> Result<NodeId, RevGraphError> {
    let dout = ctx.dout;
    // `this - other`: the residual seen from the operand being differentiated.
    let residual = |graph: &mut Graph| graph.sub(ctx.operand(ctx.slot), ctx.other());
    match (op, ctx.slot) {
        (Op::MaeLoss, _) => {
            let r = residual(graph)?;
            let s = graph.sign(r)?;
            graph.vs_mul(dout, s)
        }
        (Op::MseLoss, _) => {
            let r = residual(graph)?;
            let twice = graph.mul(2.0, dout)?;
            graph.vs_mul(twice, r)
        }
        (Op::BceLoss, 0) => {
            let s = graph.sigmoid(ctx.operand(0))?;
            let r = graph.sub(s, ctx.operand(1))?;
            graph.vs_mul(dout, r)
        }
        (Op::CrossEntropyLoss, 0) => {
            let s = graph.softmax(ctx.operand(0))?;
            let r = graph.sub(s, ctx.operand(1))?;
            graph.mul_scalar(r, dout)
        }
        (Op::BceLoss | Op::CrossEntropyLoss, _) => Err(RevGraphError::unsupported_gradient(op.name())),
        _ => Err(misrouted(op)),
    }
}

#[cfg(test)]
#[path = "loss_test.rs"]
mod tests;
