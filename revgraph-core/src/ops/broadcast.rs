//! Scalar-vector broadcast operators and the any-rank scalar helpers built on them.

use super::{misrouted, LocalGrad, Op};
use crate::autograd::graph::{Graph, IntoNode, NodeId};
use crate::error::RevGraphError;
use crate::shape::{self, dims};
use crate::tensor::Tensor;

impl Graph {
    /// `s + v` for a 0-D `s` and a 1-D `v`.
    pub fn vs_add(&mut self, s: impl IntoNode, v: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.scalar_vector(Op::VsAdd, s, v)
    }

    /// `s * v` for a 0-D `s` and a 1-D `v`.
    pub fn vs_mul(&mut self, s: impl IntoNode, v: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.scalar_vector(Op::VsMul, s, v)
    }

    /// `s / v` for a 0-D `s` and a 1-D `v`.
    pub fn vs_div(&mut self, s: impl IntoNode, v: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.scalar_vector(Op::VsDiv, s, v)
    }

    fn scalar_vector(&mut self, op: Op, s: impl IntoNode, v: impl IntoNode) -> Result<NodeId, RevGraphError> {
        let s = s.into_node(self)?;
        let v = v.into_node(self)?;
        let shape = shape::scalar_vector(op.name(), self.shape(s)?, self.shape(v)?)?;
        Ok(self.push(op, vec![s, v], shape))
    }

    /// `x + s` for `x` of any rank and a 0-D `s`.
    pub fn add_scalar(&mut self, x: impl IntoNode, s: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.through_vector(x, s, |g, s, v| g.vs_add(s, v))
    }

    /// `x * s` for `x` of any rank and a 0-D `s`.
    pub fn mul_scalar(&mut self, x: impl IntoNode, s: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.through_vector(x, s, |g, s, v| g.vs_mul(s, v))
    }

    fn through_vector(
        &mut self,
        x: impl IntoNode,
        s: impl IntoNode,
        op: fn(&mut Graph, NodeId, NodeId) -> Result<NodeId, RevGraphError>,
    ) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let s = s.into_node(self)?;
        let original = dims(self.shape(x)?);
        let flat = self.reshape(x, &[-1])?;
        let y = op(self, s, flat)?;
        self.reshape(y, &original)
    }
}

pub(super) fn forward(op: &Op, inputs: &[&Tensor]) -> Result<Tensor, RevGraphError> {
    let s = inputs[0].item()?;
    let v = inputs[1];
    let out = match op {
        Op::VsAdd => v.map(|x| s + x),
        Op::VsMul => v.map(|x| s * x),
        Op::VsDiv => v.map(|x| s / x),
        _ => return Err(misrouted(op)),
    };
    Ok(out)
}

pub(super) fn local_grad(graph: &mut Graph, op: &Op, ctx: &LocalGrad) -> Result<NodeId, RevGraphError> {
    let dout = ctx.dout;
    let (s, v) = (ctx.operand(0), ctx.operand(1));
    match (op, ctx.slot) {
        (Op::VsAdd, 0) => graph.sum(dout, 0),
        (Op::VsAdd, _) => Ok(dout),
        (Op::VsMul, 0) => graph.dot_vv(dout, v),
        (Op::VsMul, _) => graph.vs_mul(s, dout),
        (Op::VsDiv, 0) => {
            let inv = graph.vs_div(1.0, v)?;
            graph.dot_vv(dout, inv)
        }
        (Op::VsDiv, _) => {
            // -s * dout / v²
            let neg_s = graph.neg(s)?;
            let num = graph.vs_mul(neg_s, dout)?;
            let den = graph.mul(v, v)?;
            graph.div(num, den)
        }
        _ => Err(misrouted(op)),
    }
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
