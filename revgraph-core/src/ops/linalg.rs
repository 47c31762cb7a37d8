//! Dot products and matrix products.
//!
//! The transposed variants (`dot_mtv`, `dot_mtm`, `dot_mmt`) exist so that
//! gradient rules can express `Aᵗ·B` and `A·Bᵗ` without a transpose operator.
//! They are gradient targets only and have no gradient of their own.

use super::{misrouted, LocalGrad, Op};
use crate::autograd::graph::{Graph, IntoNode, NodeId};
use crate::error::RevGraphError;
use crate::kernels::matmul;
use crate::shape;
use crate::tensor::Tensor;

impl Graph {
    /// Inner product of two vectors of the same length.
    pub fn dot_vv(&mut self, a: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.binary_with(Op::DotVV, a, b, shape::dot_vv)
    }

    /// `M · v` for `M (m, n)` and `v (n)`.
    pub fn dot_mv(&mut self, m: impl IntoNode, v: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.binary_with(Op::DotMV, m, v, shape::dot_mv)
    }

    /// `Mᵗ · v` for `M (n, m)` and `v (n)`.
    pub fn dot_mtv(&mut self, m: impl IntoNode, v: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.binary_with(Op::DotMtV, m, v, shape::dot_mtv)
    }

    /// `A · B` for `A (m, n)` and `B (n, p)`.
    pub fn dot_mm(&mut self, a: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.binary_with(Op::DotMM, a, b, shape::dot_mm)
    }

    /// `Aᵗ · B` for `A (n, m)` and `B (n, p)`.
    pub fn dot_mtm(&mut self, a: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.binary_with(Op::DotMtM, a, b, shape::dot_mtm)
    }

    /// `A · Bᵗ` for `A (m, n)` and `B (p, n)`.
    pub fn dot_mmt(&mut self, a: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.binary_with(Op::DotMMt, a, b, shape::dot_mmt)
    }

    /// Outer product `x yᵗ` of two vectors.
    pub fn outer(&mut self, x: impl IntoNode, y: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.binary_with(Op::Outer, x, y, shape::outer)
    }

    /// `Σ |x_i|` of a vector.
    pub fn norm1(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        shape::vector("norm1", self.shape(x)?)?;
        Ok(self.push(Op::Norm1, vec![x], vec![]))
    }

    pub(crate) fn binary_with(
        &mut self,
        op: Op,
        a: impl IntoNode,
        b: impl IntoNode,
        rule: fn(&[usize], &[usize]) -> Result<Vec<usize>, RevGraphError>,
    ) -> Result<NodeId, RevGraphError> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        let shape = rule(self.shape(a)?, self.shape(b)?)?;
        Ok(self.push(op, vec![a, b], shape))
    }
}

pub(super) fn forward(op: &Op, inputs: &[&Tensor]) -> Result<Tensor, RevGraphError> {
    let a = inputs[0];
    let out = match op {
        Op::DotVV => matmul::dot_vv(a, inputs[1]),
        Op::DotMV => matmul::dot_mv(a, inputs[1], false),
        Op::DotMtV => matmul::dot_mv(a, inputs[1], true),
        Op::DotMM => matmul::dot_mm(a, inputs[1], false, false),
        Op::DotMtM => matmul::dot_mm(a, inputs[1], true, false),
        Op::DotMMt => matmul::dot_mm(a, inputs[1], false, true),
        Op::Outer => matmul::outer(a, inputs[1]),
        Op::Norm1 => Tensor::scalar(a.data().iter().map(|v| v.abs()).sum()),
        _ => return Err(misrouted(op)),
    };
    Ok(out)
}

pub(super) fn local_grad(graph: &mut Graph, op: &Op, ctx: &LocalGrad) -> Result<NodeId, RevGraphError> {
    let dout = ctx.dout;
    match (op, ctx.slot) {
        (Op::DotVV, _) => graph.vs_mul(dout, ctx.other()),
        // d(M·v)/dM = dout vᵗ, d(M·v)/dv = Mᵗ dout
        (Op::DotMV, 0) => graph.outer(dout, ctx.operand(1)),
        (Op::DotMV, _) => graph.dot_mtv(ctx.operand(0), dout),
        // d(A·B)/dA = dout Bᵗ, d(A·B)/dB = Aᵗ dout
        (Op::DotMM, 0) => graph.dot_mmt(dout, ctx.operand(1)),
        (Op::DotMM, _) => graph.dot_mtm(ctx.operand(0), dout),
        (Op::Outer, 0) => graph.dot_mv(dout, ctx.operand(1)),
        (Op::Outer, _) => graph.dot_mtv(dout, ctx.operand(0)),
        (Op::Norm1, _) => {
            let sign = graph.sign(ctx.operand(0))?;
            graph.vs_mul(dout, sign)
        }
        (Op::DotMtV | Op::DotMtM | Op::DotMMt, _) => Err(RevGraphError::unsupported_gradient(op.name())),
        _ => Err(misrouted(op)),
    }
}

#[cfg(test)]
#[path = "linalg_test.rs"]
mod tests;
