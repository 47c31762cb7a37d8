//! Reshaping, axis reductions and bias broadcasting.

use super::{misrouted, LocalGrad, Op};
use crate::autograd::graph::{Graph, IntoNode, NodeId};
use crate::error::RevGraphError;
use crate::kernels::reduce;
use crate::shape::{self, dims};
use crate::tensor::Tensor;

impl Graph {
    /// Same data under `new_shape`. One dimension may be `-1` and is inferred.
    pub fn reshape(&mut self, x: impl IntoNode, new_shape: &[isize]) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let shape = shape::reshape(self.shape(x)?, new_shape)?;
        Ok(self.push(Op::Reshape, vec![x], shape))
    }

    /// `(a, b, c) -> (a, c)`, summing the middle axis.
    pub fn sum3(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let shape = shape::sum3(self.shape(x)?)?;
        Ok(self.push(Op::Sum3, vec![x], shape))
    }

    /// Inserts an axis of length `size` at `axis`, repeating the data along it.
    pub fn expand_dims(&mut self, x: impl IntoNode, axis: usize, size: usize) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let shape = shape::expand_dims(self.shape(x)?, axis, size)?;
        Ok(self.push(Op::ExpandDims { axis, size }, vec![x], shape))
    }

    /// Sums `x` over `axis`, removing it.
    ///
    /// Built as a reshape to `(leading, axis, trailing)`, a [`sum3`](Graph::sum3)
    /// and a reshape to the reduced shape.
    pub fn sum(&mut self, x: impl IntoNode, axis: usize) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let input = self.shape(x)?.to_vec();
        let reduced = shape::sum_axis(&input, axis)?;
        let leading: usize = input[..axis].iter().product();
        let trailing: usize = input[axis + 1..].iter().product();

        let canonical = self.reshape(x, &[leading as isize, input[axis] as isize, trailing as isize])?;
        let summed = self.sum3(canonical)?;
        self.reshape(summed, &dims(&reduced))
    }

    /// `x + b` with the vector `b` broadcast along the last axis of `x`.
    pub fn add_bias(&mut self, x: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.binary_with(Op::AddBias, x, b, shape::add_bias)
    }
}

pub(super) fn forward(op: &Op, inputs: &[&Tensor], shape: &[usize]) -> Result<Tensor, RevGraphError> {
    let x = inputs[0];
    let out = match *op {
        Op::Reshape => x.clone().reshaped(shape.to_vec())?,
        Op::Sum3 => reduce::sum_middle(x),
        Op::ExpandDims { axis, size } => reduce::repeat_axis(x, axis, size),
        Op::AddBias => reduce::add_bias(x, inputs[1]),
        _ => return Err(misrouted(op)),
    };
    Ok(out)
}

pub(super) fn local_grad(graph: &mut Graph, op: &Op, ctx: &LocalGrad) -> Result<NodeId, RevGraphError> {
    let dout = ctx.dout;
    let x_shape = graph.shape(ctx.operand(0))?.to_vec();
    match (op, ctx.slot) {
        (Op::Reshape, _) => graph.reshape(dout, &dims(&x_shape)),
        (Op::Sum3, _) => graph.expand_dims(dout, 1, x_shape[1]),
        (Op::ExpandDims { axis, .. }, _) => graph.sum(dout, *axis),
        (Op::AddBias, 0) => Ok(dout),
        (Op::AddBias, _) => {
            let width = x_shape.last().copied().unwrap_or(1) as isize;
            let rows = graph.reshape(dout, &[-1, width])?;
            graph.sum(rows, 0)
        }
        _ => Err(misrouted(op)),
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
