use super::{misrouted, LocalGrad, Op};
use crate::autograd::graph::{Graph, IntoNode, NodeId};
use crate::error::RevGraphError;
use crate::shape;
use crate::tensor::Tensor;

impl Graph {
    /// Elementwise `a + b`. Both operands must have the same shape.
    pub fn add(&mut self, a: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.elementwise_binary(Op::Add, a, b)
    }

    /// Elementwise `a - b`.
    pub fn sub(&mut self, a: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.elementwise_binary(Op::Sub, a, b)
    }

    /// Elementwise `a * b`.
    pub fn mul(&mut self, a: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.elementwise_binary(Op::Mul, a, b)
    }

    /// Elementwise `a / b`.
    pub fn div(&mut self, a: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.elementwise_binary(Op::Div, a, b)
    }

    pub fn neg(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.unary_same_shape(Op::Neg, x)
    }

    fn elementwise_binary(&mut self, op: Op, a: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        let shape = shape::elementwise(op.name(), self.shape(a)?, self.shape(b)?)?;
        Ok(self.push(op, vec![a, b], shape))
    }

    /// Any unary operator whose output is shaped like its operand.
    pub(crate) fn unary_same_shape(&mut self, op: Op, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let shape = self.shape(x)?.to_vec();
        Ok(self.push(op, vec![x], shape))
    }
}

pub(super) fn forward(op: &Op, inputs: &[&Tensor]) -> Result<Tensor, RevGraphError> {
    let a = inputs[0];
    let out = match op {
        Op::Neg => a.map(|x| -x),
        Op::Add => a.zip_map(inputs[1], |x, y| x + y),
        Op::Sub => a.zip_map(inputs[1], |x, y| x - y),
        Op::Mul => a.zip_map(inputs[1], |x, y| x * y),
        Op::Div => a.zip_map(inputs[1], |x, y| x / y),
        _ => return Err(misrouted(op)),
    };
    Ok(out)
}

pub(super) fn local_grad(graph: &mut Graph, op: &Op, ctx: &LocalGrad) -> Result<NodeId, RevGraphError> {
    let dout = ctx.dout;
    match (op, ctx.slot) {
        (Op::Add, _) | (Op::Sub, 0) => Ok(dout),
        (Op::Sub, _) | (Op::Neg, _) => graph.neg(dout),
        (Op::Mul, _) => graph.mul(ctx.other(), dout),
        (Op::Div, 0) => graph.div(dout, ctx.operand(1)),
        (Op::Div, _) => {
            // -dout * x / y²
            let (x, y) = (ctx.operand(0), ctx.operand(1));
            let num = graph.mul(dout, x)?;
            let den = graph.mul(y, y)?;
            let q = graph.div(num, den)?;
            graph.neg(q)
        }
        _ => Err(misrouted(op)),
    }
}

#[cfg(test)]
#[path = "arithmetic_test.rs"]
mod tests;
