//! 2-D convolution operators (NCHW).
//!
//! `conv2d_dx` and `conv2d_dk` are the input and kernel gradients of `conv2d`
//! as operators of their own, so a gradient graph can be evaluated lazily
//! like any other. Transposed convolution reuses `conv2d_dx`.

use super::{misrouted, LocalGrad, Op};
use crate::autograd::graph::{Graph, IntoNode, NodeId};
use crate::error::RevGraphError;
use crate::kernels::{conv, reduce};
use crate::shape::{self, Conv2dParams};
use crate::tensor::Tensor;

impl Graph {
    /// Convolves `x (n, c, h, w)` with `k (f, c, kh, kw)`.
    ///
    /// The evaluation strategy is taken from the graph's
    /// [`GraphConfig`](crate::GraphConfig) when the node is built.
    pub fn conv2d(&mut self, x: impl IntoNode, k: impl IntoNode, params: Conv2dParams) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let k = k.into_node(self)?;
        let shape = shape::conv2d(self.shape(x)?, self.shape(k)?, &params)?;
        let algorithm = self.config().conv_algorithm;
        Ok(self.push(Op::Conv2d { params, algorithm }, vec![x, k], shape))
    }

    /// Gradient of `conv2d(X, k)` with respect to `X`, given the output gradient
    /// `dy` and the shape of `X`.
    pub fn conv2d_dx(
        &mut self,
        k: impl IntoNode,
        dy: impl IntoNode,
        params: Conv2dParams,
        x_shape: &[usize],
    ) -> Result<NodeId, RevGraphError> {
        let k = k.into_node(self)?;
        let dy = dy.into_node(self)?;
        let shape = shape::conv2d_input_grad(self.shape(k)?, self.shape(dy)?, &params, x_shape)?;
        let algorithm = self.config().conv_algorithm;
        Ok(self.push(Op::Conv2dDx { params, algorithm }, vec![k, dy], shape))
    }

    /// Gradient of `conv2d(x, K)` with respect to `K`, given the output gradient
    /// `dy` and the shape of `K`.
    pub fn conv2d_dk(
        &mut self,
        x: impl IntoNode,
        dy: impl IntoNode,
        params: Conv2dParams,
        k_shape: &[usize],
    ) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let dy = dy.into_node(self)?;
        let shape = shape::conv2d_kernel_grad(self.shape(x)?, self.shape(dy)?, &params, k_shape)?;
        let algorithm = self.config().conv_algorithm;
        Ok(self.push(Op::Conv2dDk { params, algorithm }, vec![x, dy], shape))
    }

    /// Transposed convolution of `x (n, f, h, w)` with `k (f, c, kh, kw)`, producing
    /// `(n, c, (h-1)·sh - 2·ph + kh, (w-1)·sw - 2·pw + kw)`.
    pub fn conv2d_transpose(
        &mut self,
        x: impl IntoNode,
        k: impl IntoNode,
        params: Conv2dParams,
    ) -> Result<NodeId, RevGraphError> {
        let x = x.into_node(self)?;
        let k = k.into_node(self)?;
        let out_shape = shape::conv2d_transpose(self.shape(x)?, self.shape(k)?, &params)?;
        self.conv2d_dx(k, x, params, &out_shape)
    }

    /// Adds `b[c]` to every element of channel `c`.
    pub fn conv2d_bias_add(&mut self, x: impl IntoNode, b: impl IntoNode) -> Result<NodeId, RevGraphError> {
        self.binary_with(Op::Conv2dBiasAdd, x, b, shape::conv2d_bias_add)
    }

    /// Per-channel sum of a `(n, c, h, w)` gradient.
    pub fn conv2d_bias_add_grad(&mut self, dout: impl IntoNode) -> Result<NodeId, RevGraphError> {
        let dout = dout.into_node(self)?;
        let shape = shape::conv2d_bias_add_grad(self.shape(dout)?)?;
        Ok(self.push(Op::Conv2dBiasAddGrad, vec![dout], shape))
    }
}

pub(super) fn forward(op: &Op, inputs: &[&Tensor], shape: &[usize]) -> Result<Tensor, RevGraphError> {
    let out = match op {
        Op::Conv2d { params, algorithm } => conv::conv2d(inputs[0], inputs[1], params, *algorithm),
        Op::Conv2dDx { params, algorithm } => conv::conv2d_dx(inputs[0], inputs[1], params, shape, *algorithm),
        Op::Conv2dDk { params, algorithm } => conv::conv2d_dk(inputs[0], inputs[1], params, shape, *algorithm),
        Op::Conv2dBiasAdd => reduce::channel_bias_add(inputs[0], inputs[1]),
        Op::Conv2dBiasAddGrad => reduce::channel_sum(inputs[0]),
        _ => return Err(misrouted(op)),
    };
    Ok(out)
}

pub(super) fn local_grad(graph: &mut Graph, op: &Op, ctx: &LocalGrad) -> Result<NodeId, RevGraphError> {
    let dout = ctx.dout;
    let a = ctx.operand(0);
    match (op, ctx.slot) {
        (Op::Conv2d { params, .. }, 0) => {
            let x_shape = graph.shape(a)?.to_vec();
            graph.conv2d_dx(ctx.operand(1), dout, *params, &x_shape)
        }
        (Op::Conv2d { params, .. }, _) => {
            let k_shape = graph.shape(ctx.operand(1))?.to_vec();
            graph.conv2d_dk(a, dout, *params, &k_shape)
        }
        // Z = dx(K, dY) is linear in both operands; <Z, dout> = <conv2d(dout, K), dY>.
        (Op::Conv2dDx { params, .. }, 0) => {
            let k_shape = graph.shape(a)?.to_vec();
            graph.conv2d_dk(dout, ctx.operand(1), *params, &k_shape)
        }
        (Op::Conv2dDx { params, .. }, _) => graph.conv2d(dout, a, *params),
        (Op::Conv2dBiasAdd, 0) => Ok(dout),
        (Op::Conv2dBiasAdd, _) => graph.conv2d_bias_add_grad(dout),
        (Op::Conv2dDk { .. } | Op::Conv2dBiasAddGrad, _) => Err(RevGraphError::unsupported_gradient(op.name())),
        _ => Err(misrouted(op)),
    }
}

#[cfg(test)]
#[path = "conv_test.rs"]
mod tests;
