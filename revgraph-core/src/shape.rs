//! Shape algebra.
//!
//! Pure functions computing the output shape of every operator from the shapes
//! of its operands and its fixed parameters. Builders call these before a node
//! is created, so a shape violation is always a construction-time error.

use crate::error::RevGraphError;
use crate::tensor::numel;

/// Stride and zero-padding of a 2-D convolution, as `(height, width)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2dParams {
    pub stride: (usize, usize),
    pub padding: (usize, usize),
}

impl Conv2dParams {
    pub fn new(stride_h: usize, stride_w: usize, pad_h: usize, pad_w: usize) -> Self {
        Conv2dParams {
            stride: (stride_h, stride_w),
            padding: (pad_h, pad_w),
        }
    }
}

impl Default for Conv2dParams {
    fn default() -> Self {
        Conv2dParams::new(1, 1, 0, 0)
    }
}

/// Window size and stride of a 2-D max-pooling, as `(height, width)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool2dParams {
    pub kernel: (usize, usize),
    pub stride: (usize, usize),
}

impl Pool2dParams {
    pub fn new(kernel_h: usize, kernel_w: usize, stride_h: usize, stride_w: usize) -> Self {
        Pool2dParams {
            kernel: (kernel_h, kernel_w),
            stride: (stride_h, stride_w),
        }
    }
}

fn expect_rank(operation: &str, shape: &[usize], rank: usize, what: &str) -> Result<(), RevGraphError> {
    if shape.len() != rank {
        return Err(RevGraphError::invalid_shape(
            operation,
            &[shape],
            format!("{} must have rank {}, got rank {}", what, rank, shape.len()),
        ));
    }
    Ok(())
}

/// Elementwise binary operators: both operands share one shape.
pub fn elementwise(operation: &str, a: &[usize], b: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if a != b {
        return Err(RevGraphError::shape_mismatch(operation, a, b));
    }
    Ok(a.to_vec())
}

/// Scalar-broadcast family: a 0-D scalar and a 1-D vector; the result is shaped like the vector.
pub fn scalar_vector(operation: &str, scalar: &[usize], vector: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if !scalar.is_empty() || vector.len() != 1 {
        return Err(RevGraphError::invalid_shape(
            operation,
            &[scalar, vector],
            "first operand must be a scalar and second a vector",
        ));
    }
    Ok(vector.to_vec())
}

pub fn vector(operation: &str, x: &[usize]) -> Result<(), RevGraphError> {
    expect_rank(operation, x, 1, "operand")
}

pub fn matrix(operation: &str, x: &[usize]) -> Result<(), RevGraphError> {
    expect_rank(operation, x, 2, "operand")
}

pub fn dot_vv(a: &[usize], b: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if a.len() != 1 || a != b {
        return Err(RevGraphError::invalid_shape(
            "dotvv",
            &[a, b],
            "operands must be vectors of the same size",
        ));
    }
    Ok(vec![])
}

pub fn outer(a: &[usize], b: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if a.len() != 1 || b.len() != 1 {
        return Err(RevGraphError::invalid_shape("outer", &[a, b], "operands must be vectors"));
    }
    Ok(vec![a[0], b[0]])
}

/// `(m, n) · (n) -> (m)`
pub fn dot_mv(m: &[usize], v: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if m.len() != 2 || v.len() != 1 || m[1] != v[0] {
        return Err(RevGraphError::invalid_shape(
            "dotmv",
            &[m, v],
            "operands must be of shape (m, n) and (n)",
        ));
    }
    Ok(vec![m[0]])
}

/// `(n, m)ᵗ · (n) -> (m)`
pub fn dot_mtv(m: &[usize], v: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if m.len() != 2 || v.len() != 1 || m[0] != v[0] {
        return Err(RevGraphError::invalid_shape(
            "dotmtv",
            &[m, v],
            "operands must be of shape (n, m) and (n)",
        ));
    }
    Ok(vec![m[1]])
}

/// `(m, n) · (n, p) -> (m, p)`
pub fn dot_mm(a: &[usize], b: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if a.len() != 2 || b.len() != 2 || a[1] != b[0] {
        return Err(RevGraphError::invalid_shape(
            "dotmm",
            &[a, b],
            "operands must be of shape (m, n) and (n, p)",
        ));
    }
    Ok(vec![a[0], b[1]])
}

/// `(n, m)ᵗ · (n, p) -> (m, p)`
pub fn dot_mtm(a: &[usize], b: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if a.len() != 2 || b.len() != 2 || a[0] != b[0] {
        return Err(RevGraphError::invalid_shape(
            "dotmtm",
            &[a, b],
            "operands must be of shape (n, m) and (n, p)",
        ));
    }
    Ok(vec![a[1], b[1]])
}

/// `(m, n) · (p, n)ᵗ -> (m, p)`
pub fn dot_mmt(a: &[usize], b: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if a.len() != 2 || b.len() != 2 || a[1] != b[1] {
        return Err(RevGraphError::invalid_shape(
            "dotmmt",
            &[a, b],
            "operands must be of shape (m, n) and (p, n)",
        ));
    }
    Ok(vec![a[0], b[0]])
}

/// Resolves a requested shape, where at most one dimension may be `-1`.
///
/// The wildcard is inferred from the operand's element count and the other
/// dimensions. The resolved shape must hold exactly as many elements as the operand.
pub fn reshape(input: &[usize], requested: &[isize]) -> Result<Vec<usize>, RevGraphError> {
    let total = numel(input);
    let mut wildcard = None;
    let mut known = 1usize;
    for (i, &d) in requested.iter().enumerate() {
        match d {
            -1 if wildcard.is_none() => wildcard = Some(i),
            -1 => {
                return Err(RevGraphError::invalid_argument(
                    "reshape",
                    format!("only one wildcard dimension allowed in {:?}", requested),
                ))
            }
            d if d < 0 => {
                return Err(RevGraphError::invalid_argument(
                    "reshape",
                    format!("negative dimension {} in {:?}", d, requested),
                ))
            }
            d => known *= d as usize,
        }
    }

    let mut resolved: Vec<usize> = requested.iter().map(|&d| d.max(0) as usize).collect();
    if let Some(i) = wildcard {
        if known == 0 || total % known != 0 {
            return Err(RevGraphError::invalid_shape(
                "reshape",
                &[input],
                format!("cannot infer wildcard dimension of {:?}", requested),
            ));
        }
        resolved[i] = total / known;
    }

    if numel(&resolved) != total {
        return Err(RevGraphError::shape_mismatch("reshape", input, &resolved));
    }
    Ok(resolved)
}

/// Converts a concrete shape into a reshape request.
pub(crate) fn dims(shape: &[usize]) -> Vec<isize> {
    shape.iter().map(|&d| d as isize).collect()
}

/// `x + b` with `b` broadcast along the last axis of `x`.
pub fn add_bias(x: &[usize], b: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    match (x.last(), b) {
        (Some(&last), [len]) if last == *len => Ok(x.to_vec()),
        _ => Err(RevGraphError::invalid_shape(
            "addbias",
            &[x, b],
            "bias must be a vector as long as the last dimension of the operand",
        )),
    }
}

/// `(a, b, c) -> (a, c)`
pub fn sum3(x: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    expect_rank("sum3", x, 3, "operand")?;
    Ok(vec![x[0], x[2]])
}

/// Shape after removing `axis`.
pub fn sum_axis(x: &[usize], axis: usize) -> Result<Vec<usize>, RevGraphError> {
    if axis >= x.len() {
        return Err(RevGraphError::invalid_argument(
            "sum",
            format!("axis {} out of range for shape {:?}", axis, x),
        ));
    }
    let mut out = x.to_vec();
    out.remove(axis);
    Ok(out)
}

/// Shape after inserting a new axis of length `size` at position `axis`.
pub fn expand_dims(x: &[usize], axis: usize, size: usize) -> Result<Vec<usize>, RevGraphError> {
    if axis > x.len() || size == 0 {
        return Err(RevGraphError::invalid_argument(
            "expanddims",
            format!("invalid axis {} or size {} for shape {:?}", axis, size, x),
        ));
    }
    let mut out = x.to_vec();
    out.insert(axis, size);
    Ok(out)
}

fn check_conv_params(operation: &str, params: &Conv2dParams) -> Result<(), RevGraphError> {
    if params.stride.0 == 0 || params.stride.1 == 0 {
        return Err(RevGraphError::invalid_argument(operation, "strides must be positive"));
    }
    Ok(())
}

/// `floor((H - kh + 2·ph) / sh) + 1`, or `None` when the padded input is smaller than the kernel.
fn conv_out_dim(input: usize, kernel: usize, stride: usize, pad: usize) -> Option<usize> {
    let padded = input + 2 * pad;
    if kernel == 0 || padded < kernel {
        return None;
    }
    Some((padded - kernel) / stride + 1)
}

/// `X (n, c, h, w)` convolved with `K (f, c, kh, kw)` gives `(n, f, hy, wy)`.
pub fn conv2d(x: &[usize], k: &[usize], params: &Conv2dParams) -> Result<Vec<usize>, RevGraphError> {
    check_conv_params("conv2d", params)?;
    if x.len() != 4 || k.len() != 4 || x[1] != k[1] {
        return Err(RevGraphError::invalid_shape(
            "conv2d",
            &[x, k],
            "X and K must be 4D tensors with the same number of input channels",
        ));
    }
    let hy = conv_out_dim(x[2], k[2], params.stride.0, params.padding.0);
    let wy = conv_out_dim(x[3], k[3], params.stride.1, params.padding.1);
    match (hy, wy) {
        (Some(hy), Some(wy)) => Ok(vec![x[0], k[0], hy, wy]),
        _ => Err(RevGraphError::invalid_shape(
            "conv2d",
            &[x, k],
            "kernel is larger than the padded input",
        )),
    }
}

/// Validates the input-gradient operator: `dY` must be exactly the conv2d output of an input shaped `x_shape`.
pub fn conv2d_input_grad(
    k: &[usize],
    dy: &[usize],
    params: &Conv2dParams,
    x_shape: &[usize],
) -> Result<Vec<usize>, RevGraphError> {
    if k.len() != 4 || dy.len() != 4 || x_shape.len() != 4 {
        return Err(RevGraphError::invalid_shape(
            "conv2ddx",
            &[k, dy, x_shape],
            "K, dY and the input shape must be 4D",
        ));
    }
    let expected = conv2d(x_shape, k, params)?;
    if expected != dy {
        return Err(RevGraphError::shape_mismatch("conv2ddx", &expected, dy));
    }
    Ok(x_shape.to_vec())
}

/// Validates the kernel-gradient operator: `dY` must be exactly the conv2d output of `X` with a kernel shaped `k_shape`.
pub fn conv2d_kernel_grad(
    x: &[usize],
    dy: &[usize],
    params: &Conv2dParams,
    k_shape: &[usize],
) -> Result<Vec<usize>, RevGraphError> {
    if x.len() != 4 || dy.len() != 4 || k_shape.len() != 4 {
        return Err(RevGraphError::invalid_shape(
            "conv2ddk",
            &[x, dy, k_shape],
            "X, dY and the kernel shape must be 4D",
        ));
    }
    let expected = conv2d(x, k_shape, params)?;
    if expected != dy {
        return Err(RevGraphError::shape_mismatch("conv2ddk", &expected, dy));
    }
    Ok(k_shape.to_vec())
}

/// Transposed convolution of `X (n, f, h, w)` with `K (f, c, kh, kw)`:
/// `(n, c, (h-1)·sh - 2·ph + kh, (w-1)·sw - 2·pw + kw)`.
pub fn conv2d_transpose(x: &[usize], k: &[usize], params: &Conv2dParams) -> Result<Vec<usize>, RevGraphError> {
    check_conv_params("conv2d_transpose", params)?;
    if x.len() != 4 || k.len() != 4 || x[1] != k[0] || x[2] == 0 || x[3] == 0 {
        return Err(RevGraphError::invalid_shape(
            "conv2d_transpose",
            &[x, k],
            "X and K must be 4D tensors and X channels must match K output channels",
        ));
    }
    let full_h = (x[2] - 1) * params.stride.0 + k[2];
    let full_w = (x[3] - 1) * params.stride.1 + k[3];
    let (ph, pw) = (2 * params.padding.0, 2 * params.padding.1);
    if full_h <= ph || full_w <= pw {
        return Err(RevGraphError::invalid_shape(
            "conv2d_transpose",
            &[x, k],
            "padding removes the whole output",
        ));
    }
    Ok(vec![x[0], k[1], full_h - ph, full_w - pw])
}

/// `X (n, c, h, w) + b (c)`
pub fn conv2d_bias_add(x: &[usize], b: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if x.len() != 4 || b.len() != 1 || x[1] != b[0] {
        return Err(RevGraphError::invalid_shape(
            "conv2d_bias_add",
            &[x, b],
            "X must be a 4D tensor and b a vector with one entry per channel",
        ));
    }
    Ok(x.to_vec())
}

pub fn conv2d_bias_add_grad(dout: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    expect_rank("conv2d_bias_add_grad", dout, 4, "dout")?;
    Ok(vec![dout[1]])
}

/// `(n, c, h, w) -> (n, c, (h - kh) / sh + 1, (w - kw) / sw + 1)`; no padding.
pub fn max_pool(x: &[usize], params: &Pool2dParams) -> Result<Vec<usize>, RevGraphError> {
    expect_rank("maxpooling", x, 4, "X")?;
    let (kh, kw) = params.kernel;
    let (sh, sw) = params.stride;
    if kh == 0 || kw == 0 || sh == 0 || sw == 0 {
        return Err(RevGraphError::invalid_argument(
            "maxpooling",
            "window and strides must be positive",
        ));
    }
    if x[2] < kh || x[3] < kw {
        return Err(RevGraphError::invalid_shape("maxpooling", &[x], "window is larger than the input"));
    }
    Ok(vec![x[0], x[1], (x[2] - kh) / sh + 1, (x[3] - kw) / sw + 1])
}

pub fn max_pool_grad(
    x: &[usize],
    y: &[usize],
    dout: &[usize],
    params: &Pool2dParams,
) -> Result<Vec<usize>, RevGraphError> {
    let expected = max_pool(x, params)?;
    if expected != y {
        return Err(RevGraphError::shape_mismatch("maxpoolinggrad", &expected, y));
    }
    if y != dout {
        return Err(RevGraphError::shape_mismatch("maxpoolinggrad", y, dout));
    }
    Ok(x.to_vec())
}

/// Losses over two equal-shape vectors reduce to a scalar.
pub fn vector_loss(operation: &str, pred: &[usize], target: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if pred.len() != 1 || pred != target {
        return Err(RevGraphError::invalid_shape(
            operation,
            &[pred, target],
            "operands must be vectors of the same size",
        ));
    }
    Ok(vec![])
}

/// Losses over two equal-shape matrices reduce to a scalar.
pub fn matrix_loss(operation: &str, pred: &[usize], target: &[usize]) -> Result<Vec<usize>, RevGraphError> {
    if pred.len() != 2 || pred != target {
        return Err(RevGraphError::invalid_shape(
            operation,
            &[pred, target],
            "operands must be matrices of the same size",
        ));
    }
    Ok(vec![])
}

#[cfg(test)]
#[path = "shape_test.rs"]
mod tests;
