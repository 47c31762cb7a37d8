//! Numeric kernels over dense `f32` buffers.
//!
//! Kernels assume their operands were validated by the shape algebra and never
//! fail; they are the forward computations behind [`Op::forward`](crate::ops::Op::forward).

pub mod conv;
pub mod matmul;
pub mod pool;
pub mod reduce;
pub mod scalar;

/// Splits a validated rank-4 shape into `(n, c, h, w)`.
pub(crate) fn dims4(shape: &[usize]) -> (usize, usize, usize, usize) {
    debug_assert_eq!(shape.len(), 4);
    (shape[0], shape[1], shape[2], shape[3])
}
