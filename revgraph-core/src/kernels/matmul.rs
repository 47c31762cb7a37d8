use crate::tensor::Tensor;

/// General matrix product `C = op(A) · op(B)` over row-major buffers.
///
/// `op(A)` is `(m, k)` and `op(B)` is `(k, n)`. With `trans_a` the buffer `a`
/// holds a `(k, m)` matrix; with `trans_b` the buffer `b` holds `(n, k)`.
pub fn gemm(a: &[f32], b: &[f32], m: usize, k: usize, n: usize, trans_a: bool, trans_b: bool) -> Vec<f32> {
    let mut c = vec![0.0f32; m * n];
    for i in 0..m {
        for p in 0..k {
            let a_ip = if trans_a { a[p * m + i] } else { a[i * k + p] };
            let row = &mut c[i * n..(i + 1) * n];
            if trans_b {
                for (j, c_ij) in row.iter_mut().enumerate() {
                    *c_ij += a_ip * b[j * k + p];
                }
            } else {
                for (c_ij, &b_pj) in row.iter_mut().zip(&b[p * n..(p + 1) * n]) {
                    *c_ij += a_ip * b_pj;
                }
            }
        }
    }
    c
}

pub fn dot_vv(a: &Tensor, b: &Tensor) -> Tensor {
    let s = a.data().iter().zip(b.data()).map(|(x, y)| x * y).sum();
    Tensor::scalar(s)
}

pub fn outer(a: &Tensor, b: &Tensor) -> Tensor {
    let (m, n) = (a.numel(), b.numel());
    let data = gemm(a.data(), b.data(), m, 1, n, false, false);
    Tensor::from_parts(data, vec![m, n])
}

/// `M (m, n) · v (n)`, or `Mᵗ · v` for `M (n, m)` with `transpose`.
pub fn dot_mv(mat: &Tensor, v: &Tensor, transpose: bool) -> Tensor {
    let (rows, cols) = (mat.shape()[0], mat.shape()[1]);
    let (m, k) = if transpose { (cols, rows) } else { (rows, cols) };
    let data = gemm(mat.data(), v.data(), m, k, 1, transpose, false);
    Tensor::from_parts(data, vec![m])
}

/// `op(A) · op(B)` for 2-D tensors.
pub fn dot_mm(a: &Tensor, b: &Tensor, trans_a: bool, trans_b: bool) -> Tensor {
    let (m, k) = if trans_a {
        (a.shape()[1], a.shape()[0])
    } else {
        (a.shape()[0], a.shape()[1])
    };
    let n = if trans_b { b.shape()[0] } else { b.shape()[1] };
    let data = gemm(a.data(), b.data(), m, k, n, trans_a, trans_b);
    Tensor::from_parts(data, vec![m, n])
}

#[cfg(test)]
#[path = "matmul_test.rs"]
mod tests;
