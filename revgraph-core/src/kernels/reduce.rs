use super::dims4;
use crate::tensor::Tensor;

/// `(a, b, c) -> (a, c)` by summing the middle axis.
pub fn sum_middle(x: &Tensor) -> Tensor {
    let (a, b, c) = (x.shape()[0], x.shape()[1], x.shape()[2]);
    let src = x.data();
    let mut out = vec![0.0f32; a * c];
    for i in 0..a {
        let dst = &mut out[i * c..(i + 1) * c];
        for j in 0..b {
            let row = &src[(i * b + j) * c..(i * b + j + 1) * c];
            for (d, &v) in dst.iter_mut().zip(row) {
                *d += v;
            }
        }
    }
    Tensor::from_parts(out, vec![a, c])
}

/// Inserts an axis of length `size` at `axis`, repeating the data along it.
pub fn repeat_axis(x: &Tensor, axis: usize, size: usize) -> Tensor {
    let outer: usize = x.shape()[..axis].iter().product();
    let inner: usize = x.shape()[axis..].iter().product();
    let src = x.data();
    let mut out = Vec::with_capacity(outer * size * inner);
    for o in 0..outer {
        let block = &src[o * inner..(o + 1) * inner];
        for _ in 0..size {
            out.extend_from_slice(block);
        }
    }
    let mut shape = x.shape().to_vec();
    shape.insert(axis, size);
    Tensor::from_parts(out, shape)
}

/// `x + b` with `b` broadcast along the last axis.
pub fn add_bias(x: &Tensor, b: &Tensor) -> Tensor {
    // An empty `b` means `x` is empty too.
    let n = b.numel().max(1);
    let data = x
        .data()
        .chunks(n)
        .flat_map(|row| row.iter().zip(b.data()).map(|(v, bias)| v + bias))
        .collect();
    Tensor::from_parts(data, x.shape().to_vec())
}

/// Adds `b[c]` to every element of channel `c` of a `(n, c, h, w)` tensor.
pub fn channel_bias_add(x: &Tensor, b: &Tensor) -> Tensor {
    let (_, c, h, w) = dims4(x.shape());
    let plane = h * w;
    let mut data = x.data().to_vec();
    for (i, v) in data.iter_mut().enumerate() {
        *v += b.data()[(i / plane) % c];
    }
    Tensor::from_parts(data, x.shape().to_vec())
}

/// Sums a `(n, c, h, w)` tensor over every axis but the channel axis.
pub fn channel_sum(x: &Tensor) -> Tensor {
    let (_, c, h, w) = dims4(x.shape());
    let plane = h * w;
    let mut out = vec![0.0f32; c];
    for (i, &v) in x.data().iter().enumerate() {
        out[(i / plane) % c] += v;
    }
    Tensor::from_parts(out, vec![c])
}

/// Rows of a matrix as slices. A matrix with no columns still has `rows` empty rows.
pub fn rows(x: &Tensor) -> impl Iterator<Item = &[f32]> {
    let cols = x.shape()[1];
    (0..x.shape()[0]).map(move |r| &x.data()[r * cols..(r + 1) * cols])
}

/// Row-wise `ln Σ exp`, computed around each row maximum.
pub fn log_sum_exp_rows(x: &Tensor) -> Vec<f32> {
    rows(x)
        .map(|row| {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            max + row.iter().map(|v| (v - max).exp()).sum::<f32>().ln()
        })
        .collect()
}

/// Row-wise softmax of a matrix.
pub fn softmax_rows(x: &Tensor) -> Tensor {
    let lse = log_sum_exp_rows(x);
    let data = rows(x)
        .zip(lse)
        .flat_map(|(row, l)| row.iter().map(move |v| (v - l).exp()))
        .collect();
    Tensor::from_parts(data, x.shape().to_vec())
}

#[cfg(test)]
#[path = "reduce_test.rs"]
mod tests;
