//! 2-D convolution kernels in NCHW layout.
//!
//! Both gradients are expressed as stride-1 valid convolutions over padded,
//! dilated or axis-swapped operands, so they share the forward kernels and
//! follow whichever [`ConvAlgorithm`] the node was built with.

use super::dims4;
use super::matmul::gemm;
use crate::config::ConvAlgorithm;
use crate::shape::Conv2dParams;
use crate::tensor::Tensor;

fn out_dim(input: usize, kernel: usize, stride: usize, pad: usize) -> usize {
    (input + 2 * pad - kernel) / stride + 1
}

pub fn conv2d(x: &Tensor, k: &Tensor, params: &Conv2dParams, algorithm: ConvAlgorithm) -> Tensor {
    match algorithm {
        ConvAlgorithm::Im2Col => conv2d_im2col(x, k, params),
        ConvAlgorithm::Naive => conv2d_naive(x, k, params),
    }
}

/// Direct evaluation of every output element.
pub fn conv2d_naive(x: &Tensor, k: &Tensor, params: &Conv2dParams) -> Tensor {
    let (n, c, h, w) = dims4(x.shape());
    let (f, _, kh, kw) = dims4(k.shape());
    let (sh, sw) = params.stride;
    let (ph, pw) = params.padding;
    let (hy, wy) = (out_dim(h, kh, sh, ph), out_dim(w, kw, sw, pw));
    let (xd, kd) = (x.data(), k.data());

    let mut out = Vec::with_capacity(n * f * hy * wy);
    for b in 0..n {
        for o in 0..f {
            for i in 0..hy {
                for j in 0..wy {
                    let mut acc = 0.0f32;
                    for ch in 0..c {
                        for a in 0..kh {
                            let r = i * sh + a;
                            if r < ph || r >= h + ph {
                                continue;
                            }
                            for q in 0..kw {
                                let s = j * sw + q;
                                if s < pw || s >= w + pw {
                                    continue;
                                }
                                acc += xd[((b * c + ch) * h + r - ph) * w + s - pw]
                                    * kd[((o * c + ch) * kh + a) * kw + q];
                            }
                        }
                    }
                    out.push(acc);
                }
            }
        }
    }
    Tensor::from_parts(out, vec![n, f, hy, wy])
}

/// Unfolds every receptive field of `x` into one row of a
/// `(n·hy·wy, c·kh·kw)` matrix. Padding positions become zeros.
fn im2col(x: &Tensor, kh: usize, kw: usize, params: &Conv2dParams) -> (Vec<f32>, usize, usize) {
    let (n, c, h, w) = dims4(x.shape());
    let (sh, sw) = params.stride;
    let (ph, pw) = params.padding;
    let (hy, wy) = (out_dim(h, kh, sh, ph), out_dim(w, kw, sw, pw));
    let xd = x.data();
    let width = c * kh * kw;

    let mut cols = vec![0.0f32; n * hy * wy * width];
    for b in 0..n {
        for i in 0..hy {
            for j in 0..wy {
                let row = &mut cols[((b * hy + i) * wy + j) * width..][..width];
                for ch in 0..c {
                    for a in 0..kh {
                        let r = i * sh + a;
                        if r < ph || r >= h + ph {
                            continue;
                        }
                        for q in 0..kw {
                            let s = j * sw + q;
                            if s < pw || s >= w + pw {
                                continue;
                            }
                            row[(ch * kh + a) * kw + q] = xd[((b * c + ch) * h + r - ph) * w + s - pw];
                        }
                    }
                }
            }
        }
    }
    (cols, hy, wy)
}

/// Unfolds the input with [`im2col`] and contracts it against the flattened kernel in one matrix product.
pub fn conv2d_im2col(x: &Tensor, k: &Tensor, params: &Conv2dParams) -> Tensor {
    let (n, c, _, _) = dims4(x.shape());
    let (f, _, kh, kw) = dims4(k.shape());
    let (cols, hy, wy) = im2col(x, kh, kw, params);
    let rows = n * hy * wy;
    // (rows, c·kh·kw) · (f, c·kh·kw)ᵗ
    let prod = gemm(&cols, k.data(), rows, c * kh * kw, f, false, true);

    let mut out = vec![0.0f32; n * f * hy * wy];
    for b in 0..n {
        for pos in 0..hy * wy {
            for o in 0..f {
                out[(b * f + o) * hy * wy + pos] = prod[(b * hy * wy + pos) * f + o];
            }
        }
    }
    Tensor::from_parts(out, vec![n, f, hy, wy])
}

/// Zero-pads the two spatial axes.
pub fn pad(x: &Tensor, top: usize, bottom: usize, left: usize, right: usize) -> Tensor {
    let (n, c, h, w) = dims4(x.shape());
    let (hp, wp) = (h + top + bottom, w + left + right);
    let mut out = vec![0.0f32; n * c * hp * wp];
    for plane in 0..n * c {
        for r in 0..h {
            let src = &x.data()[(plane * h + r) * w..][..w];
            let start = (plane * hp + r + top) * wp + left;
            out[start..start + w].copy_from_slice(src);
        }
    }
    Tensor::from_parts(out, vec![n, c, hp, wp])
}

/// Inserts `sh - 1` zero rows and `sw - 1` zero columns between neighbouring elements.
pub fn dilate(x: &Tensor, sh: usize, sw: usize) -> Tensor {
    let (n, c, h, w) = dims4(x.shape());
    let (hd, wd) = ((h - 1) * sh + 1, (w - 1) * sw + 1);
    let mut out = vec![0.0f32; n * c * hd * wd];
    for (plane, src) in x.data().chunks((h * w).max(1)).enumerate() {
        for r in 0..h {
            for q in 0..w {
                out[(plane * hd + r * sh) * wd + q * sw] = src[r * w + q];
            }
        }
    }
    Tensor::from_parts(out, vec![n, c, hd, wd])
}

/// Rotates every spatial plane by 180 degrees.
pub fn rot180(x: &Tensor) -> Tensor {
    let (_, _, h, w) = dims4(x.shape());
    let data = x
        .data()
        .chunks((h * w).max(1))
        .flat_map(|plane| plane.iter().rev().copied())
        .collect();
    Tensor::from_parts(data, x.shape().to_vec())
}

/// Exchanges the first two axes.
pub fn swap01(x: &Tensor) -> Tensor {
    let (n, c, h, w) = dims4(x.shape());
    let plane = h * w;
    let mut out = vec![0.0f32; x.numel()];
    for b in 0..n {
        for ch in 0..c {
            let src = &x.data()[(b * c + ch) * plane..][..plane];
            out[(ch * n + b) * plane..][..plane].copy_from_slice(src);
        }
    }
    Tensor::from_parts(out, vec![c, n, h, w])
}

/// Keeps rows `top..top + height` and columns `left..left + width`.
pub fn crop(x: &Tensor, top: usize, height: usize, left: usize, width: usize) -> Tensor {
    let (n, c, h, w) = dims4(x.shape());
    let mut out = Vec::with_capacity(n * c * height * width);
    for plane in x.data().chunks((h * w).max(1)) {
        for r in top..top + height {
            out.extend_from_slice(&plane[r * w + left..r * w + left + width]);
        }
    }
    Tensor::from_parts(out, vec![n, c, height, width])
}

/// Gradient of `conv2d(X, K)` with respect to `X`, given `dY` and the shape of `X`.
///
/// `dY` is dilated by the stride and fully padded, then correlated with the
/// rotated, channel-swapped kernel. Rows and columns the forward pass never
/// reached (when the stride does not divide the padded extent) receive zeros.
pub fn conv2d_dx(
    k: &Tensor,
    dy: &Tensor,
    params: &Conv2dParams,
    x_shape: &[usize],
    algorithm: ConvAlgorithm,
) -> Tensor {
    let (_, _, h, w) = dims4(x_shape);
    let (_, _, kh, kw) = dims4(k.shape());
    let (_, _, hy, wy) = dims4(dy.shape());
    let (sh, sw) = params.stride;
    let (ph, pw) = params.padding;

    let extra_h = h + 2 * ph - ((hy - 1) * sh + kh);
    let extra_w = w + 2 * pw - ((wy - 1) * sw + kw);
    let spread = pad(&dilate(dy, sh, sw), kh - 1, kh - 1 + extra_h, kw - 1, kw - 1 + extra_w);
    let flipped = swap01(&rot180(k));

    let full = conv2d(&spread, &flipped, &Conv2dParams::default(), algorithm);
    crop(&full, ph, h, pw, w)
}

/// Gradient of `conv2d(X, K)` with respect to `K`, given `X`, `dY` and the shape of `K`.
pub fn conv2d_dk(
    x: &Tensor,
    dy: &Tensor,
    params: &Conv2dParams,
    k_shape: &[usize],
    algorithm: ConvAlgorithm,
) -> Tensor {
    let (_, _, kh, kw) = dims4(k_shape);
    let (sh, sw) = params.stride;
    let (ph, pw) = params.padding;

    let padded = swap01(&pad(x, ph, ph, pw, pw));
    let spread = dilate(&swap01(dy), sh, sw);
    let full = conv2d(&padded, &spread, &Conv2dParams::default(), algorithm);
    swap01(&crop(&full, 0, kh, 0, kw))
}

#[cfg(test)]
#[path = "conv_test.rs"]
mod tests;
