use super::dims4;
use crate::shape::Pool2dParams;
use crate::tensor::Tensor;

/// Maximum over each `(kh, kw)` window, windows placed every `(sh, sw)` without padding.
pub fn max_pool(x: &Tensor, params: &Pool2dParams) -> Tensor {
    let (n, c, h, w) = dims4(x.shape());
    let (kh, kw) = params.kernel;
    let (sh, sw) = params.stride;
    let (hy, wy) = ((h - kh) / sh + 1, (w - kw) / sw + 1);

    let mut out = Vec::with_capacity(n * c * hy * wy);
    for plane in x.data().chunks(h * w) {
        for i in 0..hy {
            for j in 0..wy {
                let mut best = f32::NEG_INFINITY;
                for r in i * sh..i * sh + kh {
                    for &v in &plane[r * w + j * sw..r * w + j * sw + kw] {
                        best = best.max(v);
                    }
                }
                out.push(best);
            }
        }
    }
    Tensor::from_parts(out, vec![n, c, hy, wy])
}

/// Routes each `dout` entry to the input positions holding its window maximum.
///
/// Every position equal to the maximum receives the full upstream value, so
/// ties are counted once per tied position. Overlapping windows accumulate.
pub fn max_pool_grad(x: &Tensor, y: &Tensor, dout: &Tensor, params: &Pool2dParams) -> Tensor {
    let (_, _, h, w) = dims4(x.shape());
    let (_, _, hy, wy) = dims4(y.shape());
    let (kh, kw) = params.kernel;
    let (sh, sw) = params.stride;

    let mut dx = vec![0.0f32; x.numel()];
    let planes = x
        .data()
        .chunks(h * w)
        .zip(dx.chunks_mut(h * w))
        .zip(y.data().chunks(hy * wy).zip(dout.data().chunks(hy * wy)));
    for ((src, dst), (ymax, grad)) in planes {
        for i in 0..hy {
            for j in 0..wy {
                let (m, g) = (ymax[i * wy + j], grad[i * wy + j]);
                for r in i * sh..i * sh + kh {
                    for q in j * sw..j * sw + kw {
                        if src[r * w + q] == m {
                            dst[r * w + q] += g;
                        }
                    }
                }
            }
        }
    }
    Tensor::from_parts(dx, x.shape().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Tensor {
        Tensor::new(
            vec![
                1.0, 2.0, 5.0, 3.0, //
                4.0, 0.0, 1.0, 1.0, //
                7.0, 8.0, 2.0, 9.0, //
                6.0, 8.0, 0.0, 4.0,
            ],
            vec![1, 1, 4, 4],
        )
        .unwrap()
    }

    #[test]
    fn test_max_pool_windows() {
        let y = max_pool(&grid(), &Pool2dParams::new(2, 2, 2, 2));
        assert_eq!(y.shape(), &[1, 1, 2, 2]);
        assert_eq!(y.data(), &[4.0, 5.0, 8.0, 9.0]);

        let overlapping = max_pool(&grid(), &Pool2dParams::new(3, 3, 1, 1));
        assert_eq!(overlapping.data(), &[8.0, 9.0, 8.0, 9.0]);
    }

    #[test]
    fn test_max_pool_grad_routes_to_argmax() {
        let x = grid();
        let params = Pool2dParams::new(2, 2, 2, 2);
        let y = max_pool(&x, &params);
        let dout = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![1, 1, 2, 2]).unwrap();
        let dx = max_pool_grad(&x, &y, &dout, &params);
        assert_eq!(
            dx.data(),
            &[
                0.0, 0.0, 2.0, 0.0, //
                1.0, 0.0, 0.0, 0.0, //
                0.0, 3.0, 0.0, 4.0, //
                0.0, 3.0, 0.0, 0.0,
            ]
        );
    }
}
