use crate::autograd::grad_check::{check_grad, GradCheckConfig, GradCheckError};
use crate::autograd::graph::Graph;
use crate::error::RevGraphError;
use crate::tensor::Tensor;
use crate::utils::testing::{check_node_near, create_test_tensor};

fn seq(shape: Vec<usize>) -> Tensor {
    let n = shape.iter().product::<usize>();
    create_test_tensor((0..n).map(|v| v as f32 * 0.5 - 1.0).collect(), shape)
}

#[test]
fn test_reshape_round_trip() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(seq(vec![2, 3, 4]));
    let flat = g.reshape(x, &[-1])?;
    let mid = g.reshape(flat, &[4, -1])?;
    let back = g.reshape(mid, &[2, 3, 4])?;
    assert_eq!(g.shape(flat)?, &[24]);
    assert_eq!(g.shape(mid)?, &[4, 6]);
    let original = g.eval(x)?;
    assert_eq!(g.eval(back)?, original);
    Ok(())
}

#[test]
fn test_reshape_rejects_incompatible_shape() {
    let mut g = Graph::new();
    let x = g.val(seq(vec![2, 3]));
    assert!(matches!(g.reshape(x, &[4]), Err(RevGraphError::ShapeMismatch { .. })));
    assert!(matches!(g.reshape(x, &[-1, -1]), Err(RevGraphError::InvalidArgument { .. })));
}

#[test]
fn test_sum_over_every_axis() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(create_test_tensor((0..12).map(|v| v as f32).collect(), vec![2, 3, 2]));
    let s0 = g.sum(x, 0)?;
    let s1 = g.sum(x, 1)?;
    let s2 = g.sum(x, 2)?;
    check_node_near(&mut g, s0, &[3, 2], &[6.0, 8.0, 10.0, 12.0, 14.0, 16.0], 1e-6);
    check_node_near(&mut g, s1, &[2, 2], &[6.0, 9.0, 24.0, 27.0], 1e-6);
    check_node_near(&mut g, s2, &[2, 3], &[1.0, 5.0, 9.0, 13.0, 17.0, 21.0], 1e-6);
    assert!(g.sum(x, 3).is_err());
    Ok(())
}

#[test]
fn test_expand_dims_repeats() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(create_test_tensor(vec![1.0, 2.0], vec![2]));
    let e = g.expand_dims(x, 0, 3)?;
    check_node_near(&mut g, e, &[3, 2], &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0], 0.0);
    let e = g.expand_dims(x, 1, 2)?;
    check_node_near(&mut g, e, &[2, 2], &[1.0, 1.0, 2.0, 2.0], 0.0);
    Ok(())
}

#[test]
fn test_add_bias_forward() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(create_test_tensor(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]));
    let y = g.add_bias(x, Tensor::vector(vec![10.0, -10.0]))?;
    check_node_near(&mut g, y, &[2, 2], &[11.0, -8.0, 13.0, -6.0], 1e-6);
    assert!(g.add_bias(x, Tensor::vector(vec![1.0, 2.0, 3.0])).is_err());
    Ok(())
}

// --- Autograd Tests ---

#[test]
fn test_reshape_backward() -> Result<(), GradCheckError> {
    check_grad(
        |g, x| g.reshape(x[0], &[3, -1]),
        &[seq(vec![2, 3])],
        &seq(vec![3, 2]),
        &GradCheckConfig::default(),
    )
}

#[test]
fn test_sum_backward() -> Result<(), GradCheckError> {
    let config = GradCheckConfig::default();
    for axis in 0..3 {
        let mut out_shape = vec![2, 3, 4];
        out_shape.remove(axis);
        check_grad(|g, x| g.sum(x[0], axis), &[seq(vec![2, 3, 4])], &seq(out_shape), &config)?;
    }
    Ok(())
}

#[test]
fn test_expand_dims_backward() -> Result<(), GradCheckError> {
    check_grad(
        |g, x| g.expand_dims(x[0], 1, 3),
        &[seq(vec![2, 2])],
        &seq(vec![2, 3, 2]),
        &GradCheckConfig::default(),
    )
}

#[test]
fn test_add_bias_backward_rank3() -> Result<(), GradCheckError> {
    check_grad(
        |g, x| g.add_bias(x[0], x[1]),
        &[seq(vec![2, 2, 3]), create_test_tensor(vec![0.1, 0.2, 0.3], vec![3])],
        &seq(vec![2, 2, 3]),
        &GradCheckConfig::default(),
    )
}

#[test]
fn test_add_bias_with_empty_last_axis() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::zeros(vec![2, 0]));
    let y = g.add_bias(x, Tensor::zeros(vec![0]))?;
    check_node_near(&mut g, y, &[2, 0], &[], 0.0);
    Ok(())
}
