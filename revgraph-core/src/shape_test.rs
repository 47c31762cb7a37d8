use super::*;

#[test]
fn test_elementwise_requires_equal_shapes() {
    assert_eq!(elementwise("add", &[2, 3], &[2, 3]).unwrap(), vec![2, 3]);
    let err = elementwise("add", &[2, 3], &[3, 2]).unwrap_err();
    assert!(matches!(err, RevGraphError::ShapeMismatch { .. }));
}

#[test]
fn test_scalar_vector() {
    assert_eq!(scalar_vector("vsadd", &[], &[5]).unwrap(), vec![5]);
    assert!(scalar_vector("vsadd", &[1], &[5]).is_err());
    assert!(scalar_vector("vsadd", &[], &[5, 1]).is_err());
}

#[test]
fn test_matrix_products() {
    assert_eq!(dot_vv(&[4], &[4]).unwrap(), Vec::<usize>::new());
    assert!(dot_vv(&[4], &[3]).is_err());
    assert_eq!(outer(&[2], &[3]).unwrap(), vec![2, 3]);
    assert_eq!(dot_mv(&[2, 3], &[3]).unwrap(), vec![2]);
    assert!(dot_mv(&[2, 3], &[2]).is_err());
    assert_eq!(dot_mtv(&[2, 3], &[2]).unwrap(), vec![3]);
    assert_eq!(dot_mm(&[2, 3], &[3, 4]).unwrap(), vec![2, 4]);
    assert!(dot_mm(&[2, 3], &[2, 4]).is_err());
    assert_eq!(dot_mtm(&[2, 3], &[2, 4]).unwrap(), vec![3, 4]);
    assert_eq!(dot_mmt(&[2, 3], &[4, 3]).unwrap(), vec![2, 4]);
}

#[test]
fn test_reshape_resolves_wildcard() {
    assert_eq!(reshape(&[2, 3, 4], &[-1, 4]).unwrap(), vec![6, 4]);
    assert_eq!(reshape(&[2, 3, 4], &[2, -1]).unwrap(), vec![2, 12]);
    assert_eq!(reshape(&[2, 3], &[-1]).unwrap(), vec![6]);
    assert_eq!(reshape(&[], &[1, 1]).unwrap(), vec![1, 1]);
    assert_eq!(reshape(&[1], &[]).unwrap(), Vec::<usize>::new());
}

#[test]
fn test_reshape_rejects_bad_requests() {
    assert!(reshape(&[2, 3], &[4]).is_err());
    assert!(reshape(&[2, 3], &[-1, -1]).is_err());
    assert!(reshape(&[2, 3], &[-1, 4]).is_err());
    assert!(reshape(&[2, 3], &[-2, 3]).is_err());
}

#[test]
fn test_add_bias() {
    assert_eq!(add_bias(&[5, 3], &[3]).unwrap(), vec![5, 3]);
    assert_eq!(add_bias(&[2, 2, 3], &[3]).unwrap(), vec![2, 2, 3]);
    assert!(add_bias(&[5, 3], &[5]).is_err());
    assert!(add_bias(&[], &[1]).is_err());
}

#[test]
fn test_sum_and_expand_dims() {
    assert_eq!(sum3(&[2, 3, 4]).unwrap(), vec![2, 4]);
    assert!(sum3(&[2, 3]).is_err());
    assert_eq!(sum_axis(&[2, 3, 4], 1).unwrap(), vec![2, 4]);
    assert_eq!(sum_axis(&[5], 0).unwrap(), Vec::<usize>::new());
    assert!(sum_axis(&[2, 3], 2).is_err());
    assert_eq!(expand_dims(&[2, 4], 1, 3).unwrap(), vec![2, 3, 4]);
    assert_eq!(expand_dims(&[2, 4], 2, 3).unwrap(), vec![2, 4, 3]);
    assert!(expand_dims(&[2, 4], 3, 3).is_err());
}

#[test]
fn test_conv2d_output_shape() {
    let params = Conv2dParams::default();
    assert_eq!(conv2d(&[2, 3, 5, 5], &[4, 3, 3, 3], &params).unwrap(), vec![2, 4, 3, 3]);

    let params = Conv2dParams::new(2, 2, 1, 1);
    assert_eq!(conv2d(&[1, 1, 5, 5], &[1, 1, 3, 3], &params).unwrap(), vec![1, 1, 3, 3]);

    let params = Conv2dParams::new(2, 1, 0, 0);
    assert_eq!(conv2d(&[1, 1, 6, 6], &[1, 1, 3, 3], &params).unwrap(), vec![1, 1, 2, 4]);
}

#[test]
fn test_conv2d_rejects_invalid_operands() {
    let params = Conv2dParams::default();
    assert!(conv2d(&[1, 2, 5, 5], &[1, 3, 3, 3], &params).is_err());
    assert!(conv2d(&[1, 1, 2, 2], &[1, 1, 3, 3], &params).is_err());
    assert!(conv2d(&[1, 5, 5], &[1, 1, 3, 3], &params).is_err());
    assert!(conv2d(&[1, 1, 5, 5], &[1, 1, 3, 3], &Conv2dParams::new(0, 1, 0, 0)).is_err());
}

#[test]
fn test_conv2d_grad_shapes_are_validated() {
    let params = Conv2dParams::new(2, 2, 0, 0);
    assert_eq!(
        conv2d_input_grad(&[4, 3, 3, 3], &[2, 4, 2, 2], &params, &[2, 3, 6, 6]).unwrap(),
        vec![2, 3, 6, 6]
    );
    assert!(conv2d_input_grad(&[4, 3, 3, 3], &[2, 4, 3, 3], &params, &[2, 3, 6, 6]).is_err());
    assert_eq!(
        conv2d_kernel_grad(&[2, 3, 6, 6], &[2, 4, 2, 2], &params, &[4, 3, 3, 3]).unwrap(),
        vec![4, 3, 3, 3]
    );
    assert!(conv2d_kernel_grad(&[2, 3, 6, 6], &[2, 5, 2, 2], &params, &[4, 3, 3, 3]).is_err());
}

#[test]
fn test_conv2d_transpose_shape() {
    let params = Conv2dParams::new(2, 2, 0, 0);
    assert_eq!(
        conv2d_transpose(&[1, 4, 2, 2], &[4, 3, 3, 3], &params).unwrap(),
        vec![1, 3, 5, 5]
    );
    let params = Conv2dParams::new(1, 1, 1, 1);
    assert_eq!(
        conv2d_transpose(&[1, 2, 3, 3], &[2, 1, 3, 3], &params).unwrap(),
        vec![1, 1, 3, 3]
    );
    assert!(conv2d_transpose(&[1, 3, 2, 2], &[4, 3, 3, 3], &params).is_err());
    let params = Conv2dParams::new(1, 1, 2, 2);
    assert!(conv2d_transpose(&[1, 1, 1, 1], &[1, 1, 3, 3], &params).is_err());
}

#[test]
fn test_conv2d_bias_add() {
    assert_eq!(conv2d_bias_add(&[2, 3, 4, 4], &[3]).unwrap(), vec![2, 3, 4, 4]);
    assert!(conv2d_bias_add(&[2, 3, 4, 4], &[4]).is_err());
    assert_eq!(conv2d_bias_add_grad(&[2, 3, 4, 4]).unwrap(), vec![3]);
}

#[test]
fn test_max_pool_shape() {
    let params = Pool2dParams::new(2, 2, 2, 2);
    assert_eq!(max_pool(&[1, 1, 4, 4], &params).unwrap(), vec![1, 1, 2, 2]);
    assert_eq!(max_pool(&[1, 1, 5, 5], &params).unwrap(), vec![1, 1, 2, 2]);
    assert!(max_pool(&[1, 1, 1, 4], &params).is_err());
    assert!(max_pool(&[1, 1, 4, 4], &Pool2dParams::new(2, 2, 0, 1)).is_err());
    assert_eq!(
        max_pool_grad(&[1, 1, 4, 4], &[1, 1, 2, 2], &[1, 1, 2, 2], &params).unwrap(),
        vec![1, 1, 4, 4]
    );
    assert!(max_pool_grad(&[1, 1, 4, 4], &[1, 1, 3, 3], &[1, 1, 3, 3], &params).is_err());
}

#[test]
fn test_losses_reduce_to_scalar() {
    assert_eq!(vector_loss("mse", &[4], &[4]).unwrap(), Vec::<usize>::new());
    assert!(vector_loss("mse", &[4], &[3]).is_err());
    assert!(vector_loss("mse", &[2, 2], &[2, 2]).is_err());
    assert_eq!(matrix_loss("ce", &[2, 3], &[2, 3]).unwrap(), Vec::<usize>::new());
    assert!(matrix_loss("ce", &[6], &[6]).is_err());
}
