use crate::autograd::graph::{Graph, NodeId};
use crate::tensor::Tensor;

/// Checks if a tensor has the expected shape and its data lies within `tolerance` of `expected_data`.
/// Panics with the first mismatching index otherwise.
pub fn check_tensor_near(actual: &Tensor, expected_shape: &[usize], expected_data: &[f32], tolerance: f32) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");
    assert_eq!(actual.numel(), expected_data.len(), "Data length mismatch");

    for (i, (a, e)) in actual.data().iter().zip(expected_data).enumerate() {
        let diff = (a - e).abs();
        if diff > tolerance || diff.is_nan() {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Evaluates `node` and compares it with the expected values.
pub fn check_node_near(
    graph: &mut Graph,
    node: NodeId,
    expected_shape: &[usize],
    expected_data: &[f32],
    tolerance: f32,
) {
    let value = graph
        .eval(node)
        .unwrap_or_else(|e| panic!("Failed to evaluate node {:?}: {}", node, e));
    check_tensor_near(&value, expected_shape, expected_data, tolerance);
}

/// Helper to create a simple f32 tensor for testing purposes.
pub fn create_test_tensor(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
    Tensor::new(data, shape).expect("Failed to create test tensor")
}
