use super::*;
use crate::utils::testing::{check_node_near, create_test_tensor};
use approx::assert_relative_eq;

#[test]
fn test_sum_of_two_leaves() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::scalar(2.0));
    let y = g.val(Tensor::scalar(3.0));
    let z = g.add(x, y)?;
    assert_eq!(g.eval(z)?.item()?, 5.0);

    let dx = g.grad(z, x)?;
    let dy = g.grad(z, y)?;
    assert_eq!(g.eval(dx)?.item()?, 1.0);
    assert_eq!(g.eval(dy)?.item()?, 1.0);
    Ok(())
}

#[test]
fn test_builders_do_not_evaluate() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::vector(vec![1.0, 2.0]));
    let y = g.exp(x)?;
    assert!(g.value(y).is_none());
    assert!(g.value(x).is_some());
    g.eval(y)?;
    assert!(g.value(y).is_some());
    Ok(())
}

#[test]
fn test_node_links() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::scalar(2.0));
    let sq = g.mul(x, x)?;
    // One successor entry per (predecessor, successor) pair.
    assert_eq!(g.node(x)?.succs(), &[sq]);
    assert_eq!(g.node(sq)?.preds(), &[x, x]);
    assert!(g.node(x)?.is_leaf());
    assert!(!g.node(sq)?.is_leaf());
    assert_eq!(g.node(sq)?.op().name(), "mul");
    Ok(())
}

#[test]
fn test_raw_operands_become_constants() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::vector(vec![1.0, 2.0]));
    let y = g.add(x, Tensor::vector(vec![10.0, 20.0]))?;
    let c = g.node(y)?.preds()[1];
    assert!(matches!(g.node(c)?.op(), Op::Val { mutable: false }));
    assert!(g.update(c, Tensor::vector(vec![0.0, 0.0])).is_err());

    let s = g.node_from(4.0)?;
    assert_eq!(g.shape(s)?, &[] as &[usize]);
    check_node_near(&mut g, y, &[2], &[11.0, 22.0], 0.0);
    Ok(())
}

#[test]
fn test_update_invalidates_dependents_only() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::scalar(2.0));
    let y = g.val(Tensor::scalar(3.0));
    let a = g.mul(x, y)?;
    let b = g.exp(y)?;
    let c = g.add(a, 1.0)?;
    g.eval(c)?;
    g.eval(b)?;

    g.update(x, Tensor::scalar(5.0))?;
    assert!(g.value(a).is_none());
    assert!(g.value(c).is_none());
    // `b` does not depend on `x`.
    assert!(g.value(b).is_some());
    assert_eq!(g.value(x).map(|t| t.data().to_vec()), Some(vec![5.0]));
    assert_eq!(g.eval(c)?.item()?, 16.0);
    Ok(())
}

#[test]
fn test_discard_keeps_leaf_values() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::scalar(2.0));
    let y = g.neg(x)?;
    g.eval(y)?;
    g.discard(x)?;
    assert!(g.value(x).is_some());
    assert!(g.value(y).is_none());
    Ok(())
}

#[test]
fn test_update_errors() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::vector(vec![1.0, 2.0]));
    let c = g.constant(Tensor::vector(vec![1.0, 2.0]));
    let y = g.add(x, c)?;

    assert!(matches!(g.update(c, Tensor::zeros(vec![2])), Err(RevGraphError::LeafUpdate { .. })));
    assert!(matches!(g.update(y, Tensor::zeros(vec![2])), Err(RevGraphError::LeafUpdate { .. })));
    assert!(matches!(g.update(x, Tensor::zeros(vec![3])), Err(RevGraphError::ShapeMismatch { .. })));
    Ok(())
}

#[test]
fn test_is_ancestor_of() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::scalar(1.0));
    let y = g.val(Tensor::scalar(2.0));
    let a = g.exp(x)?;
    let b = g.mul(a, y)?;
    assert!(g.is_ancestor_of(x, b)?);
    assert!(g.is_ancestor_of(x, x)?);
    assert!(!g.is_ancestor_of(b, x)?);
    assert!(!g.is_ancestor_of(x, y)?);
    Ok(())
}

#[test]
fn test_unknown_node() {
    let mut g = Graph::new();
    let mut other = Graph::new();
    other.val(Tensor::scalar(1.0));
    let foreign = other.val(Tensor::scalar(2.0));
    assert!(matches!(g.eval(foreign), Err(RevGraphError::NodeNotFound { .. })));
    assert!(matches!(g.exp(foreign), Err(RevGraphError::NodeNotFound { .. })));
    assert!(g.is_empty());
}

#[test]
fn test_grad_requires_scalar_root() {
    let mut g = Graph::new();
    let x = g.val(Tensor::vector(vec![1.0, 2.0]));
    let y = g.exp(x).unwrap();
    assert!(matches!(
        g.grad(y, x),
        Err(RevGraphError::BackwardNonScalar { shape }) if shape == vec![2]
    ));
}

#[test]
fn test_grad_is_memoized() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::vector(vec![1.0, 2.0]));
    let e = g.exp(x)?;
    let loss = g.dot_vv(e, e)?;
    let first = g.grad(loss, x)?;
    let size = g.len();
    let second = g.grad(loss, x)?;
    assert_eq!(first, second);
    assert_eq!(g.len(), size);
    // Intermediate gradients were memoized on the way.
    let de = g.grad(loss, e)?;
    assert_eq!(g.len(), size);
    check_node_near(&mut g, de, &[2], &[2.0 * 1f32.exp(), 2.0 * 2f32.exp()], 1e-4);
    Ok(())
}

#[test]
fn test_grad_of_unrelated_target_is_zero() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::scalar(2.0));
    let unrelated = g.val(Tensor::vector(vec![1.0, 1.0, 1.0]));
    let y = g.mul(x, x)?;
    let d = g.grad(y, unrelated)?;
    check_node_near(&mut g, d, &[3], &[0.0, 0.0, 0.0], 0.0);
    Ok(())
}

#[test]
fn test_repeated_operands() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::scalar(3.0));
    let sq = g.mul(x, x)?;
    let diff = g.sub(x, x)?;
    let total = g.add(sq, diff)?;
    let d = g.grad(total, x)?;
    assert_relative_eq!(g.eval(d)?.item()?, 6.0);
    Ok(())
}

#[test]
fn test_gradient_graph_survives_updates() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let w = g.val(create_test_tensor(vec![1.0, -1.0], vec![2]));
    let x = g.constant(create_test_tensor(vec![2.0, 3.0], vec![2]));
    let wx = g.dot_vv(w, x)?;
    let loss = g.mul(wx, wx)?;
    let dw = g.grad(loss, w)?;
    // loss = (w·x)², dw = 2 (w·x) x
    check_node_near(&mut g, dw, &[2], &[-4.0, -6.0], 1e-5);

    g.update(w, create_test_tensor(vec![0.5, 0.5], vec![2]))?;
    assert!(g.value(dw).is_none());
    let size = g.len();
    assert_eq!(g.grad(loss, w)?, dw);
    assert_eq!(g.len(), size);
    check_node_near(&mut g, dw, &[2], &[10.0, 15.0], 1e-5);
    Ok(())
}

#[test]
fn test_deep_chain_does_not_overflow() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let x = g.val(Tensor::scalar(0.0));
    let mut y = x;
    for _ in 0..20_000 {
        y = g.add(y, 1.0)?;
    }
    assert_relative_eq!(g.eval(y)?.item()?, 20_000.0);
    let d = g.grad(y, x)?;
    assert_relative_eq!(g.eval(d)?.item()?, 1.0);
    Ok(())
}
