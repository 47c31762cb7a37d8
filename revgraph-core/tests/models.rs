use revgraph_core::{
    check_grad, Conv2dParams, GradCheckConfig, GradCheckError, Graph, LayerFn, Network, NodeId, Pool2dParams,
    RevGraphError, Tensor,
};

mod common;
use common::{one_hot, random, scaled};

/// Plain gradient descent on every parameter; returns the loss before each step.
fn descend(g: &mut Graph, loss: NodeId, params: &[NodeId], lr: f32, steps: usize) -> Result<Vec<f32>, RevGraphError> {
    let grads = params
        .iter()
        .map(|&p| g.grad(loss, p))
        .collect::<Result<Vec<_>, _>>()?;
    let mut history = Vec::with_capacity(steps);
    for _ in 0..steps {
        history.push(g.eval(loss)?.item()?);
        let mut next = Vec::with_capacity(params.len());
        for (&p, &dp) in params.iter().zip(&grads) {
            let value = g.eval(p)?;
            let step = g.eval(dp)?;
            let data = value.data().iter().zip(step.data()).map(|(v, d)| v - lr * d).collect();
            next.push(Tensor::new(data, value.shape().to_vec())?);
        }
        for (&p, value) in params.iter().zip(next) {
            g.update(p, value)?;
        }
    }
    Ok(history)
}

#[test]
fn mlp_cross_entropy_gradient_check() -> Result<(), GradCheckError> {
    let x = scaled(random(vec![4, 3], 1), 0.5);
    let targets = one_hot(&[0, 2, 1, 2], 3);
    check_grad(
        move |g, v| {
            let h = g.dot_mm(x.clone(), v[0])?;
            let h = g.add_bias(h, v[1])?;
            let h = g.tanh(h)?;
            let logits = g.dot_mm(h, v[2])?;
            let logits = g.add_bias(logits, v[3])?;
            g.cross_entropy_loss(logits, targets.clone())
        },
        &[
            scaled(random(vec![3, 5], 2), 0.5),
            scaled(random(vec![5], 3), 0.1),
            scaled(random(vec![5, 3], 4), 0.5),
            scaled(random(vec![3], 5), 0.1),
        ],
        &Tensor::scalar(1.0),
        &GradCheckConfig::default(),
    )
}

#[test]
fn dense_regression_loss_decreases() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let mut net = Network::seeded(42);
    let hidden: LayerFn = net.dense_layer(&mut g, 2, 8)?;
    let output: LayerFn = net.dense_layer(&mut g, 8, 1)?;

    // y = x0 - 2·x1
    let inputs = random(vec![16, 2], 7);
    let targets: Vec<f32> = inputs.data().chunks(2).map(|r| r[0] - 2.0 * r[1]).collect();
    let x = g.constant(inputs);
    let h = hidden(&mut g, x)?;
    let h = g.tanh(h)?;
    let pred = output(&mut g, h)?;
    let loss = g.mse_loss_nd(pred, Tensor::new(targets, vec![16, 1])?)?;

    let params = net.parameters().to_vec();
    let history = descend(&mut g, loss, &params, 0.002, 100)?;
    let (first, last) = (history[0], history[history.len() - 1]);
    assert!(last.is_finite());
    assert!(last < 0.7 * first, "loss went from {} to {}", first, last);
    Ok(())
}

#[test]
fn conv_classifier_loss_decreases() -> Result<(), RevGraphError> {
    let mut g = Graph::new();
    let mut net = Network::seeded(5);
    let conv = net.conv2d_layer(&mut g, 1, 2, (3, 3), Conv2dParams::default())?;
    let dense = net.dense_layer(&mut g, 8, 3)?;

    let images = scaled(random(vec![6, 1, 6, 6], 8), 0.5);
    let x = g.constant(images);
    let features = conv(&mut g, x)?;
    let features = g.relu(features)?;
    let pooled = g.max_pool(features, Pool2dParams::new(2, 2, 2, 2))?;
    let flat = g.reshape(pooled, &[6, -1])?;
    assert_eq!(g.shape(flat)?, &[6, 8]);
    let logits = dense(&mut g, flat)?;
    let loss = g.cross_entropy_loss(logits, one_hot(&[0, 1, 2, 0, 1, 2], 3))?;

    let params = net.parameters().to_vec();
    assert_eq!(params.len(), 4);
    let history = descend(&mut g, loss, &params, 0.001, 20)?;
    let (first, last) = (history[0], history[history.len() - 1]);
    assert!(last.is_finite());
    assert!(last < first, "loss went from {} to {}", first, last);
    Ok(())
}
