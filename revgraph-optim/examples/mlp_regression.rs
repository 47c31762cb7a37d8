//! # Training a small MLP with SGD
//!
//! Fits `y = sin(x0) + 0.5·x1` with a `2 -> 16 -> 1` network built from
//! [`Network::dense_layer`] and a tanh hidden layer.
//!
//! The graph is built once: the loss node and its gradient nodes are reused
//! on every step, and each [`Graph::update`] of a parameter only invalidates
//! the cached values that depend on it.
//!
//! `cargo run -p revgraph-optim --example mlp_regression`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use revgraph_core::{Graph, Network, RevGraphError, Tensor};
use revgraph_optim::{Optimizer, Sgd};

fn main() -> Result<(), RevGraphError> {
    let mut rng = StdRng::seed_from_u64(0);
    let samples = 64;
    let inputs = Tensor::uniform_with(vec![samples, 2], -2.0, 2.0, &mut rng);
    let targets: Vec<f32> = inputs
        .data()
        .chunks(2)
        .map(|x| x[0].sin() + 0.5 * x[1] + rng.gen_range(-0.05..0.05))
        .collect();

    let mut g = Graph::new();
    let mut net = Network::seeded(1);
    let hidden = net.dense_layer(&mut g, 2, 16)?;
    let output = net.dense_layer(&mut g, 16, 1)?;

    let x = g.constant(inputs);
    let h = hidden(&mut g, x)?;
    let h = g.tanh(h)?;
    let pred = output(&mut g, h)?;
    let loss = g.mse_loss_nd(pred, Tensor::new(targets, vec![samples, 1])?)?;

    let params = net.parameters().to_vec();
    let mut optim = Sgd::new(1e-3)?;
    for epoch in 0..=300 {
        if epoch % 50 == 0 {
            let value = g.eval(loss)?.item()?;
            println!("epoch {:>3}: loss {:.4} (mean {:.5})", epoch, value, value / samples as f32);
        }
        optim.step(&mut g, loss, &params)?;
    }
    println!("graph holds {} nodes", g.len());
    Ok(())
}
