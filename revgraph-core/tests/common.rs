use rand::rngs::StdRng;
use rand::SeedableRng;
use revgraph_core::Tensor;

/// Standard-normal tensor drawn from a fixed seed.
#[allow(dead_code)]
pub fn random(shape: Vec<usize>, seed: u64) -> Tensor {
    Tensor::randn_with(shape, &mut StdRng::seed_from_u64(seed))
}

/// One-hot rows for `labels`, shaped `(labels.len(), classes)`.
#[allow(dead_code)]
pub fn one_hot(labels: &[usize], classes: usize) -> Tensor {
    let mut data = vec![0.0; labels.len() * classes];
    for (row, &label) in labels.iter().enumerate() {
        data[row * classes + label] = 1.0;
    }
    Tensor::new(data, vec![labels.len(), classes]).expect("one-hot shape")
}

/// Scales every element of `t` by `factor`.
#[allow(dead_code)]
pub fn scaled(t: Tensor, factor: f32) -> Tensor {
    t.map(|v| v * factor)
}
