use crate::autograd::graph::{Graph, NodeId};
use crate::error::RevGraphError;
use crate::nn::init;
use crate::shape::Conv2dParams;
use crate::tensor::Tensor;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A layer: maps an input node to an output node, building its operators in the given graph.
pub type LayerFn = Box<dyn Fn(&mut Graph, NodeId) -> Result<NodeId, RevGraphError>>;

/// Creates trainable layers and remembers their parameter leaves, in creation order.
///
/// Parameters are mutable leaves, so an optimizer updates them in place with
/// [`Graph::update`].
#[derive(Debug)]
pub struct Network {
    params: Vec<NodeId>,
    rng: StdRng,
}

impl Network {
    pub fn new() -> Self {
        Network {
            params: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Network whose parameter initialisation is reproducible.
    pub fn seeded(seed: u64) -> Self {
        Network {
            params: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Weight and bias leaves of every layer created so far.
    pub fn parameters(&self) -> &[NodeId] {
        &self.params
    }

    /// `X (batch, in) -> X·W + b` with `W (in, out)` drawn from `N(0, 1)` and `b` zero.
    pub fn dense_layer(&mut self, graph: &mut Graph, in_size: usize, out_size: usize) -> Result<LayerFn, RevGraphError> {
        let mut weights = Tensor::zeros(vec![in_size, out_size]);
        init::normal_(&mut weights, 0.0, 1.0, &mut self.rng)?;
        let bias = Tensor::zeros(vec![out_size]);

        let w = graph.val(weights);
        let b = graph.val(bias);
        self.params.extend([w, b]);
        debug!("dense layer {} -> {} with parameters {:?}, {:?}", in_size, out_size, w, b);

        Ok(Box::new(move |g: &mut Graph, x: NodeId| {
            let y = g.dot_mm(x, w)?;
            g.add_bias(y, b)
        }))
    }

    /// `X (batch, in_channels, h, w) -> conv2d(X, K) + b` with `K (out_channels, in_channels, kh, kw)`
    /// and the per-channel bias `b` both drawn from `N(0, 1)`.
    pub fn conv2d_layer(
        &mut self,
        graph: &mut Graph,
        in_channels: usize,
        out_channels: usize,
        kernel: (usize, usize),
        params: Conv2dParams,
    ) -> Result<LayerFn, RevGraphError> {
        let mut kernel_t = Tensor::zeros(vec![out_channels, in_channels, kernel.0, kernel.1]);
        init::normal_(&mut kernel_t, 0.0, 1.0, &mut self.rng)?;
        let mut bias = Tensor::zeros(vec![out_channels]);
        init::normal_(&mut bias, 0.0, 1.0, &mut self.rng)?;

        let k = graph.val(kernel_t);
        let b = graph.val(bias);
        self.params.extend([k, b]);
        debug!(
            "conv2d layer {} -> {} channels, kernel {:?}, {:?}",
            in_channels, out_channels, kernel, params
        );

        Ok(Box::new(move |g: &mut Graph, x: NodeId| {
            let y = g.conv2d(x, k, params)?;
            g.conv2d_bias_add(y, b)
        }))
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "network_test.rs"]
mod tests;
