//! Engine configuration.

/// Strategy used to evaluate 2-D convolutions and their gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvAlgorithm {
    /// Unfold every receptive field into a row and run a single matrix product.
    #[default]
    Im2Col,
    /// Reference quadruple loop. Slow, kept for cross-checking `Im2Col`.
    Naive,
}

/// Settings applied by a [`Graph`](crate::Graph) when it creates nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphConfig {
    /// Stamped into every convolution node at construction time.
    pub conv_algorithm: ConvAlgorithm,
}

impl GraphConfig {
    pub fn with_conv_algorithm(mut self, conv_algorithm: ConvAlgorithm) -> Self {
        self.conv_algorithm = conv_algorithm;
        self
    }
}
