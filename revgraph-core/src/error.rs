use crate::autograd::graph::NodeId;
use thiserror::Error;

/// Custom error type for the revgraph engine.
///
/// Every builder validates its operands before a node is created, so shape
/// problems surface here at construction time and never during evaluation.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum RevGraphError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        operation: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid operand shapes {shapes:?} for operation {operation}: {reason}")]
    InvalidShape {
        operation: String,
        shapes: Vec<Vec<usize>>,
        reason: String,
    },

    #[error("Invalid argument for operation {operation}: {reason}")]
    InvalidArgument { operation: String, reason: String },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Gradient of operation {operation} is not supported")]
    UnsupportedGradient { operation: String },

    #[error("Gradient requested for non-scalar output of shape {shape:?}")]
    BackwardNonScalar { shape: Vec<usize> },

    #[error("Node {id:?} does not belong to this graph")]
    NodeNotFound { id: NodeId },

    #[error("Cannot update node {id:?}: {reason}")]
    LeafUpdate { id: NodeId, reason: String },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RevGraphError {
    pub(crate) fn invalid_shape(operation: &str, shapes: &[&[usize]], reason: impl Into<String>) -> Self {
        RevGraphError::InvalidShape {
            operation: operation.to_string(),
            shapes: shapes.iter().map(|s| s.to_vec()).collect(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(operation: &str, reason: impl Into<String>) -> Self {
        RevGraphError::InvalidArgument {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn shape_mismatch(operation: &str, expected: &[usize], actual: &[usize]) -> Self {
        RevGraphError::ShapeMismatch {
            operation: operation.to_string(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    pub(crate) fn unsupported_gradient(operation: &str) -> Self {
        RevGraphError::UnsupportedGradient {
            operation: operation.to_string(),
        }
    }
}
