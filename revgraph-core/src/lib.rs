//! Reverse-mode automatic differentiation over a lazily evaluated tensor graph.
//!
//! Operators are added to a [`Graph`] through builder methods that validate
//! shapes up front; values are computed on demand by [`Graph::eval`] and
//! cached until a leaf they depend on is updated. [`Graph::grad`] builds the
//! gradient as more graph nodes, so gradients are evaluated (and cached) the
//! same way as any other value.
//!
//! ```
//! use revgraph_core::{Graph, Tensor};
//!
//! let mut g = Graph::new();
//! let x = g.val(Tensor::scalar(2.0));
//! let y = g.val(Tensor::scalar(3.0));
//! let z = g.add(x, y)?;
//! assert_eq!(g.eval(z)?.item()?, 5.0);
//!
//! let dz_dx = g.grad(z, x)?;
//! assert_eq!(g.eval(dz_dx)?.item()?, 1.0);
//! # Ok::<(), revgraph_core::RevGraphError>(())
//! ```

pub mod autograd;
pub mod config;
pub mod error;
pub mod kernels;
pub mod nn;
pub mod ops;
pub mod shape;
pub mod tensor;
pub mod utils;

pub use autograd::grad_check::{check_grad, GradCheckConfig, GradCheckError};
pub use autograd::graph::{Graph, IntoNode, Node, NodeId};
pub use config::{ConvAlgorithm, GraphConfig};
pub use error::RevGraphError;
pub use nn::{LayerFn, Network};
pub use ops::Op;
pub use shape::{Conv2dParams, Pool2dParams};
pub use tensor::Tensor;
