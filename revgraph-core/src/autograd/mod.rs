//! Reverse-mode differentiation: the node arena, the gradient accumulator and
//! a finite-difference gradient checker.

pub mod grad;
pub mod grad_check;
pub mod graph;

pub use grad_check::{check_grad, GradCheckConfig, GradCheckError};
pub use graph::{Graph, IntoNode, Node, NodeId};
