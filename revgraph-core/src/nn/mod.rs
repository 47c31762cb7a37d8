//! Helpers for assembling trainable models on a [`Graph`](crate::Graph).

pub mod init;
pub mod network;

pub use network::{LayerFn, Network};
