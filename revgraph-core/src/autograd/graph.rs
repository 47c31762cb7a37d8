//! Computation graph arena.
//!
//! Every node lives in one `Vec` owned by [`Graph`] and is addressed by a
//! copyable [`NodeId`]. Predecessor and successor relations are plain index
//! lists, so the back-references never own anything.

use crate::config::GraphConfig;
use crate::error::RevGraphError;
use crate::ops::Op;
use crate::tensor::Tensor;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};

/// Unique identifier for a node in a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its graph's arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A node in the computation graph.
#[derive(Debug, Clone)]
pub struct Node {
    shape: Vec<usize>,
    op: Op,
    /// Operands, in operand order. May repeat a node (`x * x`).
    preds: Vec<NodeId>,
    /// Nodes using this one as an operand, each recorded once.
    succs: Vec<NodeId>,
    value: Option<Tensor>,
    /// Gradient nodes of this node with respect to each target, when this node is the root.
    pub(crate) grads: HashMap<NodeId, NodeId>,
}

impl Node {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn preds(&self) -> &[NodeId] {
        &self.preds
    }

    pub fn succs(&self) -> &[NodeId] {
        &self.succs
    }

    /// The cached value, if the node has been evaluated since its last invalidation.
    pub fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.op, Op::Val { .. })
    }
}

/// Owns all nodes of a computation and the settings used to build them.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    config: GraphConfig,
}

/// Coerces builder operands into graph nodes.
///
/// Existing nodes pass through unchanged; raw tensors and numbers become
/// immutable constant leaves.
pub trait IntoNode {
    fn into_node(self, graph: &mut Graph) -> Result<NodeId, RevGraphError>;
}

impl IntoNode for NodeId {
    fn into_node(self, graph: &mut Graph) -> Result<NodeId, RevGraphError> {
        graph.node(self)?;
        Ok(self)
    }
}

impl IntoNode for Tensor {
    fn into_node(self, graph: &mut Graph) -> Result<NodeId, RevGraphError> {
        Ok(graph.constant(self))
    }
}

impl IntoNode for f32 {
    fn into_node(self, graph: &mut Graph) -> Result<NodeId, RevGraphError> {
        Ok(graph.constant(Tensor::scalar(self)))
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Graph {
            nodes: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Number of nodes created so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, RevGraphError> {
        self.nodes.get(id.0).ok_or(RevGraphError::NodeNotFound { id })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn shape(&self, id: NodeId) -> Result<&[usize], RevGraphError> {
        Ok(self.node(id)?.shape())
    }

    /// Cached value of `id` without triggering evaluation.
    pub fn value(&self, id: NodeId) -> Option<&Tensor> {
        self.nodes.get(id.0).and_then(Node::value)
    }

    /// Creates a mutable leaf holding `value`. Its value can later be replaced with [`Graph::update`].
    pub fn val(&mut self, value: Tensor) -> NodeId {
        self.push_leaf(value, true)
    }

    /// Creates an immutable leaf holding `value`.
    pub fn constant(&mut self, value: Tensor) -> NodeId {
        self.push_leaf(value, false)
    }

    /// Coerces `x` into a node of this graph.
    pub fn node_from(&mut self, x: impl IntoNode) -> Result<NodeId, RevGraphError> {
        x.into_node(self)
    }

    fn push_leaf(&mut self, value: Tensor, mutable: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        trace!("created leaf {:?} (mutable: {}) with shape {:?}", id, mutable, value.shape());
        self.nodes.push(Node {
            shape: value.shape().to_vec(),
            op: Op::Val { mutable },
            preds: Vec::new(),
            succs: Vec::new(),
            value: Some(value),
            grads: HashMap::new(),
        });
        id
    }

    /// Appends an operator node and wires the successor back-references.
    ///
    /// Callers have validated `preds` and computed `shape` through the shape algebra.
    pub(crate) fn push(&mut self, op: Op, preds: Vec<NodeId>, shape: Vec<usize>) -> NodeId {
        let id = NodeId(self.nodes.len());
        trace!("created node {:?} ({}) with shape {:?}", id, op.name(), shape);
        for p in &preds {
            let succs = &mut self.nodes[p.0].succs;
            if !succs.contains(&id) {
                succs.push(id);
            }
        }
        self.nodes.push(Node {
            shape,
            op,
            preds,
            succs: Vec::new(),
            value: None,
            grads: HashMap::new(),
        });
        id
    }

    /// Replaces the value of a mutable leaf and invalidates everything computed from it.
    pub fn update(&mut self, id: NodeId, value: Tensor) -> Result<(), RevGraphError> {
        let node = self.node(id)?;
        match node.op {
            Op::Val { mutable: true } => {}
            Op::Val { mutable: false } => {
                return Err(RevGraphError::LeafUpdate {
                    id,
                    reason: "node is a constant".to_string(),
                })
            }
            _ => {
                return Err(RevGraphError::LeafUpdate {
                    id,
                    reason: format!("node is a {} operation, not a leaf", node.op.name()),
                })
            }
        }
        if node.shape() != value.shape() {
            return Err(RevGraphError::shape_mismatch("update", node.shape(), value.shape()));
        }
        debug!("updating leaf {:?} with shape {:?}", id, value.shape());
        self.discard(id)?;
        self.nodes[id.0].value = Some(value);
        Ok(())
    }

    /// Clears the cached value of `id` and of every node reachable through successors.
    ///
    /// Leaf values are source data and are never cleared.
    pub fn discard(&mut self, id: NodeId) -> Result<(), RevGraphError> {
        self.node(id)?;
        let mut visited = HashSet::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if !visited.insert(cur) {
                continue;
            }
            let node = &mut self.nodes[cur.0];
            if !node.is_leaf() {
                node.value = None;
            }
            stack.extend(node.succs.iter().copied());
        }
        Ok(())
    }

    /// True if `a == b` or `b` can be reached from `a` through successors.
    pub fn is_ancestor_of(&self, a: NodeId, b: NodeId) -> Result<bool, RevGraphError> {
        self.node(a)?;
        self.node(b)?;
        let mut visited = HashSet::new();
        let mut stack = vec![a];
        while let Some(cur) = stack.pop() {
            if cur == b {
                return Ok(true);
            }
            if visited.insert(cur) {
                stack.extend(self.nodes[cur.0].succs.iter().copied());
            }
        }
        Ok(false)
    }

    /// Every node `b` depends on, `b` included.
    pub(crate) fn ancestors(&self, b: NodeId) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        let mut stack = vec![b];
        while let Some(cur) = stack.pop() {
            if seen.insert(cur) {
                stack.extend(self.nodes[cur.0].preds.iter().copied());
            }
        }
        seen
    }

    /// Returns the value of `id`, evaluating (and caching) every missing predecessor first.
    pub fn eval(&mut self, id: NodeId) -> Result<Tensor, RevGraphError> {
        self.node(id)?;
        let mut stack = vec![(id, false)];
        while let Some((cur, expanded)) = stack.pop() {
            if self.nodes[cur.0].value.is_some() {
                continue;
            }
            if !expanded {
                stack.push((cur, true));
                for &p in &self.nodes[cur.0].preds {
                    if self.nodes[p.0].value.is_none() {
                        stack.push((p, false));
                    }
                }
                continue;
            }

            let value = {
                let node = &self.nodes[cur.0];
                let inputs = node
                    .preds
                    .iter()
                    .map(|p| {
                        self.nodes[p.0].value.as_ref().ok_or_else(|| {
                            RevGraphError::InternalError(format!("operand {:?} of {:?} was not evaluated", p, cur))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                trace!("evaluating node {:?} ({})", cur, node.op.name());
                node.op.forward(&inputs, &node.shape)?
            };
            self.nodes[cur.0].value = Some(value);
        }

        self.nodes[id.0]
            .value
            .clone()
            .ok_or_else(|| RevGraphError::InternalError(format!("node {:?} has no value after evaluation", id)))
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
