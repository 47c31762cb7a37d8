use super::graph::{Graph, NodeId};
use crate::error::RevGraphError;
use crate::ops::{self, LocalGrad};
use crate::tensor::Tensor;
use log::{debug, trace};
use std::collections::HashSet;

impl Graph {
    /// Builds the gradient of the scalar node `out` with respect to `target`.
    ///
    /// The result is a node of this graph shaped like `target`; nothing is
    /// computed until it is evaluated. Gradients are memoized on `out`, so a
    /// repeated request returns the same node without growing the graph.
    ///
    /// # Errors
    /// `BackwardNonScalar` if `out` is not 0-D, `UnsupportedGradient` if a path
    /// from `target` to `out` crosses an operator without a gradient rule.
    pub fn grad(&mut self, out: NodeId, target: NodeId) -> Result<NodeId, RevGraphError> {
        self.node(target)?;
        if let Some(&g) = self.node(out)?.grads.get(&target) {
            trace!("gradient memo hit for d{:?}/d{:?}", out, target);
            return Ok(g);
        }
        let out_shape = self.shape(out)?;
        if !out_shape.is_empty() {
            return Err(RevGraphError::BackwardNonScalar {
                shape: out_shape.to_vec(),
            });
        }

        debug!("accumulating gradient of {:?} with respect to {:?}", out, target);
        let ancestors = self.ancestors(out);
        if !ancestors.contains(&target) {
            let zeros = Tensor::zeros(self.shape(target)?.to_vec());
            let g = self.constant(zeros);
            self.memoize(out, target, g);
            return Ok(g);
        }

        for node in self.reverse_order(target, &ancestors) {
            if self.memoized(out, node).is_some() {
                continue;
            }
            let g = if node == out {
                self.constant(Tensor::scalar(1.0))
            } else {
                self.accumulate(out, node, &ancestors)?
            };
            self.memoize(out, node, g);
        }

        self.memoized(out, target)
            .ok_or_else(|| RevGraphError::InternalError(format!("gradient of {:?} was not accumulated", target)))
    }

    fn memoized(&self, out: NodeId, node: NodeId) -> Option<NodeId> {
        self.node(out).ok().and_then(|n| n.grads.get(&node).copied())
    }

    fn memoize(&mut self, out: NodeId, node: NodeId, grad: NodeId) {
        if let Some(root) = self.node_mut(out) {
            root.grads.insert(node, grad);
        }
    }

    /// Nodes between `target` and the root in an order where every node comes
    /// after all of its successors that lie within `ancestors`.
    fn reverse_order(&self, target: NodeId, ancestors: &HashSet<NodeId>) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(target, false)];
        while let Some((cur, expanded)) = stack.pop() {
            if expanded {
                order.push(cur);
                continue;
            }
            if !visited.insert(cur) {
                continue;
            }
            stack.push((cur, true));
            if let Ok(node) = self.node(cur) {
                for &s in node.succs() {
                    if ancestors.contains(&s) && !visited.contains(&s) {
                        stack.push((s, false));
                    }
                }
            }
        }
        order
    }

    /// Sums the local gradient contributions of every successor of `node` that reaches `out`.
    ///
    /// A successor using `node` in several operand slots contributes once per slot.
    fn accumulate(&mut self, out: NodeId, node: NodeId, ancestors: &HashSet<NodeId>) -> Result<NodeId, RevGraphError> {
        let succs: Vec<NodeId> = self
            .node(node)?
            .succs()
            .iter()
            .copied()
            .filter(|s| ancestors.contains(s))
            .collect();

        let mut total: Option<NodeId> = None;
        for y in succs {
            let dy = self
                .memoized(out, y)
                .ok_or_else(|| RevGraphError::InternalError(format!("gradient of {:?} requested before it was built", y)))?;
            let preds = self.node(y)?.preds().to_vec();
            for slot in (0..preds.len()).filter(|&i| preds[i] == node) {
                let ctx = LocalGrad {
                    node: y,
                    preds: preds.clone(),
                    slot,
                    dout: dy,
                };
                let contribution = ops::local_grad(self, &ctx)?;
                total = Some(match total {
                    Some(acc) => self.add(acc, contribution)?,
                    None => contribution,
                });
            }
        }

        match total {
            Some(g) => Ok(g),
            None => {
                let zeros = Tensor::zeros(self.shape(node)?.to_vec());
                Ok(self.constant(zeros))
            }
        }
    }
}
