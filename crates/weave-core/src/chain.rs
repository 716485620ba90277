//! Before/after chain topology
//!
//! [`Chain`] is an intrusive doubly linked list of [`AdviceNode`]s. The
//! `before` chain links at the front (most recent runs first), the `after`
//! chain at the back (earliest runs first).
//!
//! Unlinking a node leaves that node's own forward link in place, so a
//! dispatch currently standing on it still reaches the rest of the chain.

use crate::node::AdviceNode;
use std::sync::Arc;

pub(crate) struct Chain<P> {
    head: Option<Arc<AdviceNode<P>>>,
}

impl<P> Chain<P> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self { head: None }
    }

    #[inline]
    pub(crate) fn head(&self) -> Option<Arc<AdviceNode<P>>> {
        self.head.clone()
    }

    /// Make `node` the new head
    pub(crate) fn link_front(&mut self, node: Arc<AdviceNode<P>>) {
        if let Some(head) = self.head.take() {
            head.set_previous(Some(&node));
            node.set_next(Some(head));
        }
        self.head = Some(node);
    }

    /// Walk to the tail and append `node` after it
    pub(crate) fn link_back(&mut self, node: Arc<AdviceNode<P>>) {
        let Some(mut tail) = self.head.clone() else {
            self.head = Some(node);
            return;
        };
        while let Some(next) = tail.next() {
            tail = next;
        }
        node.set_previous(Some(&tail));
        tail.set_next(Some(node));
    }

    /// Splice `node` out of the chain
    ///
    /// Returns `false` if the node had already been removed.
    pub(crate) fn unlink(&mut self, node: &Arc<AdviceNode<P>>) -> bool {
        if !node.mark_removed() {
            return false;
        }
        let previous = node.previous();
        let next = node.next();

        match &previous {
            Some(previous) => previous.set_next(next.clone()),
            None => self.head = next.clone(),
        }
        if let Some(next) = &next {
            next.set_previous(previous.as_ref());
        }
        true
    }

    /// Iterate live nodes head to tail
    pub(crate) fn iter(&self) -> impl Iterator<Item = Arc<AdviceNode<P>>> {
        std::iter::successors(self.head(), |node| node.next())
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.iter().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WeavingRegistry;
    use pretty_assertions::assert_eq;

    fn labels(chain: &Chain<&'static str>) -> Vec<&'static str> {
        chain.iter().map(|n| *n.advice()).collect()
    }

    fn backward(chain: &Chain<&'static str>) -> Vec<&'static str> {
        let tail = chain.iter().last();
        std::iter::successors(tail, |node| node.previous())
            .map(|n| *n.advice())
            .collect()
    }

    #[test]
    fn link_front_is_lifo() {
        let registry = WeavingRegistry::default();
        let mut chain = Chain::new();
        for label in ["b1", "b2", "b3"] {
            chain.link_front(AdviceNode::create(&registry, label));
        }
        assert_eq!(labels(&chain), vec!["b3", "b2", "b1"]);
        assert_eq!(backward(&chain), vec!["b1", "b2", "b3"]);
    }

    #[test]
    fn link_back_is_fifo() {
        let registry = WeavingRegistry::default();
        let mut chain = Chain::new();
        for label in ["a1", "a2", "a3"] {
            chain.link_back(AdviceNode::create(&registry, label));
        }
        assert_eq!(labels(&chain), vec!["a1", "a2", "a3"]);
        assert_eq!(backward(&chain), vec!["a3", "a2", "a1"]);
    }

    #[test]
    fn unlink_middle_keeps_neighbours_linked() {
        let registry = WeavingRegistry::default();
        let mut chain = Chain::new();
        let nodes: Vec<_> = ["x", "y", "z"]
            .into_iter()
            .map(|l| AdviceNode::create(&registry, l))
            .collect();
        for node in &nodes {
            chain.link_back(Arc::clone(node));
        }

        assert!(chain.unlink(&nodes[1]));
        assert_eq!(labels(&chain), vec!["x", "z"]);
        assert_eq!(backward(&chain), vec!["z", "x"]);
    }

    #[test]
    fn unlink_head_and_tail() {
        let registry = WeavingRegistry::default();
        let mut chain = Chain::new();
        let nodes: Vec<_> = ["x", "y", "z"]
            .into_iter()
            .map(|l| AdviceNode::create(&registry, l))
            .collect();
        for node in &nodes {
            chain.link_back(Arc::clone(node));
        }

        assert!(chain.unlink(&nodes[0]));
        assert!(chain.unlink(&nodes[2]));
        assert_eq!(labels(&chain), vec!["y"]);
        assert!(chain.head().is_some_and(|h| h.previous().is_none() && h.next().is_none()));
    }

    #[test]
    fn unlink_only_node_clears_chain() {
        let registry = WeavingRegistry::default();
        let mut chain = Chain::new();
        let node = AdviceNode::create(&registry, "only");
        chain.link_front(Arc::clone(&node));

        assert!(chain.unlink(&node));
        assert!(chain.head().is_none());
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn unlink_twice_is_noop() {
        let registry = WeavingRegistry::default();
        let mut chain = Chain::new();
        let a = AdviceNode::create(&registry, "a");
        let b = AdviceNode::create(&registry, "b");
        chain.link_back(Arc::clone(&a));
        chain.link_back(Arc::clone(&b));

        assert!(chain.unlink(&a));
        assert!(!chain.unlink(&a));
        assert_eq!(labels(&chain), vec!["b"]);
    }

    #[test]
    fn removed_node_keeps_forward_link() {
        let registry = WeavingRegistry::default();
        let mut chain = Chain::new();
        let a = AdviceNode::create(&registry, "a");
        let b = AdviceNode::create(&registry, "b");
        chain.link_back(Arc::clone(&a));
        chain.link_back(Arc::clone(&b));

        chain.unlink(&a);
        assert_eq!(a.next().map(|n| *n.advice()), Some("b"));
    }
}
