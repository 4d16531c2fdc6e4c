use std::collections::BTreeSet;

use ai_core::{NodeId, Vec3};
use ai_nav::NavNode;

/// Sweeps a set of nodes nearest-first, remembering which ones have been searched.
///
/// The memory survives [`SearchRoutine::stop`] and state transitions, so a later state can
/// resume the sweep without revisiting nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRoutine {
    in_progress: bool,
    candidates: Vec<NavNode>,
    searched: BTreeSet<NodeId>,
    current: Option<NavNode>,
}

impl SearchRoutine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, nodes: &[NavNode]) {
        self.candidates = nodes
            .iter()
            .filter(|n| !self.searched.contains(&n.id))
            .copied()
            .collect();
        self.current = None;
        self.in_progress = true;
    }

    /// Pick the nearest unsearched node. Finishes the search when nothing is left.
    pub fn next_target(&mut self, from: Vec3) -> Option<NavNode> {
        if !self.in_progress {
            return None;
        }
        let searched = &self.searched;
        let next = self
            .candidates
            .iter()
            .filter(|n| !searched.contains(&n.id))
            .min_by(|a, b| {
                a.position
                    .distance_squared(from)
                    .total_cmp(&b.position.distance_squared(from))
            })
            .copied();
        if next.is_none() {
            self.in_progress = false;
        }
        self.current = next;
        next
    }

    pub fn mark_searched(&mut self, node: NodeId) {
        self.searched.insert(node);
        if self.current.is_some_and(|c| c.id == node) {
            self.current = None;
        }
    }

    pub fn stop(&mut self) {
        self.in_progress = false;
        self.current = None;
    }

    /// Forget every searched node.
    pub fn reset(&mut self) {
        self.stop();
        self.candidates.clear();
        self.searched.clear();
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn current_target(&self) -> Option<NavNode> {
        self.current
    }

    pub fn searched_count(&self) -> usize {
        self.searched.len()
    }

    pub fn was_searched(&self, node: NodeId) -> bool {
        self.searched.contains(&node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes() -> Vec<NavNode> {
        vec![
            NavNode::new(0, Vec3::new(10.0, 0.0, 0.0)),
            NavNode::new(1, Vec3::new(2.0, 0.0, 0.0)),
            NavNode::new(2, Vec3::new(5.0, 0.0, 0.0)),
        ]
    }

    #[test]
    fn sweeps_nearest_first_and_finishes() {
        let mut search = SearchRoutine::new();
        search.start(&nodes());

        let mut order = Vec::new();
        while let Some(node) = search.next_target(Vec3::ZERO) {
            order.push(node.id.0);
            search.mark_searched(node.id);
        }
        assert_eq!(order, vec![1, 2, 0]);
        assert!(!search.is_in_progress());
    }

    #[test]
    fn restart_skips_searched_nodes() {
        let mut search = SearchRoutine::new();
        search.start(&nodes());
        search.mark_searched(NodeId(1));
        search.stop();
        assert_eq!(search.next_target(Vec3::ZERO), None);

        search.start(&nodes());
        assert_eq!(search.next_target(Vec3::ZERO).map(|n| n.id), Some(NodeId(2)));

        search.reset();
        search.start(&nodes());
        assert_eq!(search.next_target(Vec3::ZERO).map(|n| n.id), Some(NodeId(1)));
    }
}
