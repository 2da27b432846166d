use std::collections::HashMap;

use crate::node::Node;
use crate::slurm::{GpuTable, NodeState};

/// A node that is out of service, with the reason Slurm gives for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeNote {
    pub name: String,
    pub reason: String,
}

impl From<&Node> for NodeNote {
    fn from(node: &Node) -> Self {
        NodeNote {
            name: node.name.clone(),
            reason: node.reason.clone(),
        }
    }
}

/// GPU capacity of the cluster, folded over all nodes.
///
/// `configured` and `allocated` only count nodes that are neither drained nor down, those have
/// their configured GPUs in `drain` and `down` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSummary {
    pub configured: GpuTable,
    pub allocated: GpuTable,
    pub drain: GpuTable,
    pub down: GpuTable,
    pub drained_nodes: Vec<NodeNote>,
    pub down_nodes: Vec<NodeNote>,
    state_counts: HashMap<NodeState, usize>,
}

impl NodeSummary {
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let mut summary = NodeSummary::default();
        for node in nodes {
            *summary.state_counts.entry(node.state).or_default() += 1;
            match node.state {
                NodeState::Drain => {
                    summary.drain.accumulate(&node.configured.gpus);
                    summary.drained_nodes.push(node.into());
                }
                NodeState::Down => {
                    summary.down.accumulate(&node.configured.gpus);
                    summary.down_nodes.push(node.into());
                }
                _ => {
                    summary.configured.accumulate(&node.configured.gpus);
                    summary.allocated.accumulate(&node.allocated.gpus);
                }
            }
        }
        summary
    }

    /// GPU types configured on nodes in service, sorted. Types found only on drained or down
    /// nodes (or only in allocations) don't get a column.
    pub fn gpu_types(&self) -> Vec<&str> {
        self.configured.keys().map(String::as_str).collect()
    }

    /// Negative if the allocation data doesn't add up.
    pub fn free(&self, gpu_type: &str) -> i64 {
        self.configured
            .signed_count(gpu_type)
            .saturating_sub(self.allocated.signed_count(gpu_type))
    }

    pub fn free_total(&self) -> i64 {
        self.gpu_types()
            .into_iter()
            .map(|gpu_type| self.free(gpu_type))
            .fold(0, i64::saturating_add)
    }

    pub fn state_count(&self, state: NodeState) -> usize {
        self.state_counts.get(&state).copied().unwrap_or(0)
    }

    pub fn node_count(&self) -> usize {
        self.state_counts.values().sum()
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod test {
    use super::*;
    use crate::resources::Resources;

    fn node(name: &str, state: NodeState, configured: &[(&str, u64)], allocated: &[(&str, u64)]) -> Node {
        Node {
            name: name.to_owned(),
            state,
            configured: Resources {
                gpus: configured.iter().copied().collect(),
                ..Resources::default()
            },
            allocated: Resources {
                gpus: allocated.iter().copied().collect(),
                ..Resources::default()
            },
            reason: match state {
                NodeState::Drain | NodeState::Down => format!("{name} broke"),
                _ => String::new(),
            },
        }
    }

    #[test]
    fn NodeSummary__from_nodes__buckets() {
        let nodes = [
            node("d1", NodeState::Drain, &[("a100", 2)], &[]),
            node("i1", NodeState::Idle, &[("a100", 4)], &[("a100", 1)]),
            node("m1", NodeState::Mixed, &[("a100", 4), ("v100", 2)], &[("a100", 4)]),
            node("x1", NodeState::Down, &[("v100", 8)], &[]),
            node("o1", NodeState::Other, &[("h100", 1)], &[]),
        ];
        let summary = NodeSummary::from_nodes(&nodes);

        assert_eq!(summary.configured, [("a100", 8), ("h100", 1), ("v100", 2)].into_iter().collect());
        assert_eq!(summary.allocated, [("a100", 5)].into_iter().collect());
        assert_eq!(summary.drain, [("a100", 2)].into_iter().collect());
        assert_eq!(summary.down, [("v100", 8)].into_iter().collect());
        assert_eq!(summary.gpu_types(), ["a100", "h100", "v100"]);
        assert_eq!(summary.free("a100"), 3);
        assert_eq!(summary.free("v100"), 2);
        assert_eq!(
            summary.drained_nodes,
            [NodeNote {
                name: "d1".into(),
                reason: "d1 broke".into()
            }]
        );
        assert_eq!(summary.down_nodes.len(), 1);
    }

    #[test]
    fn NodeSummary__gpu_types__configured_only() {
        let nodes = [
            node("i1", NodeState::Idle, &[("a100", 4)], &[("a100", 1)]),
            node("x1", NodeState::Down, &[("v100", 8)], &[]),
            node("d1", NodeState::Drain, &[("h100", 2), ("a100", 2)], &[]),
        ];
        let summary = NodeSummary::from_nodes(&nodes);
        assert_eq!(summary.gpu_types(), ["a100"]);
        assert_eq!(summary.down.count("v100"), 8);
        assert_eq!(summary.free_total(), 3);
    }

    #[test]
    fn NodeSummary__free__saturates() {
        let nodes = [
            node("a", NodeState::Idle, &[("a100", u64::MAX)], &[]),
            node("b", NodeState::Idle, &[("a100", 4)], &[]),
            node("c", NodeState::Mixed, &[("l40", 1)], &[("l40", u64::MAX)]),
        ];
        let summary = NodeSummary::from_nodes(&nodes);
        assert_eq!(summary.configured.count("a100"), u64::MAX);
        assert_eq!(summary.free("a100"), i64::MAX);
        assert_eq!(summary.free("l40"), 1 - i64::MAX);
        assert_eq!(summary.free_total(), 1);
    }

    #[test]
    fn NodeSummary__free__sums_to_total() {
        let nodes = [
            node("a", NodeState::Allocated, &[("a100", 4), ("l40", 2)], &[("a100", 4), ("l40", 1)]),
            node("b", NodeState::Mixed, &[("a100", 4)], &[("a100", 1)]),
            node("c", NodeState::Idle, &[("l40", 2)], &[]),
        ];
        let summary = NodeSummary::from_nodes(&nodes);
        for gpu_type in summary.gpu_types() {
            assert_eq!(
                summary.free(gpu_type),
                summary.configured.count(gpu_type) as i64 - summary.allocated.count(gpu_type) as i64
            );
        }
        let sum: i64 = summary.gpu_types().into_iter().map(|t| summary.free(t)).sum();
        assert_eq!(sum, summary.free_total());
        assert_eq!(summary.free_total(), 6);
    }

    #[test]
    fn NodeSummary__free__not_clamped() {
        let nodes = [node("a", NodeState::Mixed, &[("a100", 1)], &[("a100", 3)])];
        let summary = NodeSummary::from_nodes(&nodes);
        assert_eq!(summary.free("a100"), -2);
        assert_eq!(summary.free_total(), -2);
    }

    #[test]
    fn NodeSummary__state_counts() {
        let nodes = [
            node("a", NodeState::Idle, &[], &[]),
            node("b", NodeState::Idle, &[], &[]),
            node("c", NodeState::Drain, &[], &[]),
        ];
        let summary = NodeSummary::from_nodes(&nodes);
        assert_eq!(summary.state_count(NodeState::Idle), 2);
        assert_eq!(summary.state_count(NodeState::Drain), 1);
        assert_eq!(summary.state_count(NodeState::Mixed), 0);
        assert_eq!(summary.node_count(), 3);
        assert_eq!(NodeState::ALL.iter().map(|&s| summary.state_count(s)).sum::<usize>(), 3);
    }
}
