// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Read-only partition introspection.
//!
//! Every query walks the live execution plan; nothing is cached, so the
//! same tester observes the plan change across binding and allocation.
//!
//! Partition counting, in plan order:
//! ```text
//!   CONV CONV DELEGATE DELEGATE RELU CUSTOM
//!   └─ 1 ─┘  └── 2 ─┘ └── 3 ─┘ └──── 4 ──┘     total = 4, delegated = 2
//! ```
//! Each `DELEGATE` node is its own partition; each maximal run of ordinary
//! nodes is one more.

use graph_ir::{GraphError, GraphExecutor};
use std::fmt;

/// A snapshot of partition counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PartitionStats {
    pub total_nodes: usize,
    pub total_partitions: usize,
    pub delegated_partitions: usize,
    pub is_delegated: bool,
}

impl fmt::Display for PartitionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} partitions ({} delegated)",
            self.total_nodes, self.total_partitions, self.delegated_partitions
        )
    }
}

/// Borrows a graph and answers partition queries about it.
pub struct GraphTester<'a, G: GraphExecutor + ?Sized> {
    graph: &'a G,
}

impl<'a, G: GraphExecutor + ?Sized> GraphTester<'a, G> {
    pub fn new(graph: &'a G) -> Self {
        Self { graph }
    }

    /// Number of entries in the execution plan.
    pub fn total_node_num(&self) -> usize {
        self.graph.execution_plan().len()
    }

    /// Number of plan entries that are `DELEGATE` nodes.
    pub fn delegated_partition_num(&self) -> Result<usize, GraphError> {
        let mut delegated = 0;
        for position in 0..self.total_node_num() {
            if self.graph.plan_node(position)?.1.is_delegated() {
                delegated += 1;
            }
        }
        Ok(delegated)
    }

    /// Number of partitions: one per `DELEGATE` node plus one per maximal
    /// run of non-delegated nodes.
    pub fn total_partition_num(&self) -> Result<usize, GraphError> {
        let mut partitions = 0;
        let mut prev_delegated = false;
        for position in 0..self.total_node_num() {
            let delegated = self.graph.plan_node(position)?.1.is_delegated();
            if delegated {
                partitions += 1;
            } else if prev_delegated || position == 0 {
                partitions += 1;
            }
            prev_delegated = delegated;
        }
        Ok(partitions)
    }

    pub fn is_delegated(&self) -> Result<bool, GraphError> {
        Ok(self.delegated_partition_num()? > 0)
    }

    /// All counts at once.
    pub fn stats(&self) -> Result<PartitionStats, GraphError> {
        let delegated_partitions = self.delegated_partition_num()?;
        Ok(PartitionStats {
            total_nodes: self.total_node_num(),
            total_partitions: self.total_partition_num()?,
            delegated_partitions,
            is_delegated: delegated_partitions > 0,
        })
    }

    /// Renders every plan node with its tensors, then the graph inputs and
    /// outputs.
    pub fn preview(&self) -> Result<String, GraphError> {
        const RULE: &str = "------------------------------------------------------------";
        let mut lines = vec![RULE.to_string()];

        for position in 0..self.total_node_num() {
            let (index, node) = self.graph.plan_node(position)?;
            let owner = match (node.custom_name(), node.delegate) {
                (Some(name), Some(id)) => format!("{name} (delegate {id})"),
                (Some(name), None) => name.to_string(),
                (None, Some(id)) => format!("delegate {id}"),
                (None, None) => "NO delegate or custom".to_string(),
            };
            lines.push(format!("{index} <{}>  {owner}", node.op_kind));
            lines.push("INPUTS:".to_string());
            lines.extend(node.inputs.iter().map(|&t| self.describe_tensor(t)));
            lines.push("OUTPUTS:".to_string());
            lines.extend(node.outputs.iter().map(|&t| self.describe_tensor(t)));
            lines.push(RULE.to_string());
        }

        let inputs = self.graph.inputs();
        lines.push(format!("* Input Size : {}", inputs.len()));
        for (i, &t) in inputs.iter().enumerate() {
            lines.push(format!("\tInput Tensor {i} {}", self.describe_io(t)));
        }
        let outputs = self.graph.outputs();
        lines.push(format!("* Output Size : {}", outputs.len()));
        for (i, &t) in outputs.iter().enumerate() {
            lines.push(format!("\tOutput Tensor {i} {}", self.describe_io(t)));
        }
        Ok(lines.join("\n"))
    }

    fn describe_tensor(&self, index: usize) -> String {
        match self.graph.tensor(index) {
            Some(t) => format!("  {} ({}, {}) {}", t.name, t.dtype, index, t.shape_string()),
            None => format!("  <missing tensor {index}>"),
        }
    }

    fn describe_io(&self, index: usize) -> String {
        match self.graph.tensor(index) {
            Some(t) => format!("({}) : {}", t.name, t.shape_string()),
            None => format!("(<missing tensor {index}>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_ir::{NodeRegistration, OpKind, ReferenceGraph, Tensor, TensorType};

    fn graph_from(kinds: &[OpKind]) -> ReferenceGraph {
        let ops: Vec<(OpKind, Option<&str>)> = kinds.iter().map(|&k| (k, None)).collect();
        ReferenceGraph::chain("g", Tensor::new("in", TensorType::Float32, vec![1, 4]), &ops)
    }

    /// Builds a graph whose plan nodes are already DELEGATE/ordinary as given.
    fn pattern(delegated: &[bool]) -> ReferenceGraph {
        let kinds: Vec<OpKind> = delegated
            .iter()
            .map(|&d| if d { OpKind::Delegate } else { OpKind::Relu })
            .collect();
        graph_from(&kinds)
    }

    #[test]
    fn test_counts_on_undelegated_graph() {
        let g = pattern(&[false, false, false]);
        let t = GraphTester::new(&g);
        assert_eq!(t.total_node_num(), 3);
        assert_eq!(t.delegated_partition_num().unwrap(), 0);
        assert_eq!(t.total_partition_num().unwrap(), 1);
        assert!(!t.is_delegated().unwrap());
    }

    #[test]
    fn test_partition_patterns() {
        // (pattern, total partitions, delegated)
        let cases: [(&[bool], usize, usize); 6] = [
            (&[true], 1, 1),
            (&[true, true], 2, 2),
            (&[true, false, false], 2, 1),
            (&[false, true, false], 3, 1),
            (&[false, false, true, true, false, false], 4, 2),
            (&[true, false, true, false], 4, 2),
        ];
        for (p, total, delegated) in cases {
            let g = pattern(p);
            let t = GraphTester::new(&g);
            assert_eq!(t.total_partition_num().unwrap(), total, "pattern {p:?}");
            assert_eq!(t.delegated_partition_num().unwrap(), delegated, "pattern {p:?}");
        }
    }

    #[test]
    fn test_empty_plan() {
        let g = pattern(&[]);
        let stats = GraphTester::new(&g).stats().unwrap();
        assert_eq!(
            stats,
            PartitionStats {
                total_nodes: 0,
                total_partitions: 0,
                delegated_partitions: 0,
                is_delegated: false
            }
        );
    }

    #[test]
    fn test_out_of_range_plan_entry() {
        let g = pattern(&[false, false]).with_execution_plan(vec![0, 5]);
        let t = GraphTester::new(&g);
        assert_eq!(t.total_node_num(), 2);
        assert!(matches!(
            t.total_partition_num(),
            Err(GraphError::PlanIndexOutOfRange { index: 5, .. })
        ));
        assert!(t.stats().is_err());
        assert!(t.preview().is_err());
    }

    #[test]
    fn test_stats_display() {
        let g = pattern(&[true, false]);
        let stats = GraphTester::new(&g).stats().unwrap();
        assert_eq!(stats.to_string(), "2 nodes, 2 partitions (1 delegated)");
    }

    #[test]
    fn test_preview() {
        let mut g = ReferenceGraph::new(
            "decoder",
            vec![
                Tensor::new("image", TensorType::UInt8, vec![1, 8, 8, 3]),
                Tensor::new("boxes", TensorType::Float32, vec![1, 16]),
            ],
            vec![0],
            vec![1],
            vec![NodeRegistration::custom("decode_boxes", vec![0], vec![1])],
        );
        let text = GraphTester::new(&g).preview().unwrap();
        assert!(text.contains("0 <CUSTOM>  decode_boxes"));
        assert!(text.contains("image (uint8, 0) [1 x 8 x 8 x 3]"));
        assert!(text.contains("* Input Size : 1"));
        assert!(text.contains("\tOutput Tensor 0 (boxes) : [1 x 16]"));

        g = g.with_execution_plan(vec![]);
        let text = GraphTester::new(&g).preview().unwrap();
        assert!(!text.contains("<CUSTOM>"));
    }
}
