// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The executor and delegate seams.
//!
//! A [`GraphExecutor`] owns a loaded graph: a node table plus an execution
//! plan of indices into it. Callers only ever borrow it. Binding a
//! [`Delegate`] lets the executor collapse every contiguous run of nodes the
//! delegate supports into one `DELEGATE` node; this is the only mutation the
//! selector performs.

use crate::{GraphError, NodeRegistration, Tensor};
use std::fmt;

/// Identifies a delegate bound to a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelegateId(pub usize);

impl fmt::Display for DelegateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A hardware backend that can take over graph partitions.
///
/// Delegates are constructed by backend providers from explicit option
/// structs and handed to [`GraphExecutor::bind_delegate`]. The executor
/// decides the partition boundaries; the delegate only answers which nodes
/// it can run and how much of the graph it may claim.
pub trait Delegate: fmt::Debug + Send {
    /// Human-readable backend name, recorded on the collapsed nodes.
    fn name(&self) -> &str;

    /// Returns `true` if this delegate can execute `node`.
    fn supports(&self, node: &NodeRegistration) -> bool;

    /// Upper bound on the number of partitions this delegate may own.
    fn max_delegated_partitions(&self) -> Option<usize> {
        None
    }

    /// Upper bound on the number of plan nodes this delegate may claim,
    /// given the current plan length.
    fn node_budget(&self, _plan_len: usize) -> Option<usize> {
        None
    }

    /// Runs backend-side preparation before partitioning. An error here
    /// makes the bind fail.
    fn prepare(&self) -> Result<(), String> {
        Ok(())
    }

    /// A follow-up delegate the executor applies when tensors are
    /// allocated. Load-balancing backends use this to hand their
    /// CPU-fallback share to a separate partition.
    fn deferred(&self) -> Option<Box<dyn Delegate>> {
        None
    }
}

/// What a successful bind did to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateBinding {
    /// Id assigned by the executor.
    pub id: DelegateId,
    /// Name of the bound delegate.
    pub name: String,
    /// Number of partitions the delegate took over.
    pub partitions: usize,
    /// Number of plan nodes absorbed into those partitions.
    pub nodes_claimed: usize,
}

/// A loaded, topologically ordered computation graph.
pub trait GraphExecutor {
    /// The execution plan: node-table indices in execution order.
    fn execution_plan(&self) -> &[usize];

    /// Number of entries in the node table.
    fn node_count(&self) -> usize;

    /// Returns the node-table entry at `index`, or `None` when out of range.
    fn node(&self, index: usize) -> Option<&NodeRegistration>;

    /// Resolves the plan entry at `position` to its node.
    ///
    /// The node index is checked against the node table before the table is
    /// touched; an out-of-range index is a [`GraphError::PlanIndexOutOfRange`].
    fn plan_node(&self, position: usize) -> Result<(usize, &NodeRegistration), GraphError> {
        let index = *self.execution_plan().get(position).ok_or_else(|| {
            GraphError::InvalidGraph(format!(
                "execution plan has {} entries, no position {position}",
                self.execution_plan().len(),
            ))
        })?;
        let node_count = self.node_count();
        if index >= node_count {
            return Err(GraphError::PlanIndexOutOfRange {
                position,
                index,
                node_count,
            });
        }
        self.node(index)
            .map(|node| (index, node))
            .ok_or(GraphError::PlanIndexOutOfRange {
                position,
                index,
                node_count,
            })
    }

    /// Hands a delegate to the executor, which partitions the graph for it.
    fn bind_delegate(&mut self, delegate: Box<dyn Delegate>) -> Result<DelegateBinding, GraphError>;

    /// Allocates tensor buffers. Deferred delegate partitions materialise here.
    fn allocate_tensors(&mut self) -> Result<(), GraphError>;

    /// Tensor indices of the graph inputs.
    fn inputs(&self) -> &[usize];

    /// Number of graph inputs.
    fn input_count(&self) -> usize {
        self.inputs().len()
    }

    /// Tensor indices of the graph outputs.
    fn outputs(&self) -> &[usize];

    /// Returns the tensor at `index`.
    fn tensor(&self, index: usize) -> Option<&Tensor>;

    /// Returns the `input`-th graph input tensor for writing, or `None` when
    /// it cannot be resolved (unknown input or not yet allocated).
    fn input_tensor_mut(&mut self, input: usize) -> Option<&mut Tensor>;
}
