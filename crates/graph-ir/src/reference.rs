// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! In-memory reference executor.
//!
//! [`ReferenceGraph`] implements [`GraphExecutor`] over plain vectors and
//! reproduces the partitioning behaviour of a real interpreter:
//!
//! ```text
//!   plan:  CONV  CONV  ADD  CUSTOM  CONV  RELU        (6 nodes)
//!   gpu supports CONV/ADD/RELU
//!         └────────────┘          └────────┘
//!   after bind:  DELEGATE  CUSTOM  DELEGATE            (3 nodes)
//! ```
//!
//! A delegate's deferred partner (see [`Delegate::deferred`]) is applied
//! on [`allocate_tensors`](GraphExecutor::allocate_tensors), so node counts
//! observed before and after allocation differ just as they do on device.

use crate::{
    Delegate, DelegateBinding, DelegateId, GraphError, GraphExecutor, NodeRegistration, OpKind,
    Tensor,
};
use std::fmt;

/// An in-memory graph with a mutable execution plan.
#[derive(Debug)]
pub struct ReferenceGraph {
    /// Human-readable graph name.
    pub name: String,
    nodes: Vec<NodeRegistration>,
    plan: Vec<usize>,
    tensors: Vec<Tensor>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    bound: Vec<String>,
    pending: Vec<Box<dyn Delegate>>,
    allocated: bool,
}

impl ReferenceGraph {
    /// Creates a graph whose execution plan runs every node in table order.
    pub fn new(
        name: impl Into<String>,
        tensors: Vec<Tensor>,
        inputs: Vec<usize>,
        outputs: Vec<usize>,
        nodes: Vec<NodeRegistration>,
    ) -> Self {
        let plan = (0..nodes.len()).collect();
        Self {
            name: name.into(),
            nodes,
            plan,
            tensors,
            inputs,
            outputs,
            bound: Vec::new(),
            pending: Vec::new(),
            allocated: false,
        }
    }

    /// Builds a single-input linear chain: node `i` reads tensor `i` and
    /// writes tensor `i + 1`. Every tensor copies the input's type and shape.
    ///
    /// Each op is `(kind, custom_name)`.
    pub fn chain(name: impl Into<String>, input: Tensor, ops: &[(OpKind, Option<&str>)]) -> Self {
        let mut tensors = Vec::with_capacity(ops.len() + 1);
        tensors.push(input.clone());
        let mut nodes = Vec::with_capacity(ops.len());
        for (i, (kind, custom)) in ops.iter().enumerate() {
            tensors.push(Tensor::new(
                format!("t{}", i + 1),
                input.dtype,
                input.shape.clone(),
            ));
            nodes.push(NodeRegistration {
                op_kind: *kind,
                custom_name: custom.map(str::to_string),
                inputs: vec![i],
                outputs: vec![i + 1],
                delegate: None,
            });
        }
        let last = ops.len();
        Self::new(name, tensors, vec![0], vec![last], nodes)
    }

    /// Replaces the execution plan. Indices are not checked here; use
    /// [`validate`](Self::validate) or let the consumer bounds-check.
    pub fn with_execution_plan(mut self, plan: Vec<usize>) -> Self {
        self.plan = plan;
        self
    }

    /// Checks that every plan entry, graph input/output and node tensor
    /// reference resolves.
    pub fn validate(&self) -> Result<(), GraphError> {
        for position in 0..self.plan.len() {
            self.plan_node(position)?;
        }
        let tensor_count = self.tensors.len();
        for (i, node) in self.nodes.iter().enumerate() {
            for &t in node.inputs.iter().chain(node.outputs.iter()) {
                if t >= tensor_count {
                    return Err(GraphError::TensorIndexOutOfRange {
                        node: i,
                        tensor: t,
                        tensor_count,
                    });
                }
            }
        }
        for &t in self.inputs.iter().chain(self.outputs.iter()) {
            if t >= tensor_count {
                return Err(GraphError::InvalidGraph(format!(
                    "graph input/output tensor {t} out of range ({tensor_count} tensors)"
                )));
            }
        }
        Ok(())
    }

    /// Number of tensors in the graph.
    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    /// Returns `true` once [`allocate_tensors`](GraphExecutor::allocate_tensors) has succeeded.
    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// Names of the delegates bound so far, indexed by [`DelegateId`].
    pub fn bound_delegates(&self) -> &[String] {
        &self.bound
    }

    /// Number of deferred delegate partitions waiting for allocation.
    pub fn pending_delegates(&self) -> usize {
        self.pending.len()
    }

    /// Returns a summary string describing the graph.
    pub fn summary(&self) -> String {
        let delegated = self
            .plan
            .iter()
            .filter(|&&i| self.nodes.get(i).is_some_and(|n| n.is_delegated()))
            .count();
        format!(
            "Graph '{}': {} scheduled nodes ({} delegated), {} tensors, {} delegates bound",
            self.name,
            self.plan.len(),
            delegated,
            self.tensors.len(),
            self.bound.len(),
        )
    }

    fn apply(&mut self, delegate: &dyn Delegate) -> Result<DelegateBinding, GraphError> {
        delegate.prepare().map_err(|detail| GraphError::DelegateRejected {
            delegate: delegate.name().to_string(),
            detail,
        })?;

        // Candidate runs, as [start, end) plan positions.
        let mut runs: Vec<(usize, usize)> = Vec::new();
        let mut open: Option<usize> = None;
        for position in 0..self.plan.len() {
            let (_, node) = self.plan_node(position)?;
            let claimable = !node.is_delegated() && delegate.supports(node);
            match (claimable, open) {
                (true, None) => open = Some(position),
                (false, Some(start)) => {
                    runs.push((start, position));
                    open = None;
                }
                _ => {}
            }
        }
        if let Some(start) = open {
            runs.push((start, self.plan.len()));
        }

        if let Some(budget) = delegate.node_budget(self.plan.len()) {
            let mut remaining = budget;
            let mut capped = Vec::with_capacity(runs.len());
            for (start, end) in runs {
                if remaining == 0 {
                    break;
                }
                let take = (end - start).min(remaining);
                capped.push((start, start + take));
                remaining -= take;
            }
            runs = capped;
        }

        if let Some(max) = delegate.max_delegated_partitions().filter(|&m| m > 0) {
            if runs.len() > max {
                runs.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)).then(a.0.cmp(&b.0)));
                runs.truncate(max);
                runs.sort_by_key(|r| r.0);
            }
        }

        let id = DelegateId(self.bound.len());
        let name = delegate.name().to_string();
        self.bound.push(name.clone());

        let nodes_claimed: usize = runs.iter().map(|(s, e)| e - s).sum();
        let mut new_plan = Vec::with_capacity(self.plan.len() - nodes_claimed + runs.len());
        let mut position = 0;
        let mut next_run = runs.iter().peekable();
        while position < self.plan.len() {
            match next_run.peek() {
                Some(&&(start, end)) if start == position => {
                    let collapsed = self.collapse(start, end, id, &name);
                    self.nodes.push(collapsed);
                    new_plan.push(self.nodes.len() - 1);
                    position = end;
                    next_run.next();
                }
                _ => {
                    new_plan.push(self.plan[position]);
                    position += 1;
                }
            }
        }

        tracing::debug!(
            "delegate '{}' ({}) took {} nodes in {} partitions; plan {} -> {} nodes",
            name,
            id,
            nodes_claimed,
            runs.len(),
            self.plan.len(),
            new_plan.len(),
        );
        self.plan = new_plan;

        if let Some(follow_up) = delegate.deferred() {
            tracing::debug!("delegate '{}' deferred '{}' to allocation", name, follow_up.name());
            self.pending.push(follow_up);
        }

        Ok(DelegateBinding {
            id,
            name,
            partitions: runs.len(),
            nodes_claimed,
        })
    }

    /// Builds the `DELEGATE` node replacing plan positions `[start, end)`.
    fn collapse(&self, start: usize, end: usize, id: DelegateId, name: &str) -> NodeRegistration {
        let run: Vec<&NodeRegistration> = self.plan[start..end]
            .iter()
            .map(|&i| &self.nodes[i])
            .collect();
        let produced: Vec<usize> = run.iter().flat_map(|n| n.outputs.iter().copied()).collect();

        let mut inputs = Vec::new();
        for &t in run.iter().flat_map(|n| n.inputs.iter()) {
            if !produced.contains(&t) && !inputs.contains(&t) {
                inputs.push(t);
            }
        }

        let consumed_outside: Vec<usize> = self
            .plan
            .iter()
            .enumerate()
            .filter(|(p, _)| *p < start || *p >= end)
            .flat_map(|(_, &i)| self.nodes[i].inputs.iter().copied())
            .collect();
        let mut outputs = Vec::new();
        for &t in &produced {
            let escapes = self.outputs.contains(&t) || consumed_outside.contains(&t);
            if escapes && !outputs.contains(&t) {
                outputs.push(t);
            }
        }

        NodeRegistration {
            op_kind: OpKind::Delegate,
            custom_name: Some(name.to_string()),
            inputs,
            outputs,
            delegate: Some(id),
        }
    }
}

impl GraphExecutor for ReferenceGraph {
    fn execution_plan(&self) -> &[usize] {
        &self.plan
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, index: usize) -> Option<&NodeRegistration> {
        self.nodes.get(index)
    }

    fn bind_delegate(&mut self, delegate: Box<dyn Delegate>) -> Result<DelegateBinding, GraphError> {
        self.apply(delegate.as_ref())
    }

    fn allocate_tensors(&mut self) -> Result<(), GraphError> {
        self.validate()?;

        let pending = std::mem::take(&mut self.pending);
        for delegate in pending {
            self.apply(delegate.as_ref())?;
        }

        for tensor in &mut self.tensors {
            tensor.allocate();
        }
        self.allocated = true;
        tracing::debug!("{}", self.summary());
        Ok(())
    }

    fn inputs(&self) -> &[usize] {
        &self.inputs
    }

    fn outputs(&self) -> &[usize] {
        &self.outputs
    }

    fn tensor(&self, index: usize) -> Option<&Tensor> {
        self.tensors.get(index)
    }

    fn input_tensor_mut(&mut self, input: usize) -> Option<&mut Tensor> {
        let index = *self.inputs.get(input)?;
        self.tensors.get_mut(index).filter(|t| t.is_allocated())
    }
}

impl fmt::Display for ReferenceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ReferenceGraph '{}' ({} scheduled nodes):", self.name, self.plan.len())?;
        for &index in &self.plan {
            match self.nodes.get(index) {
                Some(node) => writeln!(f, "  [{index}] {}", node.summary())?,
                None => writeln!(f, "  [{index}] <out of range>")?,
            }
        }
        Ok(())
    }
}
