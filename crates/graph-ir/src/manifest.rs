// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON graph manifest parsing.
//!
//! A manifest describes a graph's tensors, node table and (optionally) its
//! execution plan, and loads into a [`ReferenceGraph`].
//!
//! # Format
//! ```json
//! {
//!   "name": "face_detect",
//!   "tensors": [
//!     { "name": "image", "dtype": "uint8", "shape": [1, 128, 128, 3] },
//!     { "name": "features", "dtype": "float32", "shape": [1, 16, 16, 32] },
//!     { "name": "boxes", "dtype": "float32", "shape": [1, 896, 16] }
//!   ],
//!   "inputs": [0],
//!   "outputs": [2],
//!   "nodes": [
//!     { "op": "CONV_2D", "inputs": [0], "outputs": [1] },
//!     { "op": "CUSTOM", "custom_name": "decode_boxes", "inputs": [1], "outputs": [2] }
//!   ],
//!   "execution_plan": [0, 1]
//! }
//! ```
//!
//! When `execution_plan` is absent the nodes run in table order.

use crate::{GraphError, NodeRegistration, OpKind, ReferenceGraph, Tensor, TensorType};
use std::path::Path;

/// Top-level graph manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphManifest {
    /// Graph name.
    pub name: String,
    /// Tensor declarations, indexed by position.
    pub tensors: Vec<ManifestTensor>,
    /// Tensor indices of the graph inputs.
    #[serde(default)]
    pub inputs: Vec<usize>,
    /// Tensor indices of the graph outputs.
    #[serde(default)]
    pub outputs: Vec<usize>,
    /// The node table.
    pub nodes: Vec<ManifestNode>,
    /// Node indices in execution order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_plan: Option<Vec<usize>>,
}

/// A tensor declaration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestTensor {
    pub name: String,
    pub dtype: TensorType,
    #[serde(default)]
    pub shape: Vec<usize>,
}

/// A node-table entry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestNode {
    /// Operator name, matched with [`OpKind::from_str_loose`].
    pub op: String,
    /// Custom-operation name for `CUSTOM` nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<usize>,
    #[serde(default)]
    pub outputs: Vec<usize>,
}

impl GraphManifest {
    /// Loads a manifest from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Converts the manifest into a [`ReferenceGraph`].
    ///
    /// Operator names must be recognised. Index ranges are not checked; use
    /// [`into_validated_graph`](Self::into_validated_graph) for that.
    pub fn into_graph(self) -> Result<ReferenceGraph, GraphError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.into_iter().enumerate() {
            let op_kind = OpKind::from_str_loose(&node.op).ok_or_else(|| {
                GraphError::InvalidGraph(format!("node {i}: unrecognised operator '{}'", node.op))
            })?;
            if op_kind == OpKind::Custom && node.custom_name.is_none() {
                tracing::warn!("node {} is CUSTOM but has no custom_name", i);
            }
            nodes.push(NodeRegistration {
                op_kind,
                custom_name: node.custom_name,
                inputs: node.inputs,
                outputs: node.outputs,
                delegate: None,
            });
        }

        let tensors = self
            .tensors
            .into_iter()
            .map(|t| Tensor::new(t.name, t.dtype, t.shape))
            .collect();

        let graph = ReferenceGraph::new(self.name, tensors, self.inputs, self.outputs, nodes);
        Ok(match self.execution_plan {
            Some(plan) => graph.with_execution_plan(plan),
            None => graph,
        })
    }

    /// Like [`into_graph`](Self::into_graph), then runs
    /// [`ReferenceGraph::validate`].
    pub fn into_validated_graph(self) -> Result<ReferenceGraph, GraphError> {
        let graph = self.into_graph()?;
        graph.validate()?;
        Ok(graph)
    }
}
