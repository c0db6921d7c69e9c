// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph introspection and mutation.

/// Errors reported by a [`crate::GraphExecutor`].
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// An execution-plan entry points outside the node table.
    #[error("execution plan entry {position} refers to node {index}, but the node table has {node_count} entries")]
    PlanIndexOutOfRange {
        position: usize,
        index: usize,
        node_count: usize,
    },

    /// A node references a tensor index that does not exist.
    #[error("node {node} references tensor {tensor}, but the graph has {tensor_count} tensors")]
    TensorIndexOutOfRange {
        node: usize,
        tensor: usize,
        tensor_count: usize,
    },

    /// The executor refused a delegate.
    #[error("delegate '{delegate}' could not be applied: {detail}")]
    DelegateRejected { delegate: String, detail: String },

    /// Tensor allocation failed.
    #[error("tensor allocation failed: {0}")]
    AllocationFailed(String),

    /// The graph manifest file could not be read.
    #[error("failed to read graph manifest: {0}")]
    ManifestReadError(#[from] std::io::Error),

    /// The graph manifest JSON is malformed.
    #[error("failed to parse graph manifest: {0}")]
    ManifestParseError(#[from] serde_json::Error),

    /// The graph is structurally invalid.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
}
