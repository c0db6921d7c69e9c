// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for delegate selection.

use delegate_backends::{BackendError, BackendKind};
use graph_ir::GraphError;

/// Why a delegate could not be bound: either the backend would not build
/// it, or the graph refused it.
#[derive(Debug, thiserror::Error)]
pub enum BindFailure {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors that abort a selection.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    /// The graph could not be read, e.g. an execution-plan entry is out of
    /// range of the node table.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// The graph is pre-compiled for a specialized backend that could not be
    /// bound.
    #[error("{kind} backend bind failed: {source}")]
    SpecializedBackend {
        kind: BackendKind,
        #[source]
        source: BindFailure,
    },

    /// The accelerator-API delegate could not be bound.
    #[error("accelerator-API delegate bind failed: {source}")]
    AcceleratorApi {
        #[source]
        source: BindFailure,
    },

    /// The GPU delegate could not be bound.
    #[error("GPU delegate bind failed: {source}")]
    Gpu {
        #[source]
        source: BindFailure,
    },

    /// The graph already has delegate partitions; rebinding is unsupported.
    #[error("graph already has {delegated} delegated partition(s)")]
    AlreadyDelegated { delegated: usize },

    /// The first graph input cannot be resolved (unknown, or not allocated).
    #[error("input tensor {input} is not available")]
    InputTensorUnavailable { input: usize },
}

impl SelectionError {
    /// Returns `true` if the execution plan referenced a missing node.
    pub fn is_plan_index_error(&self) -> bool {
        matches!(
            self,
            Self::Graph(GraphError::PlanIndexOutOfRange { .. })
                | Self::SpecializedBackend {
                    source: BindFailure::Graph(GraphError::PlanIndexOutOfRange { .. }),
                    ..
                }
                | Self::AcceleratorApi {
                    source: BindFailure::Graph(GraphError::PlanIndexOutOfRange { .. })
                }
                | Self::Gpu {
                    source: BindFailure::Graph(GraphError::PlanIndexOutOfRange { .. })
                }
        )
    }
}
