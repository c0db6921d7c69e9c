// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # graph-ir
//!
//! The graph-executor side of delegate selection.
//!
//! The selector never owns a graph: it borrows one through the
//! [`GraphExecutor`] trait, scans its execution plan, and hands it
//! [`Delegate`]s to bind. This crate defines that contract:
//!
//! - [`OpKind`]: builtin operation kinds, `CUSTOM`, and the reserved
//!   `DELEGATE` kind that marks a collapsed delegate partition.
//! - [`NodeRegistration`]: one entry in the node table.
//! - [`Tensor`] / [`TensorType`]: typed tensor buffers, used for input
//!   fabrication in smoke tests.
//! - [`GraphExecutor`] / [`Delegate`]: the executor and delegate seams.
//! - [`ReferenceGraph`]: an in-memory executor that performs partition
//!   collapse the way a real interpreter does. Used by tests, benches and
//!   the CLI.
//! - [`GraphManifest`]: a JSON graph description that loads into a
//!   [`ReferenceGraph`].
//!
//! # Example
//! ```no_run
//! use graph_ir::{GraphExecutor, GraphManifest};
//! use std::path::Path;
//!
//! let graph = GraphManifest::from_file(Path::new("./graphs/face_detect.json"))
//!     .unwrap()
//!     .into_graph()
//!     .unwrap();
//! println!("{} nodes scheduled", graph.execution_plan().len());
//! ```

mod error;
mod executor;
mod manifest;
mod node;
pub mod reference;
mod tensor;

pub use error::GraphError;
pub use executor::{Delegate, DelegateBinding, DelegateId, GraphExecutor};
pub use manifest::{GraphManifest, ManifestNode, ManifestTensor};
pub use node::{NodeRegistration, OpKind};
pub use reference::ReferenceGraph;
pub use tensor::{Tensor, TensorData, TensorType};
