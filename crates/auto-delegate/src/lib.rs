// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # auto-delegate
//!
//! Policy-driven delegate selection for graph executors.
//!
//! The selector takes:
//! - A borrowed graph implementing `GraphExecutor` from `graph-ir`.
//! - An `AccelerationPolicy` from `accel-policy`.
//! - Whatever providers from `delegate-backends` were composed into it.
//!
//! And binds delegates to the graph in a fixed order: specialized backends
//! whose marker appears in the plan, then the accelerator API, then the
//! GPU. After selection (and again after tensor allocation) the
//! [`GraphTester`] reports how the plan was partitioned.
//!
//! # Logging
//! All diagnostics go through `tracing`. A selector built with
//! [`SelectorBuilder::log_dispatch`] logs to that dispatcher instead of
//! the global one.
//!
//! # Example
//! ```no_run
//! use accel_policy::AccelerationPolicy;
//! use auto_delegate::{AutoDelegateSelector, GraphTester};
//! use graph_ir::{GraphExecutor, GraphManifest};
//! use std::path::Path;
//!
//! let mut graph = GraphManifest::from_file(Path::new("./graphs/face_detect.json"))
//!     .unwrap()
//!     .into_graph()
//!     .unwrap();
//! let policy = AccelerationPolicy::from_file(Path::new("./policy.json")).unwrap().policy;
//!
//! let mut selector = AutoDelegateSelector::with_reference_providers();
//! selector.select(&mut graph, &policy).unwrap();
//! graph.allocate_tensors().unwrap();
//! println!("{}", GraphTester::new(&graph).stats().unwrap());
//! ```

mod error;
mod graph_tester;
mod random;
mod report;
mod selector;

pub use error::{BindFailure, SelectionError};
pub use graph_tester::{GraphTester, PartitionStats};
pub use random::{fill_random_input_tensor, fill_random_input_tensor_with};
pub use report::{BoundDelegate, SelectionReport, SelectionStep};
pub use selector::{AutoDelegateSelector, SelectorBuilder};
