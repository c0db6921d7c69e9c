// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # accel-policy
//!
//! The acceleration policy handed to the delegate selector: which mode to
//! run in, how much work the load-balancing GPU backend may hand back to the
//! CPU, and where the GPU and accelerator-API backends may cache compiled
//! artefacts.
//!
//! Policies come from a small JSON document:
//! ```json
//! {
//!   "policy": "LOAD_BALANCING",
//!   "cpu_fallback_percentage": 25,
//!   "serialization": { "dir_path": "/usr/share/aif", "model_token": "pose2d_gpu_mid" }
//! }
//! ```
//! Parsing never fails. Every malformed or missing field falls back to its
//! default on its own, and each such fallback is reported as a
//! [`PolicyDiagnostic`].
//!
//! # Example
//! ```
//! use accel_policy::{AccelerationMode, AccelerationPolicy};
//!
//! let policy = AccelerationPolicy::parse(r#"{"policy":"MIN_LATENCY"}"#);
//! assert_eq!(policy.mode(), AccelerationMode::MinimumLatency);
//! ```

mod document;
mod error;
mod mode;
mod policy;

pub use document::{ParsedPolicy, PolicyDiagnostic};
pub use error::PolicyError;
pub use mode::AccelerationMode;
pub use policy::{AccelerationPolicy, AcceleratorCache, GpuResultCache};
