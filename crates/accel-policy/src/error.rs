// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for policy loading.
//!
//! Parsing policy text never fails; these cover the I/O and strict-lookup
//! paths around it.

/// Errors that can occur while loading or converting a policy.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The policy file could not be read.
    #[error("cannot read policy '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A mode name is not one of the recognised policy strings.
    #[error("unknown acceleration mode '{0}'; expected one of CPU_ONLY, MAX_PRECISION, MIN_LATENCY, LOAD_BALANCING, PYTORCH_MODEL_GPU, MIN_RES, MIN_LATENCY_MIN_RES")]
    UnknownMode(String),

    /// The policy could not be serialised back to JSON.
    #[error("policy serialise error: {0}")]
    SerializeError(#[from] serde_json::Error),
}
