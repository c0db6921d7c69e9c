// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Backend provider traits.
//!
//! The selector is written once against these traits. Which providers are
//! present is decided when the selector is composed; an absent provider
//! simply skips its step.

use crate::{AcceleratorApiOptions, BackendError, GpuDelegateOptions};
use graph_ir::{Delegate, NodeRegistration};

/// Custom-op name marking a graph compiled for the NPU.
pub const NPU_MARKER: &str = "webosnpu-custom-op";

/// Custom-op name marking a graph compiled for the TPU.
pub const TPU_MARKER: &str = "edgetpu-custom-op";

/// Constructs the general-purpose GPU delegate.
pub trait GpuDelegateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Builds a delegate from `options`. Binding happens separately.
    fn create_delegate(&self, options: &GpuDelegateOptions) -> Result<Box<dyn Delegate>, BackendError>;
}

/// Constructs the accelerator-API delegate used by the resource-minimising
/// modes.
pub trait AcceleratorApiProvider: Send + Sync {
    fn name(&self) -> &str;

    fn create_delegate(
        &self,
        options: &AcceleratorApiOptions,
    ) -> Result<Box<dyn Delegate>, BackendError>;
}

/// Specialized hardware a graph can be pre-compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Npu,
    Tpu,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Npu => "npu",
            Self::Tpu => "tpu",
        }
    }

    /// The marker op name graphs compiled for this backend carry.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Npu => NPU_MARKER,
            Self::Tpu => TPU_MARKER,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A backend for graphs pre-compiled for specific hardware.
///
/// Opening may acquire a device context or load a library. Whatever was
/// acquired stays held until [`release`](Self::release) or drop, and is
/// released before a second `open`.
pub trait SpecializedBackend: std::fmt::Debug + Send {
    fn kind(&self) -> BackendKind;

    /// Custom-op name that identifies graphs for this backend.
    fn marker(&self) -> &str {
        self.kind().marker()
    }

    /// Acquires the backend and returns a delegate for the marker ops.
    fn open(&mut self) -> Result<Box<dyn Delegate>, BackendError>;

    /// Drops any held context. Safe to call when nothing is open.
    fn release(&mut self);

    fn is_open(&self) -> bool;
}

/// A delegate that claims every custom node carrying one marker name.
#[derive(Debug, Clone)]
pub struct MarkerDelegate {
    name: String,
    marker: String,
}

impl MarkerDelegate {
    pub fn new(name: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marker: marker.into(),
        }
    }
}

impl Delegate for MarkerDelegate {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, node: &NodeRegistration) -> bool {
        !node.is_delegated() && node.custom_name() == Some(self.marker.as_str())
    }
}
