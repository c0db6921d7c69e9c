// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Simulated providers for hosts without the real hardware.
//!
//! These model each backend's partitioning behaviour closely enough to
//! drive the selector end to end against a [`graph_ir::ReferenceGraph`]:
//!
//! - [`ReferenceGpuProvider`]: claims a fixed set of builtin ops. With a
//!   CPU-fallback ratio `p > 0` it claims at most `(100 - p)%` of the plan
//!   and defers a CPU partition that takes everything left at allocation.
//! - [`ReferenceAcceleratorApiProvider`]: claims a fixed set of ops,
//!   honouring the partition limit from its options.
//! - [`ReferenceDeviceBackend`]: an NPU/TPU device context that can be made
//!   unavailable to exercise bind failures.

use crate::{
    AcceleratorApiOptions, AcceleratorApiProvider, BackendError, BackendKind, GpuDelegateOptions,
    GpuDelegateProvider, MarkerDelegate, SpecializedBackend,
};
use graph_ir::{Delegate, NodeRegistration, OpKind};

/// Builtin ops the reference GPU backend runs.
pub const DEFAULT_GPU_OPS: [OpKind; 16] = [
    OpKind::Add,
    OpKind::AveragePool2d,
    OpKind::Concatenation,
    OpKind::Conv2d,
    OpKind::DepthwiseConv2d,
    OpKind::FullyConnected,
    OpKind::Logistic,
    OpKind::MaxPool2d,
    OpKind::Mul,
    OpKind::Pad,
    OpKind::Prelu,
    OpKind::Relu,
    OpKind::Relu6,
    OpKind::Reshape,
    OpKind::ResizeBilinear,
    OpKind::Softmax,
];

/// Extra ops accepted when quantized graphs are enabled.
const QUANT_OPS: [OpKind; 2] = [OpKind::Quantize, OpKind::Dequantize];

// ── GPU ──────────────────────────────────────────────────────────

/// Simulated GPU delegate provider.
#[derive(Debug, Clone)]
pub struct ReferenceGpuProvider {
    supported: Vec<OpKind>,
    available: bool,
}

impl ReferenceGpuProvider {
    pub fn new() -> Self {
        Self::with_ops(&DEFAULT_GPU_OPS)
    }

    /// A provider that runs exactly `ops`.
    pub fn with_ops(ops: &[OpKind]) -> Self {
        Self {
            supported: ops.to_vec(),
            available: true,
        }
    }

    /// A provider whose delegate construction always fails.
    pub fn unavailable() -> Self {
        Self {
            supported: Vec::new(),
            available: false,
        }
    }
}

impl Default for ReferenceGpuProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuDelegateProvider for ReferenceGpuProvider {
    fn name(&self) -> &str {
        "reference-gpu"
    }

    fn create_delegate(&self, options: &GpuDelegateOptions) -> Result<Box<dyn Delegate>, BackendError> {
        if !self.available {
            return Err(BackendError::Unavailable {
                backend: self.name().to_string(),
                detail: "no GPU device".into(),
            });
        }
        let mut supported = self.supported.clone();
        if options.experimental.enable_quant {
            supported.extend(QUANT_OPS.into_iter().filter(|op| !self.supported.contains(op)));
        }
        tracing::debug!("reference gpu delegate: {}", options.summary());
        Ok(Box::new(ReferenceGpuDelegate {
            options: options.clone(),
            supported,
        }))
    }
}

#[derive(Debug)]
struct ReferenceGpuDelegate {
    options: GpuDelegateOptions,
    supported: Vec<OpKind>,
}

impl Delegate for ReferenceGpuDelegate {
    fn name(&self) -> &str {
        "gpu"
    }

    fn supports(&self, node: &NodeRegistration) -> bool {
        !node.is_delegated() && self.supported.contains(&node.op_kind)
    }

    fn max_delegated_partitions(&self) -> Option<usize> {
        Some(self.options.max_delegated_partitions).filter(|&n| n > 0)
    }

    fn node_budget(&self, plan_len: usize) -> Option<usize> {
        let ratio = usize::from(self.options.cpu_fallback_percentage);
        (ratio > 0).then(|| plan_len * (100 - ratio) / 100)
    }

    fn deferred(&self) -> Option<Box<dyn Delegate>> {
        (self.options.cpu_fallback_percentage > 0)
            .then(|| Box::new(CpuFallbackDelegate) as Box<dyn Delegate>)
    }
}

/// Takes every node the GPU left behind.
#[derive(Debug)]
struct CpuFallbackDelegate;

impl Delegate for CpuFallbackDelegate {
    fn name(&self) -> &str {
        "gpu-cpu-fallback"
    }

    fn supports(&self, node: &NodeRegistration) -> bool {
        !node.is_delegated()
    }
}

// ── Accelerator API ──────────────────────────────────────────────

/// Simulated accelerator-API provider.
#[derive(Debug, Clone)]
pub struct ReferenceAcceleratorApiProvider {
    supported: Vec<OpKind>,
    available: bool,
}

impl ReferenceAcceleratorApiProvider {
    pub fn new() -> Self {
        Self::with_ops(&DEFAULT_GPU_OPS)
    }

    pub fn with_ops(ops: &[OpKind]) -> Self {
        Self {
            supported: ops.to_vec(),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            supported: Vec::new(),
            available: false,
        }
    }
}

impl Default for ReferenceAcceleratorApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceleratorApiProvider for ReferenceAcceleratorApiProvider {
    fn name(&self) -> &str {
        "reference-accelerator-api"
    }

    fn create_delegate(
        &self,
        options: &AcceleratorApiOptions,
    ) -> Result<Box<dyn Delegate>, BackendError> {
        if !self.available {
            return Err(BackendError::Unavailable {
                backend: self.name().to_string(),
                detail: "accelerator API not present".into(),
            });
        }
        Ok(Box::new(AcceleratorApiDelegate {
            name: options
                .accelerator_name
                .clone()
                .unwrap_or_else(|| "accelerator-api".into()),
            supported: self.supported.clone(),
            max_partitions: options.max_delegated_partitions,
        }))
    }
}

#[derive(Debug)]
struct AcceleratorApiDelegate {
    name: String,
    supported: Vec<OpKind>,
    max_partitions: Option<usize>,
}

impl Delegate for AcceleratorApiDelegate {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, node: &NodeRegistration) -> bool {
        !node.is_delegated() && self.supported.contains(&node.op_kind)
    }

    fn max_delegated_partitions(&self) -> Option<usize> {
        self.max_partitions
    }
}

// ── Specialized devices ──────────────────────────────────────────

/// An open device context. Released on drop.
#[derive(Debug)]
struct DeviceContext {
    kind: BackendKind,
    handle: u64,
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        tracing::debug!("{} device context {} released", self.kind, self.handle);
    }
}

/// Simulated NPU/TPU backend with a device context.
#[derive(Debug)]
pub struct ReferenceDeviceBackend {
    kind: BackendKind,
    available: bool,
    context: Option<DeviceContext>,
    opens: u64,
}

impl ReferenceDeviceBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            available: true,
            context: None,
            opens: 0,
        }
    }

    /// A backend whose device never opens.
    pub fn unavailable(kind: BackendKind) -> Self {
        Self {
            available: false,
            ..Self::new(kind)
        }
    }

    /// Number of successful opens so far.
    pub fn open_count(&self) -> u64 {
        self.opens
    }
}

impl SpecializedBackend for ReferenceDeviceBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn open(&mut self) -> Result<Box<dyn Delegate>, BackendError> {
        self.release();
        if !self.available {
            return Err(BackendError::DeviceOpen {
                device: self.kind.to_string(),
                detail: "no device present".into(),
            });
        }
        self.opens += 1;
        self.context = Some(DeviceContext {
            kind: self.kind,
            handle: self.opens,
        });
        tracing::debug!("{} device context {} opened", self.kind, self.opens);
        Ok(Box::new(MarkerDelegate::new(self.kind.as_str(), self.kind.marker())))
    }

    fn release(&mut self) {
        self.context = None;
    }

    fn is_open(&self) -> bool {
        self.context.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(op: OpKind) -> NodeRegistration {
        NodeRegistration::builtin(op, vec![0], vec![1])
    }

    #[test]
    fn test_gpu_supports_default_ops() {
        let d = ReferenceGpuProvider::new()
            .create_delegate(&GpuDelegateOptions::default())
            .unwrap();
        assert!(d.supports(&node(OpKind::Conv2d)));
        assert!(!d.supports(&node(OpKind::Quantize)));
        assert!(!d.supports(&NodeRegistration::custom("decoder", vec![0], vec![1])));
        assert_eq!(d.max_delegated_partitions(), Some(1));
        assert_eq!(d.node_budget(100), None);
        assert!(d.deferred().is_none());
    }

    #[test]
    fn test_gpu_quant_ops() {
        let mut options = GpuDelegateOptions::default();
        options.experimental.enable_quant = true;
        let d = ReferenceGpuProvider::new().create_delegate(&options).unwrap();
        assert!(d.supports(&node(OpKind::Quantize)));
        assert!(d.supports(&node(OpKind::Dequantize)));
    }

    #[test]
    fn test_gpu_cpu_fallback_budget() {
        let options = GpuDelegateOptions {
            cpu_fallback_percentage: 25,
            ..Default::default()
        };
        let d = ReferenceGpuProvider::new().create_delegate(&options).unwrap();
        assert_eq!(d.node_budget(164), Some(123));
        assert_eq!(d.node_budget(3), Some(2));

        let fallback = d.deferred().unwrap();
        assert_eq!(fallback.name(), "gpu-cpu-fallback");
        assert!(fallback.supports(&NodeRegistration::custom("anything", vec![], vec![])));
    }

    #[test]
    fn test_gpu_unavailable() {
        let result = ReferenceGpuProvider::unavailable().create_delegate(&GpuDelegateOptions::default());
        assert!(matches!(result, Err(BackendError::Unavailable { .. })));
    }

    #[test]
    fn test_accelerator_api_options() {
        let options = AcceleratorApiOptions {
            max_delegated_partitions: Some(2),
            accelerator_name: Some("vendor-npu".into()),
            ..Default::default()
        };
        let d = ReferenceAcceleratorApiProvider::new().create_delegate(&options).unwrap();
        assert_eq!(d.name(), "vendor-npu");
        assert_eq!(d.max_delegated_partitions(), Some(2));

        let unset = ReferenceAcceleratorApiProvider::new()
            .create_delegate(&AcceleratorApiOptions::default())
            .unwrap();
        assert_eq!(unset.name(), "accelerator-api");
        assert_eq!(unset.max_delegated_partitions(), None);
    }

    #[test]
    fn test_device_context_lifecycle() {
        let mut backend = ReferenceDeviceBackend::new(BackendKind::Npu);
        assert!(!backend.is_open());
        let d = backend.open().unwrap();
        assert!(backend.is_open());
        assert!(d.supports(&NodeRegistration::custom("webosnpu-custom-op", vec![0], vec![1])));

        backend.open().unwrap();
        assert_eq!(backend.open_count(), 2);
        backend.release();
        assert!(!backend.is_open());
        backend.release();
    }

    #[test]
    fn test_device_unavailable() {
        let mut backend = ReferenceDeviceBackend::unavailable(BackendKind::Tpu);
        assert!(matches!(backend.open(), Err(BackendError::DeviceOpen { .. })));
        assert!(!backend.is_open());
        assert_eq!(backend.marker(), "edgetpu-custom-op");
    }
}
