// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The delegate selector.
//!
//! One call to [`AutoDelegateSelector::select`] runs a single pass over a
//! borrowed graph:
//!
//! ```text
//!   ratio check ──▶ marker scan ──▶ accelerator API ──▶ GPU
//!   (warn only)     (npu / tpu)     (MIN_RES modes)     (all but CPU_ONLY)
//!                        │
//!                        └─ matched: stop here, unless configured to continue
//! ```
//!
//! Any bind that is attempted and fails aborts the selection. Steps gated
//! off by the mode, or whose provider is not composed in, are skipped.

use crate::{BindFailure, GraphTester, SelectionError, SelectionReport, SelectionStep};
use accel_policy::{AccelerationMode, AccelerationPolicy, AcceleratorCache};
use delegate_backends::{
    AcceleratorApiOptions, AcceleratorApiProvider, BackendKind, GpuDelegateOptions,
    GpuDelegateProvider, GraphicsApi, InferencePriority, PlatformProbe, ReferenceAcceleratorApiProvider,
    ReferenceDeviceBackend, ReferenceGpuProvider, SpecializedBackend, SysfsProbe,
};
use graph_ir::GraphExecutor;
use std::time::Instant;

// ── Builder ────────────────────────────────────────────────────

/// Composes an [`AutoDelegateSelector`] from optional providers.
#[derive(Default)]
pub struct SelectorBuilder {
    gpu: Option<Box<dyn GpuDelegateProvider>>,
    accelerator_api: Option<Box<dyn AcceleratorApiProvider>>,
    specialized: Vec<Box<dyn SpecializedBackend>>,
    probe: Option<Box<dyn PlatformProbe>>,
    continue_after_specialized: bool,
    dispatch: Option<tracing::Dispatch>,
}

impl SelectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gpu_provider(mut self, provider: impl GpuDelegateProvider + 'static) -> Self {
        self.gpu = Some(Box::new(provider));
        self
    }

    pub fn accelerator_api_provider(mut self, provider: impl AcceleratorApiProvider + 'static) -> Self {
        self.accelerator_api = Some(Box::new(provider));
        self
    }

    /// Adds a specialized backend. Markers are matched in the order
    /// backends were added.
    pub fn specialized_backend(mut self, backend: impl SpecializedBackend + 'static) -> Self {
        self.specialized.push(Box::new(backend));
        self
    }

    pub fn platform_probe(mut self, probe: impl PlatformProbe + 'static) -> Self {
        self.probe = Some(Box::new(probe));
        self
    }

    /// Keep going to the accelerator-API and GPU steps after a specialized
    /// backend was bound. Off by default.
    pub fn continue_after_specialized(mut self, enabled: bool) -> Self {
        self.continue_after_specialized = enabled;
        self
    }

    /// Routes all selection logging to `dispatch` instead of the global
    /// subscriber.
    pub fn log_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn build(self) -> AutoDelegateSelector {
        AutoDelegateSelector {
            gpu: self.gpu,
            accelerator_api: self.accelerator_api,
            specialized: self.specialized,
            probe: self.probe,
            continue_after_specialized: self.continue_after_specialized,
            dispatch: self.dispatch,
        }
    }
}

// ── Selector ───────────────────────────────────────────────────

/// Chooses and binds delegates for a graph according to a policy.
///
/// # Example
/// ```
/// use accel_policy::AccelerationPolicy;
/// use auto_delegate::{AutoDelegateSelector, GraphTester};
/// use graph_ir::{OpKind, ReferenceGraph, Tensor, TensorType};
///
/// let mut graph = ReferenceGraph::chain(
///     "demo",
///     Tensor::new("x", TensorType::Float32, vec![1, 8]),
///     &[(OpKind::Conv2d, None), (OpKind::Relu, None)],
/// );
/// let policy = AccelerationPolicy::parse(r#"{"policy":"MIN_LATENCY"}"#);
///
/// let mut selector = AutoDelegateSelector::with_reference_providers();
/// let report = selector.select(&mut graph, &policy).unwrap();
/// assert!(report.is_delegating());
/// assert!(GraphTester::new(&graph).is_delegated().unwrap());
/// ```
pub struct AutoDelegateSelector {
    gpu: Option<Box<dyn GpuDelegateProvider>>,
    accelerator_api: Option<Box<dyn AcceleratorApiProvider>>,
    specialized: Vec<Box<dyn SpecializedBackend>>,
    probe: Option<Box<dyn PlatformProbe>>,
    continue_after_specialized: bool,
    dispatch: Option<tracing::Dispatch>,
}

impl AutoDelegateSelector {
    pub fn builder() -> SelectorBuilder {
        SelectorBuilder::new()
    }

    /// A selector over the simulated providers, with both specialized
    /// device backends and the live sysfs probe.
    pub fn with_reference_providers() -> Self {
        Self::builder()
            .gpu_provider(ReferenceGpuProvider::new())
            .accelerator_api_provider(ReferenceAcceleratorApiProvider::new())
            .specialized_backend(ReferenceDeviceBackend::new(BackendKind::Npu))
            .specialized_backend(ReferenceDeviceBackend::new(BackendKind::Tpu))
            .platform_probe(SysfsProbe::new())
            .build()
    }

    /// The composed specialized backends.
    pub fn specialized_backends(&self) -> &[Box<dyn SpecializedBackend>] {
        &self.specialized
    }

    /// Releases every open specialized device context.
    pub fn release_devices(&mut self) {
        for backend in &mut self.specialized {
            if backend.is_open() {
                tracing::debug!("releasing {} backend", backend.kind());
            }
            backend.release();
        }
    }

    /// Runs delegate selection for `graph` under `policy`.
    ///
    /// Contexts held from a previous selection are released before any new
    /// bind; a graph that is already delegated is refused without touching
    /// them. On error, delegates bound before the failing step stay bound.
    pub fn select<G: GraphExecutor + ?Sized>(
        &mut self,
        graph: &mut G,
        policy: &AccelerationPolicy,
    ) -> Result<SelectionReport, SelectionError> {
        match self.dispatch.clone() {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, || self.run(graph, policy)),
            None => self.run(graph, policy),
        }
    }

    /// Builds the GPU delegate options `policy` calls for.
    pub fn gpu_options(&self, policy: &AccelerationPolicy) -> GpuDelegateOptions {
        let mode = policy.mode();
        let mut options = GpuDelegateOptions::default();

        if mode.prioritizes_latency() {
            options.prioritize(InferencePriority::MinLatency);
            options.cpu_fallback_percentage = 0;
            options.is_pytorch_converted_model = false;
        } else if mode.honours_cpu_fallback() {
            options.prioritize(self.balanced_priority());
            options.cpu_fallback_percentage = policy.cpu_fallback_percentage();
            options.is_pytorch_converted_model = mode == AccelerationMode::PytorchModelGpu;
        }

        let cache = policy.gpu_cache();
        if cache.use_cache {
            options.enable_serialization = true;
            options.serialization_dir = cache.dir_path.clone();
            options.model_token = cache.model_token.clone();
        }

        options.experimental.enable_quant = true;
        options.experimental.graphics_api = GraphicsApi::compiled();
        options
    }

    /// Maps the accelerator cache onto accelerator-API options. Fields at
    /// their unset value are logged and left unset.
    pub fn accelerator_api_options(cache: &AcceleratorCache) -> AcceleratorApiOptions {
        let mut options = AcceleratorApiOptions::default();

        if cache.has_cache_location() {
            options.cache_dir = Some(cache.cache_dir.clone());
            options.model_token = Some(cache.model_token.clone());
        } else {
            tracing::info!("accelerator cache location unset; compiled-model caching off");
        }

        if cache.disallow_cpu_fallback {
            options.disallow_cpu_fallback = Some(true);
        } else {
            tracing::info!("disallow_nnapi_cpu unset; accelerator may fall back to CPU");
        }

        if cache.max_delegated_partitions > AcceleratorCache::UNSET_MAX_PARTITIONS {
            options.max_delegated_partitions = usize::try_from(cache.max_delegated_partitions).ok();
        } else {
            tracing::info!("max_number_delegated_partitions unset; using backend limit");
        }

        if cache.accelerator_name.is_empty() {
            tracing::info!("accelerator_name unset; backend picks the accelerator");
        } else {
            options.accelerator_name = Some(cache.accelerator_name.clone());
        }
        options
    }

    /// Priority for the load-balancing modes: minimum memory usage, or
    /// minimum latency on vendors that prefer it.
    fn balanced_priority(&self) -> InferencePriority {
        let vendor = self.probe.as_ref().and_then(|p| p.gpu_vendor());
        match vendor {
            Some(v) if v.prefers_min_latency() => {
                tracing::debug!("{} GPU: prioritising minimum latency", v);
                InferencePriority::MinLatency
            }
            _ => InferencePriority::MinMemoryUsage,
        }
    }

    fn run<G: GraphExecutor + ?Sized>(
        &mut self,
        graph: &mut G,
        policy: &AccelerationPolicy,
    ) -> Result<SelectionReport, SelectionError> {
        let started = Instant::now();
        let mode = policy.mode();
        let mut report = SelectionReport::new(mode);
        tracing::info!("selecting delegates: {}", policy.summary());

        let delegated = GraphTester::new(&*graph).delegated_partition_num()?;
        if delegated > 0 {
            return Err(SelectionError::AlreadyDelegated { delegated });
        }

        self.release_devices();

        if policy.ratio_ignored() {
            tracing::warn!(
                "cpu_fallback_percentage {} is ignored under {}",
                policy.cpu_fallback_percentage(),
                mode,
            );
            report.ratio_ignored = true;
        }

        let matched = self.bind_specialized(graph, &mut report)?;
        if matched && !self.continue_after_specialized {
            report.short_circuited = true;
        } else {
            if mode.minimizes_resources() {
                self.bind_accelerator_api(graph, policy, &mut report)?;
            }
            if mode.uses_gpu() {
                self.bind_gpu(graph, policy, &mut report)?;
            }
        }

        report.duration = started.elapsed();
        tracing::info!("{}", report.summary());
        Ok(report)
    }

    /// Scans the plan for backend markers and binds each matched backend
    /// once. Returns whether anything matched.
    fn bind_specialized<G: GraphExecutor + ?Sized>(
        &mut self,
        graph: &mut G,
        report: &mut SelectionReport,
    ) -> Result<bool, SelectionError> {
        let mut matched: Vec<usize> = Vec::new();
        for position in 0..graph.execution_plan().len() {
            let (index, node) = graph.plan_node(position)?;
            let Some(name) = node.custom_name() else {
                continue;
            };
            if let Some(b) = self.specialized.iter().position(|b| b.marker() == name) {
                if !matched.contains(&b) {
                    tracing::info!(
                        "node {} carries marker '{}': graph compiled for {}",
                        index,
                        name,
                        self.specialized[b].kind(),
                    );
                    matched.push(b);
                }
            }
        }

        for &b in &matched {
            let backend = &mut self.specialized[b];
            let kind = backend.kind();
            let failed = |source: BindFailure| {
                tracing::error!("{} backend bind failed: {}", kind, source);
                SelectionError::SpecializedBackend { kind, source }
            };
            let delegate = backend.open().map_err(|e| failed(e.into()))?;
            let binding = graph.bind_delegate(delegate).map_err(|e| failed(e.into()))?;
            report.record(SelectionStep::Specialized(kind), binding);
        }
        Ok(!matched.is_empty())
    }

    fn bind_accelerator_api<G: GraphExecutor + ?Sized>(
        &self,
        graph: &mut G,
        policy: &AccelerationPolicy,
        report: &mut SelectionReport,
    ) -> Result<(), SelectionError> {
        let Some(provider) = &self.accelerator_api else {
            tracing::warn!("{} requested but no accelerator-API provider is composed in", policy.mode());
            return Ok(());
        };
        let options = Self::accelerator_api_options(policy.accelerator_cache());
        tracing::debug!("accelerator-API options: {}", options.summary());

        let failed = |source: BindFailure| {
            tracing::error!("accelerator-API delegate ({}) bind failed: {}", provider.name(), source);
            SelectionError::AcceleratorApi { source }
        };
        let delegate = provider.create_delegate(&options).map_err(|e| failed(e.into()))?;
        let binding = graph.bind_delegate(delegate).map_err(|e| failed(e.into()))?;
        report.record(SelectionStep::AcceleratorApi, binding);
        report.accelerator_api_options = Some(options);
        Ok(())
    }

    fn bind_gpu<G: GraphExecutor + ?Sized>(
        &self,
        graph: &mut G,
        policy: &AccelerationPolicy,
        report: &mut SelectionReport,
    ) -> Result<(), SelectionError> {
        let Some(provider) = &self.gpu else {
            tracing::warn!("{} requested but no GPU provider is composed in", policy.mode());
            return Ok(());
        };
        let options = self.gpu_options(policy);
        tracing::debug!("GPU options: {}", options.summary());

        let failed = |source: BindFailure| {
            tracing::error!("GPU delegate ({}) bind failed: {}", provider.name(), source);
            SelectionError::Gpu { source }
        };
        let delegate = provider.create_delegate(&options).map_err(|e| failed(e.into()))?;
        let binding = graph.bind_delegate(delegate).map_err(|e| failed(e.into()))?;
        report.record(SelectionStep::Gpu, binding);
        report.gpu_options = Some(options);
        Ok(())
    }
}

impl Drop for AutoDelegateSelector {
    fn drop(&mut self) {
        self.release_devices();
    }
}

impl std::fmt::Debug for AutoDelegateSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoDelegateSelector")
            .field("gpu", &self.gpu.as_ref().map(|p| p.name()))
            .field("accelerator_api", &self.accelerator_api.as_ref().map(|p| p.name()))
            .field("specialized", &self.specialized)
            .field("has_probe", &self.probe.is_some())
            .field("continue_after_specialized", &self.continue_after_specialized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accel_policy::GpuResultCache;
    use delegate_backends::{BackendError, GpuVendor, MarkerDelegate, StaticProbe, NPU_MARKER};
    use graph_ir::{Delegate, OpKind, ReferenceGraph, Tensor, TensorType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// NPU backend whose open and live context counts outlive the selector.
    #[derive(Debug, Default)]
    struct CountingBackend {
        opens: Arc<AtomicUsize>,
        live: Arc<AtomicUsize>,
        open: bool,
    }

    impl SpecializedBackend for CountingBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Npu
        }

        fn open(&mut self) -> Result<Box<dyn Delegate>, BackendError> {
            self.release();
            self.opens.fetch_add(1, Ordering::SeqCst);
            self.live.fetch_add(1, Ordering::SeqCst);
            self.open = true;
            Ok(Box::new(MarkerDelegate::new("npu", NPU_MARKER)))
        }

        fn release(&mut self) {
            if std::mem::take(&mut self.open) {
                self.live.fetch_sub(1, Ordering::SeqCst);
            }
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    fn graph(ops: &[(OpKind, Option<&str>)]) -> ReferenceGraph {
        ReferenceGraph::chain("g", Tensor::new("in", TensorType::Float32, vec![1, 8]), ops)
    }

    fn gpu_only(probe: Option<GpuVendor>) -> AutoDelegateSelector {
        AutoDelegateSelector::builder()
            .gpu_provider(ReferenceGpuProvider::new())
            .platform_probe(StaticProbe(probe))
            .build()
    }

    #[test]
    fn test_gpu_options_min_latency() {
        let s = gpu_only(None);
        let o = s.gpu_options(&AccelerationPolicy::with_mode(AccelerationMode::MinimumLatency));
        assert_eq!(o.inference_priority1, InferencePriority::MinLatency);
        assert_eq!(o.inference_priority2, InferencePriority::Auto);
        assert_eq!(o.inference_priority3, InferencePriority::Auto);
        assert_eq!(o.cpu_fallback_percentage, 0);
        assert!(!o.is_pytorch_converted_model);
        assert!(o.experimental.enable_quant);
    }

    #[test]
    fn test_gpu_options_composite_is_latency() {
        let s = gpu_only(None);
        let o = s.gpu_options(&AccelerationPolicy::with_mode(
            AccelerationMode::MinimizeLatencyAndResourceUse,
        ));
        assert_eq!(o.inference_priority1, InferencePriority::MinLatency);
    }

    #[test]
    fn test_gpu_options_load_balancing() {
        let mut policy = AccelerationPolicy::new();
        policy.enable_load_balancing(25);

        let o = gpu_only(None).gpu_options(&policy);
        assert_eq!(o.inference_priority1, InferencePriority::MinMemoryUsage);
        assert_eq!(o.cpu_fallback_percentage, 25);
        assert!(!o.is_pytorch_converted_model);

        let o = gpu_only(Some(GpuVendor::ArmMali)).gpu_options(&policy);
        assert_eq!(o.inference_priority1, InferencePriority::MinLatency);
        assert_eq!(o.cpu_fallback_percentage, 25);

        let o = gpu_only(Some(GpuVendor::QualcommAdreno)).gpu_options(&policy);
        assert_eq!(o.inference_priority1, InferencePriority::MinMemoryUsage);
    }

    #[test]
    fn test_gpu_options_pytorch() {
        let mut policy = AccelerationPolicy::new();
        policy.enable_load_balancing(40);
        policy.set_mode(AccelerationMode::PytorchModelGpu);

        let o = gpu_only(None).gpu_options(&policy);
        assert!(o.is_pytorch_converted_model);
        assert_eq!(o.cpu_fallback_percentage, 40);
        assert_eq!(o.inference_priority1, InferencePriority::MinMemoryUsage);
    }

    #[test]
    fn test_gpu_options_max_precision_defaults() {
        let mut policy = AccelerationPolicy::new();
        policy.enable_load_balancing(40);
        policy.set_mode(AccelerationMode::MaximumPrecision);

        let o = gpu_only(None).gpu_options(&policy);
        let defaults = GpuDelegateOptions::default();
        assert_eq!(o.inference_priority1, defaults.inference_priority1);
        assert_eq!(o.cpu_fallback_percentage, 0);
    }

    #[test]
    fn test_gpu_options_serialization() {
        let mut policy = AccelerationPolicy::with_mode(AccelerationMode::MinimumLatency);
        policy.set_gpu_cache(GpuResultCache::new("/usr/share/aif", "pose2d_gpu_mid"));
        let o = gpu_only(None).gpu_options(&policy);
        assert!(o.enable_serialization);
        assert_eq!(o.serialization_dir, "/usr/share/aif");
        assert_eq!(o.model_token, "pose2d_gpu_mid");
    }

    #[test]
    fn test_accelerator_api_options_only_set_fields() {
        let unset = AutoDelegateSelector::accelerator_api_options(&AcceleratorCache::default());
        assert_eq!(unset, AcceleratorApiOptions::default());

        let mut cache = AcceleratorCache::new("/cache", "tok");
        cache.disallow_cpu_fallback = true;
        cache.max_delegated_partitions = 3;
        cache.accelerator_name = "npu".into();
        let o = AutoDelegateSelector::accelerator_api_options(&cache);
        assert_eq!(o.cache_dir.as_deref(), Some("/cache"));
        assert_eq!(o.model_token.as_deref(), Some("tok"));
        assert_eq!(o.disallow_cpu_fallback, Some(true));
        assert_eq!(o.max_delegated_partitions, Some(3));
        assert_eq!(o.accelerator_name.as_deref(), Some("npu"));

        let half = AutoDelegateSelector::accelerator_api_options(&AcceleratorCache::new("/cache", ""));
        assert!(half.cache_dir.is_none());
        assert!(half.model_token.is_none());
    }

    #[test]
    fn test_cpu_only_binds_nothing() {
        let mut g = graph(&[(OpKind::Conv2d, None), (OpKind::Relu, None)]);
        let mut s = gpu_only(None);
        let report = s.select(&mut g, &AccelerationPolicy::new()).unwrap();
        assert!(!report.is_delegating());
        assert!(report.gpu_options.is_none());
        assert_eq!(g.execution_plan().len(), 2);
    }

    #[test]
    fn test_min_latency_binds_gpu() {
        let mut g = graph(&[(OpKind::Conv2d, None), (OpKind::Relu, None), (OpKind::Custom, Some("nms"))]);
        let mut s = gpu_only(None);
        let policy = AccelerationPolicy::with_mode(AccelerationMode::MinimumLatency);
        let report = s.select(&mut g, &policy).unwrap();

        let gpu = report.delegate_for(SelectionStep::Gpu).unwrap();
        assert_eq!(gpu.nodes_claimed, 2);
        assert_eq!(g.execution_plan().len(), 2);
    }

    #[test]
    fn test_missing_gpu_provider_is_vacuous() {
        let mut g = graph(&[(OpKind::Conv2d, None)]);
        let mut s = AutoDelegateSelector::builder().build();
        let policy = AccelerationPolicy::with_mode(AccelerationMode::MinimumLatency);
        let report = s.select(&mut g, &policy).unwrap();
        assert!(!report.is_delegating());
    }

    #[test]
    fn test_gpu_create_failure_is_fatal() {
        let mut g = graph(&[(OpKind::Conv2d, None)]);
        let mut s = AutoDelegateSelector::builder()
            .gpu_provider(ReferenceGpuProvider::unavailable())
            .build();
        let policy = AccelerationPolicy::with_mode(AccelerationMode::MaximumPrecision);
        let err = s.select(&mut g, &policy).unwrap_err();
        assert!(matches!(err, SelectionError::Gpu { source: BindFailure::Backend(_) }));
    }

    #[test]
    fn test_ratio_ignored_is_reported() {
        let mut policy = AccelerationPolicy::new();
        policy.enable_load_balancing(30);
        policy.set_mode(AccelerationMode::MinimumLatency);

        let mut g = graph(&[(OpKind::Conv2d, None)]);
        let report = gpu_only(None).select(&mut g, &policy).unwrap();
        assert!(report.ratio_ignored);
        assert_eq!(report.gpu_options.unwrap().cpu_fallback_percentage, 0);
    }

    #[test]
    fn test_specialized_short_circuits() {
        let mut g = graph(&[(OpKind::Custom, Some(NPU_MARKER)), (OpKind::Conv2d, None)]);
        let mut s = AutoDelegateSelector::builder()
            .gpu_provider(ReferenceGpuProvider::new())
            .specialized_backend(ReferenceDeviceBackend::new(BackendKind::Npu))
            .build();
        let policy = AccelerationPolicy::with_mode(AccelerationMode::MinimumLatency);
        let report = s.select(&mut g, &policy).unwrap();

        assert!(report.short_circuited);
        assert_eq!(report.delegates.len(), 1);
        assert_eq!(report.delegates[0].step, SelectionStep::Specialized(BackendKind::Npu));
        assert!(s.specialized_backends()[0].is_open());
    }

    #[test]
    fn test_continue_after_specialized() {
        let mut g = graph(&[(OpKind::Custom, Some(NPU_MARKER)), (OpKind::Conv2d, None)]);
        let mut s = AutoDelegateSelector::builder()
            .gpu_provider(ReferenceGpuProvider::new())
            .specialized_backend(ReferenceDeviceBackend::new(BackendKind::Npu))
            .continue_after_specialized(true)
            .build();
        let policy = AccelerationPolicy::with_mode(AccelerationMode::MinimumLatency);
        let report = s.select(&mut g, &policy).unwrap();

        assert!(!report.short_circuited);
        assert_eq!(report.delegates.len(), 2);
        assert!(report.delegate_for(SelectionStep::Gpu).is_some());
    }

    #[test]
    fn test_release_devices() {
        let mut g = graph(&[(OpKind::Custom, Some(NPU_MARKER))]);
        let mut s = AutoDelegateSelector::builder()
            .specialized_backend(ReferenceDeviceBackend::new(BackendKind::Npu))
            .build();
        s.select(&mut g, &AccelerationPolicy::new()).unwrap();
        assert!(s.specialized_backends()[0].is_open());
        s.release_devices();
        assert!(!s.specialized_backends()[0].is_open());
    }

    #[test]
    fn test_already_delegated_keeps_context() {
        let mut g = graph(&[(OpKind::Custom, Some(NPU_MARKER))]);
        let mut s = AutoDelegateSelector::builder()
            .specialized_backend(ReferenceDeviceBackend::new(BackendKind::Npu))
            .build();
        let policy = AccelerationPolicy::new();
        s.select(&mut g, &policy).unwrap();

        let again = s.select(&mut g, &policy);
        assert!(matches!(again, Err(SelectionError::AlreadyDelegated { .. })));
        assert!(s.specialized_backends()[0].is_open());
    }

    #[test]
    fn test_drop_closes_context() {
        let backend = CountingBackend::default();
        let (opens, live) = (Arc::clone(&backend.opens), Arc::clone(&backend.live));
        let mut s = AutoDelegateSelector::builder().specialized_backend(backend).build();

        let mut g = graph(&[(OpKind::Custom, Some(NPU_MARKER))]);
        s.select(&mut g, &AccelerationPolicy::new()).unwrap();
        assert_eq!(live.load(Ordering::SeqCst), 1);

        drop(s);
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reselect_reopens_single_context() {
        let backend = CountingBackend::default();
        let (opens, live) = (Arc::clone(&backend.opens), Arc::clone(&backend.live));
        let mut s = AutoDelegateSelector::builder().specialized_backend(backend).build();
        let policy = AccelerationPolicy::new();

        let mut first = graph(&[(OpKind::Custom, Some(NPU_MARKER))]);
        s.select(&mut first, &policy).unwrap();
        let mut second = graph(&[(OpKind::Custom, Some(NPU_MARKER)), (OpKind::Relu, None)]);
        s.select(&mut second, &policy).unwrap();

        assert_eq!(opens.load(Ordering::SeqCst), 2);
        assert_eq!(live.load(Ordering::SeqCst), 1);
        assert!(s.specialized_backends()[0].is_open());
    }
}
