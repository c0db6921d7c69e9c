// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The acceleration policy aggregate.

use crate::AccelerationMode;

/// Where the GPU delegate may serialise compiled programs.
///
/// Unused unless both a directory and a model token were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GpuResultCache {
    pub use_cache: bool,
    pub dir_path: String,
    pub model_token: String,
}

impl GpuResultCache {
    /// Creates an enabled cache descriptor.
    pub fn new(dir_path: impl Into<String>, model_token: impl Into<String>) -> Self {
        Self {
            use_cache: true,
            dir_path: dir_path.into(),
            model_token: model_token.into(),
        }
    }
}

/// Options forwarded to the accelerator-API delegate.
///
/// Each field has an "unset" value (empty string, `false`, `0`); the
/// selector only forwards fields that differ from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AcceleratorCache {
    pub cache_dir: String,
    pub model_token: String,
    pub disallow_cpu_fallback: bool,
    /// `0` leaves the backend's own limit in place.
    pub max_delegated_partitions: i32,
    pub accelerator_name: String,
}

impl AcceleratorCache {
    /// Sentinel for an unset partition limit.
    pub const UNSET_MAX_PARTITIONS: i32 = 0;

    /// Creates a descriptor with a cache location and every optional field unset.
    pub fn new(cache_dir: impl Into<String>, model_token: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            model_token: model_token.into(),
            ..Default::default()
        }
    }

    /// Returns `true` when both the cache directory and token are set.
    pub fn has_cache_location(&self) -> bool {
        !self.cache_dir.is_empty() && !self.model_token.is_empty()
    }

    /// Returns `true` if every field is at its unset value.
    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

/// A complete acceleration policy.
///
/// Built once (by default or from a policy document), optionally adjusted,
/// then lent to the selector. The default is `CpuOnly` with no CPU fallback
/// and both caches unused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccelerationPolicy {
    mode: AccelerationMode,
    cpu_fallback_percentage: u8,
    gpu_cache: GpuResultCache,
    accelerator_cache: AcceleratorCache,
}

impl AccelerationPolicy {
    /// Creates the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a default policy with the given mode.
    pub fn with_mode(mode: AccelerationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// The acceleration mode.
    pub fn mode(&self) -> AccelerationMode {
        self.mode
    }

    /// Overwrites the mode. The CPU-fallback ratio is left as is.
    pub fn set_mode(&mut self, mode: AccelerationMode) {
        self.mode = mode;
    }

    /// The CPU-fallback ratio, in percent.
    pub fn cpu_fallback_percentage(&self) -> u8 {
        self.cpu_fallback_percentage
    }

    /// Switches to `EnableLoadBalancing` and stores `percent`, clamped to
    /// `[0, 100]`.
    ///
    /// The mode switch happens regardless of the current mode, so calling
    /// this after [`set_mode`](Self::set_mode) overrides that mode.
    pub fn enable_load_balancing(&mut self, percent: i64) {
        let clamped = percent.clamp(0, 100);
        if clamped != percent {
            tracing::debug!("cpu fallback percentage {} clamped to {}", percent, clamped);
        }
        self.mode = AccelerationMode::EnableLoadBalancing;
        self.cpu_fallback_percentage = clamped as u8;
    }

    /// Stores the CPU-fallback ratio. Same as
    /// [`enable_load_balancing`](Self::enable_load_balancing): the mode is
    /// forced to `EnableLoadBalancing`.
    pub fn set_cpu_fallback_ratio(&mut self, percent: i64) {
        self.enable_load_balancing(percent);
    }

    /// Where GPU delegate compilation results are serialized.
    pub fn gpu_cache(&self) -> &GpuResultCache {
        &self.gpu_cache
    }

    /// Replaces the GPU result cache. The mode is left as is.
    pub fn set_gpu_cache(&mut self, cache: GpuResultCache) {
        self.gpu_cache = cache;
    }

    /// The accelerator-API compilation cache.
    pub fn accelerator_cache(&self) -> &AcceleratorCache {
        &self.accelerator_cache
    }

    /// Replaces the accelerator-API cache. The mode is left as is.
    pub fn set_accelerator_cache(&mut self, cache: AcceleratorCache) {
        self.accelerator_cache = cache;
    }

    /// Returns `true` if a non-zero CPU-fallback ratio is set under a mode
    /// that does not honour it.
    pub fn ratio_ignored(&self) -> bool {
        self.cpu_fallback_percentage > 0 && !self.mode.honours_cpu_fallback()
    }

    /// Returns a one-line description.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "mode={} cpu_fallback={}%",
            self.mode, self.cpu_fallback_percentage
        );
        if self.gpu_cache.use_cache {
            s.push_str(&format!(
                " gpu_cache={}:{}",
                self.gpu_cache.dir_path, self.gpu_cache.model_token
            ));
        }
        if !self.accelerator_cache.is_unset() {
            s.push_str(&format!(
                " accelerator_cache={}:{}",
                self.accelerator_cache.cache_dir, self.accelerator_cache.model_token
            ));
            if !self.accelerator_cache.accelerator_name.is_empty() {
                s.push_str(&format!(" ({})", self.accelerator_cache.accelerator_name));
            }
        }
        s
    }
}
