// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Option structs handed to backend providers.

#[cfg(all(feature = "opengl", feature = "opencl"))]
compile_error!("features `opengl` and `opencl` are mutually exclusive");

/// What the GPU backend should optimise for, in one priority slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferencePriority {
    #[default]
    Auto,
    MaxPrecision,
    MinLatency,
    MinMemoryUsage,
}

impl InferencePriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::MaxPrecision => "max-precision",
            Self::MinLatency => "min-latency",
            Self::MinMemoryUsage => "min-memory-usage",
        }
    }
}

impl std::fmt::Display for InferencePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Low-level graphics API the GPU backend may be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsApi {
    OpenGl,
    OpenCl,
}

impl GraphicsApi {
    /// The restriction selected at build time via the `opengl` or `opencl`
    /// feature, if any.
    pub const fn compiled() -> Option<Self> {
        if cfg!(feature = "opengl") {
            Some(Self::OpenGl)
        } else if cfg!(feature = "opencl") {
            Some(Self::OpenCl)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenGl => "opengl",
            Self::OpenCl => "opencl",
        }
    }
}

/// Experimental switches of the GPU backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct GpuExperimentalFlags {
    /// Accept quantized graphs.
    pub enable_quant: bool,
    /// Run only on this graphics API.
    pub graphics_api: Option<GraphicsApi>,
}

/// Options for the general-purpose GPU delegate.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GpuDelegateOptions {
    pub is_precision_loss_allowed: bool,
    pub inference_priority1: InferencePriority,
    pub inference_priority2: InferencePriority,
    pub inference_priority3: InferencePriority,
    /// Share of the graph, in percent, handed back to the CPU.
    pub cpu_fallback_percentage: u8,
    pub is_pytorch_converted_model: bool,
    pub enable_serialization: bool,
    pub serialization_dir: String,
    pub model_token: String,
    pub experimental: GpuExperimentalFlags,
    /// `0` means no limit.
    pub max_delegated_partitions: usize,
}

impl Default for GpuDelegateOptions {
    fn default() -> Self {
        Self {
            is_precision_loss_allowed: false,
            inference_priority1: InferencePriority::MaxPrecision,
            inference_priority2: InferencePriority::Auto,
            inference_priority3: InferencePriority::Auto,
            cpu_fallback_percentage: 0,
            is_pytorch_converted_model: false,
            enable_serialization: false,
            serialization_dir: String::new(),
            model_token: String::new(),
            experimental: GpuExperimentalFlags::default(),
            max_delegated_partitions: 1,
        }
    }
}

impl GpuDelegateOptions {
    /// Puts `first` in the top priority slot and `Auto` in the other two.
    pub fn prioritize(&mut self, first: InferencePriority) {
        self.inference_priority1 = first;
        self.inference_priority2 = InferencePriority::Auto;
        self.inference_priority3 = InferencePriority::Auto;
    }

    /// Returns a one-line description.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "priorities=[{}, {}, {}] cpu_fallback={}%",
            self.inference_priority1,
            self.inference_priority2,
            self.inference_priority3,
            self.cpu_fallback_percentage,
        );
        if self.is_pytorch_converted_model {
            s.push_str(" pytorch");
        }
        if self.enable_serialization {
            s.push_str(&format!(" serialize={}:{}", self.serialization_dir, self.model_token));
        }
        if let Some(api) = self.experimental.graphics_api {
            s.push_str(&format!(" api={}", api.as_str()));
        }
        s
    }
}

/// Options for the accelerator-API delegate. Every field starts unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AcceleratorApiOptions {
    pub cache_dir: Option<String>,
    pub model_token: Option<String>,
    pub disallow_cpu_fallback: Option<bool>,
    pub max_delegated_partitions: Option<usize>,
    pub accelerator_name: Option<String>,
}

impl AcceleratorApiOptions {
    pub fn summary(&self) -> String {
        let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
        format!(
            "cache={}:{} disallow_cpu={} max_partitions={} accelerator={}",
            field(&self.cache_dir),
            field(&self.model_token),
            self.disallow_cpu_fallback
                .map_or_else(|| "-".into(), |b| b.to_string()),
            self.max_delegated_partitions
                .map_or_else(|| "-".into(), |n| n.to_string()),
            field(&self.accelerator_name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_defaults() {
        let o = GpuDelegateOptions::default();
        assert_eq!(o.inference_priority1, InferencePriority::MaxPrecision);
        assert_eq!(o.inference_priority2, InferencePriority::Auto);
        assert_eq!(o.cpu_fallback_percentage, 0);
        assert_eq!(o.max_delegated_partitions, 1);
        assert!(!o.experimental.enable_quant);
    }

    #[test]
    fn test_prioritize() {
        let mut o = GpuDelegateOptions::default();
        o.prioritize(InferencePriority::MinMemoryUsage);
        assert_eq!(o.inference_priority1, InferencePriority::MinMemoryUsage);
        assert_eq!(o.inference_priority2, InferencePriority::Auto);
        assert_eq!(o.inference_priority3, InferencePriority::Auto);
    }

    #[test]
    fn test_summary() {
        let mut o = GpuDelegateOptions::default();
        o.prioritize(InferencePriority::MinLatency);
        o.enable_serialization = true;
        o.serialization_dir = "/usr/share/aif".into();
        o.model_token = "pose2d_gpu_mid".into();
        let s = o.summary();
        assert!(s.starts_with("priorities=[min-latency, auto, auto]"));
        assert!(s.contains("serialize=/usr/share/aif:pose2d_gpu_mid"));
    }

    #[test]
    fn test_accelerator_options_unset() {
        let o = AcceleratorApiOptions::default();
        assert_eq!(o.summary(), "cache=-:- disallow_cpu=- max_partitions=- accelerator=-");
    }

    #[test]
    fn test_compiled_api_matches_features() {
        let expected = if cfg!(feature = "opengl") {
            Some(GraphicsApi::OpenGl)
        } else if cfg!(feature = "opencl") {
            Some(GraphicsApi::OpenCl)
        } else {
            None
        };
        assert_eq!(GraphicsApi::compiled(), expected);
    }

    #[test]
    fn test_serialize_options() {
        let json = serde_json::to_value(GpuDelegateOptions::default()).unwrap();
        assert_eq!(json["inference_priority1"], "max_precision");
    }
}
