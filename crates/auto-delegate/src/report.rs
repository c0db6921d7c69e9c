// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! What a selection did.

use accel_policy::AccelerationMode;
use delegate_backends::{AcceleratorApiOptions, BackendKind, GpuDelegateOptions};
use graph_ir::DelegateBinding;
use std::time::Duration;

/// The selection step a delegate was bound in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStep {
    Specialized(BackendKind),
    AcceleratorApi,
    Gpu,
}

impl std::fmt::Display for SelectionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Specialized(kind) => write!(f, "{kind}"),
            Self::AcceleratorApi => f.write_str("accelerator-api"),
            Self::Gpu => f.write_str("gpu"),
        }
    }
}

/// One delegate bound during selection.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BoundDelegate {
    pub step: SelectionStep,
    /// Delegate name as recorded on the graph.
    pub name: String,
    /// Partitions taken at bind time. Deferred partitions are not counted.
    pub partitions: usize,
    pub nodes_claimed: usize,
}

/// Outcome of a successful selection.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SelectionReport {
    pub mode: AccelerationMode,
    /// Delegates in bind order.
    pub delegates: Vec<BoundDelegate>,
    /// A non-zero CPU-fallback ratio was set under a mode that ignores it.
    pub ratio_ignored: bool,
    /// A specialized backend matched and the remaining steps were skipped.
    pub short_circuited: bool,
    /// Options the GPU delegate was built with, if that step ran.
    pub gpu_options: Option<GpuDelegateOptions>,
    /// Options the accelerator-API delegate was built with, if that step ran.
    pub accelerator_api_options: Option<AcceleratorApiOptions>,
    pub duration: Duration,
}

impl SelectionReport {
    pub fn new(mode: AccelerationMode) -> Self {
        Self {
            mode,
            delegates: Vec::new(),
            ratio_ignored: false,
            short_circuited: false,
            gpu_options: None,
            accelerator_api_options: None,
            duration: Duration::ZERO,
        }
    }

    /// Records a successful bind.
    pub fn record(&mut self, step: SelectionStep, binding: DelegateBinding) {
        self.delegates.push(BoundDelegate {
            step,
            name: binding.name,
            partitions: binding.partitions,
            nodes_claimed: binding.nodes_claimed,
        });
    }

    /// Returns `true` if any delegate was bound.
    pub fn is_delegating(&self) -> bool {
        !self.delegates.is_empty()
    }

    /// Returns the delegate bound in `step`, if any.
    pub fn delegate_for(&self, step: SelectionStep) -> Option<&BoundDelegate> {
        self.delegates.iter().find(|d| d.step == step)
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let bound = if self.delegates.is_empty() {
            "none".to_string()
        } else {
            self.delegates
                .iter()
                .map(|d| format!("{}({}: {} nodes/{} partitions)", d.step, d.name, d.nodes_claimed, d.partitions))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut s = format!(
            "Selection [{}]: delegates {} in {:.3}ms",
            self.mode,
            bound,
            self.duration.as_secs_f64() * 1000.0,
        );
        if self.short_circuited {
            s.push_str(", specialized match short-circuited");
        }
        if self.ratio_ignored {
            s.push_str(", cpu fallback ratio ignored");
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_ir::DelegateId;

    fn binding(name: &str) -> DelegateBinding {
        DelegateBinding {
            id: DelegateId(0),
            name: name.into(),
            partitions: 1,
            nodes_claimed: 68,
        }
    }

    #[test]
    fn test_empty_report() {
        let r = SelectionReport::new(AccelerationMode::CpuOnly);
        assert!(!r.is_delegating());
        assert!(r.summary().contains("delegates none"));
    }

    #[test]
    fn test_record() {
        let mut r = SelectionReport::new(AccelerationMode::EnableLoadBalancing);
        r.record(SelectionStep::Gpu, binding("gpu"));
        r.ratio_ignored = true;
        assert!(r.is_delegating());
        assert_eq!(r.delegate_for(SelectionStep::Gpu).unwrap().nodes_claimed, 68);
        assert!(r.delegate_for(SelectionStep::AcceleratorApi).is_none());

        let s = r.summary();
        assert!(s.contains("[LOAD_BALANCING]"));
        assert!(s.contains("gpu(gpu: 68 nodes/1 partitions)"));
        assert!(s.contains("ratio ignored"));
    }

    #[test]
    fn test_step_display() {
        assert_eq!(SelectionStep::Specialized(BackendKind::Npu).to_string(), "npu");
        assert_eq!(SelectionStep::AcceleratorApi.to_string(), "accelerator-api");
    }
}
