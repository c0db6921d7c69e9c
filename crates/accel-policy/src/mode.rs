// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Acceleration modes.
//!
//! The mode is a closed enumeration. `MinimizeLatencyAndResourceUse` is the
//! one composite: it behaves as both `MinimumLatency` and
//! `MinimizeResourceUse`, which [`AccelerationMode::includes`] expresses
//! without exposing any ordinal or bit encoding.

use crate::PolicyError;
use std::str::FromStr;

/// How the selector should trade precision, latency and resource use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub enum AccelerationMode {
    /// Never bind the general-purpose GPU delegate.
    #[default]
    #[serde(rename = "CPU_ONLY")]
    CpuOnly,
    /// GPU with the backend's default priorities.
    #[serde(rename = "MAX_PRECISION")]
    MaximumPrecision,
    /// GPU, prioritising minimum latency.
    #[serde(rename = "MIN_LATENCY")]
    MinimumLatency,
    /// GPU with part of the graph handed back to the CPU.
    #[serde(rename = "LOAD_BALANCING")]
    EnableLoadBalancing,
    /// Like load balancing, for graphs converted from PyTorch.
    #[serde(rename = "PYTORCH_MODEL_GPU")]
    PytorchModelGpu,
    /// Accelerator-API delegate, minimising resource use.
    #[serde(rename = "MIN_RES")]
    MinimizeResourceUse,
    /// `MinimumLatency` and `MinimizeResourceUse` together.
    #[serde(rename = "MIN_LATENCY_MIN_RES")]
    MinimizeLatencyAndResourceUse,
}

impl AccelerationMode {
    /// Every mode, in declaration order.
    pub const ALL: [AccelerationMode; 7] = [
        AccelerationMode::CpuOnly,
        AccelerationMode::MaximumPrecision,
        AccelerationMode::MinimumLatency,
        AccelerationMode::EnableLoadBalancing,
        AccelerationMode::PytorchModelGpu,
        AccelerationMode::MinimizeResourceUse,
        AccelerationMode::MinimizeLatencyAndResourceUse,
    ];

    /// Returns the policy-document name of this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CpuOnly => "CPU_ONLY",
            Self::MaximumPrecision => "MAX_PRECISION",
            Self::MinimumLatency => "MIN_LATENCY",
            Self::EnableLoadBalancing => "LOAD_BALANCING",
            Self::PytorchModelGpu => "PYTORCH_MODEL_GPU",
            Self::MinimizeResourceUse => "MIN_RES",
            Self::MinimizeLatencyAndResourceUse => "MIN_LATENCY_MIN_RES",
        }
    }

    /// Looks up a policy-document name. Matching is exact.
    pub fn from_policy_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == name)
    }

    /// Returns `true` if this mode behaves as `other`.
    ///
    /// Every mode includes itself; the composite also includes both of its
    /// parts.
    pub fn includes(self, other: Self) -> bool {
        self == other
            || (self == Self::MinimizeLatencyAndResourceUse
                && matches!(other, Self::MinimumLatency | Self::MinimizeResourceUse))
    }

    pub fn prioritizes_latency(self) -> bool {
        self.includes(Self::MinimumLatency)
    }

    /// Modes that route through the accelerator-API delegate.
    pub fn minimizes_resources(self) -> bool {
        self.includes(Self::MinimizeResourceUse)
    }

    /// Modes under which the CPU-fallback ratio is honoured.
    pub fn honours_cpu_fallback(self) -> bool {
        matches!(self, Self::EnableLoadBalancing | Self::PytorchModelGpu)
    }

    /// Returns `true` unless the mode is `CpuOnly`.
    pub fn uses_gpu(self) -> bool {
        self != Self::CpuOnly
    }
}

impl std::fmt::Display for AccelerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccelerationMode {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_policy_name(s).ok_or_else(|| PolicyError::UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_cpu_only() {
        assert_eq!(AccelerationMode::default(), AccelerationMode::CpuOnly);
        assert!(!AccelerationMode::CpuOnly.uses_gpu());
    }

    #[test]
    fn test_names_round_trip() {
        for mode in AccelerationMode::ALL {
            assert_eq!(AccelerationMode::from_policy_name(mode.as_str()), Some(mode));
            let parsed: AccelerationMode = mode.to_string().parse().unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn test_lookup_is_exact() {
        assert_eq!(AccelerationMode::from_policy_name("min_latency"), None);
        assert_eq!(AccelerationMode::from_policy_name(""), None);
        assert!(matches!(
            "FASTEST".parse::<AccelerationMode>(),
            Err(PolicyError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_composite_includes_parts() {
        let both = AccelerationMode::MinimizeLatencyAndResourceUse;
        assert!(both.includes(AccelerationMode::MinimumLatency));
        assert!(both.includes(AccelerationMode::MinimizeResourceUse));
        assert!(!both.includes(AccelerationMode::EnableLoadBalancing));
        assert!(!AccelerationMode::MinimumLatency.includes(both));

        assert!(both.prioritizes_latency());
        assert!(both.minimizes_resources());
        assert!(AccelerationMode::MinimumLatency.prioritizes_latency());
        assert!(!AccelerationMode::MinimumLatency.minimizes_resources());
    }

    #[test]
    fn test_cpu_fallback_modes() {
        let honoured: Vec<_> = AccelerationMode::ALL
            .into_iter()
            .filter(|m| m.honours_cpu_fallback())
            .collect();
        assert_eq!(
            honoured,
            vec![AccelerationMode::EnableLoadBalancing, AccelerationMode::PytorchModelGpu]
        );
    }

    #[test]
    fn test_serde_uses_policy_names() {
        let json = serde_json::to_string(&AccelerationMode::MinimizeResourceUse).unwrap();
        assert_eq!(json, "\"MIN_RES\"");
        let back: AccelerationMode = serde_json::from_str("\"LOAD_BALANCING\"").unwrap();
        assert_eq!(back, AccelerationMode::EnableLoadBalancing);
    }
}
