// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! GPU vendor detection via `/dev/` and `/sys/`.
//!
//! The GPU priority choice for load-balancing modes depends on the vendor:
//! on ARM Mali, minimum latency wins over minimum memory usage. Detection
//! checks vendor device nodes first, then the DRM driver name in
//! `/sys/class/drm/card0/device/uevent`. Off-target (containers, x86
//! hosts) nothing matches and the probe returns `None`.

use std::path::{Path, PathBuf};

/// Device nodes that identify a vendor on their own.
const DEVICE_NODES: [(&str, GpuVendor); 5] = [
    ("mali0", GpuVendor::ArmMali),
    ("mali", GpuVendor::ArmMali),
    ("kgsl-3d0", GpuVendor::QualcommAdreno),
    ("pvr_sync", GpuVendor::ImaginationPowerVr),
    ("galcore", GpuVendor::VivanteGc),
];

const DRM_UEVENT: &str = "class/drm/card0/device/uevent";

/// Known embedded GPU vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuVendor {
    ArmMali,
    QualcommAdreno,
    ImaginationPowerVr,
    VivanteGc,
}

impl GpuVendor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ArmMali => "ARM Mali",
            Self::QualcommAdreno => "Qualcomm Adreno",
            Self::ImaginationPowerVr => "Imagination PowerVR",
            Self::VivanteGc => "Vivante GC",
        }
    }

    /// Vendors on which load-balancing modes prioritise minimum latency.
    pub fn prefers_min_latency(self) -> bool {
        self == Self::ArmMali
    }

    /// Maps a kernel DRM driver name to a vendor.
    pub fn from_drm_driver(driver: &str) -> Option<Self> {
        match driver {
            "panfrost" | "lima" | "mali" | "mali_kbase" => Some(Self::ArmMali),
            "msm" | "msm_drm" => Some(Self::QualcommAdreno),
            "pvrsrvkm" | "powervr" => Some(Self::ImaginationPowerVr),
            "etnaviv" | "galcore" => Some(Self::VivanteGc),
            _ => None,
        }
    }
}

impl std::fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers platform capability questions for the selector.
pub trait PlatformProbe: Send + Sync {
    /// The GPU vendor, or `None` when it cannot be determined.
    fn gpu_vendor(&self) -> Option<GpuVendor>;
}

/// Detects the GPU vendor from the device and sysfs trees.
#[derive(Debug, Clone)]
pub struct SysfsProbe {
    dev_root: PathBuf,
    sys_root: PathBuf,
}

impl SysfsProbe {
    /// Probes the live `/dev` and `/sys`.
    pub fn new() -> Self {
        Self::with_roots("/dev", "/sys")
    }

    /// Probes alternative roots, e.g. a captured device tree.
    pub fn with_roots(dev_root: impl Into<PathBuf>, sys_root: impl Into<PathBuf>) -> Self {
        Self {
            dev_root: dev_root.into(),
            sys_root: sys_root.into(),
        }
    }

    fn drm_driver(&self) -> Option<String> {
        let uevent = read_sysfs_file(&self.sys_root.join(DRM_UEVENT))?;
        uevent
            .lines()
            .find_map(|line| line.strip_prefix("DRIVER="))
            .map(|d| d.trim().to_string())
    }
}

impl Default for SysfsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProbe for SysfsProbe {
    fn gpu_vendor(&self) -> Option<GpuVendor> {
        for (node, vendor) in DEVICE_NODES {
            if self.dev_root.join(node).exists() {
                tracing::debug!("found {} under {}: {}", node, self.dev_root.display(), vendor);
                return Some(vendor);
            }
        }
        let driver = self.drm_driver()?;
        let vendor = GpuVendor::from_drm_driver(&driver);
        tracing::debug!("drm driver '{}' -> {:?}", driver, vendor);
        vendor
    }
}

/// A probe with a fixed answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProbe(pub Option<GpuVendor>);

impl PlatformProbe for StaticProbe {
    fn gpu_vendor(&self) -> Option<GpuVendor> {
        self.0
    }
}

/// Reads a sysfs file and returns its trimmed content, or `None` when it
/// is missing or unreadable.
fn read_sysfs_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => Some(s.trim().to_string()),
        Err(e) => {
            tracing::trace!("cannot read {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates an empty pair of fake roots under the temp dir.
    fn fake_roots(name: &str) -> (PathBuf, PathBuf) {
        let base = std::env::temp_dir().join("delegate_backends_probe").join(name);
        let _ = std::fs::remove_dir_all(&base);
        let dev = base.join("dev");
        let sys = base.join("sys");
        std::fs::create_dir_all(&dev).unwrap();
        std::fs::create_dir_all(&sys).unwrap();
        (dev, sys)
    }

    #[test]
    fn test_mali_device_node() {
        let (dev, sys) = fake_roots("mali");
        std::fs::write(dev.join("mali0"), "").unwrap();
        let probe = SysfsProbe::with_roots(&dev, &sys);
        assert_eq!(probe.gpu_vendor(), Some(GpuVendor::ArmMali));
    }

    #[test]
    fn test_drm_driver_fallback() {
        let (dev, sys) = fake_roots("drm");
        let uevent = sys.join(DRM_UEVENT);
        std::fs::create_dir_all(uevent.parent().unwrap()).unwrap();
        std::fs::write(&uevent, "DRIVER=msm\nPCI_SLOT_NAME=0000\n").unwrap();
        let probe = SysfsProbe::with_roots(&dev, &sys);
        assert_eq!(probe.gpu_vendor(), Some(GpuVendor::QualcommAdreno));
    }

    #[test]
    fn test_nothing_found() {
        let (dev, sys) = fake_roots("empty");
        let probe = SysfsProbe::with_roots(&dev, &sys);
        assert_eq!(probe.gpu_vendor(), None);
    }

    #[test]
    fn test_only_mali_prefers_latency() {
        assert!(GpuVendor::ArmMali.prefers_min_latency());
        assert!(!GpuVendor::QualcommAdreno.prefers_min_latency());
        assert_eq!(GpuVendor::from_drm_driver("panfrost"), Some(GpuVendor::ArmMali));
        assert_eq!(GpuVendor::from_drm_driver("i915"), None);
    }

    #[test]
    fn test_static_probe() {
        assert_eq!(StaticProbe(Some(GpuVendor::VivanteGc)).gpu_vendor(), Some(GpuVendor::VivanteGc));
        assert_eq!(StaticProbe::default().gpu_vendor(), None);
    }
}
