// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `auto-delegate probe` command: display platform detection results.
//!
//! Reads device nodes and sysfs. On machines without a supported GPU
//! (e.g., Docker, x86 laptops) the vendor shows as unknown.

use delegate_backends::{GraphicsApi, PlatformProbe, SysfsProbe};

pub fn execute() -> anyhow::Result<()> {
    super::banner("auto-delegate · Platform Probe");

    let vendor = SysfsProbe::new().gpu_vendor();
    match vendor {
        Some(v) => {
            println!("  GPU vendor:       {v}");
            let priority = if v.prefers_min_latency() { "min-latency" } else { "min-memory-usage" };
            println!("  Balanced priority: {priority}");
        }
        None => {
            println!("  GPU vendor:       unknown");
            println!("  Balanced priority: min-memory-usage");
        }
    }

    let api = GraphicsApi::compiled().map_or("auto", GraphicsApi::as_str);
    println!("  Graphics API:     {api}");
    println!();

    Ok(())
}
