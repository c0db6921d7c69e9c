// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `auto-delegate policy` command: parse a policy document.
//!
//! Parsing never fails on content; every problem is reported as a
//! diagnostic and the affected setting keeps its default.

use accel_policy::AccelerationPolicy;
use std::path::PathBuf;

pub fn execute(path: Option<PathBuf>, inline: Option<String>) -> anyhow::Result<()> {
    super::banner("auto-delegate · Policy Check");

    let (source, parsed) = match (path, inline) {
        (Some(path), _) => {
            let parsed = AccelerationPolicy::from_file(&path)?;
            (path.display().to_string(), parsed)
        }
        (None, Some(text)) => ("<inline>".to_string(), AccelerationPolicy::parse_with_diagnostics(&text)),
        (None, None) => anyhow::bail!("either --policy or --policy-json is required"),
    };

    println!("  Source:  {source}");
    println!("  Policy:  {}", parsed.policy.summary());
    if parsed.policy.ratio_ignored() {
        println!(
            "  Note:    cpu_fallback_percentage is ignored under {}",
            parsed.policy.mode(),
        );
    }
    println!();

    if parsed.is_clean() {
        println!("  No diagnostics.");
    } else {
        println!("  Diagnostics:");
        for d in &parsed.diagnostics {
            let level = if d.is_validation_error() { "error" } else { "warn" };
            println!("   [{level:<5}] {d}");
        }
    }
    println!();

    println!("  Normalized:");
    for line in parsed.policy.to_json()?.lines() {
        println!("   {line}");
    }
    println!();

    Ok(())
}
