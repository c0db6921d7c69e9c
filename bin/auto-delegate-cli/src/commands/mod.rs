// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

pub mod inspect;
pub mod policy;
pub mod probe;
pub mod select;

use anyhow::Context;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v` when set.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads a graph manifest without validating its plan, so that broken
/// plans reach the selector and are reported there.
pub fn load_graph(path: &Path) -> anyhow::Result<graph_ir::ReferenceGraph> {
    graph_ir::GraphManifest::from_file(path)
        .and_then(|m| m.into_graph())
        .with_context(|| format!("failed to load graph from '{}'", path.display()))
}

pub fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║  {:<52}║", title);
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}
