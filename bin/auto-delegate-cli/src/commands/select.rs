// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `auto-delegate select` command: run delegate selection on a graph.
//!
//! Prints partitioning before selection, after selection and (with
//! `--allocate`) after tensor allocation, since deferred delegates only
//! take their partitions at allocation time.

use accel_policy::AccelerationPolicy;
use anyhow::Context;
use auto_delegate::{fill_random_input_tensor, AutoDelegateSelector, GraphTester, PartitionStats};
use delegate_backends::{
    BackendKind, ExternalDelegateBackend, ReferenceAcceleratorApiProvider, ReferenceDeviceBackend,
    ReferenceGpuProvider, SysfsProbe,
};
use graph_ir::GraphExecutor;
use std::path::PathBuf;

pub struct SelectArgs {
    pub graph: PathBuf,
    pub policy: Option<PathBuf>,
    pub policy_json: Option<String>,
    pub allocate: bool,
    pub continue_after_specialized: bool,
    pub tpu_library: Option<PathBuf>,
    pub json: bool,
}

pub fn execute(args: SelectArgs) -> anyhow::Result<()> {
    let policy = load_policy(&args)?;
    let mut graph = super::load_graph(&args.graph)?;

    let mut builder = AutoDelegateSelector::builder()
        .gpu_provider(ReferenceGpuProvider::new())
        .accelerator_api_provider(ReferenceAcceleratorApiProvider::new())
        .specialized_backend(ReferenceDeviceBackend::new(BackendKind::Npu))
        .platform_probe(SysfsProbe::new())
        .continue_after_specialized(args.continue_after_specialized);
    builder = match &args.tpu_library {
        Some(path) => builder.specialized_backend(ExternalDelegateBackend::new(BackendKind::Tpu, path.clone())),
        None => builder.specialized_backend(ReferenceDeviceBackend::new(BackendKind::Tpu)),
    };
    let mut selector = builder.build();

    let before = GraphTester::new(&graph).stats()?;
    let report = selector
        .select(&mut graph, &policy)
        .with_context(|| format!("delegate selection failed for '{}'", graph.name))?;
    let selected = GraphTester::new(&graph).stats()?;

    let allocated = if args.allocate {
        graph.allocate_tensors()?;
        let filled = fill_random_input_tensor(&mut graph)?;
        tracing::info!("filled {} input elements", filled);
        Some(GraphTester::new(&graph).stats()?)
    } else {
        None
    };

    if args.json {
        let doc = serde_json::json!({
            "graph": graph.name,
            "policy": policy.to_value(),
            "report": report,
            "before": before,
            "after_select": selected,
            "after_allocate": allocated,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    super::banner("auto-delegate · Delegate Selection");
    println!("  Graph:  {}", graph.name);
    println!("  Policy: {}", policy.summary());
    println!();

    // ── Delegates ──────────────────────────────────────────────
    if report.delegates.is_empty() {
        println!("  No delegates bound; the graph runs on the CPU.");
    }
    for d in &report.delegates {
        println!(
            "  {:<16} {:<20} {:>6} nodes {:>4} partitions",
            d.step.to_string(),
            d.name,
            d.nodes_claimed,
            d.partitions,
        );
    }
    if report.short_circuited {
        println!("  (specialized backend matched; later steps skipped)");
    }
    if report.ratio_ignored {
        println!("  (cpu_fallback_percentage ignored under {})", report.mode);
    }
    println!();

    // ── Partitioning ───────────────────────────────────────────
    println!("  {:<16} {:>8} {:>12} {:>10}", "Stage", "Nodes", "Partitions", "Delegated");
    println!("  {}", "-".repeat(50));
    print_stats("before", &before);
    print_stats("after select", &selected);
    if let Some(stats) = &allocated {
        print_stats("after allocate", stats);
    }
    println!();
    println!("  Selection took {:.3} ms", report.duration.as_secs_f64() * 1000.0);

    Ok(())
}

fn load_policy(args: &SelectArgs) -> anyhow::Result<AccelerationPolicy> {
    let parsed = match (&args.policy, &args.policy_json) {
        (Some(path), _) => AccelerationPolicy::from_file(path)?,
        (None, Some(text)) => AccelerationPolicy::parse_with_diagnostics(text),
        (None, None) => {
            tracing::warn!("no policy given; using CPU_ONLY");
            return Ok(AccelerationPolicy::new());
        }
    };
    Ok(parsed.policy)
}

fn print_stats(stage: &str, stats: &PartitionStats) {
    println!(
        "  {:<16} {:>8} {:>12} {:>10}",
        stage, stats.total_nodes, stats.total_partitions, stats.delegated_partitions,
    );
}
