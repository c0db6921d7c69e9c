// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Example: Compare acceleration policies on a synthetic detector graph.
//!
//! Runs every policy mode against a fresh copy of the same graph and
//! prints the partitioning observed after selection and after allocation.
//!
//! ```bash
//! cargo run -p auto-delegate --example policy_comparison
//! ```

use accel_policy::{AccelerationMode, AccelerationPolicy};
use auto_delegate::{fill_random_input_tensor, AutoDelegateSelector, GraphTester};
use delegate_backends::{
    BackendKind, ReferenceAcceleratorApiProvider, ReferenceDeviceBackend, ReferenceGpuProvider,
    StaticProbe,
};
use graph_ir::{GraphExecutor, OpKind, ReferenceGraph, Tensor, TensorType};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let template = build_graph();
    println!("Graph: {}\n", template.summary());

    println!(
        "{:<22} {:<28} {:>18} {:>18}",
        "Policy", "Delegates", "After select", "After allocate",
    );
    println!("{}", "-".repeat(90));

    for mode in AccelerationMode::ALL {
        let mut policy = AccelerationPolicy::new();
        policy.enable_load_balancing(25);
        policy.set_mode(mode);

        let mut graph = build_graph();
        let mut selector = selector();
        match selector.select(&mut graph, &policy) {
            Ok(report) => {
                let selected = GraphTester::new(&graph).stats()?;
                graph.allocate_tensors()?;
                fill_random_input_tensor(&mut graph)?;
                let allocated = GraphTester::new(&graph).stats()?;

                let names = report
                    .delegates
                    .iter()
                    .map(|d| d.name.as_str())
                    .collect::<Vec<_>>()
                    .join("+");
                println!(
                    "{:<22} {:<28} {:>18} {:>18}",
                    mode.as_str(),
                    if names.is_empty() { "-" } else { &names },
                    format!("{}/{}/{}", selected.total_nodes, selected.total_partitions, selected.delegated_partitions),
                    format!("{}/{}/{}", allocated.total_nodes, allocated.total_partitions, allocated.delegated_partitions),
                );
            }
            Err(e) => println!("{:<22} FAIL: {e}", mode.as_str()),
        }
    }
    println!("\n(columns: nodes/partitions/delegated)");

    Ok(())
}

fn selector() -> AutoDelegateSelector {
    AutoDelegateSelector::builder()
        .gpu_provider(ReferenceGpuProvider::new())
        .accelerator_api_provider(ReferenceAcceleratorApiProvider::with_ops(&[
            OpKind::Conv2d,
            OpKind::DepthwiseConv2d,
        ]))
        .specialized_backend(ReferenceDeviceBackend::new(BackendKind::Npu))
        .specialized_backend(ReferenceDeviceBackend::new(BackendKind::Tpu))
        .platform_probe(StaticProbe(None))
        .build()
}

/// A backbone of GPU-friendly ops followed by a custom post-processing tail.
fn build_graph() -> ReferenceGraph {
    let mut ops: Vec<(OpKind, Option<&str>)> = Vec::new();
    for _ in 0..12 {
        ops.push((OpKind::Conv2d, None));
        ops.push((OpKind::DepthwiseConv2d, None));
        ops.push((OpKind::Relu6, None));
    }
    ops.push((OpKind::Reshape, None));
    for _ in 0..8 {
        ops.push((OpKind::Custom, Some("decode_boxes")));
    }
    ReferenceGraph::chain(
        "detector",
        Tensor::new("image", TensorType::Float32, vec![1, 32, 32, 3]),
        &ops,
    )
}
