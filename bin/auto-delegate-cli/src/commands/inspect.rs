// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `auto-delegate inspect` command: display graph structure.

use auto_delegate::GraphTester;
use graph_ir::GraphExecutor;
use std::path::PathBuf;

pub fn execute(path: PathBuf) -> anyhow::Result<()> {
    super::banner("auto-delegate · Graph Inspector");

    let graph = super::load_graph(&path)?;
    let tester = GraphTester::new(&graph);

    // ── Summary ────────────────────────────────────────────────
    println!("  {}", graph.summary());
    println!("  Inputs: {}   Outputs: {}", graph.input_count(), graph.outputs().len());
    match tester.stats() {
        Ok(stats) => println!("  Partitioning: {stats}"),
        Err(e) => println!("  Partitioning: unavailable ({e})"),
    }
    println!();

    // ── Plan ───────────────────────────────────────────────────
    println!("{}", tester.preview()?);
    println!();

    Ok(())
}
