// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # auto-delegate
//!
//! Command-line interface for policy-driven delegate selection.
//!
//! ## Usage
//! ```bash
//! # Select delegates for a graph and show partitioning before/after allocation
//! auto-delegate select --graph ./graphs/face_detect.json --policy ./policies/load_balancing.json --allocate
//!
//! # Inline policy, JSON report
//! auto-delegate select --graph ./graphs/face_detect.json --policy-json '{"policy":"MIN_LATENCY"}' --json
//!
//! # Inspect graph structure
//! auto-delegate inspect --graph ./graphs/face_detect.json
//!
//! # Validate a policy document
//! auto-delegate policy --policy ./policies/load_balancing.json
//!
//! # Show the detected GPU vendor
//! auto-delegate probe
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "auto-delegate",
    about = "Policy-driven delegate selection for graph executors",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select and bind delegates for a graph under a policy.
    Select {
        /// Path to the graph manifest (JSON).
        #[arg(short, long)]
        graph: PathBuf,

        /// Path to the policy document.
        #[arg(short, long, conflicts_with = "policy_json")]
        policy: Option<PathBuf>,

        /// Inline policy document.
        #[arg(long)]
        policy_json: Option<String>,

        /// Allocate tensors after selection and fill the first input.
        #[arg(short, long)]
        allocate: bool,

        /// Keep selecting after a specialized backend was bound.
        #[arg(long)]
        continue_after_specialized: bool,

        /// Load the TPU delegate from this shared library instead of the
        /// simulated device.
        #[arg(long)]
        tpu_library: Option<PathBuf>,

        /// Print the selection report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Inspect a graph: print its plan, tensors and partitioning.
    Inspect {
        /// Path to the graph manifest (JSON).
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Parse a policy document and print its diagnostics and normalized form.
    Policy {
        /// Path to the policy document.
        #[arg(short, long, conflicts_with = "policy_json", required_unless_present = "policy_json")]
        policy: Option<PathBuf>,

        /// Inline policy document.
        #[arg(long)]
        policy_json: Option<String>,
    },

    /// Display the detected GPU vendor and compiled graphics API.
    Probe,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Select {
            graph,
            policy,
            policy_json,
            allocate,
            continue_after_specialized,
            tpu_library,
            json,
        } => commands::select::execute(commands::select::SelectArgs {
            graph,
            policy,
            policy_json,
            allocate,
            continue_after_specialized,
            tpu_library,
            json,
        }),
        Commands::Inspect { graph } => commands::inspect::execute(graph),
        Commands::Policy {
            policy,
            policy_json,
        } => commands::policy::execute(policy, policy_json),
        Commands::Probe => commands::probe::execute(),
    }
}
