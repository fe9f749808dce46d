// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iact_pipeline::backends::local::LocalTaskFactory;
use iact_pipeline::config::{load_and_validate_config, RuntimeBuilder};
use iact_pipeline::engine::RunSummary;
use iact_pipeline::observability::{init_logging, TracingStatusDisplay};

#[derive(Parser)]
#[command(name = "iact-pipeline")]
#[command(about = "Run event-processing task pipelines described in YAML or TOML")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Default log filter, overridden by RUST_LOG
    #[arg(long, global = true, env = "IACT_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a pipeline and run its event loop
    Run {
        /// Pipeline configuration (.yaml, .yml or .toml)
        config: PathBuf,

        /// Stop after this many events, overriding the configuration
        #[arg(long)]
        max_events: Option<u64>,

        /// Stream the loop starts in, overriding the configuration
        #[arg(long)]
        stream: Option<String>,

        /// Print the run summary as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Log the two-line progress display
        #[arg(long)]
        status: bool,
    },

    /// Check a configuration without running it
    Validate {
        config: PathBuf,
    },

    /// List the task kinds a configuration may use
    Kinds,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Run {
            config,
            max_events,
            stream,
            json,
            status,
        } => run(&config, max_events, stream, json, status),
        Commands::Validate { config } => validate(&config),
        Commands::Kinds => {
            list_kinds();
            Ok(())
        }
    };

    if let Err(error) = result {
        eprintln!("❌ {:#}", error);
        process::exit(1);
    }
}

fn run(
    config_file: &Path,
    max_events: Option<u64>,
    stream: Option<String>,
    json: bool,
    status: bool,
) -> Result<()> {
    let mut config = load_and_validate_config(config_file)
        .with_context(|| format!("Failed to load {}", config_file.display()))?;
    if max_events.is_some() {
        config.event_loop.max_events = max_events;
    }
    if let Some(stream) = stream {
        config.event_loop.stream = stream;
    }

    let mut event_loop = RuntimeBuilder::from_config(&config)
        .with_context(|| format!("Failed to build the pipeline in {}", config_file.display()))?;
    if status {
        event_loop = event_loop.with_display(Rc::new(TracingStatusDisplay));
    }

    let summary = event_loop.run().context("Event loop failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(config_file, &summary);
    }
    Ok(())
}

fn print_summary(config_file: &Path, summary: &RunSummary) {
    println!("📋 Configuration: {}", config_file.display());
    println!("🔢 Events: {}", summary.events);
    if summary.continued_events > 0 {
        println!("⏭️  Cut short: {}", summary.continued_events);
    }
    println!("🏁 Outcome: {}", summary.outcome.as_str());
    println!("⏱️  Duration: {:?}", summary.duration);
    println!();
    for line in summary.statistics.lines() {
        println!("{}", line);
    }
}

fn validate(config_file: &Path) -> Result<()> {
    let config = load_and_validate_config(config_file)
        .with_context(|| format!("{} is not a valid pipeline", config_file.display()))?;
    println!(
        "✅ {}: {} task(s) under '{}'",
        config_file.display(),
        config.task_list.count(),
        config.task_list.name
    );
    Ok(())
}

fn list_kinds() {
    for kind in LocalTaskFactory::list_available_kinds() {
        let role = if LocalTaskFactory::is_filter_kind(kind) {
            "filter"
        } else if LocalTaskFactory::is_composite_kind(kind) {
            "composite"
        } else {
            "task"
        };
        println!("{:<16} {}", kind, role);
    }
}
