//! Suitegate CLI - merge gate for independently built test suites
//!
//! The `suitegate` command runs an ordered plan of test executables from a
//! build directory and exits with the merge gate's verdict:
//!
//! - `0`: SUCCESS or UNSTABLE (non-blocking failures, performance regressions)
//! - `1`: FAILURE (a blocking suite failed) or a configuration error

mod console;
mod plan;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Level};

use suitegate_core::{Aggregator, BaselineConfig, BaselineWarning, ProcessInvoker, RunSummary};

use crate::console::ConsoleSink;

#[derive(Parser)]
#[command(name = "suitegate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Merge gate for independently built test suites", long_about = None)]
struct Cli {
    /// Build directory; suites are looked up under `<build-dir>/tests/`
    #[arg(long, env = "SUITEGATE_BUILD_DIR", default_value = "build")]
    build_dir: PathBuf,

    /// Project root, used to locate the default baseline file
    #[arg(long, env = "SUITEGATE_PROJECT_ROOT", default_value = ".")]
    project_root: PathBuf,

    /// Performance baseline JSON
    /// (default: <project-root>/tests/data/performance_baseline.json)
    #[arg(long, env = "SUITEGATE_BASELINE")]
    baseline: Option<PathBuf>,

    /// JSON suite plan replacing the built-in one
    #[arg(long, env = "SUITEGATE_PLAN")]
    plan: Option<PathBuf>,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    suitegate_core::init_tracing(cli.json, level);

    let summary = cmd_gate(&cli).await?;
    Ok(ExitCode::from(summary.exit_code() as u8))
}

fn default_baseline_path(project_root: &Path) -> PathBuf {
    project_root
        .join("tests")
        .join("data")
        .join("performance_baseline.json")
}

async fn cmd_gate(cli: &Cli) -> Result<RunSummary> {
    let baseline_path = cli
        .baseline
        .clone()
        .unwrap_or_else(|| default_baseline_path(&cli.project_root));

    let load = BaselineConfig::load(&baseline_path).context("Failed to load performance baselines")?;
    if let Some(BaselineWarning::Missing { path }) = &load.warning {
        println!(
            "⚠ Baseline file not found at {}. Using default thresholds.",
            path.display()
        );
    }

    let entries = match &cli.plan {
        Some(path) => plan::load_plan(path)?,
        None => plan::builtin_plan(),
    };
    let descriptors =
        plan::resolve_plan(&entries, &cli.build_dir).context("Invalid suite plan")?;

    info!(
        build_dir = %cli.build_dir.display(),
        suites = descriptors.len(),
        "Starting merge gate"
    );

    let aggregator = Aggregator::from_load(Arc::new(ProcessInvoker::new()), load)?;
    let mut sink = ConsoleSink;
    let summary = aggregator
        .run(&descriptors, &mut sink)
        .await
        .context("Gate run failed")?;

    print!("{}", console::render_summary(&summary));

    if let Some(path) = &cli.report {
        write_report(path, &summary)?;
        println!("Report written to {}", path.display());
    }

    Ok(summary)
}

fn write_report(path: &Path, summary: &RunSummary) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write to {}", path.display()))?;
    Ok(())
}
