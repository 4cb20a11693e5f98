// file: src/utils/logging.rs
// description: Tracing subscriber initialization and console run summary

use crate::pipeline::{FileFailure, RunSummary};
use colored::*;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when verbose.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Console stages printed before the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Connect,
    Process,
}

impl Stage {
    const ALL: [Stage; 3] = [Stage::Configure, Stage::Connect, Stage::Process];

    fn label(self) -> &'static str {
        match self {
            Stage::Configure => "Loading configuration",
            Stage::Connect => "Connecting to graph and text backends",
            Stage::Process => "Extracting indicators",
        }
    }
}

pub fn format_stage(stage: Stage) -> String {
    let position = Stage::ALL.iter().position(|s| *s == stage).unwrap_or(0) + 1;
    format!(
        "{} {}",
        format!("[{}/{}]", position, Stage::ALL.len()).cyan().bold(),
        stage.label()
    )
}

/// End-of-run console report: totals, per-kind counts, then anything skipped.
pub fn summary_lines(summary: &RunSummary, report: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} of {} files, {} indicators in {}s",
        "✓".green().bold(),
        summary.files_processed,
        summary.files_total,
        summary.total_indicators(),
        summary.duration_secs
    )];

    for (kind, count) in &summary.indicators {
        lines.push(format!("  {} {}", format!("{:<6}", kind.as_str()).bold(), count));
    }

    lines.push(format!(
        "  report {} ({} lines)",
        report.display(),
        summary.report_lines
    ));

    if summary.files_cancelled > 0 {
        lines.push(format!(
            "{} {} files not started",
            "⚠".yellow().bold(),
            summary.files_cancelled
        ));
    }

    if !summary.failures.is_empty() {
        lines.push(format!(
            "{} {} files skipped",
            "⚠".yellow().bold(),
            summary.files_failed()
        ));
        lines.extend(summary.failures.iter().map(failure_line));
    }

    lines
}

fn failure_line(failure: &FileFailure) -> String {
    format!(
        "  {} {} [{}] {}",
        "✗".red(),
        failure.path.display(),
        failure.category.red(),
        failure.reason
    )
}
