// file: src/pipeline/progress.rs
// description: progress tracking and end-of-run summary for pipeline execution
// reference: uses indicatif for progress bars and tracks processing metrics

use crate::models::IndicatorKind;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub category: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub run_id: String,
    pub files_total: usize,
    pub files_processed: usize,
    pub files_cancelled: usize,
    pub failures: Vec<FileFailure>,
    pub indicators: BTreeMap<IndicatorKind, usize>,
    pub report_lines: usize,
    pub units_applied: usize,
    pub retries: usize,
    pub duration_secs: u64,
}

impl RunSummary {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total_indicators(&self) -> usize {
        self.indicators.values().sum()
    }

    pub fn files_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.files_processed as f64 / self.duration_secs as f64
    }

    /// Share of attempted files that made it through; cancelled files are not attempts.
    pub fn success_rate(&self) -> f64 {
        let total = self.files_processed + self.files_failed();
        if total == 0 {
            return 0.0;
        }
        (self.files_processed as f64 / total as f64) * 100.0
    }

    /// Failure counts keyed by error category.
    pub fn failures_by_category(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.category).or_insert(0) += 1;
        }
        counts
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    files_processed: AtomicUsize,
    files_failed: AtomicUsize,
    indicators_found: AtomicUsize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn hidden(total_files: usize) -> Self {
        Self::with_options(total_files, false, false)
    }

    pub fn with_options(total_files: usize, colored: bool, visible: bool) -> Self {
        let multi_progress = if visible {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let main_bar = create_progress_bar(&multi_progress, total_files as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            files_processed: AtomicUsize::new(0),
            files_failed: AtomicUsize::new(0),
            indicators_found: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn inc_files_processed(&self, indicators: usize) {
        self.files_processed.fetch_add(1, Ordering::SeqCst);
        self.indicators_found.fetch_add(indicators, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_files_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_files_cancelled(&self) {
        self.main_bar.inc(1);
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Processing complete");
        self.detail_bar.finish_and_clear();
    }

    fn update_detail_bar(&self) {
        let indicators = self.indicators_found.load(Ordering::SeqCst);
        let processed = self.files_processed.load(Ordering::SeqCst);
        let failed = self.files_failed.load(Ordering::SeqCst);

        self.detail_bar.set_message(format!(
            "Processed: {} | Indicators: {} | Failed: {}",
            processed, indicators, failed
        ));
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = bar_template(colored);
    // templates are static; fall back to the default style rather than fail the run
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        bar.set_style(style.progress_chars(chars));
    }
    bar
}

fn bar_template(colored: bool) -> (&'static str, &'static str) {
    if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            "█▓▒░",
        )
    } else {
        (
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}",
            "=>-",
        )
    }
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
        bar.set_style(style);
    }
    bar
}
