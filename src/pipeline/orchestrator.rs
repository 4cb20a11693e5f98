// file: src/pipeline/orchestrator.rs
// description: coordinates scanning, per-file processing, reporting and graph ingestion
// reference: orchestrates asynchronous ingestion workflow

use crate::config::Config;
use crate::corpus::{ContentHasher, FileScanner, ScannedFile};
use crate::error::{PipelineError, Result};
use crate::exporter::ReportWriter;
use crate::extractor::IndicatorExtractor;
use crate::graph::{self, GraphIngestor, GraphStore, IngestStats, RetryPolicy, SchemaManager};
use crate::models::{ExtractionRecord, IndicatorKind};
use crate::pipeline::processor::FileProcessor;
use crate::pipeline::progress::{FileFailure, ProgressTracker, RunSummary};
use crate::text::{self, TextExtractor};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

enum FileOutcome {
    Processed {
        indicators: BTreeMap<IndicatorKind, usize>,
        report_lines: usize,
        ingest: IngestStats,
    },
    Failed {
        path: PathBuf,
        error: PipelineError,
    },
    Cancelled,
}

pub struct PipelineOrchestrator {
    config: Config,
    processor: Arc<FileProcessor>,
    ingestor: GraphIngestor,
    text: Arc<dyn TextExtractor>,
    run_id: String,
    cancel: CancellationToken,
    colored_progress: bool,
}

impl PipelineOrchestrator {
    /// Builds the configured graph and text backends.
    pub fn new(config: Config) -> Result<Self> {
        let store = graph::connect(&config.graph)
            .map_err(|e| PipelineError::Config(format!("cannot configure graph store: {}", e)))?;
        let text = text::from_config(&config.text)?;
        Self::with_backends(config, store, text)
    }

    pub fn with_backends(
        config: Config,
        store: Arc<dyn GraphStore>,
        text: Arc<dyn TextExtractor>,
    ) -> Result<Self> {
        config.validate()?;

        let run_id = Uuid::new_v4().to_string();
        let extractor = IndicatorExtractor::from_config(&config.extraction)?;
        let processor = Arc::new(FileProcessor::new(
            ContentHasher::new(config.pipeline.hash_chunk_size),
            text.clone(),
            extractor,
        ));
        let ingestor = GraphIngestor::new(
            store,
            RetryPolicy::from_config(&config.graph),
            run_id.clone(),
        );

        Ok(Self {
            config,
            processor,
            ingestor,
            text,
            run_id,
            cancel: CancellationToken::new(),
            colored_progress: true,
        })
    }

    /// Progress bar colouring; follows the `--color` flag.
    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored_progress = colored;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Cancelling stops new files from starting; files already in flight finish.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Startup checks. Any failure is a configuration error.
    pub async fn initialize(&self) -> Result<()> {
        SchemaManager::new(self.ingestor.store().as_ref())
            .initialize()
            .await?;

        info!("Checking {} text extraction backend", self.text.name());
        self.text.ping().await.map_err(|e| match e {
            PipelineError::Config(_) => e,
            other => PipelineError::Config(format!("text extraction unavailable: {}", other)),
        })?;

        Ok(())
    }

    pub async fn run(&self, input: &Path, report_path: &Path) -> Result<RunSummary> {
        info!("Starting indicator ingestion run {}", self.run_id);

        self.initialize().await?;

        // an unreadable input must not truncate an existing report
        let files = self.scan_files(input).await?;
        let report = ReportWriter::create(report_path)?;

        let mut summary = RunSummary::new(self.run_id.clone());
        summary.files_total = files.len();

        if files.is_empty() {
            warn!("No files found to process in {}", input.display());
            return Ok(summary);
        }

        let workers = self.config.pipeline.parallel_workers.max(1);
        let progress = ProgressTracker::with_options(
            files.len(),
            self.colored_progress,
            self.config.pipeline.show_progress,
        );

        info!(
            "Processing {} files with {} concurrent workers",
            files.len(),
            workers
        );

        let outcomes: Vec<FileOutcome> = stream::iter(files)
            .map(|file| self.process_one(file, &report, &progress))
            .buffer_unordered(workers)
            .collect()
            .await;

        progress.finish();

        let mut fatal = None;
        for outcome in outcomes {
            match outcome {
                FileOutcome::Processed {
                    indicators,
                    report_lines,
                    ingest,
                } => {
                    summary.files_processed += 1;
                    summary.report_lines += report_lines;
                    summary.units_applied += ingest.units_applied;
                    summary.retries += ingest.retries;
                    for (kind, count) in indicators {
                        *summary.indicators.entry(kind).or_insert(0) += count;
                    }
                }
                FileOutcome::Failed { path, error } => {
                    summary.failures.push(FileFailure {
                        path,
                        category: error.category(),
                        reason: error.to_string(),
                    });
                    if error.is_fatal() && fatal.is_none() {
                        fatal = Some(error);
                    }
                }
                FileOutcome::Cancelled => summary.files_cancelled += 1,
            }
        }

        summary.failures.sort_by(|a, b| a.path.cmp(&b.path));
        summary.duration_secs = progress.elapsed_secs();
        self.log_final_stats(&summary);

        match fatal {
            Some(error) => Err(error),
            None => Ok(summary),
        }
    }

    async fn scan_files(&self, input: &Path) -> Result<Vec<ScannedFile>> {
        let root = input.to_path_buf();
        let pipeline_config = self.config.pipeline.clone();

        tokio::task::spawn_blocking(move || FileScanner::new(pipeline_config).scan_directory(&root))
            .await
            .map_err(|e| PipelineError::Config(format!("File scanning task failed: {}", e)))?
    }

    async fn process_one(
        &self,
        file: ScannedFile,
        report: &ReportWriter,
        progress: &ProgressTracker,
    ) -> FileOutcome {
        if self.cancel.is_cancelled() {
            progress.inc_files_cancelled();
            return FileOutcome::Cancelled;
        }

        progress.set_message(format!("Processing {}", file.relative_path));

        match self.ingest_file(&file, report).await {
            Ok((record, report_lines, ingest)) => {
                progress.inc_files_processed(record.len());
                FileOutcome::Processed {
                    indicators: record.count_by_kind(),
                    report_lines,
                    ingest,
                }
            }
            Err(error) => {
                progress.inc_files_failed();
                if error.is_fatal() {
                    error!("Aborting run: {}", error);
                    self.cancel.cancel();
                } else {
                    warn!("Skipping {} [{}]: {}", file.path.display(), error.category(), error);
                }
                FileOutcome::Failed {
                    path: file.path,
                    error,
                }
            }
        }
    }

    async fn ingest_file(
        &self,
        file: &ScannedFile,
        report: &ReportWriter,
    ) -> Result<(ExtractionRecord, usize, IngestStats)> {
        let record = self.processor.process(file).await?;
        let report_lines = report.append(&record)?;

        let ingest = self
            .ingestor
            .ingest(&record, &file.path)
            .await
            .map_err(|source| {
                error!(
                    "Graph ingestion failed for {} ({})",
                    file.path.display(),
                    record.identity().content_hash
                );
                PipelineError::Ingestion {
                    path: file.path.clone(),
                    source,
                }
            })?;

        Ok((record, report_lines, ingest))
    }

    fn log_final_stats(&self, summary: &RunSummary) {
        info!("=== Run {} Summary ===", summary.run_id);
        info!("Duration: {} seconds", summary.duration_secs);
        info!("Files found: {}", summary.files_total);
        info!("Files processed: {}", summary.files_processed);
        info!("Files failed: {}", summary.files_failed());
        info!("Files cancelled: {}", summary.files_cancelled);
        info!("Success rate: {:.2}%", summary.success_rate());
        info!("Processing speed: {:.2} files/sec", summary.files_per_second());
        for (kind, count) in &summary.indicators {
            info!("{} indicators: {}", kind, count);
        }
        info!("Report lines written: {}", summary.report_lines);
        info!(
            "Graph units applied: {} ({} retries)",
            summary.units_applied, summary.retries
        );
        for (category, count) in summary.failures_by_category() {
            info!("Skipped ({}): {}", category, count);
        }
        info!("=================================");
    }
}
