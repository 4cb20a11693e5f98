// file: src/pipeline/processor.rs
// description: turns one scanned file into an extraction record
// reference: hashes content, fetches text, runs indicator extractors

use crate::corpus::{ContentHasher, ScannedFile};
use crate::error::{PipelineError, Result};
use crate::extractor::IndicatorExtractor;
use crate::models::ExtractionRecord;
use crate::text::TextExtractor;
use std::sync::Arc;
use tracing::debug;

pub struct FileProcessor {
    hasher: ContentHasher,
    text: Arc<dyn TextExtractor>,
    extractor: IndicatorExtractor,
}

impl FileProcessor {
    pub fn new(
        hasher: ContentHasher,
        text: Arc<dyn TextExtractor>,
        extractor: IndicatorExtractor,
    ) -> Self {
        Self {
            hasher,
            text,
            extractor,
        }
    }

    pub async fn process(&self, file: &ScannedFile) -> Result<ExtractionRecord> {
        debug!("Processing file: {}", file.relative_path);

        let hasher = self.hasher;
        let path = file.path.clone();
        let identity = tokio::task::spawn_blocking(move || hasher.identify(&path))
            .await
            .map_err(|e| {
                PipelineError::extraction(&file.path, format!("hashing task failed: {}", e))
            })??;

        let text = self.text.extract_text(&file.path).await?;
        let indicators = self.extractor.extract(&text);

        debug!(
            "{} ({}): {} indicators in {} chars",
            file.relative_path,
            identity.content_hash,
            indicators.len(),
            text.len()
        );

        Ok(ExtractionRecord::new(identity, indicators))
    }
}
