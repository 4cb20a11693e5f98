// file: src/text/plain.rs
// description: local text extraction for plain-text corpora
// reference: lossy utf-8 decoding with binary sniffing

use crate::error::{PipelineError, Result};
use crate::text::TextExtractor;
use async_trait::async_trait;
use std::path::Path;

const SNIFF_LEN: usize = 8 * 1024;

/// Reads files directly. Anything with a NUL byte near the start is treated
/// as binary and rejected, since it needs a real document parser.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn looks_binary(bytes: &[u8]) -> bool {
        bytes[..bytes.len().min(SNIFF_LEN)].contains(&0)
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "plain"
    }

    async fn extract_text(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::file_operation(path, e))?;

        if Self::looks_binary(&bytes) {
            return Err(PipelineError::extraction(path, "binary content"));
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
