// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use crate::graph::IngestionError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Extraction failed for {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    #[error("Ingestion failed for {path}: {source}")]
    Ingestion {
        path: PathBuf,
        source: IngestionError,
    },

    #[error("Report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn file_operation(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::FileOperation {
            path: path.into(),
            source,
        }
    }

    pub fn extraction(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PipelineError::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Taxonomy name used in logs and the end-of-run summary.
    pub fn category(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "configuration",
            PipelineError::FileOperation { .. } | PipelineError::Io(_) => "io",
            PipelineError::Extraction { .. } => "extraction",
            PipelineError::Ingestion { .. } => "ingestion",
            PipelineError::Report(_) => "report",
        }
    }

    /// Configuration and report failures abort a run; everything else is scoped to one file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Config(_) | PipelineError::Report(_))
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Report(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let io = PipelineError::file_operation(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(io.category(), "io");
        assert!(!io.is_fatal());

        let extraction = PipelineError::extraction("/tmp/x", "binary content");
        assert_eq!(extraction.category(), "extraction");
        assert!(extraction.to_string().contains("binary content"));

        let ingestion = PipelineError::Ingestion {
            path: PathBuf::from("/tmp/x"),
            source: IngestionError {
                unit: "(File:abc)".to_string(),
                attempts: 3,
                cause: crate::graph::GraphError::Unavailable("connection refused".to_string()),
            },
        };
        assert_eq!(ingestion.category(), "ingestion");
        assert!(ingestion.to_string().contains("after 3 attempt(s)"));

        assert!(PipelineError::Config("bad".to_string()).is_fatal());
    }
}
