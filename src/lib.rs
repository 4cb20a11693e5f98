// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod corpus;
pub mod error;
pub mod exporter;
pub mod extractor;
pub mod graph;
pub mod models;
pub mod pipeline;
pub mod text;
pub mod utils;

pub use config::{Config, ExtractionConfig, GraphConfig, PipelineConfig, TextConfig};
pub use corpus::{ContentHasher, FileScanner, ScannedFile};
pub use error::{PipelineError, Result};
pub use exporter::ReportWriter;
pub use extractor::{CoinValidator, IndicatorExtractor};
pub use graph::{GraphError, GraphIngestor, GraphStore, InMemoryGraphStore, Neo4jStore};
pub use models::{
    CoinType, ContentHash, ExtractionRecord, FileIdentity, Indicator, IndicatorKind,
};
pub use pipeline::{FileFailure, PipelineOrchestrator, RunSummary};
pub use text::{PlainTextExtractor, TextExtractor, TikaClient};
pub use utils::Validator;
