// file: src/text/mod.rs
// description: text extraction backends that turn raw files into searchable text
// reference: internal module structure

pub mod plain;
pub mod tika;

pub use plain::PlainTextExtractor;
pub use tika::TikaClient;

use crate::config::{TextBackend, TextConfig};
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns the textual content of the file at `path`.
    async fn extract_text(&self, path: &Path) -> Result<String>;

    async fn ping(&self) -> Result<()>;
}

pub fn from_config(config: &TextConfig) -> Result<Arc<dyn TextExtractor>> {
    match config.backend {
        TextBackend::Tika => Ok(Arc::new(TikaClient::new(config)?)),
        TextBackend::Plain => Ok(Arc::new(PlainTextExtractor::new())),
    }
}
