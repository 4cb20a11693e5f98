// file: src/text/tika.rs
// description: Apache Tika server client for text extraction
// reference: https://cwiki.apache.org/confluence/display/TIKA/TikaServer

use crate::config::TextConfig;
use crate::error::{PipelineError, Result};
use crate::text::TextExtractor;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

pub struct TikaClient {
    client: Client,
    base_url: String,
}

impl TikaClient {
    pub fn new(config: &TextConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.tika_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/tika", self.base_url)
    }
}

#[async_trait]
impl TextExtractor for TikaClient {
    fn name(&self) -> &'static str {
        "tika"
    }

    async fn extract_text(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PipelineError::file_operation(path, e))?;

        debug!("Sending {} bytes from {} to Tika", bytes.len(), path.display());

        let response = self
            .client
            .put(self.endpoint())
            .header("Accept", "text/plain")
            .body(bytes)
            .send()
            .await
            .map_err(|e| PipelineError::extraction(path, format!("Tika request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::extraction(
                path,
                format!("Tika returned status {}: {}", status, error_text),
            ));
        }

        response.text().await.map_err(|e| {
            PipelineError::extraction(path, format!("Failed to read Tika response: {}", e))
        })
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .get(self.endpoint())
            .send()
            .await
            .map_err(|e| PipelineError::Config(format!("Tika unreachable at {}: {}", self.base_url, e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PipelineError::Config(format!(
                "Tika health check returned status {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TextBackend;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = TikaClient::new(&TextConfig {
            backend: TextBackend::Tika,
            tika_url: "http://localhost:9998/".to_string(),
            request_timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(client.endpoint(), "http://localhost:9998/tika");
    }
}
