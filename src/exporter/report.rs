// file: src/exporter/report.rs
// description: tab-separated indicator report shared by all workers
// reference: https://docs.rs/csv

use crate::error::{PipelineError, Result};
use crate::models::ExtractionRecord;
use csv::{QuoteStyle, Writer, WriterBuilder};
use parking_lot::Mutex;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const REPORT_HEADER: [&str; 4] = ["source", "md5", "type", "value"];

/// One line per (file, kind, value). Lines for a record are written together
/// and flushed before `append` returns, so a crash loses at most the record
/// in flight.
pub struct ReportWriter {
    path: PathBuf,
    writer: Mutex<Writer<File>>,
}

impl ReportWriter {
    /// Creates or truncates the report and writes the header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::create(&path).map_err(|e| {
            PipelineError::Report(format!("cannot create report {}: {}", path.display(), e))
        })?;

        // fields are written verbatim; paths may contain quote characters
        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .from_writer(file);

        writer.write_record(REPORT_HEADER)?;
        writer.flush()?;

        info!("Writing report to {}", path.display());

        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of lines written.
    pub fn append(&self, record: &ExtractionRecord) -> Result<usize> {
        if record.is_empty() {
            return Ok(0);
        }

        let identity = record.identity();
        let source = identity.display_path();
        let mut writer = self.writer.lock();

        for indicator in record.indicators() {
            writer.write_record([
                source.as_str(),
                identity.content_hash.as_str(),
                indicator.kind.as_str(),
                indicator.value.as_str(),
            ])?;
        }
        writer.flush()?;

        debug!("Reported {} indicators for {}", record.len(), source);
        Ok(record.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoinType, ContentHash, FileIdentity, Indicator, IndicatorKind};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn record(path: &str) -> ExtractionRecord {
        ExtractionRecord::new(
            FileIdentity::new(path, ContentHash::from_hex("9e107d9d372bb6826bd81d3542a419d6")),
            vec![
                Indicator::new(IndicatorKind::Ipv4, "10.0.0.1"),
                Indicator::new(
                    IndicatorKind::CryptoAddress(CoinType::Bitcoin),
                    "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
                ),
                Indicator::new(IndicatorKind::Email, "a@b.com"),
            ],
        )
    }

    #[test]
    fn test_header_and_sorted_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.tsv");

        let report = ReportWriter::create(&path).unwrap();
        assert_eq!(report.append(&record("/evidence/a.txt")).unwrap(), 3);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "source\tmd5\ttype\tvalue\n\
             /evidence/a.txt\t9e107d9d372bb6826bd81d3542a419d6\temail\ta@b.com\n\
             /evidence/a.txt\t9e107d9d372bb6826bd81d3542a419d6\tipv4\t10.0.0.1\n\
             /evidence/a.txt\t9e107d9d372bb6826bd81d3542a419d6\tbtc\t1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa\n"
        );
    }

    #[test]
    fn test_appends_are_not_deduplicated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.tsv");

        let report = ReportWriter::create(&path).unwrap();
        report.append(&record("/evidence/a.txt")).unwrap();
        report.append(&record("/evidence/a.txt")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 7);
    }

    #[test]
    fn test_empty_record_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.tsv");

        let report = ReportWriter::create(&path).unwrap();
        let empty = ExtractionRecord::new(
            FileIdentity::new("/e/x", ContentHash::from_hex("d41d8cd98f00b204e9800998ecf8427e")),
            Vec::new(),
        );

        assert_eq!(report.append(&empty).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "source\tmd5\ttype\tvalue\n");
    }

    #[test]
    fn test_quotes_in_path_written_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.tsv");

        let report = ReportWriter::create(&path).unwrap();
        let quoted = ExtractionRecord::new(
            FileIdentity::new(
                "/e/say \"hi\" o'brien.txt",
                ContentHash::from_hex("9e107d9d372bb6826bd81d3542a419d6"),
            ),
            vec![Indicator::new(IndicatorKind::Email, "a@b.com")],
        );
        report.append(&quoted).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.lines().nth(1).unwrap(),
            "/e/say \"hi\" o'brien.txt\t9e107d9d372bb6826bd81d3542a419d6\temail\ta@b.com"
        );
    }

    #[test]
    fn test_create_truncates_existing_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.tsv");
        fs::write(&path, "stale line\n").unwrap();

        ReportWriter::create(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "source\tmd5\ttype\tvalue\n");
    }

    #[test]
    fn test_unwritable_report_is_report_error() {
        let err = ReportWriter::create("/nonexistent-dir/report.tsv")
            .err()
            .unwrap();
        assert!(err.is_fatal());
        assert_eq!(err.category(), "report");
    }
}
