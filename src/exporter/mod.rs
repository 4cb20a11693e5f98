// file: src/exporter/mod.rs
// description: report output module exports
// reference: internal module structure

pub mod report;

pub use report::{REPORT_HEADER, ReportWriter};
