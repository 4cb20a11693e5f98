// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod indicator;
pub mod record;

pub use indicator::{CoinType, Indicator, IndicatorKind};
pub use record::{ContentHash, ExtractionRecord, FileIdentity};
