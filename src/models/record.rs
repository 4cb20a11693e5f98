// file: src/models/record.rs
// description: per-file extraction result handed to the report sink and graph ingestion
// reference: content-addressed file identity

use crate::models::{Indicator, IndicatorKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Lowercase hex digest of a file's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub content_hash: ContentHash,
}

impl FileIdentity {
    pub fn new(path: impl Into<PathBuf>, content_hash: ContentHash) -> Self {
        Self {
            path: path.into(),
            content_hash,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    identity: FileIdentity,
    indicators: BTreeSet<Indicator>,
}

impl ExtractionRecord {
    pub fn new(identity: FileIdentity, indicators: impl IntoIterator<Item = Indicator>) -> Self {
        Self {
            identity,
            indicators: indicators.into_iter().collect(),
        }
    }

    pub fn identity(&self) -> &FileIdentity {
        &self.identity
    }

    pub fn indicators(&self) -> impl Iterator<Item = &Indicator> {
        self.indicators.iter()
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Kinds with at least one indicator, in kind order.
    pub fn kinds(&self) -> Vec<IndicatorKind> {
        self.count_by_kind().into_keys().collect()
    }

    pub fn count_by_kind(&self) -> BTreeMap<IndicatorKind, usize> {
        let mut counts = BTreeMap::new();
        for indicator in &self.indicators {
            *counts.entry(indicator.kind).or_insert(0) += 1;
        }
        counts
    }
}
