// file: src/graph/store.rs
// description: graph store abstraction with keyed, idempotent upserts
// reference: property graph merge semantics

use crate::models::{CoinType, IndicatorKind};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub type PropertyMap = BTreeMap<String, Value>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph store unavailable: {0}")]
    Unavailable(String),

    #[error("transient graph store failure: {0}")]
    Transient(String),

    #[error("graph store rejected statement ({code}): {message}")]
    Rejected { code: String, message: String },

    #[error("relationship endpoint missing: {0}")]
    MissingEndpoint(String),

    #[error("unexpected graph store response: {0}")]
    Protocol(String),
}

impl GraphError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GraphError::Unavailable(_) | GraphError::Transient(_))
    }
}

/// Node labels form a closed set so they never carry caller data into a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeLabel {
    File,
    Indicator(IndicatorKind),
}

impl NodeLabel {
    pub fn all() -> Vec<NodeLabel> {
        let mut labels = vec![
            NodeLabel::File,
            NodeLabel::Indicator(IndicatorKind::Email),
            NodeLabel::Indicator(IndicatorKind::Ipv4),
        ];
        labels.extend(
            CoinType::ALL
                .iter()
                .map(|coin| NodeLabel::Indicator(IndicatorKind::CryptoAddress(*coin))),
        );
        labels
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::File => "File",
            NodeLabel::Indicator(IndicatorKind::Email) => "Email",
            NodeLabel::Indicator(IndicatorKind::Ipv4) => "IPv4",
            NodeLabel::Indicator(IndicatorKind::CryptoAddress(CoinType::Bitcoin)) => "BTC",
        }
    }

    /// Name of the property that identifies a node under this label.
    pub fn key_property(&self) -> &'static str {
        match self {
            NodeLabel::File => "md5",
            NodeLabel::Indicator(_) => "value",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationshipType(pub IndicatorKind);

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self.0 {
            IndicatorKind::Email => "HAS_EMAIL",
            IndicatorKind::Ipv4 => "HAS_IPV4",
            IndicatorKind::CryptoAddress(CoinType::Bitcoin) => "HAS_BTC",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a node by label and the value of its key property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub key: String,
}

impl NodeRef {
    pub fn new(label: NodeLabel, key: impl Into<String>) -> Self {
        Self {
            label,
            key: key.into(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{})", self.label, self.key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    Node {
        node: NodeRef,
        properties: PropertyMap,
    },
    Relationship {
        rel_type: RelationshipType,
        from: NodeRef,
        to: NodeRef,
    },
}

/// Ordered upserts a store applies atomically: all or none become visible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfWork {
    ops: Vec<Upsert>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(mut self, node: NodeRef, properties: PropertyMap) -> Self {
        self.ops.push(Upsert::Node { node, properties });
        self
    }

    pub fn relationship(mut self, rel_type: RelationshipType, from: NodeRef, to: NodeRef) -> Self {
        self.ops.push(Upsert::Relationship { rel_type, from, to });
        self
    }

    pub fn ops(&self) -> &[Upsert] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn describe(&self) -> String {
        self.ops
            .iter()
            .map(|op| match op {
                Upsert::Node { node, .. } => node.to_string(),
                Upsert::Relationship { rel_type, from, to } => {
                    format!("{}-[{}]->{}", from, rel_type, to)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Applies every upsert in order as one atomic unit.
    async fn apply(&self, unit: &UnitOfWork) -> Result<(), GraphError>;

    async fn ping(&self) -> Result<(), GraphError>;

    /// Prepares whatever the backend needs for per-key atomic upserts.
    async fn ensure_schema(&self) -> Result<(), GraphError>;

    async fn upsert_node(
        &self,
        label: NodeLabel,
        key: &str,
        properties: PropertyMap,
    ) -> Result<NodeRef, GraphError> {
        let node = NodeRef::new(label, key);
        self.apply(&UnitOfWork::new().node(node.clone(), properties))
            .await?;
        Ok(node)
    }

    async fn upsert_relationship(
        &self,
        rel_type: RelationshipType,
        from: &NodeRef,
        to: &NodeRef,
    ) -> Result<(), GraphError> {
        self.apply(&UnitOfWork::new().relationship(rel_type, from.clone(), to.clone()))
            .await
    }
}
