// file: src/graph/mod.rs
// description: graph store module exports
// reference: internal module structure

pub mod ingest;
pub mod memory;
pub mod neo4j;
pub mod schema;
pub mod store;

pub use ingest::{GraphIngestor, IngestStats, IngestionError, RetryPolicy};
pub use memory::InMemoryGraphStore;
pub use neo4j::Neo4jStore;
pub use schema::SchemaManager;
pub use store::{
    GraphError, GraphStore, NodeLabel, NodeRef, PropertyMap, RelationshipType, UnitOfWork, Upsert,
};

use crate::config::{GraphBackend, GraphConfig};
use std::sync::Arc;

/// Builds the configured store backend.
pub fn connect(config: &GraphConfig) -> Result<Arc<dyn GraphStore>, GraphError> {
    match config.backend {
        GraphBackend::Neo4j => Ok(Arc::new(Neo4jStore::new(config)?)),
        GraphBackend::Memory => Ok(Arc::new(InMemoryGraphStore::new())),
    }
}
