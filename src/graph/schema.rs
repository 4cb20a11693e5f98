// file: src/graph/schema.rs
// description: graph schema setup and startup connectivity checks
// reference: https://neo4j.com/docs/cypher-manual/current/constraints/

use crate::error::{PipelineError, Result};
use crate::graph::store::{GraphStore, NodeLabel};
use tracing::info;

pub struct SchemaManager<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> SchemaManager<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    /// Verifies the store is reachable and installs key constraints.
    /// Any failure here is a configuration error and aborts the run.
    pub async fn initialize(&self) -> Result<()> {
        info!("Checking {} graph store connectivity", self.store.name());

        self.store.ping().await.map_err(|e| {
            PipelineError::Config(format!("graph store unreachable: {}", e))
        })?;

        self.store.ensure_schema().await.map_err(|e| {
            PipelineError::Config(format!("failed to prepare graph schema: {}", e))
        })?;

        info!("Graph schema ready");
        Ok(())
    }

    /// One uniqueness constraint per label on its key property; these make
    /// concurrent MERGEs on the same key resolve to a single node.
    pub fn constraint_statements() -> Vec<String> {
        NodeLabel::all()
            .into_iter()
            .map(|label| {
                format!(
                    "CREATE CONSTRAINT {name} IF NOT EXISTS FOR (n:{label}) REQUIRE n.{key} IS UNIQUE",
                    name = format!(
                        "ioc_graph_{}_{}",
                        label.as_str().to_ascii_lowercase(),
                        label.key_property()
                    ),
                    label = label.as_str(),
                    key = label.key_property(),
                )
            })
            .collect()
    }
}
