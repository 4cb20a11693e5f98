// file: src/graph/neo4j.rs
// description: Neo4j graph store over the HTTP transactional Cypher endpoint
// reference: https://neo4j.com/docs/http-api/current/

use crate::config::GraphConfig;
use crate::graph::schema::SchemaManager;
use crate::graph::store::{
    GraphError, GraphStore, NodeRef, PropertyMap, RelationshipType, UnitOfWork, Upsert,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct TxRequest {
    statements: Vec<Statement>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Statement {
    pub statement: String,
    pub parameters: Value,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

/// Each unit of work is sent as one `tx/commit` request, which Neo4j runs as
/// a single transaction. Concurrent requests are bounded by session permits.
#[derive(Clone)]
pub struct Neo4jStore {
    client: Client,
    commit_url: String,
    username: String,
    password: Option<String>,
    sessions: Arc<Semaphore>,
}

impl Neo4jStore {
    pub fn new(config: &GraphConfig) -> Result<Self, GraphError> {
        info!(
            "Configuring Neo4j store at {} (database {})",
            config.uri, config.database
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| GraphError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            commit_url: format!(
                "{}/db/{}/tx/commit",
                config.uri.trim_end_matches('/'),
                config.database
            ),
            username: config.username.clone(),
            password: config.password.clone(),
            sessions: Arc::new(Semaphore::new(config.max_sessions.max(1))),
        })
    }

    pub fn node_statement(node: &NodeRef, properties: &PropertyMap) -> Statement {
        Statement {
            statement: format!(
                "MERGE (n:{label} {{{key}: $key}}) SET n += $props RETURN count(n)",
                label = node.label.as_str(),
                key = node.label.key_property(),
            ),
            parameters: json!({ "key": node.key, "props": properties }),
        }
    }

    pub fn relationship_statement(
        rel_type: RelationshipType,
        from: &NodeRef,
        to: &NodeRef,
    ) -> Statement {
        Statement {
            statement: format!(
                "MATCH (a:{from_label} {{{from_key}: $from}}) \
                 MATCH (b:{to_label} {{{to_key}: $to}}) \
                 MERGE (a)-[r:{rel}]->(b) RETURN count(r)",
                from_label = from.label.as_str(),
                from_key = from.label.key_property(),
                to_label = to.label.as_str(),
                to_key = to.label.key_property(),
                rel = rel_type.as_str(),
            ),
            parameters: json!({ "from": from.key, "to": to.key }),
        }
    }

    async fn commit(&self, statements: Vec<Statement>) -> Result<Vec<StatementResult>, GraphError> {
        let _session = self
            .sessions
            .acquire()
            .await
            .map_err(|_| GraphError::Unavailable("session pool closed".to_string()))?;

        let response = self
            .client
            .post(&self.commit_url)
            .basic_auth(&self.username, self.password.as_ref())
            .header("Accept", "application/json")
            .json(&TxRequest { statements })
            .send()
            .await
            .map_err(|e| GraphError::Unavailable(format!("Neo4j request failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GraphError::Unavailable(format!(
                "Neo4j returned status {}",
                status
            )));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GraphError::Rejected {
                code: status.as_u16().to_string(),
                message: "authentication failed".to_string(),
            });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GraphError::Protocol(format!(
                "Neo4j returned status {}: {}",
                status, body
            )));
        }

        let body: TxResponse = response
            .json()
            .await
            .map_err(|e| GraphError::Protocol(format!("Failed to parse Neo4j response: {}", e)))?;

        if let Some(error) = body.errors.into_iter().next() {
            return Err(classify(error));
        }

        Ok(body.results)
    }
}

fn classify(error: Neo4jError) -> GraphError {
    // MERGE races on a unique constraint surface as ConstraintValidationFailed; a retry sees the winner.
    if error.code.starts_with("Neo.TransientError")
        || error.code == "Neo.ClientError.Schema.ConstraintValidationFailed"
    {
        GraphError::Transient(format!("{}: {}", error.code, error.message))
    } else {
        GraphError::Rejected {
            code: error.code,
            message: error.message,
        }
    }
}

fn first_count(result: Option<&StatementResult>) -> Option<u64> {
    result?.data.first()?.row.first()?.as_u64()
}

#[async_trait]
impl GraphStore for Neo4jStore {
    fn name(&self) -> &'static str {
        "neo4j"
    }

    async fn apply(&self, unit: &UnitOfWork) -> Result<(), GraphError> {
        if unit.is_empty() {
            return Ok(());
        }

        let statements: Vec<Statement> = unit
            .ops()
            .iter()
            .map(|op| match op {
                Upsert::Node { node, properties } => Self::node_statement(node, properties),
                Upsert::Relationship { rel_type, from, to } => {
                    Self::relationship_statement(*rel_type, from, to)
                }
            })
            .collect();

        debug!("Committing unit of work: {}", unit.describe());
        let results = self.commit(statements).await?;

        for (index, op) in unit.ops().iter().enumerate() {
            if let Upsert::Relationship { from, to, .. } = op
                && first_count(results.get(index)).unwrap_or(0) == 0
            {
                return Err(GraphError::MissingEndpoint(format!("{} or {}", from, to)));
            }
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), GraphError> {
        let results = self
            .commit(vec![Statement {
                statement: "RETURN 1".to_string(),
                parameters: json!({}),
            }])
            .await?;

        match first_count(results.first()) {
            Some(1) => Ok(()),
            _ => Err(GraphError::Protocol("unexpected ping result".to_string())),
        }
    }

    async fn ensure_schema(&self) -> Result<(), GraphError> {
        // schema changes cannot share a transaction with each other's writes
        for statement in SchemaManager::constraint_statements() {
            self.commit(vec![Statement {
                statement,
                parameters: json!({}),
            }])
            .await?;
        }
        Ok(())
    }
}
