// file: src/graph/memory.rs
// description: in-process graph store with per-unit atomic upserts
// reference: mutex-guarded in-memory graph store for tests and dry runs

use crate::graph::store::{
    GraphError, GraphStore, NodeLabel, NodeRef, PropertyMap, RelationshipType, UnitOfWork, Upsert,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct GraphState {
    nodes: BTreeMap<NodeRef, PropertyMap>,
    relationships: BTreeSet<(RelationshipType, NodeRef, NodeRef)>,
}

/// Every unit of work runs under a single lock, so concurrent upserts of the
/// same key converge on one node.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    state: Mutex<GraphState>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.state.lock().relationships.len()
    }

    pub fn node(&self, node: &NodeRef) -> Option<PropertyMap> {
        self.state.lock().nodes.get(node).cloned()
    }

    pub fn nodes_with_label(&self, label: NodeLabel) -> Vec<NodeRef> {
        self.state
            .lock()
            .nodes
            .keys()
            .filter(|node| node.label == label)
            .cloned()
            .collect()
    }

    pub fn relationships_from(&self, from: &NodeRef) -> Vec<(RelationshipType, NodeRef)> {
        self.state
            .lock()
            .relationships
            .iter()
            .filter(|(_, source, _)| source == from)
            .map(|(rel_type, _, target)| (*rel_type, target.clone()))
            .collect()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn apply(&self, unit: &UnitOfWork) -> Result<(), GraphError> {
        let mut state = self.state.lock();

        // Validate endpoints before touching state so a failed unit leaves nothing behind.
        let mut pending: BTreeSet<&NodeRef> = BTreeSet::new();
        for op in unit.ops() {
            match op {
                Upsert::Node { node, .. } => {
                    pending.insert(node);
                }
                Upsert::Relationship { from, to, .. } => {
                    for endpoint in [from, to] {
                        if !pending.contains(endpoint) && !state.nodes.contains_key(endpoint) {
                            return Err(GraphError::MissingEndpoint(endpoint.to_string()));
                        }
                    }
                }
            }
        }

        for op in unit.ops() {
            match op {
                Upsert::Node { node, properties } => {
                    let entry = state.nodes.entry(node.clone()).or_default();
                    entry.insert(
                        node.label.key_property().to_string(),
                        Value::String(node.key.clone()),
                    );
                    entry.extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                Upsert::Relationship { rel_type, from, to } => {
                    state
                        .relationships
                        .insert((*rel_type, from.clone(), to.clone()));
                }
            }
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), GraphError> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), GraphError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndicatorKind;
    use serde_json::json;

    fn email(value: &str) -> NodeRef {
        NodeRef::new(NodeLabel::Indicator(IndicatorKind::Email), value)
    }

    #[tokio::test]
    async fn test_node_upsert_is_idempotent() {
        let store = InMemoryGraphStore::new();
        let mut props = PropertyMap::new();
        props.insert("path".to_string(), json!("/a.txt"));

        store
            .upsert_node(NodeLabel::File, "abc", props.clone())
            .await
            .unwrap();
        store
            .upsert_node(NodeLabel::File, "abc", props)
            .await
            .unwrap();

        assert_eq!(store.node_count(), 1);
        let node = store.node(&NodeRef::new(NodeLabel::File, "abc")).unwrap();
        assert_eq!(node["md5"], json!("abc"));
    }

    #[tokio::test]
    async fn test_properties_overwritten() {
        let store = InMemoryGraphStore::new();
        let file = NodeRef::new(NodeLabel::File, "abc");

        let mut first = PropertyMap::new();
        first.insert("path".to_string(), json!("/first.txt"));
        let mut second = PropertyMap::new();
        second.insert("path".to_string(), json!("/second.txt"));

        store.upsert_node(NodeLabel::File, "abc", first).await.unwrap();
        store.upsert_node(NodeLabel::File, "abc", second).await.unwrap();

        assert_eq!(store.node(&file).unwrap()["path"], json!("/second.txt"));
    }

    #[tokio::test]
    async fn test_relationship_requires_endpoints() {
        let store = InMemoryGraphStore::new();
        let file = NodeRef::new(NodeLabel::File, "abc");

        let err = store
            .upsert_relationship(RelationshipType(IndicatorKind::Email), &file, &email("a@b.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, GraphError::MissingEndpoint(_)));
        assert_eq!(store.relationship_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_unit_applies_nothing() {
        let store = InMemoryGraphStore::new();
        let file = NodeRef::new(NodeLabel::File, "abc");
        let unit = UnitOfWork::new()
            .node(file.clone(), PropertyMap::new())
            .relationship(RelationshipType(IndicatorKind::Email), file, email("ghost@b.com"));

        assert!(store.apply(&unit).await.is_err());
        assert_eq!(store.node_count(), 0);
    }

    #[tokio::test]
    async fn test_unit_with_endpoints_applies() {
        let store = InMemoryGraphStore::new();
        let file = NodeRef::new(NodeLabel::File, "abc");
        let unit = UnitOfWork::new()
            .node(file.clone(), PropertyMap::new())
            .node(email("a@b.com"), PropertyMap::new())
            .relationship(RelationshipType(IndicatorKind::Email), file.clone(), email("a@b.com"));

        store.apply(&unit).await.unwrap();
        store.apply(&unit).await.unwrap();

        assert_eq!(store.node_count(), 2);
        assert_eq!(store.relationship_count(), 1);
        assert_eq!(store.relationships_from(&file).len(), 1);
    }
}
