//! Directed multigraph of entities and relations.
//!
//! Nodes are keyed by entity id (`TYPE:normalized`) and keep insertion order.
//! Parallel edges between the same ordered pair are told apart by an integer
//! key, so the same relation seen in two sentences is stored twice, each
//! with its own evidence.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use pubkg_common::{EntityType, RelationType};
use pubkg_ner::Entity;

use crate::relation::{generate_entity_id, EntityRef, Relation};

pub const GRAPH_VERSION: &str = "1.0";
pub const GRAPH_DESCRIPTION: &str = "Biomedical Knowledge Graph from PubMed XML";

/// Where in the literature a node or edge was seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub pubmed_id: String,
    pub section: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_pos: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_pos: Option<usize>,
}

impl SourceRef {
    pub fn new(pubmed_id: impl Into<String>, section: impl Into<String>, position: Option<(usize, usize)>) -> Self {
        Self {
            pubmed_id: pubmed_id.into(),
            section: section.into(),
            timestamp: Utc::now(),
            start_pos: position.map(|(s, _)| s),
            end_pos: position.map(|(_, e)| e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_text: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub key: usize,
    #[serde(flatten)]
    pub data: EdgeData,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        EdgeId { source: self.source.clone(), target: self.target.clone(), key: self.key }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId {
    pub source: String,
    pub target: String,
    pub key: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub created: DateTime<Utc>,
    pub version: String,
    pub description: String,
}

impl Default for GraphMetadata {
    fn default() -> Self {
        Self {
            created: Utc::now(),
            version: GRAPH_VERSION.to_string(),
            description: GRAPH_DESCRIPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    pub metadata: GraphMetadata,
    nodes: IndexMap<String, NodeData>,
    edges: Vec<Edge>,
    edge_index: HashMap<EdgeId, usize>,
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(metadata: GraphMetadata) -> Self {
        Self { metadata, ..Self::default() }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&String, &NodeData)> {
        self.nodes.iter()
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edge_index.get(id).map(|&i| &self.edges[i])
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn out_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.outgoing.get(id).into_iter().flatten().map(|&i| &self.edges[i])
    }

    pub fn in_edges<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.incoming.get(id).into_iter().flatten().map(|&i| &self.edges[i])
    }

    /// Insert the entity's node if absent and return its id.
    pub fn add_entity(&mut self, entity: &Entity) -> String {
        let id = generate_entity_id(entity);
        self.nodes.entry(id.clone()).or_insert_with(|| NodeData {
            entity_type: entity.entity_type,
            text: entity.text.clone(),
            normalized_text: Some(entity.normalized_text.clone()),
            sources: Vec::new(),
        });
        id
    }

    fn ensure_node(&mut self, entity: &EntityRef) {
        self.nodes.entry(entity.id.clone()).or_insert_with(|| NodeData {
            entity_type: entity.entity_type,
            text: entity.text.clone(),
            normalized_text: None,
            sources: Vec::new(),
        });
    }

    /// Add a new edge for `relation`, creating missing endpoint nodes.
    pub fn add_relation(&mut self, relation: &Relation) -> EdgeId {
        self.ensure_node(&relation.subject);
        self.ensure_node(&relation.object);
        self.insert_edge(
            relation.subject.id.clone(),
            relation.object.id.clone(),
            None,
            EdgeData {
                relation_type: relation.predicate,
                evidence: Some(relation.evidence.clone()),
                confidence: relation.confidence,
                sources: Vec::new(),
            },
        )
    }

    pub fn add_source_to_entity(&mut self, id: &str, source: SourceRef) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.sources.push(source);
                true
            }
            None => false,
        }
    }

    pub fn add_source_to_relation(&mut self, id: &EdgeId, source: SourceRef) -> bool {
        match self.edge_index.get(id) {
            Some(&i) => {
                self.edges[i].data.sources.push(source);
                true
            }
            None => false,
        }
    }

    /// Copy of the nodes in `ids` and every edge with both ends among them.
    pub fn induced_subgraph(&self, ids: &HashSet<String>) -> KnowledgeGraph {
        let mut sub = KnowledgeGraph::with_metadata(self.metadata.clone());
        for (id, node) in self.nodes.iter().filter(|(id, _)| ids.contains(*id)) {
            sub.nodes.insert(id.clone(), node.clone());
        }
        for edge in self.edges.iter().filter(|e| ids.contains(&e.source) && ids.contains(&e.target)) {
            sub.push_edge(edge.clone());
        }
        sub
    }

    pub(crate) fn insert_node(&mut self, id: String, data: NodeData) {
        self.nodes.insert(id, data);
    }

    /// Insert an edge; `key` is honoured when free, else the lowest integer
    /// not already used by the pair is taken.
    pub(crate) fn insert_edge(&mut self, source: String, target: String, key: Option<usize>, data: EdgeData) -> EdgeId {
        let mut id = EdgeId { source, target, key: 0 };
        id.key = match key {
            Some(k) if !self.edge_index.contains_key(&EdgeId { key: k, ..id.clone() }) => k,
            _ => (0..)
                .find(|&k| !self.edge_index.contains_key(&EdgeId { key: k, ..id.clone() }))
                .unwrap_or_default(),
        };
        self.push_edge(Edge { source: id.source.clone(), target: id.target.clone(), key: id.key, data });
        id
    }

    fn push_edge(&mut self, edge: Edge) {
        let i = self.edges.len();
        self.edge_index.insert(edge.id(), i);
        self.outgoing.entry(edge.source.clone()).or_default().push(i);
        self.incoming.entry(edge.target.clone()).or_default().push(i);
        self.edges.push(edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pubkg_ner::{normalize_text, EntitySource};

    fn entity(t: EntityType, text: &str) -> Entity {
        Entity {
            entity_type: t,
            text: text.to_string(),
            normalized_text: normalize_text(text),
            start_pos: 0,
            end_pos: text.len(),
            source: EntitySource::Dictionary,
        }
    }

    fn relation(s: &Entity, p: RelationType, o: &Entity, evidence: &str) -> Relation {
        Relation {
            subject: s.into(),
            predicate: p,
            object: o.into(),
            evidence: evidence.to_string(),
            confidence: 0.7,
        }
    }

    #[test]
    fn test_add_entity_is_idempotent() {
        let mut kg = KnowledgeGraph::new();
        let a = kg.add_entity(&entity(EntityType::Drug, "Aspirin"));
        let b = kg.add_entity(&entity(EntityType::Drug, "aspirin"));
        assert_eq!(a, "DRUG:aspirin");
        assert_eq!(a, b);
        assert_eq!(kg.node_count(), 1);
        assert_eq!(kg.node(&a).unwrap().text, "Aspirin");
    }

    #[test]
    fn test_parallel_edges_get_distinct_keys() {
        let mut kg = KnowledgeGraph::new();
        let aspirin = entity(EntityType::Drug, "aspirin");
        let fever = entity(EntityType::Symptom, "fever");

        let first = kg.add_relation(&relation(&aspirin, RelationType::Treats, &fever, "one"));
        let second = kg.add_relation(&relation(&aspirin, RelationType::Treats, &fever, "two"));
        let back = kg.add_relation(&relation(&fever, RelationType::CooccursWith, &aspirin, "three"));

        assert_eq!((first.key, second.key, back.key), (0, 1, 0));
        assert_eq!(kg.node_count(), 2);
        assert_eq!(kg.edge_count(), 3);
        // Nodes created from a relation carry no normalised text
        assert_eq!(kg.node("DRUG:aspirin").unwrap().normalized_text, None);
        assert_eq!(kg.edge(&second).unwrap().data.evidence.as_deref(), Some("two"));
        assert_eq!(kg.out_edges("DRUG:aspirin").count(), 2);
        assert_eq!(kg.in_edges("DRUG:aspirin").count(), 1);
    }

    #[test]
    fn test_sources_attach_only_to_existing_items() {
        let mut kg = KnowledgeGraph::new();
        let id = kg.add_entity(&entity(EntityType::Gene, "BRCA1"));
        assert!(kg.add_source_to_entity(&id, SourceRef::new("1", "abstract", Some((3, 8)))));
        assert!(!kg.add_source_to_entity("GENE:tp53", SourceRef::new("1", "abstract", None)));

        let missing = EdgeId { source: id.clone(), target: id.clone(), key: 0 };
        assert!(!kg.add_source_to_relation(&missing, SourceRef::new("1", "abstract", None)));

        let source = &kg.node(&id).unwrap().sources[0];
        assert_eq!((source.start_pos, source.end_pos), (Some(3), Some(8)));
    }

    #[test]
    fn test_explicit_key_collision_falls_back() {
        let mut kg = KnowledgeGraph::new();
        let data = EdgeData {
            relation_type: RelationType::CooccursWith,
            evidence: None,
            confidence: 0.5,
            sources: Vec::new(),
        };
        let a = kg.insert_edge("A".into(), "B".into(), Some(5), data.clone());
        let b = kg.insert_edge("A".into(), "B".into(), Some(5), data.clone());
        let c = kg.insert_edge("A".into(), "B".into(), None, data);
        assert_eq!((a.key, b.key, c.key), (5, 0, 1));
    }

    #[test]
    fn test_new_edge_fills_lowest_free_key() {
        let mut kg = KnowledgeGraph::new();
        let aspirin = entity(EntityType::Drug, "aspirin");
        let fever = entity(EntityType::Symptom, "fever");
        let data = EdgeData {
            relation_type: RelationType::Treats,
            evidence: None,
            confidence: 0.7,
            sources: Vec::new(),
        };
        // As if loaded from a file holding only key 1 for the pair
        kg.insert_edge("DRUG:aspirin".into(), "SYMPTOM:fever".into(), Some(1), data);

        let first = kg.add_relation(&relation(&aspirin, RelationType::Treats, &fever, "a"));
        let second = kg.add_relation(&relation(&aspirin, RelationType::Treats, &fever, "b"));
        assert_eq!((first.key, second.key), (0, 2));
    }

    #[test]
    fn test_induced_subgraph() {
        let mut kg = KnowledgeGraph::new();
        let a = entity(EntityType::Drug, "aspirin");
        let b = entity(EntityType::Symptom, "fever");
        let c = entity(EntityType::Disease, "influenza");
        kg.add_relation(&relation(&a, RelationType::Treats, &b, "x"));
        kg.add_relation(&relation(&c, RelationType::CooccursWith, &b, "y"));

        let keep: HashSet<String> = ["DRUG:aspirin", "SYMPTOM:fever"].iter().map(|s| s.to_string()).collect();
        let sub = kg.induced_subgraph(&keep);
        assert_eq!(sub.node_count(), 2);
        assert_eq!(sub.edge_count(), 1);
        assert_eq!(sub.edges().next().unwrap().data.relation_type, RelationType::Treats);
    }
}
