//! Read-side queries over a [`KnowledgeGraph`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use pubkg_common::{EntityType, RelationType};

use crate::graph::{EdgeId, KnowledgeGraph, SourceRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub direction: Direction,
    pub relation_type: RelationType,
    pub entity_id: String,
    pub entity_type: Option<EntityType>,
    pub entity_text: Option<String>,
    pub confidence: f64,
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KgStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub entity_types: BTreeMap<EntityType, usize>,
    pub relation_types: BTreeMap<RelationType, usize>,
    pub source_count: usize,
    pub sources: Vec<String>,
}

impl KnowledgeGraph {
    /// Node ids whose text or normalised text contains `text`, ignoring case.
    pub fn query_by_entity(&self, text: &str, entity_type: Option<EntityType>) -> Vec<String> {
        let needle = text.to_lowercase();
        self.nodes()
            .filter(|(_, node)| entity_type.map_or(true, |t| node.entity_type == t))
            .filter(|(_, node)| {
                node.text.to_lowercase().contains(&needle)
                    || node.normalized_text.as_deref().is_some_and(|n| n.contains(&needle))
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Outgoing neighbours first, then incoming ones.
    pub fn neighbors(&self, id: &str, relation_type: Option<RelationType>) -> Vec<Neighbor> {
        if !self.contains_node(id) {
            return Vec::new();
        }

        let outgoing = self.out_edges(id).map(|e| (Direction::Outgoing, e, &e.target));
        let incoming = self.in_edges(id).map(|e| (Direction::Incoming, e, &e.source));
        outgoing
            .chain(incoming)
            .filter(|(_, e, _)| relation_type.map_or(true, |r| e.data.relation_type == r))
            .map(|(direction, e, other)| {
                let node = self.node(other);
                Neighbor {
                    direction,
                    relation_type: e.data.relation_type,
                    entity_id: other.clone(),
                    entity_type: node.map(|n| n.entity_type),
                    entity_text: node.map(|n| n.text.clone()),
                    confidence: e.data.confidence,
                    evidence: e.data.evidence.clone(),
                }
            })
            .collect()
    }

    pub fn entity_sources(&self, id: &str) -> &[SourceRef] {
        self.node(id).map(|n| n.sources.as_slice()).unwrap_or(&[])
    }

    pub fn relation_sources(&self, id: &EdgeId) -> &[SourceRef] {
        self.edge(id).map(|e| e.data.sources.as_slice()).unwrap_or(&[])
    }

    pub fn statistics(&self) -> KgStatistics {
        let mut stats = KgStatistics {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            ..Default::default()
        };
        let mut pmids = BTreeSet::new();

        for (_, node) in self.nodes() {
            *stats.entity_types.entry(node.entity_type).or_default() += 1;
            pmids.extend(node.sources.iter().map(|s| s.pubmed_id.clone()));
        }
        for edge in self.edges() {
            *stats.relation_types.entry(edge.data.relation_type).or_default() += 1;
            pmids.extend(edge.data.sources.iter().map(|s| s.pubmed_id.clone()));
        }

        stats.source_count = pmids.len();
        stats.sources = pmids.into_iter().collect();
        stats
    }
}
