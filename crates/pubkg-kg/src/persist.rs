//! Node-link JSON persistence.
//!
//! ```json
//! { "directed": true, "multigraph": true, "graph": {...},
//!   "nodes": [{"id": ..., "type": ..., ...}],
//!   "links": [{"source": ..., "target": ..., "key": 0, "type": ..., ...}],
//!   "metadata": {"saved_at": ..., "node_count": ..., "edge_count": ...} }
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use pubkg_common::{PubkgError, Result};

use crate::graph::{Edge, GraphMetadata, KnowledgeGraph, NodeData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub saved_at: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
}

#[derive(Serialize, Deserialize)]
struct NodeRecord {
    id: String,
    #[serde(flatten)]
    data: NodeData,
}

#[derive(Serialize, Deserialize)]
struct NodeLinkDocument {
    directed: bool,
    multigraph: bool,
    graph: GraphMetadata,
    nodes: Vec<NodeRecord>,
    links: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<SaveMetadata>,
}

#[instrument(skip(kg, path), fields(path = %path.display()))]
pub fn save_knowledge_graph(kg: &KnowledgeGraph, path: &Path) -> Result<SaveMetadata> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let metadata = SaveMetadata {
        saved_at: Utc::now(),
        node_count: kg.node_count(),
        edge_count: kg.edge_count(),
    };
    let doc = NodeLinkDocument {
        directed: true,
        multigraph: true,
        graph: kg.metadata.clone(),
        nodes: kg
            .nodes()
            .map(|(id, data)| NodeRecord { id: id.clone(), data: data.clone() })
            .collect(),
        links: kg.edges().cloned().collect(),
        metadata: Some(metadata.clone()),
    };

    fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    info!(nodes = metadata.node_count, edges = metadata.edge_count, "Knowledge graph saved");
    Ok(metadata)
}

#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_knowledge_graph(path: &Path) -> Result<KnowledgeGraph> {
    if !path.exists() {
        return Err(PubkgError::NotFound(format!("knowledge graph file {}", path.display())));
    }
    let doc: NodeLinkDocument = serde_json::from_str(&fs::read_to_string(path)?)?;

    let mut kg = KnowledgeGraph::with_metadata(doc.graph);
    for node in doc.nodes {
        kg.insert_node(node.id, node.data);
    }
    for link in doc.links {
        for end in [&link.source, &link.target] {
            if !kg.contains_node(end) {
                return Err(PubkgError::Graph(format!("link references unknown node {end}")));
            }
        }
        kg.insert_edge(link.source, link.target, Some(link.key), link.data);
    }

    info!(nodes = kg.node_count(), edges = kg.edge_count(), "Knowledge graph loaded");
    Ok(kg)
}
