//! pubkg-kg: Knowledge graph construction, persistence and querying.
//! - Pattern and co-occurrence relation extraction
//! - Directed multigraph with source references back to article text
//! - Node-link JSON persistence
//! - Question answering over a traversed subgraph

pub mod builder;
pub mod graph;
pub mod persist;
pub mod pipeline;
pub mod query;
pub mod relation;
pub mod solver;

pub use builder::{BuildReport, KgBuilder};
pub use graph::{Edge, EdgeData, EdgeId, GraphMetadata, KnowledgeGraph, NodeData, SourceRef};
pub use persist::{load_knowledge_graph, save_knowledge_graph, SaveMetadata};
pub use pipeline::{process_pubmed_id, ProcessOptions, ProcessOutcome};
pub use query::{Direction, KgStatistics, Neighbor};
pub use relation::{
    extract_relations_by_cooccurrence, extract_relations_from_article, generate_entity_id,
    EntityRef, Relation,
};
pub use solver::{
    answer_question, Answer, AnswerSynthesizer, ChatCompletionSynthesizer, KgSolver, TemplateSynthesizer,
};
