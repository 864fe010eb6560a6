//! Biomedical named entity recognition for parsed PubMed articles.
//!
//! Dictionary matching runs locally through an Aho-Corasick automaton; an
//! optional HTTP model service (e.g. a scispaCy container) adds model-based
//! entities. Both sit behind the [`EntityRecognizer`] trait.

pub mod dictionary;
pub mod entity;
pub mod extraction;
pub mod labels;
pub mod recognizer;
pub mod text;
pub mod trie;

pub use dictionary::EntityDictionary;
pub use entity::{merge_duplicate_entities, Entity, EntitySource};
pub use extraction::{entity_statistics, EntityExtractor, EntityStatistics, ExtractedEntities};
pub use labels::map_label;
pub use recognizer::{EntityRecognizer, HttpRecognizer};
pub use text::{normalize_text, tokenize_sentences, tokenize_words};
pub use trie::{DictionaryNer, DictionaryStats};

pub type Result<T> = std::result::Result<T, NerError>;

#[derive(Debug, thiserror::Error)]
pub enum NerError {
    #[error("Automaton build failed: {0}")]
    Automaton(String),

    #[error("Dictionary I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid dictionary JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NER service request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<NerError> for pubkg_common::PubkgError {
    fn from(e: NerError) -> Self {
        pubkg_common::PubkgError::Ner(e.to_string())
    }
}

impl From<aho_corasick::BuildError> for NerError {
    fn from(e: aho_corasick::BuildError) -> Self {
        NerError::Automaton(e.to_string())
    }
}
