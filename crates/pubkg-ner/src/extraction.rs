//! Per-section entity extraction over a parsed article.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use pubkg_common::{ArticleMetadata, EntityType, ParsedArticle};
use pubkg_config::NerConfig;

use crate::dictionary::EntityDictionary;
use crate::entity::Entity;
use crate::recognizer::{EntityRecognizer, HttpRecognizer};
use crate::trie::DictionaryNer;
use crate::Result;

/// Entities keyed by section name, plus the article metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub entities: IndexMap<String, Vec<Entity>>,
    pub metadata: ArticleMetadata,
}

impl ExtractedEntities {
    pub fn total(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityStatistics {
    pub total_entities: usize,
    pub entities_by_type: BTreeMap<EntityType, usize>,
    pub entities_by_section: IndexMap<String, usize>,
}

pub fn entity_statistics(extracted: &ExtractedEntities) -> EntityStatistics {
    let mut stats = EntityStatistics::default();
    for (section, entities) in &extracted.entities {
        stats.total_entities += entities.len();
        stats.entities_by_section.insert(section.clone(), entities.len());
        for entity in entities {
            *stats.entities_by_type.entry(entity.entity_type).or_default() += 1;
        }
    }
    stats
}

pub struct EntityExtractor {
    recognizers: Vec<Arc<dyn EntityRecognizer>>,
}

impl EntityExtractor {
    pub fn new(recognizers: Vec<Arc<dyn EntityRecognizer>>) -> Self {
        Self { recognizers }
    }

    /// Dictionary NER from `dictionary_dir`, plus the model service when
    /// one is configured.
    pub fn from_config(config: &NerConfig) -> Result<Self> {
        let dictionary = EntityDictionary::load_dir(&config.dictionary_dir);
        let dictionary_ner: Arc<dyn EntityRecognizer> = Arc::new(DictionaryNer::new(&dictionary)?);
        let mut recognizers = vec![dictionary_ner];
        if let Some(http) = HttpRecognizer::from_config(config)? {
            recognizers.push(Arc::new(http));
        }
        Ok(Self::new(recognizers))
    }

    pub fn with_dictionary(dictionary: &EntityDictionary) -> Result<Self> {
        let ner: Arc<dyn EntityRecognizer> = Arc::new(DictionaryNer::new(dictionary)?);
        Ok(Self::new(vec![ner]))
    }

    /// Run every recogniser over `text`. A failing recogniser is skipped.
    pub async fn extract_text(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        for recognizer in &self.recognizers {
            match recognizer.recognize(text).await {
                Ok(found) => entities.extend(found),
                Err(e) => warn!(recognizer = recognizer.name(), error = %e, "Recognizer failed, skipping"),
            }
        }

        let mut seen = HashSet::new();
        entities.retain(|e| {
            seen.insert((e.entity_type, e.normalized_text.clone(), e.start_pos, e.end_pos))
        });
        entities.sort_by_key(|e| e.start_pos);
        entities
    }

    #[instrument(skip_all, fields(pmid = article.pmid_or_unknown()))]
    pub async fn extract_article(&self, article: &ParsedArticle) -> ExtractedEntities {
        let mut result = ExtractedEntities {
            entities: IndexMap::new(),
            metadata: article.metadata.clone(),
        };
        for (section, text) in article.text_segments() {
            let entities = self.extract_text(text).await;
            result.entities.insert(section.to_string(), entities);
        }
        info!(
            sections = result.entities.len(),
            entities = result.total(),
            "Entity extraction complete"
        );
        result
    }
}
