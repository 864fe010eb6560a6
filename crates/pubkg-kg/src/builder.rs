//! Builds the knowledge graph from parsed articles.

use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use pubkg_common::{ParsedArticle, Result};
use pubkg_config::NerConfig;
use pubkg_ingestion::parse_pubmed_xml;
use pubkg_ner::{EntityExtractor, ExtractedEntities};

use crate::graph::{KnowledgeGraph, SourceRef};
use crate::relation::{extract_relations_from_article, Relation};

/// Outcome of adding one article to a graph.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub run_id: Uuid,
    pub pmid: String,
    pub entity_count: usize,
    pub relation_count: usize,
    #[serde(skip)]
    pub entities: ExtractedEntities,
    #[serde(skip)]
    pub relations: IndexMap<String, Vec<Relation>>,
}

pub struct KgBuilder {
    extractor: EntityExtractor,
}

impl KgBuilder {
    pub fn new(extractor: EntityExtractor) -> Self {
        Self { extractor }
    }

    pub fn from_config(config: &NerConfig) -> Result<Self> {
        Ok(Self::new(EntityExtractor::from_config(config)?))
    }

    /// Add the article's entities and relations to `kg`.
    ///
    /// Every entity occurrence adds a positioned source to its node; every
    /// relation becomes a new edge carrying a section-level source.
    #[instrument(skip(self, kg, article), fields(pmid = %pmid))]
    pub async fn build_from_article(
        &self,
        kg: &mut KnowledgeGraph,
        article: &ParsedArticle,
        pmid: &str,
    ) -> BuildReport {
        let run_id = Uuid::new_v4();
        let entities = self.extractor.extract_article(article).await;
        let relations = extract_relations_from_article(article, &entities);

        for (section, found) in &entities.entities {
            for entity in found {
                let id = kg.add_entity(entity);
                let source = SourceRef::new(pmid, section.as_str(), Some((entity.start_pos, entity.end_pos)));
                kg.add_source_to_entity(&id, source);
            }
        }

        for (section, found) in &relations {
            for relation in found {
                let edge = kg.add_relation(relation);
                kg.add_source_to_relation(&edge, SourceRef::new(pmid, section.as_str(), None));
            }
        }

        let report = BuildReport {
            run_id,
            pmid: pmid.to_string(),
            entity_count: entities.total(),
            relation_count: relations.values().map(Vec::len).sum(),
            entities,
            relations,
        };
        info!(
            %run_id,
            entities = report.entity_count,
            relations = report.relation_count,
            nodes = kg.node_count(),
            edges = kg.edge_count(),
            "Article added to knowledge graph"
        );
        report
    }

    /// Parse `path` and add it, keyed by the article's own PMID.
    pub async fn build_from_xml_file(
        &self,
        kg: &mut KnowledgeGraph,
        path: &Path,
    ) -> Result<(BuildReport, ParsedArticle)> {
        let article = parse_pubmed_xml(path)?;
        let pmid = article.pmid_or_unknown().to_string();
        let report = self.build_from_article(kg, &article, &pmid).await;
        Ok((report, article))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pubkg_common::RelationType;
    use pubkg_ner::EntityDictionary;

    fn builder() -> KgBuilder {
        KgBuilder::new(EntityExtractor::with_dictionary(&EntityDictionary::default()).unwrap())
    }

    #[tokio::test]
    async fn test_build_from_article() {
        let article = ParsedArticle {
            abstract_text: "Aspirin treats fever. Aspirin and fever again.".into(),
            ..Default::default()
        };
        let mut kg = KnowledgeGraph::new();
        let report = builder().build_from_article(&mut kg, &article, "42").await;

        assert_eq!(report.pmid, "42");
        assert_eq!(report.entity_count, 4);
        assert_eq!(report.relation_count, 2);
        assert_eq!(kg.node_count(), 2);
        assert_eq!(kg.edge_count(), 2);

        let aspirin = kg.node("DRUG:aspirin").unwrap();
        assert_eq!(aspirin.sources.len(), 2);
        // Positions index the normalised text, where the full stop is gone
        assert_eq!(aspirin.sources[1].start_pos, Some(21));
        assert_eq!(aspirin.sources[0].section, "abstract");

        let types: Vec<RelationType> = kg.edges().map(|e| e.data.relation_type).collect();
        assert_eq!(types, vec![RelationType::Treats, RelationType::CooccursWith]);
        assert!(kg.edges().all(|e| e.data.sources[0].pubmed_id == "42"));
    }

    #[tokio::test]
    async fn test_build_accumulates_across_articles() {
        let b = builder();
        let mut kg = KnowledgeGraph::new();
        let first = ParsedArticle { abstract_text: "Aspirin treats fever.".into(), ..Default::default() };
        let second = ParsedArticle { abstract_text: "Aspirin treats fever!".into(), ..Default::default() };
        let r1 = b.build_from_article(&mut kg, &first, "1").await;
        let r2 = b.build_from_article(&mut kg, &second, "2").await;

        assert_ne!(r1.run_id, r2.run_id);
        assert_eq!(kg.node_count(), 2);
        assert_eq!(kg.edge_count(), 2);
        assert_eq!(kg.statistics().sources, vec!["1", "2"]);
    }
}
