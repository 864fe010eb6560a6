//! Relation extraction from sentence co-occurrence and lexical patterns.

use std::collections::HashSet;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pubkg_common::{is_valid_relation, EntityType, ParsedArticle, RelationType};
use pubkg_ner::{normalize_text, tokenize_sentences, Entity, ExtractedEntities};

const PATTERN_CONFIDENCE: f64 = 0.7;
const COOCCURRENCE_CONFIDENCE: f64 = 0.5;

/// Stable node id: `"{TYPE}:{normalized_text}"`.
pub fn generate_entity_id(entity: &Entity) -> String {
    format!("{}:{}", entity.entity_type, entity.normalized_text)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

impl From<&Entity> for EntityRef {
    fn from(e: &Entity) -> Self {
        Self { id: generate_entity_id(e), text: e.text.clone(), entity_type: e.entity_type }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub subject: EntityRef,
    pub predicate: RelationType,
    pub object: EntityRef,
    pub evidence: String,
    pub confidence: f64,
}

fn relation_patterns() -> &'static [(RelationType, Vec<Regex>)] {
    static PATTERNS: OnceLock<Vec<(RelationType, Vec<Regex>)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: &[(RelationType, &[&str])] = &[
            (RelationType::Treats, &[
                r"(\w+)\s+(treat|treats|treating|treated|therapy|therapeutic|effective|efficacy|used for)\s+(\w+)",
                r"(\w+)\s+(for the treatment of|indicated for|used to treat)\s+(\w+)",
                r"treatment of (\w+) with (\w+)",
            ]),
            (RelationType::Causes, &[
                r"(\w+)\s+(cause|causes|causing|caused|induce|induces|inducing|induced|lead to|leads to|leading to|led to)\s+(\w+)",
                r"(\w+)\s+(result in|results in|resulting in|resulted in)\s+(\w+)",
                r"(\w+)\s+(associated with|contributing to|contribute to|contributes to)\s+(\w+)",
            ]),
            (RelationType::InteractsWith, &[
                r"(\w+)\s+(interact|interacts|interacting|interacted|interaction|binding|binds|bound|bind)\s+(with|to)\s+(\w+)",
                r"(\w+)-(\w+) interaction",
                r"(\w+)\s+(potentiate|potentiates|inhibit|inhibits)\s+(\w+)",
            ]),
            (RelationType::AssociatedWith, &[
                r"(\w+)\s+(associated with|linked to|related to|correlation with|correlate with|correlates with)\s+(\w+)",
                r"association between (\w+) and (\w+)",
                r"relationship between (\w+) and (\w+)",
            ]),
            (RelationType::PartOf, &[
                r"(\w+)\s+(is part of|are part of|component of|contained in|located in)\s+(\w+)",
                r"(\w+)\s+(contain|contains|containing|contained)\s+(\w+)",
            ]),
            (RelationType::ExpressedIn, &[
                r"(\w+)\s+(expressed in|expression in|expressed by|expression by|found in|localized in|localizes to)\s+(\w+)",
                r"expression of (\w+) in (\w+)",
            ]),
            (RelationType::Inhibits, &[
                r"(\w+)\s+(inhibit|inhibits|inhibiting|inhibited|suppress|suppresses|suppressing|suppressed|block|blocks|blocking|blocked)\s+(\w+)",
                r"inhibition of (\w+) by (\w+)",
            ]),
            (RelationType::Activates, &[
                r"(\w+)\s+(activate|activates|activating|activated|stimulate|stimulates|stimulating|stimulated)\s+(\w+)",
                r"activation of (\w+) by (\w+)",
            ]),
        ];
        table
            .iter()
            .map(|(relation, patterns)| {
                let compiled = patterns.iter().map(|p| Regex::new(p).unwrap()).collect();
                (*relation, compiled)
            })
            .collect()
    })
}

/// Find a pattern relation between two entities in `sentence`.
///
/// Returns the relation and whether `e1` is the subject. Patterns with a
/// verb group bind subject to the first group and object to the last one;
/// two-group patterns ("association between X and Y") are symmetric.
/// Matching runs on the normalised sentence, the same form entities carry.
pub fn extract_relation_by_pattern(sentence: &str, e1: &Entity, e2: &Entity) -> Option<(RelationType, bool)> {
    let lower = normalize_text(sentence);
    let (t1, t2) = (e1.normalized_text.as_str(), e2.normalized_text.as_str());

    for (relation, patterns) in relation_patterns() {
        for pattern in patterns {
            for caps in pattern.captures_iter(&lower) {
                let groups: Vec<&str> = caps
                    .iter()
                    .skip(1)
                    .map(|g| g.map_or("", |m| m.as_str()))
                    .collect();
                match groups.as_slice() {
                    [subject, _, .., object] => {
                        if subject.contains(t1) && object.contains(t2) {
                            if is_valid_relation(e1.entity_type, *relation, e2.entity_type) {
                                return Some((*relation, true));
                            }
                        } else if subject.contains(t2)
                            && object.contains(t1)
                            && is_valid_relation(e2.entity_type, *relation, e1.entity_type)
                        {
                            return Some((*relation, false));
                        }
                    }
                    [a, b] => {
                        if (a.contains(t1) && b.contains(t2)) || (a.contains(t2) && b.contains(t1)) {
                            return Some((*relation, true));
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    None
}

/// Relations between entities that share a sentence of `text`.
///
/// Entities are de-duplicated by (type, normalised text) first, so each
/// pair yields at most one relation per sentence.
pub fn extract_relations_by_cooccurrence(text: &str, entities: &[Entity]) -> Vec<Relation> {
    if text.is_empty() || entities.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let distinct: Vec<&Entity> = entities
        .iter()
        .filter(|e| !e.normalized_text.is_empty())
        .filter(|e| seen.insert((e.entity_type, e.normalized_text.as_str())))
        .collect();

    let mut relations = Vec::new();
    for sentence in tokenize_sentences(text) {
        let normalized = normalize_text(sentence);
        let present: Vec<&Entity> = distinct
            .iter()
            .copied()
            .filter(|e| normalized.contains(e.normalized_text.as_str()))
            .collect();
        if present.len() < 2 {
            continue;
        }

        for (j, e1) in present.iter().enumerate() {
            for e2 in &present[j + 1..] {
                if e1.text == e2.text {
                    continue;
                }
                let (mut predicate, forward) = extract_relation_by_pattern(sentence, e1, e2)
                    .unwrap_or((RelationType::CooccursWith, true));
                let (subject, object) = if forward { (*e1, *e2) } else { (*e2, *e1) };
                if !is_valid_relation(subject.entity_type, predicate, object.entity_type) {
                    predicate = RelationType::CooccursWith;
                }
                relations.push(Relation {
                    subject: subject.into(),
                    predicate,
                    object: object.into(),
                    evidence: sentence.to_string(),
                    confidence: if predicate == RelationType::CooccursWith {
                        COOCCURRENCE_CONFIDENCE
                    } else {
                        PATTERN_CONFIDENCE
                    },
                });
            }
        }
    }
    relations
}

/// Relations per section, in the same section order as entity extraction.
pub fn extract_relations_from_article(
    article: &ParsedArticle,
    extracted: &ExtractedEntities,
) -> IndexMap<String, Vec<Relation>> {
    let mut by_section = IndexMap::new();
    for (section, text) in article.text_segments() {
        let Some(entities) = extracted.entities.get(section) else {
            continue;
        };
        let relations = extract_relations_by_cooccurrence(text, entities);
        debug!(section, relations = relations.len(), "Relations extracted");
        by_section.insert(section.to_string(), relations);
    }
    by_section
}
