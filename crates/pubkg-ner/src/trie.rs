//! Dictionary NER using an Aho-Corasick trie.
//!
//! Every dictionary term is normalised the same way as the input text and
//! compiled into one automaton, so a segment is scanned once regardless of
//! dictionary size. Matches must sit on word boundaries. Different terms
//! may overlap (e.g. "insulin" and "insulin receptor"); repeated hits of the
//! same term do not.

use std::collections::{BTreeMap, HashMap};

use aho_corasick::{AhoCorasick, MatchKind};
use tracing::info;

use pubkg_common::EntityType;

use crate::dictionary::EntityDictionary;
use crate::entity::{Entity, EntitySource};
use crate::text::normalize_text;
use crate::Result;

/// One dictionary term behind an automaton pattern.
#[derive(Debug, Clone)]
struct TermInfo {
    entity_type: EntityType,
    term: String,
    /// Position in dictionary order, used to order matches at equal offsets.
    order: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DictionaryStats {
    pub per_type: BTreeMap<EntityType, usize>,
    pub total_patterns: usize,
}

pub struct DictionaryNer {
    automaton: AhoCorasick,
    /// Pattern index -> terms (of any type) normalising to that pattern.
    pattern_info: Vec<Vec<TermInfo>>,
    stats: DictionaryStats,
}

impl DictionaryNer {
    pub fn new(dictionary: &EntityDictionary) -> Result<Self> {
        let mut patterns: Vec<String> = Vec::new();
        let mut pattern_info: Vec<Vec<TermInfo>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut stats = DictionaryStats::default();
        let mut order = 0;

        for (entity_type, terms) in dictionary.iter() {
            for term in terms {
                let pattern = normalize_text(term);
                if pattern.is_empty() {
                    continue;
                }
                let idx = *index.entry(pattern.clone()).or_insert_with(|| {
                    patterns.push(pattern);
                    pattern_info.push(Vec::new());
                    patterns.len() - 1
                });
                // "E. coli" and "E coli" under one type are the same entity
                if pattern_info[idx].iter().any(|i| i.entity_type == entity_type) {
                    continue;
                }
                pattern_info[idx].push(TermInfo { entity_type, term: term.clone(), order });
                *stats.per_type.entry(entity_type).or_default() += 1;
                order += 1;
            }
        }
        stats.total_patterns = patterns.len();

        // Standard semantics: overlapping search needs every match reported
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(&patterns)?;

        info!(
            patterns = stats.total_patterns,
            types = stats.per_type.len(),
            "DictionaryNer loaded"
        );
        Ok(Self { automaton, pattern_info, stats })
    }

    /// Find all dictionary entities in `text`. Positions index the
    /// normalised text.
    pub fn extract(&self, text: &str) -> Vec<Entity> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Vec::new();
        }
        let bytes = normalized.as_bytes();

        let mut last_end: HashMap<usize, usize> = HashMap::new();
        let mut hits: Vec<(usize, usize, Entity)> = Vec::new();

        for mat in self.automaton.find_overlapping_iter(&normalized) {
            let (start, end) = (mat.start(), mat.end());
            if !is_word_boundary(bytes, start) || !is_word_boundary(bytes, end) {
                continue;
            }
            let pattern_idx = mat.pattern().as_usize();
            if last_end.get(&pattern_idx).is_some_and(|&prev| start < prev) {
                continue;
            }
            last_end.insert(pattern_idx, end);

            for info in &self.pattern_info[pattern_idx] {
                hits.push((
                    start,
                    info.order,
                    Entity {
                        entity_type: info.entity_type,
                        text: info.term.clone(),
                        normalized_text: normalized[start..end].to_string(),
                        start_pos: start,
                        end_pos: end,
                        source: EntitySource::Dictionary,
                    },
                ));
            }
        }

        hits.sort_by_key(|(start, order, _)| (*start, *order));
        hits.into_iter().map(|(_, _, e)| e).collect()
    }

    /// Extract entities from multiple texts.
    /// Uses rayon for batches larger than 10 texts when `parallel` is on.
    pub fn extract_batch(&self, texts: &[&str]) -> Vec<Vec<Entity>> {
        #[cfg(feature = "parallel")]
        {
            if texts.len() > 10 {
                use rayon::prelude::*;
                return texts.par_iter().map(|text| self.extract(text)).collect();
            }
        }
        texts.iter().map(|text| self.extract(text)).collect()
    }

    pub fn stats(&self) -> &DictionaryStats {
        &self.stats
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Regex `\b` at byte offset `pos` of ASCII `text`.
fn is_word_boundary(text: &[u8], pos: usize) -> bool {
    let before = pos > 0 && is_word_byte(text[pos - 1]);
    let after = pos < text.len() && is_word_byte(text[pos]);
    before != after
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ner() -> DictionaryNer {
        DictionaryNer::new(&EntityDictionary::default()).unwrap()
    }

    #[test]
    fn test_default_dictionary_extraction() {
        let entities = ner().extract("Metformin lowers glucose in Diabetes; SARS-CoV-2 binds ACE2.");

        let found: Vec<(&str, EntityType)> =
            entities.iter().map(|e| (e.text.as_str(), e.entity_type)).collect();
        assert_eq!(
            found,
            vec![
                ("metformin", EntityType::Drug),
                ("glucose", EntityType::Chemical),
                ("diabetes", EntityType::Disease),
                ("SARS-CoV-2", EntityType::Organism),
                ("ACE2", EntityType::Protein),
            ]
        );
        let sars = &entities[3];
        assert_eq!(sars.normalized_text, "sars-cov-2");
        assert_eq!(
            &normalize_text("Metformin lowers glucose in Diabetes; SARS-CoV-2 binds ACE2.")
                [sars.start_pos..sars.end_pos],
            "sars-cov-2"
        );
    }

    #[test]
    fn test_whole_words_only() {
        let entities = ner().extract("heartburn and preheart are not the heart");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "heart");
        assert_eq!(entities[0].start_pos, 35);
    }

    #[test]
    fn test_overlapping_terms_and_punctuated_terms() {
        let entities = ner().extract("The insulin receptor and E. coli.");
        let texts: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["insulin receptor", "E. coli"]);

        let mut dict = EntityDictionary::empty();
        dict.insert(EntityType::Protein, "insulin");
        dict.insert(EntityType::Protein, "insulin receptor");
        let entities = DictionaryNer::new(&dict).unwrap().extract("insulin receptor");
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].end_pos, 7);
        assert_eq!(entities[1].end_pos, 16);
    }

    #[test]
    fn test_same_term_in_two_types() {
        let mut dict = EntityDictionary::empty();
        dict.insert(EntityType::Drug, "aspirin");
        dict.insert(EntityType::Chemical, "Aspirin");
        let ner = DictionaryNer::new(&dict).unwrap();
        assert_eq!(ner.stats().total_patterns, 1);

        let entities = ner.extract("aspirin, again aspirin");
        assert_eq!(entities.len(), 4);
        assert_eq!(entities[0].entity_type, EntityType::Drug);
        assert_eq!(entities[1].entity_type, EntityType::Chemical);
        assert_eq!(entities[2].start_pos, 14);
    }

    #[test]
    fn test_batch_processing() {
        let ner = ner();
        let texts = vec!["fever and cough", "nothing here", "PCR of the liver"];
        let results = ner.extract_batch(&texts);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].len(), 2);
        assert!(results[1].is_empty());
        assert_eq!(results[2].len(), 2);

        let many: Vec<&str> = std::iter::repeat("fever").take(20).collect();
        assert!(ner.extract_batch(&many).iter().all(|r| r.len() == 1));
    }

    #[test]
    fn test_stats_count_terms_per_type() {
        let stats = ner().stats().clone();
        assert_eq!(stats.per_type[&EntityType::Drug], 3);
        assert_eq!(stats.total_patterns, 30);
    }
}
