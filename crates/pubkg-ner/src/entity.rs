use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use pubkg_common::EntityType;

/// Which recogniser produced an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntitySource {
    Dictionary,
    Model,
}

/// One entity mention.
///
/// Dictionary positions index the normalised text of the segment; model
/// positions index the raw segment text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub text: String,
    pub normalized_text: String,
    pub start_pos: usize,
    pub end_pos: usize,
    pub source: EntitySource,
}

/// Keep the first entity for every (normalised text, type) pair.
pub fn merge_duplicate_entities(entities: &[Entity]) -> Vec<Entity> {
    let mut seen = HashSet::new();
    entities
        .iter()
        .filter(|e| seen.insert((e.normalized_text.as_str(), e.entity_type)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(t: EntityType, text: &str, start: usize) -> Entity {
        Entity {
            entity_type: t,
            text: text.to_string(),
            normalized_text: text.to_lowercase(),
            start_pos: start,
            end_pos: start + text.len(),
            source: EntitySource::Dictionary,
        }
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let entities = vec![
            entity(EntityType::Disease, "Diabetes", 0),
            entity(EntityType::Drug, "aspirin", 12),
            entity(EntityType::Disease, "diabetes", 40),
            entity(EntityType::Chemical, "aspirin", 50),
        ];
        let merged = merge_duplicate_entities(&entities);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].start_pos, 0);
        assert_eq!(merged[2].entity_type, EntityType::Chemical);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(entity(EntityType::Gene, "TP53", 3)).unwrap();
        assert_eq!(json["type"], "GENE");
        assert_eq!(json["normalized_text"], "tp53");
        assert_eq!(json["source"], "dictionary");
    }
}
