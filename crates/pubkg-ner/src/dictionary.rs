//! Per-type entity gazetteers stored as `<type>_dict.json` string arrays.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use pubkg_common::EntityType;

use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDictionary {
    terms: IndexMap<EntityType, Vec<String>>,
}

fn default_terms(entity_type: EntityType) -> Vec<String> {
    entity_type.examples().iter().map(|s| s.to_string()).collect()
}

impl Default for EntityDictionary {
    /// Seed dictionaries from the schema examples.
    fn default() -> Self {
        let terms = EntityType::all()
            .iter()
            .map(|&t| (t, default_terms(t)))
            .collect();
        Self { terms }
    }
}

impl EntityDictionary {
    pub fn empty() -> Self {
        Self { terms: IndexMap::new() }
    }

    pub fn dict_path(dir: &Path, entity_type: EntityType) -> PathBuf {
        dir.join(format!("{}_dict.json", entity_type.as_str().to_lowercase()))
    }

    /// Load every type's dictionary from `dir`.
    ///
    /// A missing file is seeded with the defaults and written back; an
    /// unreadable or invalid file falls back to the defaults.
    pub fn load_dir(dir: &Path) -> Self {
        let mut dict = Self::empty();
        for &entity_type in EntityType::all() {
            let path = Self::dict_path(dir, entity_type);
            if !path.exists() {
                dict.terms.insert(entity_type, default_terms(entity_type));
                if let Err(e) = dict.save_type(dir, entity_type) {
                    warn!(path = %path.display(), error = %e, "Error saving default entity dictionary");
                }
                continue;
            }
            let terms = read_terms(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Error loading entity dictionary, using defaults");
                default_terms(entity_type)
            });
            dict.terms.insert(entity_type, terms);
        }
        info!(dir = %dir.display(), terms = dict.len(), "Entity dictionaries loaded");
        dict
    }

    /// Write one type's dictionary as a pretty-printed JSON array.
    pub fn save_type(&self, dir: &Path, entity_type: EntityType) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = Self::dict_path(dir, entity_type);
        let json = serde_json::to_string_pretty(self.terms(entity_type))?;
        std::fs::write(&path, json)?;
        debug!(path = %path.display(), "Saved entity dictionary");
        Ok(())
    }

    pub fn terms(&self, entity_type: EntityType) -> &[String] {
        self.terms.get(&entity_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, entity_type: EntityType, term: impl Into<String>) {
        self.terms.entry(entity_type).or_default().push(term.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityType, &[String])> {
        self.terms.iter().map(|(t, terms)| (*t, terms.as_slice()))
    }

    /// Total number of terms across all types.
    pub fn len(&self) -> usize {
        self.terms.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn read_terms(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_dir_seeds_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let dict = EntityDictionary::load_dir(dir.path());

        assert_eq!(dict, EntityDictionary::default());
        let seeded = dir.path().join("drug_dict.json");
        assert!(seeded.exists());
        let terms: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(seeded).unwrap()).unwrap();
        assert_eq!(terms, vec!["aspirin", "metformin", "atorvastatin"]);
    }

    #[test]
    fn test_load_dir_reads_existing_and_recovers_from_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gene_dict.json"), r#"["KRAS", "EGFR"]"#).unwrap();
        std::fs::write(dir.path().join("disease_dict.json"), "{not json").unwrap();

        let dict = EntityDictionary::load_dir(dir.path());
        assert_eq!(dict.terms(EntityType::Gene), ["KRAS", "EGFR"]);
        assert_eq!(dict.terms(EntityType::Disease), ["diabetes", "COVID-19", "hypertension"]);
        // The broken file is left for the user to fix
        assert_eq!(
            std::fs::read_to_string(dir.path().join("disease_dict.json")).unwrap(),
            "{not json"
        );
    }

    #[test]
    fn test_insert_and_len() {
        let mut dict = EntityDictionary::empty();
        assert!(dict.is_empty());
        dict.insert(EntityType::Drug, "remdesivir");
        dict.insert(EntityType::Drug, "dexamethasone");
        assert_eq!(dict.len(), 2);
        assert!(dict.terms(EntityType::Gene).is_empty());
    }
}
