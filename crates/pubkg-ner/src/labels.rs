//! Mapping of NER model labels onto schema entity types.

use pubkg_common::EntityType;

/// Map a model label (scispaCy, BC5CDR, CRAFT, BIO-tagged...) to a schema
/// entity type. Labels with no schema counterpart map to `None`.
pub fn map_label(label: &str) -> Option<EntityType> {
    let clean = label
        .trim()
        .trim_start_matches("B-")
        .trim_start_matches("I-")
        .to_uppercase();

    let entity_type = match clean.as_str() {
        "CHEMICAL" | "SIMPLE_CHEMICAL" => EntityType::Chemical,
        "DRUG" => EntityType::Drug,
        "DISEASE" | "SPECIFICDISEASE" | "DISEASECLASS" | "CANCER" => EntityType::Disease,
        "SYMPTOM" => EntityType::Symptom,
        "GENE" | "GGP" | "GENE_OR_GENE_PRODUCT" => EntityType::Gene,
        "PROTEIN" => EntityType::Protein,
        "SPECIES" | "TAXON" | "ORGANISM" => EntityType::Organism,
        "ANATOMY" | "ORGAN" | "TISSUE" => EntityType::Anatomy,
        "PROCEDURE" => EntityType::Method,
        "PATHWAY" => EntityType::Pathway,
        _ => return None,
    };
    Some(entity_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bio_prefixes_are_stripped() {
        assert_eq!(map_label("B-GENE"), Some(EntityType::Gene));
        assert_eq!(map_label("I-DISEASE"), Some(EntityType::Disease));
        assert_eq!(map_label("GGP"), Some(EntityType::Gene));
    }

    #[test]
    fn test_schema_mapping() {
        assert_eq!(map_label("Chemical"), Some(EntityType::Chemical));
        assert_eq!(map_label("SPECIES"), Some(EntityType::Organism));
        assert_eq!(map_label("TISSUE"), Some(EntityType::Anatomy));
        assert_eq!(map_label("PROCEDURE"), Some(EntityType::Method));
        assert_eq!(map_label("Gene_or_gene_product"), Some(EntityType::Gene));
    }

    #[test]
    fn test_unmapped_labels_dropped() {
        assert_eq!(map_label("PERSON"), None);
        assert_eq!(map_label("ENTITY"), None);
        assert_eq!(map_label("CELL_TYPE"), None);
    }
}
