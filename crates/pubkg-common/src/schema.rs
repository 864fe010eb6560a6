//! Biomedical knowledge graph schema: entity types, relation types and
//! the subject/object constraints each relation carries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PubkgError;

// ---------------------------------------------------------------------------
// Entity types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Drug,
    Disease,
    Gene,
    Protein,
    Pathway,
    Symptom,
    Anatomy,
    Organism,
    Chemical,
    Method,
}

impl EntityType {
    /// All entity types in schema order.
    pub fn all() -> &'static [EntityType] {
        &[
            EntityType::Drug,
            EntityType::Disease,
            EntityType::Gene,
            EntityType::Protein,
            EntityType::Pathway,
            EntityType::Symptom,
            EntityType::Anatomy,
            EntityType::Organism,
            EntityType::Chemical,
            EntityType::Method,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Drug     => "DRUG",
            EntityType::Disease  => "DISEASE",
            EntityType::Gene     => "GENE",
            EntityType::Protein  => "PROTEIN",
            EntityType::Pathway  => "PATHWAY",
            EntityType::Symptom  => "SYMPTOM",
            EntityType::Anatomy  => "ANATOMY",
            EntityType::Organism => "ORGANISM",
            EntityType::Chemical => "CHEMICAL",
            EntityType::Method   => "METHOD",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EntityType::Drug     => "Medications, therapeutic compounds, and chemical substances used for treatment",
            EntityType::Disease  => "Medical conditions, disorders, syndromes, and pathologies",
            EntityType::Gene     => "Genes, gene products, and genetic markers",
            EntityType::Protein  => "Proteins, enzymes, and protein complexes",
            EntityType::Pathway  => "Biological pathways and processes",
            EntityType::Symptom  => "Clinical manifestations and symptoms of diseases",
            EntityType::Anatomy  => "Anatomical structures, organs, and body parts",
            EntityType::Organism => "Living organisms including bacteria, viruses, and other pathogens",
            EntityType::Chemical => "Chemical compounds and substances not classified as drugs",
            EntityType::Method   => "Research methods, techniques, and procedures",
        }
    }

    /// Seed terms used for the default entity dictionaries.
    pub fn examples(&self) -> &'static [&'static str] {
        match self {
            EntityType::Drug     => &["aspirin", "metformin", "atorvastatin"],
            EntityType::Disease  => &["diabetes", "COVID-19", "hypertension"],
            EntityType::Gene     => &["BRCA1", "TP53", "APOE"],
            EntityType::Protein  => &["ACE2", "cytochrome P450", "insulin receptor"],
            EntityType::Pathway  => &["glycolysis", "apoptosis", "oxidative phosphorylation"],
            EntityType::Symptom  => &["fever", "cough", "fatigue"],
            EntityType::Anatomy  => &["liver", "brain", "heart"],
            EntityType::Organism => &["SARS-CoV-2", "E. coli", "S. aureus"],
            EntityType::Chemical => &["glucose", "sodium chloride", "ATP"],
            EntityType::Method   => &["PCR", "mass spectrometry", "CRISPR"],
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = PubkgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        EntityType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| PubkgError::UnknownType(s.to_string()))
    }
}

/// Whether `name` names a schema entity type (case-insensitive).
pub fn is_valid_entity_type(name: &str) -> bool {
    name.parse::<EntityType>().is_ok()
}

// ---------------------------------------------------------------------------
// Relation types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    Treats,
    Causes,
    InteractsWith,
    AssociatedWith,
    PartOf,
    ExpressedIn,
    Inhibits,
    Activates,
    ConvertsTo,
    CooccursWith,
}

/// Which entity types may fill one end of a relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeConstraint {
    Any,
    OneOf(&'static [EntityType]),
}

impl TypeConstraint {
    pub fn accepts(&self, entity_type: EntityType) -> bool {
        match self {
            TypeConstraint::Any => true,
            TypeConstraint::OneOf(types) => types.contains(&entity_type),
        }
    }
}

use EntityType as E;

const SMALL_MOLECULE_OR_GENE: &[EntityType] = &[E::Drug, E::Protein, E::Gene, E::Chemical];

impl RelationType {
    pub fn all() -> &'static [RelationType] {
        &[
            RelationType::Treats,
            RelationType::Causes,
            RelationType::InteractsWith,
            RelationType::AssociatedWith,
            RelationType::PartOf,
            RelationType::ExpressedIn,
            RelationType::Inhibits,
            RelationType::Activates,
            RelationType::ConvertsTo,
            RelationType::CooccursWith,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Treats         => "TREATS",
            RelationType::Causes         => "CAUSES",
            RelationType::InteractsWith  => "INTERACTS_WITH",
            RelationType::AssociatedWith => "ASSOCIATED_WITH",
            RelationType::PartOf         => "PART_OF",
            RelationType::ExpressedIn    => "EXPRESSED_IN",
            RelationType::Inhibits       => "INHIBITS",
            RelationType::Activates      => "ACTIVATES",
            RelationType::ConvertsTo     => "CONVERTS_TO",
            RelationType::CooccursWith   => "COOCCURS_WITH",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RelationType::Treats         => "Indicates that one entity (typically a drug) is used to treat another entity (typically a disease)",
            RelationType::Causes         => "Indicates that one entity causes or contributes to another entity",
            RelationType::InteractsWith  => "Indicates interaction between two entities (e.g., drug-drug interactions, protein-protein interactions)",
            RelationType::AssociatedWith => "Indicates a general association between entities without specifying directionality",
            RelationType::PartOf         => "Indicates that one entity is a component or part of another entity",
            RelationType::ExpressedIn    => "Indicates that a gene or protein is expressed in a specific anatomical location",
            RelationType::Inhibits       => "Indicates that one entity inhibits or suppresses another entity",
            RelationType::Activates      => "Indicates that one entity activates or enhances another entity",
            RelationType::ConvertsTo     => "Indicates that one entity is converted into another entity",
            RelationType::CooccursWith   => "Indicates co-occurrence or correlation between entities without implying causation",
        }
    }

    pub fn subject_types(&self) -> TypeConstraint {
        match self {
            RelationType::Treats         => TypeConstraint::OneOf(&[E::Drug, E::Method]),
            RelationType::Causes         => TypeConstraint::OneOf(&[E::Drug, E::Gene, E::Organism, E::Chemical]),
            RelationType::InteractsWith  => TypeConstraint::OneOf(SMALL_MOLECULE_OR_GENE),
            RelationType::AssociatedWith => TypeConstraint::Any,
            RelationType::PartOf         => TypeConstraint::OneOf(&[E::Anatomy, E::Protein, E::Gene, E::Chemical]),
            RelationType::ExpressedIn    => TypeConstraint::OneOf(&[E::Gene, E::Protein]),
            RelationType::Inhibits       => TypeConstraint::OneOf(SMALL_MOLECULE_OR_GENE),
            RelationType::Activates      => TypeConstraint::OneOf(SMALL_MOLECULE_OR_GENE),
            RelationType::ConvertsTo     => TypeConstraint::OneOf(&[E::Chemical, E::Drug]),
            RelationType::CooccursWith   => TypeConstraint::Any,
        }
    }

    pub fn object_types(&self) -> TypeConstraint {
        match self {
            RelationType::Treats         => TypeConstraint::OneOf(&[E::Disease, E::Symptom]),
            RelationType::Causes         => TypeConstraint::OneOf(&[E::Disease, E::Symptom, E::Protein]),
            RelationType::InteractsWith  => TypeConstraint::OneOf(SMALL_MOLECULE_OR_GENE),
            RelationType::AssociatedWith => TypeConstraint::Any,
            RelationType::PartOf         => TypeConstraint::OneOf(&[E::Anatomy, E::Pathway, E::Protein]),
            RelationType::ExpressedIn    => TypeConstraint::OneOf(&[E::Anatomy]),
            RelationType::Inhibits       => TypeConstraint::OneOf(&[E::Protein, E::Gene, E::Pathway]),
            RelationType::Activates      => TypeConstraint::OneOf(&[E::Protein, E::Gene, E::Pathway]),
            RelationType::ConvertsTo     => TypeConstraint::OneOf(&[E::Chemical, E::Drug]),
            RelationType::CooccursWith   => TypeConstraint::Any,
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = PubkgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        RelationType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| PubkgError::UnknownType(s.to_string()))
    }
}

/// Check a typed triple against the relation's subject/object constraints.
pub fn is_valid_relation(subject: EntityType, relation: RelationType, object: EntityType) -> bool {
    relation.subject_types().accepts(subject) && relation.object_types().accepts(object)
}
