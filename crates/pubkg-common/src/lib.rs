//! pubkg-common: Shared types, errors, and the KG schema used across all pubkg crates.

pub mod error;
pub mod schema;
pub mod article;

// Re-export commonly used types
pub use error::{PubkgError, Result};
pub use schema::{EntityType, RelationType, is_valid_entity_type, is_valid_relation};
pub use article::{ArticleMetadata, ParsedArticle};
