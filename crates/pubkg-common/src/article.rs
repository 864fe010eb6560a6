//! Parsed article model shared by ingestion, NER and KG crates.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Bibliographic metadata pulled out of a PubMed XML record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub pmid: Option<String>,
    pub doi: Option<String>,
    pub title: Option<String>,
    pub journal: Option<String>,
    /// "Day Month Year", "Month Year", "Year" or empty.
    pub pub_date: String,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
}

/// Structured content of one article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedArticle {
    pub metadata: ArticleMetadata,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub full_text: String,
    /// Section name -> cleaned section text, in document order.
    pub sections: IndexMap<String, String>,
}

impl ParsedArticle {
    pub fn pmid_or_unknown(&self) -> &str {
        self.metadata.pmid.as_deref().unwrap_or("unknown")
    }

    /// Text segments to mine, keyed by section name.
    ///
    /// The abstract comes first, then every parsed section. The full text is
    /// only used when the article has no sections at all.
    pub fn text_segments(&self) -> IndexMap<&str, &str> {
        let mut segments = IndexMap::new();
        if !self.abstract_text.is_empty() {
            segments.insert("abstract", self.abstract_text.as_str());
        }
        for (name, text) in &self.sections {
            segments.insert(name.as_str(), text.as_str());
        }
        if self.sections.is_empty() && !self.full_text.is_empty() {
            segments.insert("full_text", self.full_text.as_str());
        }
        segments
    }
}
