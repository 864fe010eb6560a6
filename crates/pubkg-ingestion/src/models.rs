//! Data models for the ingestion stage.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A PubMed XML record saved to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadedArticle {
    pub pmid: String,
    pub path: PathBuf,
    pub bytes: u64,
    /// Hex SHA-256 of the saved body.
    pub sha256: String,
    /// Name of the source that served the record.
    pub source: String,
}
