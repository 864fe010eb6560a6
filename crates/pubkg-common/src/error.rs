use thiserror::Error;

#[derive(Debug, Error)]
pub enum PubkgError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Invalid PubMed ID: {0:?}")]
    InvalidPubmedId(String),

    #[error("Download failed for PMID {pmid}: {reason}")]
    DownloadFailed { pmid: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid knowledge graph: {0}")]
    Graph(String),

    #[error("Entity recognition failed: {0}")]
    Ner(String),

    #[error("Unknown schema type: {0}")]
    UnknownType(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PubkgError>;
