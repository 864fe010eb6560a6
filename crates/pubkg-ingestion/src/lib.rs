//! pubkg-ingestion: PubMed literature ingestion.
//! - XML download with primary/E-utilities fallback
//! - Generic streaming downloads
//! - PubMed / PMC XML parsing into `ParsedArticle`

pub mod download;
pub mod models;
pub mod parser;
pub mod sources;

pub use download::download_data;
pub use models::DownloadedArticle;
pub use parser::{parse_pubmed_xml, parse_pubmed_xml_str};
pub use sources::pubmed::{is_valid_pubmed_id, PubMedDownloader, DEFAULT_PMID};
pub use sources::XmlSource;
