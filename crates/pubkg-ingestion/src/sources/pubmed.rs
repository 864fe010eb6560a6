//! PubMed XML download with source fallback.
//!
//! Endpoints used:
//!   primary: {primary_base}/{pmid}/xml/            (PMC article mirror)
//!   efetch:  {eutils_base}/efetch.fcgi?db=pubmed   (NCBI E-utilities)

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use pubkg_common::{PubkgError, Result};
use pubkg_config::IngestionConfig;

use super::XmlSource;
use crate::models::DownloadedArticle;

pub const DEFAULT_PMID: &str = "32133153";

/// A PubMed ID is a non-empty run of ASCII digits.
pub fn is_valid_pubmed_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// The PMC article mirror (`{base}/{pmid}/xml/`).
pub struct PmcMirrorSource {
    base_url: String,
}

impl PmcMirrorSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }
}

#[async_trait]
impl XmlSource for PmcMirrorSource {
    fn name(&self) -> &str {
        "pmc"
    }

    fn url_for(&self, pmid: &str) -> String {
        format!("{}/{}/xml/", self.base_url.trim_end_matches('/'), pmid)
    }
}

/// NCBI E-utilities efetch.
pub struct EutilsSource {
    base_url: String,
    api_key: Option<SecretString>,
}

impl EutilsSource {
    pub fn new(base_url: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self { base_url: base_url.into(), api_key }
    }
}

#[async_trait]
impl XmlSource for EutilsSource {
    fn name(&self) -> &str {
        "eutils"
    }

    fn url_for(&self, pmid: &str) -> String {
        let mut url = format!(
            "{}/efetch.fcgi?db=pubmed&id={}&retmode=xml",
            self.base_url.trim_end_matches('/'),
            pmid
        );
        if let Some(key) = &self.api_key {
            url.push_str("&api_key=");
            url.push_str(key.expose_secret());
        }
        url
    }
}

pub struct PubMedDownloader {
    client: Client,
    sources: Vec<Box<dyn XmlSource>>,
    default_pmid: String,
}

impl PubMedDownloader {
    /// Primary mirror first, E-utilities as fallback.
    pub fn from_config(config: &IngestionConfig) -> Result<Self> {
        let sources: Vec<Box<dyn XmlSource>> = vec![
            Box::new(PmcMirrorSource::new(&config.primary_base_url)),
            Box::new(EutilsSource::new(&config.eutils_base_url, config.api_key.clone())),
        ];
        let mut downloader =
            Self::with_sources(sources, Duration::from_secs(config.timeout_secs))?;
        downloader.default_pmid = config.default_pmid.clone();
        Ok(downloader)
    }

    pub fn with_sources(sources: Vec<Box<dyn XmlSource>>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pubkg/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, sources, default_pmid: DEFAULT_PMID.to_string() })
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.name())
    }

    /// Download the XML record for `pmid` (default PMID when `None`) into
    /// `{out_dir}/pubmed_{pmid}.xml`.
    #[instrument(skip(self, out_dir))]
    pub async fn download(&self, pmid: Option<&str>, out_dir: &Path) -> Result<DownloadedArticle> {
        let pmid = pmid.unwrap_or(&self.default_pmid).trim();
        if !is_valid_pubmed_id(pmid) {
            return Err(PubkgError::InvalidPubmedId(pmid.to_string()));
        }

        let mut failures = Vec::new();
        for source in &self.sources {
            match source.fetch(&self.client, pmid).await {
                Ok(body) => {
                    tokio::fs::create_dir_all(out_dir).await?;
                    let path = out_dir.join(format!("pubmed_{}.xml", pmid));
                    tokio::fs::write(&path, &body).await?;

                    let sha256 = format!("{:x}", Sha256::digest(&body));
                    info!(
                        pmid,
                        source = source.name(),
                        bytes = body.len(),
                        path = %path.display(),
                        "Downloaded PubMed XML"
                    );
                    return Ok(DownloadedArticle {
                        pmid: pmid.to_string(),
                        path,
                        bytes: body.len() as u64,
                        sha256,
                        source: source.name().to_string(),
                    });
                }
                Err(e) => {
                    warn!(pmid, source = source.name(), error = %e, "Source failed, trying next");
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        Err(PubkgError::DownloadFailed {
            pmid: pmid.to_string(),
            reason: if failures.is_empty() {
                "no sources configured".to_string()
            } else {
                failures.join("; ")
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubmed_id_validation() {
        assert!(is_valid_pubmed_id("32133153"));
        assert!(!is_valid_pubmed_id(""));
        assert!(!is_valid_pubmed_id("PMC7092803"));
        assert!(!is_valid_pubmed_id("12 34"));
        assert!(!is_valid_pubmed_id("١٢٣"));
    }

    #[test]
    fn test_source_urls() {
        let pmc = PmcMirrorSource::new("https://example.org/articles/pmc/");
        assert_eq!(pmc.url_for("123"), "https://example.org/articles/pmc/123/xml/");

        let eutils = EutilsSource::new("https://eutils.example.org/entrez/eutils", None);
        assert_eq!(
            eutils.url_for("123"),
            "https://eutils.example.org/entrez/eutils/efetch.fcgi?db=pubmed&id=123&retmode=xml"
        );

        let keyed = EutilsSource::new("http://e", Some(SecretString::from("k1")));
        assert!(keyed.url_for("9").ends_with("&api_key=k1"));
    }

    #[test]
    fn test_from_config_orders_sources() {
        let downloader = PubMedDownloader::from_config(&IngestionConfig::default()).unwrap();
        assert_eq!(downloader.sources().collect::<Vec<_>>(), vec!["pmc", "eutils"]);
        assert_eq!(downloader.default_pmid, DEFAULT_PMID);
    }
}
