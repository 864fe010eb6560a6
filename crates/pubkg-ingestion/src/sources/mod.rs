//! PubMed XML sources.

pub mod pubmed;

use async_trait::async_trait;
use reqwest::Client;

use pubkg_common::{PubkgError, Result};

/// A remote endpoint that serves the XML record for a PubMed ID.
#[async_trait]
pub trait XmlSource: Send + Sync {
    /// Short name used in logs and in `DownloadedArticle::source`.
    fn name(&self) -> &str;

    fn url_for(&self, pmid: &str) -> String;

    /// Fetch the raw XML body. Anything other than HTTP 200 is an error.
    async fn fetch(&self, client: &Client, pmid: &str) -> Result<Vec<u8>> {
        let url = self.url_for(pmid);
        let resp = client.get(&url).send().await?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(PubkgError::DownloadFailed {
                pmid: pmid.to_string(),
                reason: format!("{} returned HTTP {}", self.name(), status.as_u16()),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}
