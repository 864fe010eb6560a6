//! Generic streaming file download.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use pubkg_common::Result;

/// Stream `url` into `save_path`, creating the parent directory.
/// 4xx/5xx responses are errors. Returns the number of bytes written.
#[instrument(skip(client, save_path), fields(path = %save_path.as_ref().display()))]
pub async fn download_data(client: &Client, url: &str, save_path: impl AsRef<Path>) -> Result<u64> {
    let save_path = save_path.as_ref();
    let resp = client.get(url).send().await?.error_for_status()?;

    if let Some(dir) = save_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }

    let mut file = tokio::fs::File::create(save_path).await?;
    let mut stream = resp.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if chunk.is_empty() {
            continue;
        }
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    debug!(bytes = written, "Download complete");
    Ok(written)
}
