//! Recogniser seam: dictionary matching and an HTTP NER model service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use pubkg_config::NerConfig;

use crate::entity::{Entity, EntitySource};
use crate::labels::map_label;
use crate::text::normalize_text;
use crate::trie::DictionaryNer;
use crate::Result;

#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    fn name(&self) -> &str;

    async fn recognize(&self, text: &str) -> Result<Vec<Entity>>;
}

#[async_trait]
impl EntityRecognizer for DictionaryNer {
    fn name(&self) -> &str {
        "dictionary"
    }

    async fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        Ok(self.extract(text))
    }
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    entities: Vec<ServiceEntity>,
}

/// `start`/`end` are character offsets into the posted text.
#[derive(Debug, Deserialize)]
struct ServiceEntity {
    label: String,
    start: usize,
    end: usize,
}

/// Client for an NER model service (e.g. a scispaCy container) that accepts
/// `{"text": ...}` and answers `{"entities": [{"label", "start", "end"}]}`.
pub struct HttpRecognizer {
    client: Client,
    url: String,
}

impl HttpRecognizer {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into() })
    }

    /// `None` when no model service is configured.
    pub fn from_config(config: &NerConfig) -> Result<Option<Self>> {
        config
            .model_service_url
            .as_ref()
            .map(|url| Self::new(url.clone(), Duration::from_secs(config.model_timeout_secs)))
            .transpose()
    }
}

#[async_trait]
impl EntityRecognizer for HttpRecognizer {
    fn name(&self) -> &str {
        "model"
    }

    #[instrument(skip(self, text), fields(url = %self.url, len = text.len()))]
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let resp: ServiceResponse = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // Char offset -> byte offset, with the end-of-text sentinel
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        let mut entities = Vec::with_capacity(resp.entities.len());
        for ent in resp.entities {
            let Some(entity_type) = map_label(&ent.label) else {
                continue;
            };
            let span = if ent.start < ent.end {
                boundaries.get(ent.start).zip(boundaries.get(ent.end))
            } else {
                None
            };
            let Some((&start, &end)) = span else {
                warn!(label = %ent.label, start = ent.start, end = ent.end, "Skipping entity with invalid span");
                continue;
            };
            let surface = &text[start..end];
            entities.push(Entity {
                entity_type,
                text: surface.to_string(),
                normalized_text: normalize_text(surface),
                start_pos: ent.start,
                end_pos: ent.end,
                source: EntitySource::Model,
            });
        }

        debug!(count = entities.len(), "Model entities mapped");
        Ok(entities)
    }
}
