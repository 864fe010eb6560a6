//! Configuration loading for pubkg.
//! Reads pubkg.toml from the current directory or the path in the PUBKG_CONFIG env var.
//! Files ending in `.yaml`/`.yml` are parsed as YAML instead.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "PUBKG_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "pubkg.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ingestion: IngestionConfig,
    pub ner: NerConfig,
    pub kg: KgConfig,
    pub solver: SolverConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub primary_base_url: String,
    pub eutils_base_url: String,
    pub timeout_secs: u64,
    pub xml_dir: PathBuf,
    pub default_pmid: String,
    pub api_key: Option<SecretString>,
}

fn default_primary_base_url() -> String {
    "https://www.ncbi.nlm.nih.gov/research/baylor-covid19/articles/pmc".to_string()
}
fn default_eutils_base_url() -> String { "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string() }
fn default_timeout_secs()    -> u64    { 30 }
fn default_xml_dir()         -> PathBuf { PathBuf::from("output/pubmed_xml") }
fn default_pmid()            -> String { "32133153".to_string() }

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            primary_base_url: default_primary_base_url(),
            eutils_base_url: default_eutils_base_url(),
            timeout_secs: default_timeout_secs(),
            xml_dir: default_xml_dir(),
            default_pmid: default_pmid(),
            api_key: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NerConfig {
    /// Directory holding `<type>_dict.json` gazetteers.
    pub dictionary_dir: PathBuf,
    /// Optional HTTP NER service (e.g. a scispaCy container).
    pub model_service_url: Option<String>,
    pub model_timeout_secs: u64,
}

fn default_dictionary_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("pubkg").join("dictionaries"))
        .unwrap_or_else(|| PathBuf::from("resources/dictionaries"))
}
fn default_model_timeout() -> u64 { 60 }

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            dictionary_dir: default_dictionary_dir(),
            model_service_url: None,
            model_timeout_secs: default_model_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KgConfig {
    pub output_dir: PathBuf,
}

impl Default for KgConfig {
    fn default() -> Self {
        Self { output_dir: PathBuf::from("output/knowledge_graphs") }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub traversal_depth: usize,
    pub context_preview_chars: usize,
    pub llm: Option<LlmConfig>,
}

fn default_traversal_depth() -> usize { 1 }
fn default_preview_chars()   -> usize { 500 }

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            traversal_depth: default_traversal_depth(),
            context_preview_chars: default_preview_chars(),
            llm: None,
        }
    }
}

/// OpenAI-compatible chat completion endpoint used for answer synthesis.
#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<SecretString>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 { 1024 }
fn default_llm_timeout_secs() -> u64 { 120 }

impl Config {
    /// Load configuration.
    /// Checks PUBKG_CONFIG first, then pubkg.toml in the current directory.
    /// A missing default file yields the built-in defaults; a missing file
    /// named by PUBKG_CONFIG is an error.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`Config::load`], but an explicit path wins over the search.
    /// `.env` is read either way so key overrides apply to both.
    pub fn load_from(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        // .env is optional
        let _ = dotenvy::dotenv();
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    fn load_with<F>(explicit: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match (explicit, lookup(CONFIG_ENV)) {
            (Some(path), _) => Self::from_path(path)?,
            (None, Some(path)) => Self::from_path(path)?,
            (None, None) if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_path(DEFAULT_CONFIG_FILE)?,
            (None, None) => {
                debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Config::default()
            }
        };
        config.apply_overrides(lookup);
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let config = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognised keys: NCBI_API_KEY, PUBKG_LLM_API_KEY, PUBKG_NER_SERVICE_URL.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("NCBI_API_KEY").filter(|k| !k.is_empty()) {
            self.ingestion.api_key = Some(SecretString::from(key));
        }
        if let Some(key) = lookup("PUBKG_LLM_API_KEY").filter(|k| !k.is_empty()) {
            if let Some(llm) = self.solver.llm.as_mut() {
                llm.api_key = Some(SecretString::from(key));
            }
        }
        if let Some(url) = lookup("PUBKG_NER_SERVICE_URL").filter(|u| !u.is_empty()) {
            self.ner.model_service_url = Some(url);
        }
    }
}
