//! End-to-end processing of one PubMed ID: download, parse, build, save.

use std::path::PathBuf;

use tracing::{info, instrument};

use pubkg_common::{PubkgError, Result};
use pubkg_config::Config;
use pubkg_ingestion::{is_valid_pubmed_id, parse_pubmed_xml, DownloadedArticle, PubMedDownloader};

use crate::builder::{BuildReport, KgBuilder};
use crate::graph::KnowledgeGraph;
use crate::persist::{load_knowledge_graph, save_knowledge_graph};

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub xml_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Existing graph to extend; ignored when the file does not exist.
    pub kg_file: Option<PathBuf>,
}

impl ProcessOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            xml_dir: config.ingestion.xml_dir.clone(),
            output_dir: config.kg.output_dir.clone(),
            kg_file: None,
        }
    }
}

#[derive(Debug)]
pub struct ProcessOutcome {
    pub kg: KnowledgeGraph,
    pub output_path: PathBuf,
    pub report: BuildReport,
    pub download: DownloadedArticle,
}

#[instrument(skip(downloader, builder, options))]
pub async fn process_pubmed_id(
    pmid: &str,
    downloader: &PubMedDownloader,
    builder: &KgBuilder,
    options: &ProcessOptions,
) -> Result<ProcessOutcome> {
    let pmid = pmid.trim();
    if !is_valid_pubmed_id(pmid) {
        return Err(PubkgError::InvalidPubmedId(pmid.to_string()));
    }

    let download = downloader.download(Some(pmid), &options.xml_dir).await?;
    let article = parse_pubmed_xml(&download.path)?;

    let mut kg = match options.kg_file.as_deref().filter(|p| p.exists()) {
        Some(path) => {
            let kg = load_knowledge_graph(path)?;
            let stats = kg.statistics();
            info!(
                path = %path.display(),
                nodes = stats.node_count,
                edges = stats.edge_count,
                sources = stats.source_count,
                "Extending existing knowledge graph"
            );
            kg
        }
        None => KnowledgeGraph::new(),
    };

    let report = builder.build_from_article(&mut kg, &article, pmid).await;

    let output_path = options.output_dir.join(format!("kg_{pmid}.json"));
    save_knowledge_graph(&kg, &output_path)?;

    let stats = kg.statistics();
    info!(
        path = %output_path.display(),
        nodes = stats.node_count,
        edges = stats.edge_count,
        entity_types = ?stats.entity_types,
        relation_types = ?stats.relation_types,
        "Knowledge graph written"
    );

    Ok(ProcessOutcome { kg, output_path, report, download })
}
