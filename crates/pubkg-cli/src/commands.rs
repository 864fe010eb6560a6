//! CLI command definitions and dispatch.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use pubkg_common::RelationType;
use pubkg_config::Config;
use pubkg_ingestion::{parse_pubmed_xml, PubMedDownloader};
use pubkg_kg::{
    load_knowledge_graph, process_pubmed_id, save_knowledge_graph, KgBuilder, KgSolver,
    KnowledgeGraph, ProcessOptions,
};

/// Turn PubMed articles into a biomedical knowledge graph and query it.
#[derive(Parser)]
#[command(name = "pubkg", version, long_about = None)]
pub(crate) struct Cli {
    /// Config file (defaults to $PUBKG_CONFIG, then ./pubkg.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Filter used when RUST_LOG is unset.
    pub fn default_filter(&self) -> &'static str {
        match self.verbose {
            0 => "pubkg=debug,info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Download the XML record for a PubMed ID.
    Download {
        /// PubMed ID (defaults to the configured default PMID).
        pmid: Option<String>,

        /// Directory to write pubmed_<pmid>.xml into.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Parse a PubMed/PMC XML file and print it as JSON.
    Parse {
        xml: PathBuf,
    },

    /// Download, parse and add one PubMed ID to a knowledge graph.
    Build {
        pmid: String,

        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Existing graph to extend.
        #[arg(long)]
        kg_file: Option<PathBuf>,
    },

    /// Add a local XML file to a knowledge graph.
    BuildFile {
        xml: PathBuf,

        /// Existing graph to extend.
        #[arg(long)]
        kg_file: Option<PathBuf>,

        /// Where to save (defaults to --kg-file, else <output_dir>/kg_<pmid>.json).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print statistics for a saved graph.
    Stats {
        kg: PathBuf,
    },

    /// Answer a question from a saved graph.
    Ask {
        question: String,

        #[arg(long)]
        kg: PathBuf,

        /// Traversal depth around matching entities.
        #[arg(long)]
        depth: Option<usize>,
    },

    /// List the neighbours of an entity, e.g. `DRUG:aspirin`.
    Neighbors {
        kg: PathBuf,

        entity_id: String,

        /// Only follow edges of this relation type.
        #[arg(long)]
        relation: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_or_new(path: Option<&Path>) -> Result<KnowledgeGraph> {
    match path.filter(|p| p.exists()) {
        Some(p) => load_knowledge_graph(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(KnowledgeGraph::new()),
    }
}

pub(crate) async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Download { pmid, out } => {
            let downloader = PubMedDownloader::from_config(&config.ingestion)?;
            let out = out.unwrap_or_else(|| config.ingestion.xml_dir.clone());
            let article = downloader.download(pmid.as_deref(), &out).await?;
            print_json(&article)
        }

        Command::Parse { xml } => {
            let article = parse_pubmed_xml(&xml).with_context(|| format!("parsing {}", xml.display()))?;
            print_json(&article)
        }

        Command::Build { pmid, output_dir, kg_file } => {
            let downloader = PubMedDownloader::from_config(&config.ingestion)?;
            let builder = KgBuilder::from_config(&config.ner)?;
            let mut options = ProcessOptions::from_config(config);
            options.kg_file = kg_file;
            if let Some(dir) = output_dir {
                options.output_dir = dir;
            }

            let outcome = process_pubmed_id(&pmid, &downloader, &builder, &options).await?;
            info!(path = %outcome.output_path.display(), "Build complete");
            print_json(&outcome.report)
        }

        Command::BuildFile { xml, kg_file, output } => {
            let builder = KgBuilder::from_config(&config.ner)?;
            let mut kg = load_or_new(kg_file.as_deref())?;
            let (report, _) = builder.build_from_xml_file(&mut kg, &xml).await?;

            let output = output
                .or(kg_file)
                .unwrap_or_else(|| config.kg.output_dir.join(format!("kg_{}.json", report.pmid)));
            save_knowledge_graph(&kg, &output)?;
            info!(path = %output.display(), "Build complete");
            print_json(&report)
        }

        Command::Stats { kg } => {
            let graph = load_knowledge_graph(&kg)?;
            print_json(&graph.statistics())
        }

        Command::Ask { question, kg, depth } => {
            let mut solver = KgSolver::from_config(&config.solver)?;
            if let Some(depth) = depth {
                solver = solver.with_depth(depth);
            }
            print_json(&solver.answer(&question, &kg).await)
        }

        Command::Neighbors { kg, entity_id, relation } => {
            let relation = relation.map(|r| r.parse::<RelationType>()).transpose()?;
            let graph = load_knowledge_graph(&kg)?;
            if !graph.contains_node(&entity_id) {
                bail!("entity {entity_id} is not in {}", kg.display());
            }
            print_json(&graph.neighbors(&entity_id, relation))
        }
    }
}
