//! pubkg: PubMed articles to a biomedical knowledge graph.
//! Entry point for the command-line binary.

mod commands;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.default_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("pubkg {}", env!("CARGO_PKG_VERSION"));

    let config = pubkg_config::Config::load_from(cli.config.as_deref())?;
    debug!(xml_dir = %config.ingestion.xml_dir.display(), output_dir = %config.kg.output_dir.display(), "Configuration ready");

    commands::run(cli.command, &config).await
}
