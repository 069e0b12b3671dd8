//! MathRAG CLI
//!
//! Reads one query per stdin line and prints the prompt context the
//! retrieval core builds for it.

use anyhow::Context;
use mathrag_common::{config::AppConfig, corpus::FileCorpusSource, metrics, VERSION};
use mathrag_context::ContextProvider;
use mathrag_search::RagRepository;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_new(&config.observability.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate()?;

    // 2. Setup logging and metrics
    init_tracing(&config);
    metrics::register_metrics();
    info!("Starting MathRAG v{}", VERSION);

    // 3. Load corpora and build indexes
    let source = Arc::new(FileCorpusSource::from_config(&config.corpus));
    let repository = Arc::new(RagRepository::new(source, &config));
    if let Err(e) = repository.initialize().await {
        error!(error = %e, "No corpus available, exiting");
        return Err(e.into());
    }
    let provider = ContextProvider::new(Arc::clone(&repository), &config);

    // 4. Answer queries from stdin
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        let output = match provider.retrieve_for_prompt(query).await {
            Some(context) => context,
            None => {
                warn!(query, "No context for query");
                "(no context)".to_string()
            }
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n\n").await?;
        stdout.flush().await?;
    }

    let stats = repository.get_stats().await;
    info!(stats = %serde_json::to_string(&stats)?, "MathRAG shutting down");
    Ok(())
}
