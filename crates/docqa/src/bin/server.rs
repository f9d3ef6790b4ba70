//! Document QA server binary
//!
//! Run with: cargo run -p docqa --bin docqa-server

use clap::Parser;
use docqa::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docqa-server", version, about = "Answer questions about a directory of documents")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Rebuild the index from the document directory before serving
    #[arg(long)]
    rebuild: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                          docqa                            ║
║          Questions answered from your documents           ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Documents: {}", config.ingestion.data_dir.display());
    tracing::info!("  - Index storage: {}", config.storage.storage_dir.display());
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!(
        "  - Chunk size: {} tokens, overlap {}",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let base_url = config.llm.base_url.clone();
    let server = RagServer::new(config)?;

    tracing::info!("Checking language-model API at {}...", base_url);
    if server.state().health_check().await? {
        tracing::info!("Language-model API is reachable");
    } else {
        tracing::warn!("Language-model API not reachable at {}", base_url);
        tracing::warn!("Queries will fail until the API is available and the key is valid");
    }

    if args.rebuild {
        let index = server.state().engine().index().rebuild().await?;
        tracing::info!(
            "Index rebuilt: {} documents, {} chunks",
            index.manifest().document_count,
            index.len()
        );
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("\nEndpoints:");
    println!("  GET /query?q=...  - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
