use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use poa_core::FingerprintScheme;
use poa_host::server::build_router;
use poa_host::telemetry::init_tracing;
use poa_host::{PoaConfig, ProofService};
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(author, version, about = "Proof of Art HTTP service", long_about = None)]
struct Cli {
    /// TOML config file (defaults: local generator, memory storage and registry)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override server.bind_addr
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Override fingerprint.scheme (concatenated | framed)
    #[arg(long)]
    scheme: Option<FingerprintScheme>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("poa_host=debug,tower_http=debug");
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PoaConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let mut config = PoaConfig::default();
            config.apply_env();
            config
        }
    };
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }
    if let Some(scheme) = cli.scheme {
        config.fingerprint.scheme = scheme;
    }
    config.validate()?;

    let service = Arc::new(ProofService::from_config(&config)?);
    let app = build_router(service, &config.server);

    let addr = config.server.bind_addr;
    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
