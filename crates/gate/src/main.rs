use aoc_gate::config::{Cli, LogFormat};
use aoc_gate::server::{Server, shutdown_signal};
use anyhow::Context as _;
use clap::Parser as _;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let config = cli.resolve().context("resolve configuration")?;
    let site_dir = config.site_dir.clone();
    let canonical_host = config.gate.canonical_host.clone();
    let preview_suffix = config.gate.preview_suffix.clone();

    let server = Server::bind(config).await.context("start server")?;
    let addr = server.local_addr().context("read listener address")?;
    tracing::info!(
        %addr,
        site_dir = %site_dir.display(),
        %canonical_host,
        %preview_suffix,
        "aoc-gate listening"
    );

    server
        .run(shutdown_signal())
        .await
        .context("serve http")?;

    tracing::info!("aoc-gate shut down cleanly");
    Ok(())
}
