use clap::Parser;
use prometheus::Registry;
use tracing::{debug, error, info, warn};

use chain_resource::assemble_chain;
use chain_resource::config::{Cli, Config};
use chain_resource::exchange_rate::ExchangeRateList;
use chain_resource::metrics::{self, ChainMetrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "chain_resource=debug"
    } else {
        "chain_resource=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("chain-resource v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let mut config = Config::load(&cli.config)?;
    config.apply_cli(&cli);

    info!(
        memory_expiration_secs = config.memory.expiration_secs,
        file = %config.file.path.display(),
        file_expiration_secs = config.file.expiration_secs,
        url = %config.web.url,
        "Configuration loaded"
    );

    let registry = Registry::new();
    let chain_metrics = ChainMetrics::new(&registry)?;
    let chain = assemble_chain::<ExchangeRateList>(&config)?.with_metrics(chain_metrics);

    let resolved = chain.resolve().await;

    match metrics::render(&registry) {
        Ok(text) => debug!(metrics = %text, "Resolution metrics"),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }

    match resolved {
        Some(resolved) => {
            info!(
                source = %resolved.source,
                written = resolved.propagation.written.len(),
                failed = resolved.propagation.failed.len(),
                "Rates resolved"
            );
            println!("{}", resolved.value);
            Ok(())
        }
        None => {
            error!("No tier could supply exchange rates");
            anyhow::bail!("exchange rates unavailable from every tier")
        }
    }
}
