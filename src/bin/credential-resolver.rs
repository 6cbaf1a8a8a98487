use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use credential_resolver::discovery;
use credential_resolver::observability::metrics::get_metrics;
use credential_resolver::registry::CredentialRegistry;
use credential_resolver::sources::TokenSource;
use credential_resolver::store::CredentialStore;
use credential_resolver::utils::config_loader;
use credential_resolver::utils::constants::DEFAULT_EXPIRY_SKEW_SECS;
use credential_resolver::utils::logging;
use credential_resolver::utils::logging::LogLevel;
use tracing::{debug, error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "credential-resolver.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned()).await?;

    // -------------------------------
    // 2. Open the store and build the registry
    // -------------------------------

    let settings = &service_config.settings;
    let token_source = TokenSource::from_settings(settings).context("failed to build http client")?;
    let store = CredentialStore::open(&settings.store_path)
        .await
        .with_context(|| format!("failed to open credential store '{}'", settings.store_path))?;

    let registry = Arc::new(
        CredentialRegistry::new(token_source, store)
            .with_expiry_skew(settings.expiry_skew_seconds.unwrap_or(DEFAULT_EXPIRY_SKEW_SECS)),
    );
    registry.load_from_store().await?;

    // -------------------------------
    // 3. Collect configured sources
    // -------------------------------

    let mut sources = service_config.sources.clone();

    // -------------------------------
    // 4. Add credentials found in gcloud databases
    // -------------------------------

    if service_config.discovery.enabled {
        for found in discovery::discover(&service_config.discovery).await {
            let name = format!("discovered:{}", found.account_id);
            sources.entry(name).or_insert(found.descriptor);
        }
    }

    // -------------------------------
    // 5. Resolve everything concurrently
    // -------------------------------

    let mut failed = 0;
    for (name, result) in registry.resolve_all(&sources).await {
        match result {
            Ok(credential) => info!(
                source = %name,
                identity = %credential.identity,
                source_kind = credential.source_kind.as_str(),
                expiry = ?credential.expiry,
                "credential ready"
            ),
            Err(err) => {
                failed += 1;
                warn!(source = %name, error = %err, "credential unavailable");
            }
        }
    }

    let held = registry.identities().await;
    info!(held = held.len(), failed, "resolution finished");
    debug!("metrics:\n{}", get_metrics().await.gather_text());
    if !sources.is_empty() && failed == sources.len() {
        error!("no credential source could be resolved");
        anyhow::bail!("no credential source could be resolved");
    }
    Ok(())
}
