use scenarios::config::ScenarioConfig;
use scenarios::match_scenario;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing; RUST_LOG overrides the default filter
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ScenarioConfig::from_env()?;
    tracing::info!(seed = ?config.seed, scheme = ?config.scheme, "Starting match-orders scenario");

    let report = match_scenario::run(&config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
