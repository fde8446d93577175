use anyhow::Context;
use dotenv::dotenv;
use lightbnb_server::db::criteria::parse_limit;
use lightbnb_server::{AppState, SearchCriteria, Settings};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Usage: `lightbnb-server [criteria-json] [limit]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    let mut args = std::env::args().skip(1);
    let criteria = match args.next() {
        Some(json) => SearchCriteria::from_json(&json).context("Invalid search criteria")?,
        None => SearchCriteria::default(),
    };
    let limit = args
        .next()
        .map(|raw| parse_limit(&raw))
        .transpose()
        .context("Invalid limit")?;

    // Load configuration
    let config = Settings::new().context("Failed to load configuration")?;
    info!("Configuration loaded for environment {}", config.environment);

    let state = AppState::new(config)
        .await
        .context("Failed to open the database")?;

    let result = state.search_properties(&criteria, limit).await;
    state.shutdown().await?;

    let properties = result.context("Property search failed")?;
    info!("Found {} properties", properties.len());
    println!("{}", serde_json::to_string_pretty(&properties)?);

    Ok(())
}
