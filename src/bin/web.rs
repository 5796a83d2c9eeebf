use anyhow::{Context, Result};
use okosfoci_tips::api::football_api::FootballApiClient;
use okosfoci_tips::api::FootballDataSource;
use okosfoci_tips::config::Config;
use okosfoci_tips::server::{self, AppState, ENDPOINTS};
use okosfoci_tips::teams::TeamDatabase;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration (reads .env first)
    let config = Config::from_env().context("Invalid configuration")?;

    let source: Option<Arc<dyn FootballDataSource>> = match config.api_key {
        Some(_) => {
            let client: Arc<dyn FootballDataSource> = Arc::new(FootballApiClient::from_config(&config)?);
            Some(client)
        }
        None => {
            warn!("FOOTBALL_API_KEY is not set; /tippek will answer 500 until it is");
            None
        }
    };

    let teams = TeamDatabase::load(&config.teams_db)?;
    info!("Loaded {} teams from {}", teams.len(), config.teams_db.display());

    let addr = config.bind_addr();
    println!("{}", "=".repeat(60));
    println!("Okosfoci API server");
    println!("URL: http://{}", addr);
    println!("DATA_ROOT: {}", config.data_root.display());
    println!("API key present: {}", config.api_key.is_some());
    println!("Leagues configured: {}", config.tips.leagues.len());
    println!("{}", "=".repeat(60));
    println!("Available endpoints:");
    for endpoint in ENDPOINTS {
        println!("  {}", endpoint);
    }
    println!("Press Ctrl+C to stop\n");

    let state = Arc::new(AppState::new(config, source, teams));
    let app = server::router(state);

    // Run server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app).await?;

    Ok(())
}
