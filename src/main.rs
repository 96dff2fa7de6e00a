// src/main.rs

use std::sync::Arc;

use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use teamchat::api::http::http_router;
use teamchat::config::CONFIG;
use teamchat::llm::client::{GeminiClient, GeminiConfig};
use teamchat::state::AppState;
use teamchat::teams::{MemoryTeamDirectory, SqliteTeamDirectory, TeamDirectory};

#[derive(Parser, Debug)]
#[command(
    name = "teamchat",
    about = "Streaming Gemini chat proxy with team directory backend"
)]
struct Cli {
    /// Bind host (overrides TEAMCHAT_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides TEAMCHAT_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Team directory backend: "memory" or "sqlite" (overrides TEAMCHAT_TEAM_STORE)
    #[arg(long)]
    store: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level: Level = CONFIG.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Teamchat backend");
    info!("Model: {} (fallback: {})", CONFIG.model, CONFIG.fallback_model);
    if !CONFIG.has_api_key() {
        warn!("GEMINI_API_KEY is not set; conversation requests will fail upstream");
    }

    // Team directory backend is decided here, once, and injected.
    let store = cli.store.unwrap_or_else(|| CONFIG.team_store.clone());
    let teams: Arc<dyn TeamDirectory> = match store.as_str() {
        "sqlite" => {
            let pool = SqlitePoolOptions::new()
                .max_connections(CONFIG.sqlite_max_connections)
                .connect(&CONFIG.database_url)
                .await?;
            let directory = SqliteTeamDirectory::new(pool);
            directory.migrate().await?;
            info!("Team directory: sqlite ({})", CONFIG.database_url);
            Arc::new(directory)
        }
        other => {
            if other != "memory" {
                warn!("unknown team store '{other}', using the memory backend");
            }
            info!("Team directory: in-process memory");
            Arc::new(MemoryTeamDirectory::new())
        }
    };

    let gemini = Arc::new(GeminiClient::new(GeminiConfig::from_env())?);
    let app_state = Arc::new(AppState::new(teams, gemini));

    let app = http_router(app_state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors_layer()?);

    let host = cli.host.unwrap_or_else(|| CONFIG.host.clone());
    let port = cli.port.unwrap_or(CONFIG.port);
    let bind_address = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{bind_address}");

    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer() -> anyhow::Result<tower_http::cors::CorsLayer> {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    let origin: HeaderValue = CONFIG.cors_origin.parse()?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}
