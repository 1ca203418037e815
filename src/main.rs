use anyhow::Context;
use clap::Parser;
use notescribe::adapters::services::{asr::build_asr_service, llm::build_llm_service};
use notescribe::adapters::storage::SqliteStorage;
use notescribe::services::{NoteProcessor, TokenService};
use notescribe::{build_router, AppState, Config};
use std::sync::Arc;

/// Open the database and wire adapters into the shared state
fn initialize_app(config: Config) -> anyhow::Result<AppState> {
    let storage = SqliteStorage::new(config.database.clone())
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;
    storage
        .run_migrations()
        .context("Failed to run database migrations")?;
    let storage = Arc::new(storage);

    let transcriber = build_asr_service(&config).context("Failed to build ASR service")?;
    let generator = build_llm_service(&config).context("Failed to build LLM service")?;
    let tokens = TokenService::from_config(&config).context("Invalid token settings")?;

    std::fs::create_dir_all(&config.media_root).with_context(|| {
        format!(
            "Failed to create media root {}",
            config.media_root.display()
        )
    })?;

    Ok(AppState {
        processor: Arc::new(NoteProcessor::new(
            storage.clone(),
            transcriber,
            generator,
        )),
        storage,
        tokens: Arc::new(tokens),
        config: Arc::new(config),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    config.validate().context("Invalid configuration")?;
    let bind = config.bind;

    log::info!("Starting notescribe v{}", env!("CARGO_PKG_VERSION"));
    let state = initialize_app(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    log::info!("Listening on http://{}", bind);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
