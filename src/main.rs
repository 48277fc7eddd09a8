use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use careers_backend::{
    auth::jwt::JwtService,
    config::AppConfig,
    db,
    genai::{AnthropicGenerator, DisabledGenerator, TextGenerator},
    routes::create_router,
    s3::build_client,
    state::AppState,
    storage::S3Storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        s3_bucket = %config.s3_bucket,
        genai_enabled = config.genai_api_key.is_some(),
        "loaded backend configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    let s3_client = build_client(&config).await?;
    let storage = Arc::new(S3Storage::new(s3_client, config.s3_bucket.clone()));
    let genai: Arc<dyn TextGenerator> = match config.genai_api_key.clone() {
        Some(api_key) => Arc::new(AnthropicGenerator::new(api_key, config.genai_model.clone())?),
        None => {
            tracing::warn!("GENAI_API_KEY not set; generated reports and commentary disabled");
            Arc::new(DisabledGenerator)
        }
    };
    let jwt = JwtService::from_config(&config)?;

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let state = AppState::new(pool, config, storage, genai, jwt);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "careers backend listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
