use duck_quiz::{build_state, config::Config, routes::build_router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    let state = build_state(&config)?;
    let app = build_router(state);

    tracing::info!(questions = %config.questions_path.display(), "question bank source");
    if let Some(dir) = &config.public_dir {
        tracing::info!(public_dir = %dir.display(), "serving static files");
    }

    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    tracing::info!("server listening on {}", config.bind_address);
    axum::serve(listener, app).await?;
    Ok(())
}
