pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod protocol;
pub mod routes;
pub mod state;

use std::sync::Arc;

pub fn build_state(config: &config::Config) -> anyhow::Result<state::AppState> {
    let ai_client: Arc<dyn state::CompletionClient> = match config.completion.clone() {
        Some(completion) => {
            tracing::info!(model = %completion.model, "using remote completion service");
            Arc::new(state::GroqClient::new(completion)?)
        }
        None => {
            tracing::warn!("GROQ_API_KEY is not set, ai replies come from the offline client");
            Arc::new(state::OfflineCompletionClient)
        }
    };
    Ok(state::AppState::new(ai_client, config))
}
