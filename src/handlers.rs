use crate::error::AppError;
use crate::models::QuestionBank;
use crate::protocol::{ChatRequest, ChatResponse, ExplainRequest, ExplainResponse};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use tracing::{info, warn};

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

pub async fn questions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<QuestionBank>, AppError> {
    let req_id = request_id_from_headers(&headers);
    match state.bank.load().await {
        Ok(bank) => {
            info!(request_id = %req_id, topics = bank.topic_names().count(), "question bank served");
            Ok(Json(bank))
        }
        Err(err) => {
            warn!(request_id = %req_id, "failed to load questions: {}", err);
            Err(AppError::bank_unavailable(err, req_id))
        }
    }
}

/// Hint and free-form chat. Any body, even one that is not JSON, gets a text
/// answer.
pub async fn ai_chat(State(state): State<AppState>, body: Bytes) -> Json<ChatResponse> {
    let request = ChatRequest::from_body(&body);
    Json(state.gateway.chat(request).await)
}

pub async fn ai_explain(State(state): State<AppState>, body: Bytes) -> Json<ExplainResponse> {
    let request = ExplainRequest::from_body(&body);
    Json(state.gateway.explain(request).await)
}
