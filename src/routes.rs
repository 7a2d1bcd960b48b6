use crate::handlers;
use crate::state::AppState;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-request-id"),
        ]);

    let public_dir = state.public_dir.clone();
    let router = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/questions", get(handlers::questions))
        .route("/ai-chat", post(handlers::ai_chat))
        .route("/ai-explain", post(handlers::ai_explain))
        .with_state(state);

    let router = match public_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::OfflineCompletionClient;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router() -> Router {
        let config = Config::new("/nonexistent/questions.json");
        build_router(AppState::new(Arc::new(OfflineCompletionClient), &config))
    }

    #[tokio::test]
    async fn health_is_ok() {
        let resp = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_bank_is_server_error() {
        let resp = router()
            .oneshot(
                Request::get("/questions")
                    .header("x-request-id", "abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["message"], "Failed to load questions");
        assert_eq!(body["error"]["request_id"], "abc");
    }

    #[tokio::test]
    async fn ai_chat_answers_garbage_with_text() {
        let resp = router()
            .oneshot(
                Request::post("/ai-chat")
                    .header("content-type", "text/plain")
                    .body(Body::from("{{{"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["text"], "No question received by server.");
        assert_eq!(body["history"], serde_json::json!([]));
    }
}
