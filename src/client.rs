//! Network side of the game controller: the question bank read and the two
//! AI calls, behind a trait so the controller can be driven without a server.

use crate::models::QuestionBank;
use crate::protocol::{ChatRequest, ChatResponse, ExplainRequest, ExplainResponse};
use async_trait::async_trait;
use http::StatusCode;

/// The question bank could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("Failed to load questions: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(StatusCode),
}

#[async_trait]
pub trait QuizBackend: Send + Sync {
    async fn fetch_bank(&self) -> Result<QuestionBank, BankError>;

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, TransportError>;

    async fn explain(&self, request: ExplainRequest) -> Result<ExplainResponse, TransportError>;
}

/// Talks to a running quiz server over HTTP.
#[derive(Clone)]
pub struct HttpQuizBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpQuizBackend {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, TransportError>
    where
        Req: serde::Serialize + Sync,
        Resp: serde::de::DeserializeOwned,
    {
        let resp = self.http.post(self.url(path)).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(TransportError::Status(resp.status()));
        }
        Ok(resp.json::<Resp>().await?)
    }
}

#[async_trait]
impl QuizBackend for HttpQuizBackend {
    async fn fetch_bank(&self) -> Result<QuestionBank, BankError> {
        let resp = self
            .http
            .get(self.url("/questions"))
            .send()
            .await
            .map_err(|e| BankError::Unavailable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(BankError::Unavailable(format!("server answered with status {}", resp.status())));
        }
        resp.json::<QuestionBank>()
            .await
            .map_err(|e| BankError::Unavailable(e.to_string()))
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, TransportError> {
        self.post_json("/ai-chat", &request).await
    }

    async fn explain(&self, request: ExplainRequest) -> Result<ExplainResponse, TransportError> {
        self.post_json("/ai-explain", &request).await
    }
}
