use crate::config::{CompletionConfig, Config};
use crate::error::{BankLoadError, CompletionError};
use crate::gateway::AiGateway;
use crate::models::{validate_bank, ChatMessage, QuestionBank, Role};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// What the completion service sent back, before fallback resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionReply {
    pub content: Option<String>,
    pub error: Option<String>,
}

impl CompletionReply {
    pub fn content(text: impl Into<String>) -> Self {
        Self { content: Some(text.into()), error: None }
    }

    pub fn service_error(message: impl Into<String>) -> Self {
        Self { content: None, error: Some(message.into()) }
    }

    /// Trimmed content if there is any, else the service's error message.
    pub fn text(&self) -> Option<String> {
        self.content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .or_else(|| self.error.as_deref().filter(|e| !e.is_empty()))
            .map(str::to_owned)
    }
}

pub trait CompletionClient: Send + Sync {
    fn complete(&self, messages: Vec<ChatMessage>) -> BoxFuture<'static, Result<CompletionReply, CompletionError>>;
}

/// Stands in for the remote service when no credential is configured.
#[derive(Clone)]
pub struct OfflineCompletionClient;

impl CompletionClient for OfflineCompletionClient {
    fn complete(&self, messages: Vec<ChatMessage>) -> BoxFuture<'static, Result<CompletionReply, CompletionError>> {
        let explaining = messages
            .iter()
            .any(|m| m.role == Role::User && m.content.contains("Correct answer index:"));
        Box::pin(async move {
            let text = if explaining {
                "Quack! I'm offline, so I can't explain this one in detail. Compare your pick with the correct option and think about what sets them apart."
            } else {
                "Quack! I'm offline right now. Try ruling out one choice you're sure is wrong, then ask yourself what the question is really testing."
            };
            Ok(CompletionReply::content(text))
        })
    }
}

#[derive(Serialize)]
struct CompletionRequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponseBody {
    #[serde(default)]
    choices: Option<Vec<CompletionChoice>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

impl From<CompletionResponseBody> for CompletionReply {
    fn from(body: CompletionResponseBody) -> Self {
        Self {
            content: body
                .choices
                .unwrap_or_default()
                .into_iter()
                .next()
                .and_then(|c| c.message)
                .and_then(|m| m.content),
            error: body.error.as_ref().and_then(service_error_message),
        }
    }
}

// `{"error": {"message": ..}}` from the service, or a bare string from proxies.
fn service_error_message(error: &Value) -> Option<String> {
    match error {
        Value::String(message) => Some(message.clone()),
        other => other.get("message").and_then(Value::as_str).map(str::to_owned),
    }
}

fn decode_reply(raw: &[u8]) -> Result<CompletionReply, CompletionError> {
    let body: CompletionResponseBody = serde_json::from_slice(raw)?;
    Ok(body.into())
}

/// OpenAI-compatible chat completion client (Groq by default).
#[derive(Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl GroqClient {
    pub fn new(config: CompletionConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }
}

impl CompletionClient for GroqClient {
    fn complete(&self, messages: Vec<ChatMessage>) -> BoxFuture<'static, Result<CompletionReply, CompletionError>> {
        let http = self.http.clone();
        let url = self.config.completions_url();
        let api_key = self.config.api_key.clone();
        let model = self.config.model.clone();

        Box::pin(async move {
            // Error statuses still carry a JSON body with an `error` field.
            let raw = http
                .post(&url)
                .bearer_auth(&api_key)
                .json(&CompletionRequestBody { model: &model, messages: &messages })
                .send()
                .await?
                .bytes()
                .await?;
            decode_reply(&raw)
        })
    }
}

/// Reads the question bank file. Every call reads fresh from disk.
#[derive(Debug, Clone)]
pub struct BankSource {
    path: PathBuf,
}

impl BankSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<QuestionBank, BankLoadError> {
        let raw = tokio::fs::read(&self.path).await.map_err(|source| BankLoadError::Read {
            path: self.path.display().to_string(),
            source,
        })?;
        let bank: QuestionBank = serde_json::from_slice(&raw)?;
        validate_bank(&bank).map_err(BankLoadError::Invalid)?;
        Ok(bank)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub gateway: AiGateway,
    pub bank: BankSource,
    pub public_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(ai_client: Arc<dyn CompletionClient>, config: &Config) -> Self {
        Self {
            gateway: AiGateway::new(ai_client, config.texts.clone()),
            bank: BankSource::new(&config.questions_path),
            public_dir: config.public_dir.clone(),
        }
    }
}
