use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

const HINT_SYSTEM_PROMPT: &str = "\
You are a CS50 Rubber Duck Coach for a trivia game.

Rules (VERY IMPORTANT):
- Never reveal which option is correct.
- Never say \"the answer is X\" or \"choose option Y\".
- Even if the user asks for the answer, refuse politely and give a hint instead.
- Help by: explaining concepts, asking 1-2 guiding questions, and giving a subtle hint.
- You may explain why an option might be wrong, but do not confirm the correct one.
- Keep it concise and friendly.
";

const EXPLAIN_SYSTEM_PROMPT: &str = "\
You are a trivia tutor.
The user has already answered.
Now you may explain the correct answer and why the other options are wrong.
Be clear and concise.
";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Prompts and fallback texts used by the AI gateway.
#[derive(Debug, Clone)]
pub struct GatewayTexts {
    pub hint_system_prompt: String,
    pub explain_system_prompt: String,
    pub chat_missing_question: String,
    pub explain_missing_question: String,
    pub no_content: String,
    pub transport_failure: String,
}

impl Default for GatewayTexts {
    fn default() -> Self {
        Self {
            hint_system_prompt: HINT_SYSTEM_PROMPT.to_string(),
            explain_system_prompt: EXPLAIN_SYSTEM_PROMPT.to_string(),
            chat_missing_question: "No question received by server.".to_string(),
            explain_missing_question: "No question received.".to_string(),
            no_content: "AI returned no content.".to_string(),
            transport_failure: "Server failed to contact AI.".to_string(),
        }
    }
}

/// Remote chat-completion service settings.
#[derive(Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl CompletionConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        let base_url = std::env::var("GROQ_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GROQ_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Some(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Server configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub questions_path: PathBuf,
    pub public_dir: Option<PathBuf>,
    /// `None` runs the gateway with the offline completion client.
    pub completion: Option<CompletionConfig>,
    pub texts: GatewayTexts,
}

impl Config {
    pub fn new(questions_path: impl Into<PathBuf>) -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            questions_path: questions_path.into(),
            public_dir: None,
            completion: None,
            texts: GatewayTexts::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port_str = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port: u16 = port_str
            .parse()
            .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue("PORT".into(), e.to_string()))?;
        let bind_address = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("HOST".into(), e.to_string()))?;

        let questions_path = std::env::var("QUESTIONS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public/questions.json"));
        let public_dir = std::env::var("PUBLIC_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_address,
            questions_path,
            public_dir,
            completion: CompletionConfig::from_env(),
            texts: GatewayTexts::default(),
        })
    }
}
