use crate::models::{ChatMessage, Question, QuestionView};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Body of `POST /ai-chat`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub question: Option<QuestionView>,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub history: Option<Vec<ChatMessage>>,
}

/// Body of `POST /ai-explain`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub question: Option<Question>,
    pub user_answer_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResponse {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LooseChatRequest {
    question: Option<Value>,
    user_message: Option<Value>,
    history: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LooseExplainRequest {
    question: Option<Value>,
    user_answer_index: Option<Value>,
}

fn object_or_default<T: serde::de::DeserializeOwned + Default>(body: &[u8]) -> T {
    match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(err) => {
            warn!("undecodable ai request body: {}", err);
            T::default()
        }
    }
}

impl ChatRequest {
    /// Decodes a request body field by field. A part that does not decode is
    /// treated as absent, so any body yields a request.
    pub fn from_body(body: &[u8]) -> Self {
        let loose: LooseChatRequest = object_or_default(body);
        let question = loose
            .question
            .and_then(|v| serde_json::from_value::<QuestionView>(v).ok())
            .filter(QuestionView::is_well_formed);
        let history = loose
            .history
            .and_then(|v| match serde_json::from_value(v) {
                Ok(h) => Some(h),
                Err(err) => {
                    warn!("dropping malformed chat history: {}", err);
                    None
                }
            })
            .unwrap_or_default();
        Self {
            question,
            user_message: loose
                .user_message
                .as_ref()
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_default(),
            history,
        }
    }
}

impl ExplainRequest {
    pub fn from_body(body: &[u8]) -> Self {
        let loose: LooseExplainRequest = object_or_default(body);
        let question = loose
            .question
            .and_then(|v| serde_json::from_value::<Question>(v).ok())
            .filter(|q| crate::models::validate_question(q).is_ok());
        Self {
            question,
            user_answer_index: loose
                .user_answer_index
                .and_then(|v| serde_json::from_value(v).ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn chat_request_round_trip_uses_camel_case() {
        let req = ChatRequest {
            question: Some(QuestionView {
                question: "Q".into(),
                choices: vec!["a".into(), "b".into()],
            }),
            user_message: "help".into(),
            history: vec![ChatMessage::user("hi")],
        };
        let raw = serde_json::to_value(&req).unwrap();
        assert_eq!(raw["userMessage"], "help");
        assert_eq!(raw["history"][0]["role"], "user");
        assert!(raw["question"].get("correctIndex").is_none());
    }

    #[test]
    fn chat_body_garbage_decodes_to_empty_request() {
        let req = ChatRequest::from_body(b"not json at all");
        assert!(req.question.is_none());
        assert!(req.history.is_empty());
        assert!(req.user_message.is_empty());
    }

    #[test]
    fn chat_body_with_bad_question_keeps_history() {
        let body = serde_json::json!({
            "question": {"question": "", "choices": ["a", "b"]},
            "userMessage": "hello",
            "history": [{"role": "assistant", "content": "earlier"}]
        });
        let req = ChatRequest::from_body(body.to_string().as_bytes());
        assert!(req.question.is_none());
        assert_eq!(req.history.len(), 1);
        assert_eq!(req.history[0].role, Role::Assistant);
        assert_eq!(req.user_message, "hello");
    }

    #[test]
    fn explain_body_requires_answer_key() {
        let body = serde_json::json!({
            "question": {"question": "Q", "choices": ["a", "b"]},
            "userAnswerIndex": 1
        });
        let req = ExplainRequest::from_body(body.to_string().as_bytes());
        assert!(req.question.is_none());
        assert_eq!(req.user_answer_index, Some(1));

        let body = serde_json::json!({
            "question": {"question": "Q", "choices": ["a", "b"], "correctIndex": 0},
            "userAnswerIndex": null
        });
        let req = ExplainRequest::from_body(body.to_string().as_bytes());
        assert_eq!(req.question.unwrap().correct_index, 0);
        assert!(req.user_answer_index.is_none());
    }
}
