//! Stateless relay between quiz clients and the completion service.
//!
//! Hint/chat mode only ever sees a [`QuestionView`], so the answer key is
//! absent from everything it sends upstream. Explain mode gets the full
//! [`Question`] and is single-shot. Every call resolves to text.

use crate::config::GatewayTexts;
use crate::models::{ChatMessage, Question, QuestionView};
use crate::protocol::{ChatRequest, ChatResponse, ExplainRequest, ExplainResponse};
use crate::state::CompletionClient;
use std::sync::Arc;
use tracing::{info, instrument, warn};

fn choices_line(choices: &[String]) -> String {
    choices.join(", ")
}

pub fn hint_messages(
    texts: &GatewayTexts,
    question: &QuestionView,
    history: &[ChatMessage],
    user_message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(ChatMessage::system(texts.hint_system_prompt.as_str()));
    messages.push(ChatMessage::user(format!(
        "Here is the trivia question:\nQuestion: {}\nChoices: {}",
        question.question,
        choices_line(&question.choices)
    )));
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(user_message));
    messages
}

pub fn explain_messages(texts: &GatewayTexts, question: &Question, user_answer_index: Option<usize>) -> Vec<ChatMessage> {
    let answered = user_answer_index
        .map(|i| i.to_string())
        .unwrap_or_else(|| "none".to_string());
    vec![
        ChatMessage::system(texts.explain_system_prompt.as_str()),
        ChatMessage::user(format!(
            "Question: {}\nChoices: {}\nCorrect answer index: {}\nUser answered index: {}",
            question.question,
            choices_line(&question.choices),
            question.correct_index,
            answered
        )),
    ]
}

#[derive(Clone)]
pub struct AiGateway {
    client: Arc<dyn CompletionClient>,
    texts: Arc<GatewayTexts>,
}

impl AiGateway {
    pub fn new(client: Arc<dyn CompletionClient>, texts: GatewayTexts) -> Self {
        Self {
            client,
            texts: Arc::new(texts),
        }
    }

    pub fn texts(&self) -> &GatewayTexts {
        &self.texts
    }

    /// `None` means the service could not be reached or answered garbage.
    async fn complete_text(&self, messages: Vec<ChatMessage>) -> Option<String> {
        match self.client.complete(messages).await {
            Ok(reply) => Some(reply.text().unwrap_or_else(|| self.texts.no_content.clone())),
            Err(err) => {
                warn!("completion service failed: {}", err);
                None
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(history_len = request.history.len()))]
    pub async fn chat(&self, request: ChatRequest) -> ChatResponse {
        let ChatRequest { question, user_message, history } = request;
        let Some(question) = question else {
            info!("chat request without a usable question");
            return ChatResponse {
                text: self.texts.chat_missing_question.clone(),
                history: Some(history),
            };
        };

        let messages = hint_messages(&self.texts, &question, &history, &user_message);
        match self.complete_text(messages).await {
            Some(text) => {
                let mut history = history;
                history.push(ChatMessage::user(user_message));
                history.push(ChatMessage::assistant(text.clone()));
                ChatResponse { text, history: Some(history) }
            }
            None => ChatResponse {
                text: self.texts.transport_failure.clone(),
                history: Some(history),
            },
        }
    }

    #[instrument(level = "info", skip_all, fields(user_answer_index = ?request.user_answer_index))]
    pub async fn explain(&self, request: ExplainRequest) -> ExplainResponse {
        let Some(question) = request.question else {
            info!("explain request without a usable question");
            return ExplainResponse {
                text: self.texts.explain_missing_question.clone(),
            };
        };

        let messages = explain_messages(&self.texts, &question, request.user_answer_index);
        let text = self
            .complete_text(messages)
            .await
            .unwrap_or_else(|| self.texts.transport_failure.clone());
        ExplainResponse { text }
    }
}
