//! Client-side quiz session state machine.
//!
//! `Idle -> InProgress -> Ended`, with each question inside `InProgress`
//! going `Unanswered -> Answered`. Actions go through [`GameController::dispatch`],
//! which mutates state synchronously and may hand back a [`Command`] for the
//! network. The command's [`Outcome`] comes back through
//! [`GameController::resolve`]. A command borrows nothing from the
//! controller, so quiz actions stay available while an AI call is in flight.

use crate::client::{BankError, QuizBackend, TransportError};
use crate::models::{ChatMessage, Question, QuestionBank};
use crate::protocol::{ChatRequest, ChatResponse, ExplainRequest, ExplainResponse};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MAX_POOL_SIZE: usize = 10;

/// Uniform in-place Fisher-Yates shuffle.
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

pub fn sample_pool<R: Rng + ?Sized>(questions: &[Arc<Question>], rng: &mut R) -> Vec<Arc<Question>> {
    let mut pool = questions.to_vec();
    shuffle(&mut pool, rng);
    pool.truncate(MAX_POOL_SIZE);
    pool
}

#[derive(Debug, Clone)]
pub struct ControllerTexts {
    pub hint_prompt: String,
    pub hint_request: String,
    pub explain_prompt: String,
    pub answer_first: String,
    pub no_hint: String,
    pub no_response: String,
    pub no_explanation: String,
    pub hint_failed: String,
    pub chat_failed: String,
    pub explain_failed: String,
    pub empty_topic: String,
}

impl Default for ControllerTexts {
    fn default() -> Self {
        Self {
            hint_prompt: "🦆 Hint please (no spoilers).".to_string(),
            hint_request: "Give me a hint (no spoilers). Ask me 1–2 guiding questions.".to_string(),
            explain_prompt: "Explain my answer.".to_string(),
            answer_first: "Answer first, then I can explain.".to_string(),
            no_hint: "No hint from AI.".to_string(),
            no_response: "No response from AI.".to_string(),
            no_explanation: "No explanation from AI.".to_string(),
            hint_failed: "Hint failed.".to_string(),
            chat_failed: "AI chat failed.".to_string(),
            explain_failed: "Explain failed.".to_string(),
            empty_topic: "No questions for this topic.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    You,
    Ai,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::You => f.write_str("You"),
            Sender::Ai => f.write_str("AI"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionState {
    Unanswered,
    Answered { choice: usize },
}

#[derive(Debug, Clone)]
pub struct Session {
    pool: Vec<Arc<Question>>,
    current_index: usize,
    score: u32,
    question_state: QuestionState,
    history: Vec<ChatMessage>,
}

impl Session {
    fn new(pool: Vec<Arc<Question>>) -> Self {
        Self {
            pool,
            current_index: 0,
            score: 0,
            question_state: QuestionState::Unanswered,
            history: Vec::new(),
        }
    }

    fn reset_question(&mut self) {
        self.question_state = QuestionState::Unanswered;
        self.history.clear();
    }

    pub fn pool(&self) -> &[Arc<Question>] {
        &self.pool
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn question_state(&self) -> QuestionState {
        self.question_state
    }

    pub fn answered_locked(&self) -> bool {
        matches!(self.question_state, QuestionState::Answered { .. })
    }

    pub fn last_user_answer_index(&self) -> Option<usize> {
        match self.question_state {
            QuestionState::Answered { choice } => Some(choice),
            QuestionState::Unanswered => None,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn question(&self) -> Option<&Arc<Question>> {
        self.pool.get(self.current_index).or_else(|| self.pool.last())
    }
}

#[derive(Debug, Clone, Default)]
pub enum Phase {
    #[default]
    Idle,
    InProgress(Session),
    Ended(Session),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start { topic: String },
    SelectChoice(usize),
    Advance,
    Hint,
    ChatSend(String),
    Explain,
    Exit,
}

/// Identifies the loaded question an AI call was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Hint,
    Chat,
}

/// A network effect requested by [`GameController::dispatch`].
#[derive(Debug, Clone)]
pub enum Command {
    FetchBank { topic: String },
    Chat { ticket: Ticket, kind: ChatKind, request: ChatRequest },
    Explain { ticket: Ticket, request: ExplainRequest },
}

impl Command {
    pub async fn execute<B: QuizBackend + ?Sized>(self, backend: &B) -> Outcome {
        match self {
            Command::FetchBank { topic } => Outcome::BankLoaded {
                topic,
                result: backend.fetch_bank().await,
            },
            Command::Chat { ticket, kind, request } => Outcome::ChatReplied {
                ticket,
                kind,
                result: backend.chat(request).await,
            },
            Command::Explain { ticket, request } => Outcome::Explained {
                ticket,
                result: backend.explain(request).await,
            },
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    BankLoaded { topic: String, result: Result<QuestionBank, BankError> },
    ChatReplied { ticket: Ticket, kind: ChatKind, result: Result<ChatResponse, TransportError> },
    Explained { ticket: Ticket, result: Result<ExplainResponse, TransportError> },
}

pub struct GameController<R = StdRng> {
    phase: Phase,
    log: Vec<ChatLine>,
    alert: Option<String>,
    loads: u64,
    texts: ControllerTexts,
    rng: R,
}

impl GameController<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy(), ControllerTexts::default())
    }
}

impl Default for GameController<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> GameController<R> {
    pub fn with_rng(rng: R, texts: ControllerTexts) -> Self {
        Self {
            phase: Phase::Idle,
            log: Vec::new(),
            alert: None,
            loads: 0,
            texts,
            rng,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.phase {
            Phase::InProgress(s) | Phase::Ended(s) => Some(s),
            Phase::Idle => None,
        }
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.phase {
            Phase::InProgress(s) | Phase::Ended(s) => Some(s),
            Phase::Idle => None,
        }
    }

    pub fn chat_log(&self) -> &[ChatLine] {
        &self.log
    }

    pub fn texts(&self) -> &ControllerTexts {
        &self.texts
    }

    pub fn take_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    pub fn progress_label(&self) -> Option<String> {
        match &self.phase {
            Phase::InProgress(s) => Some(format!("Question {} of {}", s.current_index + 1, s.pool.len())),
            _ => None,
        }
    }

    pub fn final_score(&self) -> Option<(u32, usize)> {
        match &self.phase {
            Phase::Ended(s) => Some((s.score, s.pool.len())),
            _ => None,
        }
    }

    fn ticket(&self) -> Ticket {
        Ticket(self.loads)
    }

    fn say(&mut self, sender: Sender, text: impl Into<String>) {
        self.log.push(ChatLine { sender, text: text.into() });
    }

    fn question_loaded(&mut self) {
        self.loads += 1;
        self.log.clear();
    }

    pub fn dispatch(&mut self, action: Action) -> Option<Command> {
        match action {
            Action::Start { topic } => self.is_idle().then_some(Command::FetchBank { topic }),
            Action::SelectChoice(choice) => {
                self.select_choice(choice);
                None
            }
            Action::Advance => {
                self.advance();
                None
            }
            Action::Hint => {
                let request_text = self.texts.hint_request.clone();
                self.chat_command(ChatKind::Hint, request_text)
            }
            Action::ChatSend(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                self.chat_command(ChatKind::Chat, text.to_string())
            }
            Action::Explain => self.explain_command(),
            Action::Exit => {
                self.exit();
                None
            }
        }
    }

    fn select_choice(&mut self, choice: usize) {
        let Phase::InProgress(session) = &mut self.phase else {
            return;
        };
        if session.answered_locked() {
            return;
        }
        let Some(question) = session.question().cloned() else {
            return;
        };
        if choice >= question.choices.len() {
            warn!(choice, "ignoring selection of a choice that does not exist");
            return;
        }
        session.question_state = QuestionState::Answered { choice };
        if question.is_correct(choice) {
            session.score += 1;
        }
    }

    fn advance(&mut self) {
        let Phase::InProgress(session) = &mut self.phase else {
            return;
        };
        if !session.answered_locked() {
            return;
        }
        session.current_index += 1;
        if session.current_index >= session.pool.len() {
            let Phase::InProgress(session) = std::mem::take(&mut self.phase) else {
                return;
            };
            info!(score = session.score, total = session.pool.len(), "quiz finished");
            self.phase = Phase::Ended(session);
        } else {
            session.reset_question();
            self.question_loaded();
        }
    }

    fn exit(&mut self) {
        self.phase = Phase::Idle;
        self.alert = None;
        self.log.clear();
        self.loads += 1;
    }

    fn chat_command(&mut self, kind: ChatKind, user_message: String) -> Option<Command> {
        let session = self.session()?;
        let question = session.question()?.view();
        let history = session.history.clone();
        let visible = match kind {
            ChatKind::Hint => self.texts.hint_prompt.clone(),
            ChatKind::Chat => user_message.clone(),
        };
        self.say(Sender::You, visible);
        Some(Command::Chat {
            ticket: self.ticket(),
            kind,
            request: ChatRequest {
                question: Some(question),
                user_message,
                history,
            },
        })
    }

    fn explain_command(&mut self) -> Option<Command> {
        let session = self.session()?;
        let question = Question::clone(session.question()?);
        let Some(choice) = session.last_user_answer_index() else {
            let text = self.texts.answer_first.clone();
            self.say(Sender::Ai, text);
            return None;
        };
        let prompt = self.texts.explain_prompt.clone();
        self.say(Sender::You, prompt);
        Some(Command::Explain {
            ticket: self.ticket(),
            request: ExplainRequest {
                question: Some(question),
                user_answer_index: Some(choice),
            },
        })
    }

    pub fn resolve(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::BankLoaded { topic, result } => self.start_with(topic, result),
            Outcome::ChatReplied { ticket, kind, result } => {
                if !self.is_current(ticket) {
                    return;
                }
                let (empty, failed) = match kind {
                    ChatKind::Hint => (self.texts.no_hint.clone(), self.texts.hint_failed.clone()),
                    ChatKind::Chat => (self.texts.no_response.clone(), self.texts.chat_failed.clone()),
                };
                match result {
                    Ok(reply) => {
                        if let (Some(history), Some(session)) = (reply.history, self.session_mut()) {
                            session.history = history;
                        }
                        self.say(Sender::Ai, non_empty_or(reply.text, empty));
                    }
                    Err(err) => {
                        warn!("ai chat call failed: {}", err);
                        self.say(Sender::Ai, failed);
                    }
                }
            }
            Outcome::Explained { ticket, result } => {
                if !self.is_current(ticket) {
                    return;
                }
                let text = match result {
                    Ok(reply) => non_empty_or(reply.text, self.texts.no_explanation.clone()),
                    Err(err) => {
                        warn!("ai explain call failed: {}", err);
                        self.texts.explain_failed.clone()
                    }
                };
                self.say(Sender::Ai, text);
            }
        }
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        let current = !self.is_idle() && ticket == self.ticket();
        if !current {
            debug!(?ticket, "dropping ai reply for a question that is no longer loaded");
        }
        current
    }

    fn start_with(&mut self, topic: String, result: Result<QuestionBank, BankError>) {
        if !self.is_idle() {
            debug!(%topic, "ignoring question bank that arrived after the game started");
            return;
        }
        let bank = match result {
            Ok(bank) => bank,
            Err(err) => {
                warn!(%topic, "cannot start quiz: {}", err);
                self.alert = Some(err.to_string());
                return;
            }
        };
        let questions = bank.topic(&topic).unwrap_or_default();
        if questions.is_empty() {
            warn!(%topic, "cannot start quiz: topic has no questions");
            self.alert = Some(self.texts.empty_topic.clone());
            return;
        }
        let pool = sample_pool(questions, &mut self.rng);
        info!(%topic, pool = pool.len(), "quiz started");
        self.alert = None;
        self.phase = Phase::InProgress(Session::new(pool));
        self.question_loaded();
    }

    pub async fn run<B: QuizBackend + ?Sized>(&mut self, backend: &B, action: Action) {
        if let Some(command) = self.dispatch(action) {
            let outcome = command.execute(backend).await;
            self.resolve(outcome);
        }
    }
}

fn non_empty_or(text: String, fallback: String) -> String {
    if text.is_empty() {
        fallback
    } else {
        text
    }
}
