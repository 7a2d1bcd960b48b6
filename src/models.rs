use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub choices: Vec<String>,
    pub correct_index: usize,
}

impl Question {
    pub fn is_correct(&self, choice: usize) -> bool {
        self.correct_index == choice
    }

    pub fn view(&self) -> QuestionView {
        QuestionView {
            question: self.question.clone(),
            choices: self.choices.clone(),
        }
    }
}

/// Question text and choices without the answer key.
///
/// Hint/chat requests carry this type instead of [`Question`], so the correct
/// index cannot be serialized into them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionView {
    pub question: String,
    pub choices: Vec<String>,
}

impl QuestionView {
    pub fn is_well_formed(&self) -> bool {
        !self.question.trim().is_empty() && self.choices.len() >= 2
    }
}

/// Topic name to ordered questions. Questions are shared, never copied, by
/// the sessions that pool them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct QuestionBank {
    topics: BTreeMap<String, Vec<Arc<Question>>>,
}

impl QuestionBank {
    pub fn new(topics: BTreeMap<String, Vec<Arc<Question>>>) -> Self {
        Self { topics }
    }

    pub fn topic(&self, name: &str) -> Option<&[Arc<Question>]> {
        self.topics.get(name).map(Vec::as_slice)
    }

    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Arc<Question>])> {
        self.topics.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub issue: String,
}

fn check_question(q: &Question, path: &str, issues: &mut Vec<ValidationIssue>) {
    if q.question.trim().is_empty() {
        issues.push(ValidationIssue {
            field: format!("{path}.question"),
            issue: "must not be empty".into(),
        });
    }
    if q.choices.len() < 2 {
        issues.push(ValidationIssue {
            field: format!("{path}.choices"),
            issue: "must contain at least 2 choices".into(),
        });
    }
    for (j, choice) in q.choices.iter().enumerate() {
        if choice.trim().is_empty() {
            issues.push(ValidationIssue {
                field: format!("{path}.choices[{j}]"),
                issue: "must not be empty".into(),
            });
        }
    }
    if q.correct_index >= q.choices.len() {
        issues.push(ValidationIssue {
            field: format!("{path}.correctIndex"),
            issue: "must reference an existing choice".into(),
        });
    }
}

pub fn validate_question(q: &Question) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    check_question(q, "question", &mut issues);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

pub fn validate_bank(bank: &QuestionBank) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    for (topic, questions) in bank.iter() {
        if topic.trim().is_empty() {
            issues.push(ValidationIssue {
                field: "topic".into(),
                issue: "name must not be empty".into(),
            });
        }
        for (i, q) in questions.iter().enumerate() {
            check_question(q, &format!("{topic}[{i}]"), &mut issues);
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
