//! The narrow output interface the flow engine renders through.

use super::answers::AnswerValue;
use super::catalog::{Choice, QuestionType};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The assistant speaking.
    Assistant,
    /// Echo of what the client answered.
    Client,
    /// Replayed Q/A pair from a resumed session.
    History,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Choices offered by a yes/no style sub-dialog.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl Message {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }
}

/// A question ready for display, with options resolved and placeholders filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedQuestion {
    pub position: usize,
    pub id: String,
    pub field: String,
    pub kind: QuestionType,
    pub prompt: String,
    pub options: Vec<Choice>,
    pub required: bool,
    /// Previous answer offered for accept-as-is when editing a text answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill: Option<AnswerValue>,
    /// Multi-select values toggled but not yet confirmed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub staged: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
    pub percent: u8,
}

impl Progress {
    pub fn new(answered: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((answered.min(total) * 100) / total) as u8
        };
        Self {
            answered,
            total,
            percent,
        }
    }
}

pub trait Presenter {
    fn render_message(&mut self, message: Message);
    fn render_question(&mut self, question: &RenderedQuestion);
    fn update_progress(&mut self, progress: Progress);
    fn scroll_to_latest(&mut self) {}
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    Message(Message),
    Question(RenderedQuestion),
    Progress(Progress),
}

/// Buffers everything rendered so a caller can forward it in one batch.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    outputs: Vec<Output>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn drain(&mut self) -> Vec<Output> {
        std::mem::take(&mut self.outputs)
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.outputs.iter().filter_map(|o| match o {
            Output::Message(m) => Some(m),
            _ => None,
        })
    }

    pub fn last_question(&self) -> Option<&RenderedQuestion> {
        self.outputs.iter().rev().find_map(|o| match o {
            Output::Question(q) => Some(q),
            _ => None,
        })
    }
}

impl Presenter for Transcript {
    fn render_message(&mut self, message: Message) {
        self.outputs.push(Output::Message(message));
    }

    fn render_question(&mut self, question: &RenderedQuestion) {
        self.outputs.push(Output::Question(question.clone()));
    }

    fn update_progress(&mut self, progress: Progress) {
        self.outputs.push(Output::Progress(progress));
    }
}
