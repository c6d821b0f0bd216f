//! The conversational intake engine.
//!
//! One [`IntakeFlow`] owns the answers and cursor of a single session. It
//! walks the catalog in order, skipping questions whose dependency is
//! unmet, persists a progress snapshot after every change, and renders
//! everything through a [`Presenter`].
//!
//! States:
//!
//! ```text
//! ResumePrompt --resume/restart--> Asking --last answer--> Review
//! Review --confirm(no)--> ReviewDeclined --summary--> Review
//! Review --confirm(yes), gateway ok--> Submitted
//! any state --edit--> Asking (except ResumePrompt, Submitted)
//! ```

use super::answers::{AnswerStore, AnswerValue};
use super::catalog::{self, Catalog, Choice, Question, QuestionType, NAME_FIELD};
use super::gateway::{Submission, SubmissionGateway};
use super::present::{Message, Presenter, Progress, RenderedQuestion, Role};
use super::snapshot::{ProgressSnapshot, ProgressStore};
use super::summary::{build_summary, display_value, format_summary, SummarySection};
use crate::config::Config;
use crate::error::{ClientdeskError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// A saved snapshot was found; waiting for resume or restart.
    ResumePrompt,
    Asking,
    /// All questions answered; waiting for confirmation.
    Review,
    /// Confirmation declined; waiting for edit, summary or restart.
    ReviewDeclined,
    Submitted,
}

impl FlowState {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowState::ResumePrompt => "resume_prompt",
            FlowState::Asking => "asking",
            FlowState::Review => "review",
            FlowState::ReviewDeclined => "review_declined",
            FlowState::Submitted => "submitted",
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewChoice {
    /// Show the summary again and return to confirmation.
    Summary,
    /// Discard everything and begin at the first question.
    Restart,
}

#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub company_name: String,
    pub support_email: Option<String>,
    pub retention: Duration,
}

impl FlowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            company_name: config.branding.company_name.clone(),
            support_email: config.branding.support_email.clone(),
            retention: config.intake.retention(),
        }
    }
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self::from_config(&Config::new("Studio"))
    }
}

fn yes_no() -> Vec<Choice> {
    vec![
        Choice::new("yes", "Yes, send it"),
        Choice::new("no", "No, I want to change something"),
    ]
}

fn resume_choices() -> Vec<Choice> {
    vec![
        Choice::new("resume", "Pick up where I left off"),
        Choice::new("restart", "Start over"),
    ]
}

fn declined_choices() -> Vec<Choice> {
    vec![
        Choice::new("summary", "Show the summary again"),
        Choice::new("restart", "Start over completely"),
    ]
}

// ---------------------------------------------------------------------------
// IntakeFlow
// ---------------------------------------------------------------------------

pub struct IntakeFlow<S: ProgressStore, P: Presenter> {
    catalog: Arc<Catalog>,
    answers: AnswerStore,
    position: usize,
    state: FlowState,
    staged: Vec<String>,
    /// Value shown again while re-editing the question at this position.
    editing: Option<(usize, AnswerValue)>,
    pending: Option<ProgressSnapshot>,
    store: S,
    presenter: P,
    settings: FlowSettings,
}

impl<S: ProgressStore, P: Presenter> IntakeFlow<S, P> {
    pub fn new(catalog: Arc<Catalog>, store: S, presenter: P, settings: FlowSettings) -> Self {
        Self {
            catalog,
            answers: AnswerStore::new(),
            position: 0,
            state: FlowState::Asking,
            staged: Vec::new(),
            editing: None,
            pending: None,
            store,
            presenter,
            settings,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn staged(&self) -> &[String] {
        &self.staged
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Start / resume / restart
    // -----------------------------------------------------------------------

    pub fn start(&mut self) -> FlowState {
        self.start_at(Utc::now())
    }

    /// Begin the session, offering to resume a non-expired snapshot.
    pub fn start_at(&mut self, now: DateTime<Utc>) -> FlowState {
        match self.store.load() {
            Ok(Some(snapshot)) if snapshot.is_expired(now, self.settings.retention) => {
                tracing::debug!(saved_at = %snapshot.saved_at, "discarding expired intake progress");
                self.clear_snapshot();
            }
            Ok(Some(snapshot)) if snapshot.position > 0 || !snapshot.answers.is_empty() => {
                let name = snapshot
                    .answers
                    .text(NAME_FIELD)
                    .map(|n| format!(", {n}"))
                    .unwrap_or_default();
                self.pending = Some(snapshot);
                self.state = FlowState::ResumePrompt;
                self.presenter.render_message(
                    Message::assistant(format!(
                        "Welcome back{name}! You were part-way through your project questions. \
                         Would you like to pick up where you left off?"
                    ))
                    .with_choices(resume_choices()),
                );
                self.presenter.scroll_to_latest();
                return self.state;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("could not read saved intake progress, starting fresh: {e}");
            }
        }
        self.begin_fresh();
        self.state
    }

    /// Answer the resume prompt.
    pub fn resume(&mut self, resume: bool) -> Result<FlowState> {
        self.expect_state(&[FlowState::ResumePrompt])?;
        if !resume {
            return self.restart();
        }
        let Some(snapshot) = self.pending.take() else {
            return self.restart();
        };
        self.answers = snapshot.answers;
        self.position = snapshot.position.min(self.catalog.len());
        self.state = FlowState::Asking;

        self.presenter
            .render_message(Message::assistant("Here's what you told me so far:"));
        let catalog = Arc::clone(&self.catalog);
        for question in catalog.questions().iter().take(self.position) {
            if !question.is_reachable(&self.answers) {
                continue;
            }
            if let Some(value) = self.answers.get(question.answer_field()) {
                let options = question.resolve_options(&self.answers);
                self.presenter.render_message(Message::new(
                    Role::History,
                    format!("{}: {}", question.label, display_value(question, value, &options)),
                ));
            }
        }
        self.present_current();
        Ok(self.state)
    }

    /// Discard the snapshot and all answers, then ask the first question.
    pub fn restart(&mut self) -> Result<FlowState> {
        self.expect_state(&[
            FlowState::ResumePrompt,
            FlowState::Asking,
            FlowState::Review,
            FlowState::ReviewDeclined,
            FlowState::Submitted,
        ])?;
        self.clear_snapshot();
        self.presenter
            .render_message(Message::assistant("No problem, let's start fresh."));
        self.begin_fresh();
        Ok(self.state)
    }

    fn begin_fresh(&mut self) {
        self.answers.clear();
        self.position = 0;
        self.staged.clear();
        self.editing = None;
        self.pending = None;
        self.state = FlowState::Asking;
        self.present_current();
    }

    // -----------------------------------------------------------------------
    // Asking
    // -----------------------------------------------------------------------

    fn first_reachable_from(&self, start: usize) -> Option<usize> {
        (start..self.catalog.len()).find(|&i| self.catalog.questions()[i].is_reachable(&self.answers))
    }

    /// The question at the cursor, moving the cursor past any question whose
    /// dependency is unmet. `None` once the catalog is exhausted.
    pub fn current_question(&mut self) -> Option<&Question> {
        match self.first_reachable_from(self.position) {
            Some(position) => {
                self.position = position;
                self.catalog.get(position)
            }
            None => {
                self.position = self.catalog.len();
                None
            }
        }
    }

    /// Display form of the current question without moving the cursor.
    pub fn rendered_question(&self) -> Option<RenderedQuestion> {
        if self.state != FlowState::Asking {
            return None;
        }
        let position = self.first_reachable_from(self.position)?;
        Some(self.render_at(position))
    }

    fn render_at(&self, position: usize) -> RenderedQuestion {
        let question = &self.catalog.questions()[position];
        let prefill = match &self.editing {
            Some((p, value)) if *p == position && question.kind.is_text_like() => Some(value.clone()),
            _ => None,
        };
        RenderedQuestion {
            position,
            id: question.id.clone(),
            field: question.answer_field().to_string(),
            kind: question.kind,
            prompt: question.render_prompt(&self.answers, &self.settings.company_name),
            options: question.resolve_options(&self.answers),
            required: question.required,
            prefill,
            staged: self.staged.clone(),
        }
    }

    fn present_current(&mut self) {
        if self.current_question().is_none() {
            self.enter_review();
            return;
        }
        self.state = FlowState::Asking;
        let rendered = self.render_at(self.position);
        self.presenter.render_question(&rendered);
        self.presenter.update_progress(self.progress());
        self.presenter.scroll_to_latest();
    }

    /// Validate and store an answer for the current question, then advance.
    ///
    /// A validation failure is rendered, returned as
    /// [`ClientdeskError::Validation`] and leaves the cursor in place.
    pub fn submit_answer(&mut self, input: impl Into<AnswerValue>) -> Result<FlowState> {
        self.expect_state(&[FlowState::Asking])?;
        let input = input.into();
        let Some(position) = self.first_reachable_from(self.position) else {
            self.enter_review();
            return Ok(self.state);
        };
        self.position = position;

        let catalog = Arc::clone(&self.catalog);
        let question = &catalog.questions()[position];
        let options = question.resolve_options(&self.answers);

        // Blank input on a prefilled edit keeps the previous answer.
        let input = match &self.editing {
            Some((p, previous))
                if *p == position && input.is_empty() && question.kind.is_text_like() =>
            {
                previous.clone()
            }
            _ => input,
        };

        match question.resolve_input(input.clone(), &options) {
            Err(message) => {
                if !input.is_empty() {
                    self.presenter
                        .render_message(Message::new(Role::Client, input.to_string()));
                }
                self.presenter
                    .render_message(Message::new(Role::Error, message.clone()));
                let rendered = self.render_at(position);
                self.presenter.render_question(&rendered);
                Err(ClientdeskError::validation(question.answer_field(), message))
            }
            Ok(value) => {
                let field = question.answer_field();
                match value {
                    Some(value) => {
                        self.presenter.render_message(Message::new(
                            Role::Client,
                            display_value(question, &value, &options),
                        ));
                        self.answers.insert(field, value);
                    }
                    None => {
                        self.presenter
                            .render_message(Message::new(Role::Client, "(skipped)"));
                        self.answers.remove(field);
                    }
                }
                self.staged.clear();
                self.editing = None;
                self.position = position + 1;
                self.persist();
                self.present_current();
                Ok(self.state)
            }
        }
    }

    /// Add or remove a multi-select option from the staging buffer.
    pub fn toggle_option(&mut self, raw: &str) -> Result<Vec<String>> {
        self.expect_state(&[FlowState::Asking])?;
        let position = self
            .first_reachable_from(self.position)
            .ok_or(ClientdeskError::PositionOutOfRange(self.position))?;
        let catalog = Arc::clone(&self.catalog);
        let question = &catalog.questions()[position];
        if question.kind != QuestionType::Multiselect {
            return Err(ClientdeskError::validation(
                question.answer_field(),
                "This question only takes a single answer.",
            ));
        }
        let options = question.resolve_options(&self.answers);
        let Some(choice) = catalog::match_choice(raw.trim(), &options) else {
            return Err(ClientdeskError::validation(
                question.answer_field(),
                format!("'{}' isn't one of the options.", raw.trim()),
            ));
        };
        match self.staged.iter().position(|v| *v == choice.value) {
            Some(i) => {
                self.staged.remove(i);
            }
            None => self.staged.push(choice.value.clone()),
        }
        // keep staging in option order
        self.staged
            .sort_by_key(|v| options.iter().position(|c| c.value == *v));
        let rendered = self.render_at(position);
        self.presenter.render_question(&rendered);
        Ok(self.staged.clone())
    }

    /// Submit the staged multi-select values as the answer.
    pub fn confirm_selection(&mut self) -> Result<FlowState> {
        let staged = self.staged.clone();
        self.submit_answer(AnswerValue::List(staged))
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    /// Rewind to `target`, dropping that answer and every later one.
    pub fn edit_answer(&mut self, target: usize) -> Result<FlowState> {
        self.expect_state(&[
            FlowState::Asking,
            FlowState::Review,
            FlowState::ReviewDeclined,
        ])?;
        if target >= self.catalog.len() {
            return Err(ClientdeskError::PositionOutOfRange(target));
        }
        if target > self.position {
            return Err(ClientdeskError::PositionNotReached(target));
        }

        let catalog = Arc::clone(&self.catalog);
        let previous = self.answers.get(catalog.questions()[target].answer_field()).cloned();
        match previous {
            Some(value) => self.editing = Some((target, value)),
            None => {
                if !matches!(&self.editing, Some((p, _)) if *p == target) {
                    self.editing = None;
                }
            }
        }
        for question in &catalog.questions()[target..] {
            self.answers.remove(question.answer_field());
        }
        self.position = target;
        self.staged.clear();
        self.state = FlowState::Asking;
        self.persist();

        self.presenter.render_message(Message::assistant(
            "Sure, let's change that. Answers after this one will be asked again.",
        ));
        self.present_current();
        Ok(self.state)
    }

    // -----------------------------------------------------------------------
    // Review / submit
    // -----------------------------------------------------------------------

    pub fn summary(&self) -> Vec<SummarySection> {
        build_summary(&self.catalog, &self.answers)
    }

    fn enter_review(&mut self) {
        self.position = self.catalog.len();
        self.state = FlowState::Review;
        let summary = format_summary(&self.summary());
        self.presenter.update_progress(self.progress());
        self.presenter.render_message(Message::assistant(format!(
            "That's everything! Here's a summary of your answers:\n\n{summary}"
        )));
        self.presenter.render_message(
            Message::assistant("Does everything look right? Shall I send it over?")
                .with_choices(yes_no()),
        );
        self.presenter.scroll_to_latest();
    }

    /// Answer the final confirmation. On gateway failure the answers and the
    /// saved snapshot are kept and the engine stays in review for a retry.
    pub fn confirm_review(
        &mut self,
        confirm: bool,
        gateway: &dyn SubmissionGateway,
    ) -> Result<FlowState> {
        self.confirm_review_at(confirm, gateway, Utc::now())
    }

    pub fn confirm_review_at(
        &mut self,
        confirm: bool,
        gateway: &dyn SubmissionGateway,
        now: DateTime<Utc>,
    ) -> Result<FlowState> {
        self.expect_state(&[FlowState::Review])?;
        if !confirm {
            self.state = FlowState::ReviewDeclined;
            self.presenter.render_message(
                Message::assistant(
                    "No problem, nothing has been lost. Choose a number from the summary to \
                     edit that answer, or pick an option below.",
                )
                .with_choices(declined_choices()),
            );
            return Ok(self.state);
        }

        let submission = Submission::new(self.answers.clone(), now);
        match gateway.submit(&submission) {
            Ok(receipt) => {
                self.clear_snapshot();
                self.state = FlowState::Submitted;
                let name = self
                    .answers
                    .text(NAME_FIELD)
                    .map(|n| format!(", {n}"))
                    .unwrap_or_default();
                let reference = receipt
                    .id
                    .map(|id| format!(" (reference #{id})"))
                    .unwrap_or_default();
                self.presenter.render_message(Message::assistant(format!(
                    "Thanks{name}! {} has your project details{reference} and will be in touch \
                     within one business day.",
                    self.settings.company_name
                )));
                Ok(self.state)
            }
            Err(e) => {
                tracing::warn!("intake submission failed: {e}");
                let contact = self
                    .settings
                    .support_email
                    .as_deref()
                    .map(|email| format!(" or email us at {email}"))
                    .unwrap_or_default();
                self.presenter.render_message(
                    Message::new(
                        Role::Error,
                        format!(
                            "Sorry, I couldn't send your answers ({e}). They're saved, so you can \
                             try again{contact}."
                        ),
                    )
                    .with_choices(vec![Choice::new("yes", "Try again")]),
                );
                Err(e)
            }
        }
    }

    pub fn review_choice(&mut self, choice: ReviewChoice) -> Result<FlowState> {
        self.expect_state(&[FlowState::ReviewDeclined, FlowState::Review])?;
        match choice {
            ReviewChoice::Summary => {
                self.enter_review();
                Ok(self.state)
            }
            ReviewChoice::Restart => self.restart(),
        }
    }

    // -----------------------------------------------------------------------
    // Progress & persistence
    // -----------------------------------------------------------------------

    /// Answered vs total among questions reachable under the current answers.
    /// Optional questions already passed count as answered.
    pub fn progress(&self) -> Progress {
        let reachable = self
            .catalog
            .questions()
            .iter()
            .enumerate()
            .filter(|(_, q)| q.is_reachable(&self.answers));
        let (answered, total) = reachable.fold((0, 0), |(answered, total), (i, q)| {
            let done = self.answers.contains(q.answer_field()) || (!q.required && i < self.position);
            (answered + usize::from(done), total + 1)
        });
        Progress::new(answered, total)
    }

    fn persist(&mut self) {
        let snapshot = ProgressSnapshot {
            position: self.position,
            answers: self.answers.clone(),
            saved_at: Utc::now(),
        };
        if let Err(e) = self.store.save(&snapshot) {
            tracing::warn!("could not save intake progress: {e}");
        }
    }

    fn clear_snapshot(&mut self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("could not clear saved intake progress: {e}");
        }
    }

    fn expect_state(&self, allowed: &[FlowState]) -> Result<()> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(ClientdeskError::InvalidState {
            expected: allowed
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" or "),
            actual: self.state.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
