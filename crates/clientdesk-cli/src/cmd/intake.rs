use anyhow::Context;
use clientdesk_core::config::Config;
use clientdesk_core::error::ClientdeskError;
use clientdesk_core::intake::{
    Catalog, FileProgressStore, FlowSettings, FlowState, HttpGateway, IntakeFlow, Message,
    Presenter, Progress, QuestionType, RenderedQuestion, ReviewChoice, Role,
};
use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// TerminalPresenter
// ---------------------------------------------------------------------------

/// Prints the conversation to stdout, pausing before each assistant line
/// when attached to a terminal.
pub struct TerminalPresenter {
    prefix: String,
    delay: Duration,
}

impl TerminalPresenter {
    pub fn new(prefix: impl Into<String>, delay: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            delay,
        }
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

impl Presenter for TerminalPresenter {
    fn render_message(&mut self, message: Message) {
        match message.role {
            // the client's own typing is already on screen
            Role::Client => return,
            Role::Assistant => {
                self.pause();
                println!("\n{}", message.text);
            }
            Role::History => println!("  - {}", message.text),
            Role::Error => println!("\n! {}", message.text),
        }
        for (i, choice) in message.choices.iter().enumerate() {
            println!("  {}) {}", i + 1, choice.label);
        }
    }

    fn render_question(&mut self, question: &RenderedQuestion) {
        self.pause();
        println!("\n[{}] {}", question.position + 1, question.prompt);
        for (i, choice) in question.options.iter().enumerate() {
            let mark = if question.staged.contains(&choice.value) {
                "x"
            } else {
                " "
            };
            if question.kind == QuestionType::Multiselect {
                println!("  [{mark}] {}) {}", i + 1, choice.label);
            } else {
                println!("  {}) {}", i + 1, choice.label);
            }
        }
        if question.kind == QuestionType::Multiselect {
            println!("  (pick several, separated by commas)");
        }
        if let Some(previous) = &question.prefill {
            println!("  (press enter to keep: {previous})");
        }
        if !question.required {
            println!("  (optional, press enter to skip)");
        }
    }

    fn update_progress(&mut self, progress: Progress) {
        println!(
            "  progress: {}/{} ({}%)",
            progress.answered, progress.total, progress.percent
        );
    }

    fn scroll_to_latest(&mut self) {
        let _ = std::io::stdout().flush();
    }
}

// ---------------------------------------------------------------------------
// Input handling
// ---------------------------------------------------------------------------

/// A line typed by the client, with `:` commands split out.
#[derive(Debug, PartialEq)]
enum Input {
    Edit(usize),
    Restart,
    Progress,
    Quit,
    Text(String),
}

fn parse_input(line: &str) -> Result<Input, String> {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix(':') else {
        return Ok(Input::Text(trimmed.to_string()));
    };
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("edit"), Some(n)) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Input::Edit(n - 1)),
            _ => Err(format!("':edit' needs a question number, got '{n}'")),
        },
        (Some("edit"), None) => Err("usage: :edit N".to_string()),
        (Some("restart"), None) => Ok(Input::Restart),
        (Some("progress"), None) => Ok(Input::Progress),
        (Some("quit"), None) | (Some("q"), None) => Ok(Input::Quit),
        _ => Err(format!(
            "unknown command '{trimmed}' (try :edit N, :restart, :progress, :quit)"
        )),
    }
}

fn parse_yes_no(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "y" | "yes" | "1" | "resume" => Some(true),
        "n" | "no" | "2" | "restart" => Some(false),
        _ => None,
    }
}

fn parse_review_choice(text: &str) -> Option<ReviewChoice> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "summary" => Some(ReviewChoice::Summary),
        "2" | "restart" => Some(ReviewChoice::Restart),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, endpoint: Option<&str>, key: &str) -> anyhow::Result<()> {
    let config = match Config::load(root) {
        Ok(config) => config,
        Err(ClientdeskError::NotInitialized) => {
            tracing::debug!("no config found, using defaults");
            Config::new("Studio")
        }
        Err(e) => return Err(e).context("failed to load config"),
    };

    let endpoint = endpoint.unwrap_or(&config.intake.submit_url);
    let gateway = HttpGateway::new(endpoint)?;
    let store = FileProgressStore::new(root, key)?;
    let delay = if std::io::stdout().is_terminal() {
        Duration::from_millis(config.intake.typing_delay_ms)
    } else {
        Duration::ZERO
    };
    let presenter = TerminalPresenter::new(config.branding.prompt_prefix.clone(), delay);
    let mut flow = IntakeFlow::new(
        Catalog::shared(),
        store,
        presenter,
        FlowSettings::from_config(&config),
    );

    if let Some(tagline) = &config.branding.tagline {
        println!("{} · {tagline}", config.branding.company_name);
    }
    flow.start();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if flow.state() == FlowState::Submitted {
            return Ok(());
        }
        print!("{} ", flow.presenter().prefix);
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            println!("Your answers so far are saved. Run `clientdesk intake` again to continue.");
            return Ok(());
        };
        let line = line.context("failed to read input")?;

        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        let result = match input {
            Input::Quit => {
                println!("Your answers so far are saved. Run `clientdesk intake` again to continue.");
                return Ok(());
            }
            Input::Progress => {
                let p = flow.progress();
                println!("  {}/{} answered ({}%)", p.answered, p.total, p.percent);
                continue;
            }
            Input::Restart => flow.restart(),
            Input::Edit(position) => flow.edit_answer(position),
            Input::Text(text) => match flow.state() {
                FlowState::ResumePrompt => match parse_yes_no(&text) {
                    Some(resume) => flow.resume(resume),
                    None => {
                        println!("Please answer 1 to resume or 2 to start over.");
                        continue;
                    }
                },
                FlowState::Asking => flow.submit_answer(text.as_str()),
                FlowState::Review => match parse_yes_no(&text) {
                    Some(confirm) => flow.confirm_review(confirm, &gateway),
                    None => {
                        println!("Please answer yes or no.");
                        continue;
                    }
                },
                FlowState::ReviewDeclined => match parse_review_choice(&text) {
                    Some(choice) => flow.review_choice(choice),
                    None => {
                        println!("Pick 1 or 2, or type :edit N to change answer N.");
                        continue;
                    }
                },
                FlowState::Submitted => return Ok(()),
            },
        };

        match result {
            Ok(_) => {}
            // already shown by the flow
            Err(ClientdeskError::Validation { .. }) | Err(ClientdeskError::Submission(_)) => {}
            Err(e) => println!("! {e}"),
        }
    }
}
