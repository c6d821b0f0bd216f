//! The static intake question catalog.
//!
//! Questions are asked in catalog order. A question with a `depends_on`
//! condition is only reachable while that condition holds. Two questions
//! (`budget` and `features`) resolve their options from the answered
//! project type at render time.

use super::answers::{AnswerStore, AnswerValue};
use super::condition::Condition;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Answer key written by the greeting question, whose own `field` is empty.
pub const NAME_FIELD: &str = "name";

/// Field holding the project type that drives the dynamic option tables.
pub const PROJECT_TYPE_FIELD: &str = "projectType";

pub const EMAIL_FIELD: &str = "email";

/// Fallback key for project types without their own table entry.
pub const FALLBACK_PROJECT_TYPE: &str = "other";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    Email,
    Tel,
    Url,
    Select,
    Multiselect,
    Textarea,
}

impl QuestionType {
    pub fn is_choice(self) -> bool {
        matches!(self, QuestionType::Select | QuestionType::Multiselect)
    }

    /// Free-text types are re-rendered prefilled when edited.
    pub fn is_text_like(self) -> bool {
        !self.is_choice()
    }
}

/// Review summary grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Contact,
    Project,
    Scope,
    Logistics,
}

impl Topic {
    pub fn title(self) -> &'static str {
        match self {
            Topic::Contact => "Contact",
            Topic::Project => "Project",
            Topic::Scope => "Scope & budget",
            Topic::Logistics => "Logistics",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Tables keyed by project type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTable {
    Budget,
    Features,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSource {
    None,
    Static(Vec<Choice>),
    ByProjectType(LookupTable),
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validator {
    Name,
    Email,
    Phone,
    Url,
    MinLength(usize),
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static URL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn url_re() -> &'static Regex {
    URL_RE.get_or_init(|| {
        Regex::new(r"^(https?://)?([A-Za-z0-9-]+\.)+[A-Za-z]{2,}(:\d+)?(/\S*)?$").unwrap()
    })
}

fn phone_re() -> &'static Regex {
    PHONE_RE.get_or_init(|| Regex::new(r"^\+?[0-9\s().\-]+$").unwrap())
}

impl Validator {
    /// Returns an error message when `input` is rejected.
    pub fn check(self, input: &str) -> Option<String> {
        let input = input.trim();
        match self {
            Validator::Name => {
                if input.chars().filter(|c| c.is_alphabetic()).count() < 2 {
                    Some("Please enter at least two letters for your name.".to_string())
                } else {
                    None
                }
            }
            Validator::Email => {
                if email_re().is_match(input) {
                    None
                } else {
                    Some("That doesn't look like a valid email address.".to_string())
                }
            }
            Validator::Phone => {
                let digits = input.chars().filter(char::is_ascii_digit).count();
                if phone_re().is_match(input) && (7..=15).contains(&digits) {
                    None
                } else {
                    Some("Please enter a phone number with 7 to 15 digits.".to_string())
                }
            }
            Validator::Url => {
                if url_re().is_match(input) {
                    None
                } else {
                    Some("Please enter a website address like example.com.".to_string())
                }
            }
            Validator::MinLength(n) => {
                if input.chars().count() < n {
                    Some(format!("Please write at least {n} characters."))
                } else {
                    None
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Question {
    pub id: String,
    /// Empty for the greeting question, see [`Question::answer_field`].
    pub field: String,
    pub label: String,
    pub prompt: String,
    pub kind: QuestionType,
    pub options: OptionSource,
    pub required: bool,
    pub validator: Option<Validator>,
    pub depends_on: Option<Condition>,
    pub topic: Topic,
}

impl Question {
    pub fn new(id: &str, field: &str, label: &str, prompt: &str, kind: QuestionType, topic: Topic) -> Self {
        Self {
            id: id.to_string(),
            field: field.to_string(),
            label: label.to_string(),
            prompt: prompt.to_string(),
            kind,
            options: OptionSource::None,
            required: true,
            validator: None,
            depends_on: None,
            topic,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn choices(mut self, choices: &[(&str, &str)]) -> Self {
        self.options = OptionSource::Static(
            choices
                .iter()
                .map(|(value, label)| Choice::new(value, label))
                .collect(),
        );
        self
    }

    pub fn lookup(mut self, table: LookupTable) -> Self {
        self.options = OptionSource::ByProjectType(table);
        self
    }

    pub fn validated(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.depends_on = Some(condition);
        self
    }

    /// The answer-store key this question writes.
    pub fn answer_field(&self) -> &str {
        if self.field.is_empty() {
            NAME_FIELD
        } else {
            &self.field
        }
    }

    pub fn is_reachable(&self, answers: &AnswerStore) -> bool {
        self.depends_on
            .as_ref()
            .map_or(true, |condition| condition.is_met(answers))
    }

    pub fn resolve_options(&self, answers: &AnswerStore) -> Vec<Choice> {
        match &self.options {
            OptionSource::None => Vec::new(),
            OptionSource::Static(choices) => choices.clone(),
            OptionSource::ByProjectType(table) => {
                let project_type = answers.text(PROJECT_TYPE_FIELD).unwrap_or(FALLBACK_PROJECT_TYPE);
                lookup_options(*table, project_type)
            }
        }
    }

    /// Fill `{{name}}`, `{{company}}` and other `{{field}}` placeholders.
    pub fn render_prompt(&self, answers: &AnswerStore, company: &str) -> String {
        render_template(&self.prompt, answers, company)
    }

    /// Turn raw input into the value to store.
    ///
    /// `Ok(None)` means an optional question was left blank. `Err` carries
    /// the message to show before re-prompting.
    pub fn resolve_input(
        &self,
        input: AnswerValue,
        options: &[Choice],
    ) -> std::result::Result<Option<AnswerValue>, String> {
        match self.kind {
            QuestionType::Select => {
                let raw = match input {
                    AnswerValue::Text(s) => s,
                    AnswerValue::List(_) => {
                        return Err("Please pick just one option.".to_string());
                    }
                };
                if raw.trim().is_empty() {
                    return self.blank();
                }
                match match_choice(raw.trim(), options) {
                    Some(choice) => Ok(Some(AnswerValue::Text(choice.value.clone()))),
                    None => Err(unknown_choice(raw.trim())),
                }
            }
            QuestionType::Multiselect => {
                let raw: Vec<String> = match input {
                    AnswerValue::Text(s) => s.split(',').map(|p| p.trim().to_string()).collect(),
                    AnswerValue::List(items) => items.into_iter().map(|p| p.trim().to_string()).collect(),
                };
                let mut picked: Vec<String> = Vec::new();
                for part in raw.iter().filter(|p| !p.is_empty()) {
                    let Some(choice) = match_choice(part, options) else {
                        return Err(unknown_choice(part));
                    };
                    if !picked.contains(&choice.value) {
                        picked.push(choice.value.clone());
                    }
                }
                if picked.is_empty() {
                    return self.blank();
                }
                Ok(Some(AnswerValue::List(picked)))
            }
            _ => {
                let raw = match input {
                    AnswerValue::Text(s) => s,
                    AnswerValue::List(items) => items.join(", "),
                };
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return self.blank();
                }
                if let Some(validator) = self.validator {
                    if let Some(message) = validator.check(trimmed) {
                        return Err(message);
                    }
                }
                Ok(Some(AnswerValue::Text(trimmed.to_string())))
            }
        }
    }

    fn blank(&self) -> std::result::Result<Option<AnswerValue>, String> {
        if self.required {
            if self.kind.is_choice() {
                Err("Please choose at least one option.".to_string())
            } else {
                Err("This one is required, please type an answer.".to_string())
            }
        } else {
            Ok(None)
        }
    }
}

fn unknown_choice(raw: &str) -> String {
    format!("'{raw}' isn't one of the options. Use a number or the option name.")
}

/// Accepts an option value, its label (case-insensitive) or its 1-based index.
pub(crate) fn match_choice<'a>(raw: &str, options: &'a [Choice]) -> Option<&'a Choice> {
    if let Ok(index) = raw.parse::<usize>() {
        if index >= 1 {
            if let Some(choice) = options.get(index - 1) {
                return Some(choice);
            }
        }
    }
    options.iter().find(|c| {
        c.value.eq_ignore_ascii_case(raw) || c.label.eq_ignore_ascii_case(raw)
    })
}

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap())
}

pub fn render_template(template: &str, answers: &AnswerStore, company: &str) -> String {
    placeholder_re()
        .replace_all(template, |caps: &regex::Captures<'_>| match &caps[1] {
            "company" => company.to_string(),
            NAME_FIELD => answers
                .text(NAME_FIELD)
                .map(first_name)
                .unwrap_or("there")
                .to_string(),
            other => answers.get(other).map(|v| v.to_string()).unwrap_or_default(),
        })
        .into_owned()
}

fn first_name(full: &str) -> &str {
    full.split_whitespace().next().unwrap_or(full)
}

// ---------------------------------------------------------------------------
// Lookup tables
// ---------------------------------------------------------------------------

type Table = &'static [(&'static str, &'static [(&'static str, &'static str)])];

pub const PROJECT_TYPES: &[(&str, &str)] = &[
    ("business", "Business / service website"),
    ("ecommerce", "Online store"),
    ("portfolio", "Portfolio"),
    ("blog", "Blog or publication"),
    ("webapp", "Web application"),
    ("other", "Something else"),
];

const BUDGETS: Table = &[
    (
        "business",
        &[
            ("under-2k", "Under $2,000"),
            ("2k-5k", "$2,000 – $5,000"),
            ("5k-10k", "$5,000 – $10,000"),
            ("10k-plus", "$10,000+"),
            ("unsure", "Not sure yet"),
        ],
    ),
    (
        "ecommerce",
        &[
            ("3k-7k", "$3,000 – $7,000"),
            ("7k-15k", "$7,000 – $15,000"),
            ("15k-30k", "$15,000 – $30,000"),
            ("30k-plus", "$30,000+"),
            ("unsure", "Not sure yet"),
        ],
    ),
    (
        "portfolio",
        &[
            ("under-1k", "Under $1,000"),
            ("1k-3k", "$1,000 – $3,000"),
            ("3k-5k", "$3,000 – $5,000"),
            ("unsure", "Not sure yet"),
        ],
    ),
    (
        "blog",
        &[
            ("under-1k", "Under $1,000"),
            ("1k-2500", "$1,000 – $2,500"),
            ("2500-5k", "$2,500 – $5,000"),
            ("unsure", "Not sure yet"),
        ],
    ),
    (
        "webapp",
        &[
            ("10k-25k", "$10,000 – $25,000"),
            ("25k-50k", "$25,000 – $50,000"),
            ("50k-100k", "$50,000 – $100,000"),
            ("100k-plus", "$100,000+"),
            ("unsure", "Not sure yet"),
        ],
    ),
    (
        "other",
        &[
            ("under-2k", "Under $2,000"),
            ("2k-5k", "$2,000 – $5,000"),
            ("5k-15k", "$5,000 – $15,000"),
            ("15k-plus", "$15,000+"),
            ("unsure", "Not sure yet"),
        ],
    ),
];

const FEATURES: Table = &[
    (
        "business",
        &[
            ("contact-form", "Contact form"),
            ("booking", "Online booking"),
            ("testimonials", "Testimonials"),
            ("blog", "Blog / news"),
            ("seo", "SEO setup"),
            ("analytics", "Analytics"),
            ("newsletter", "Newsletter signup"),
        ],
    ),
    (
        "ecommerce",
        &[
            ("online-store", "Product catalog & cart"),
            ("payments", "Online payments"),
            ("inventory", "Inventory management"),
            ("shipping", "Shipping rates"),
            ("reviews", "Product reviews"),
            ("seo", "SEO setup"),
            ("analytics", "Analytics"),
        ],
    ),
    (
        "portfolio",
        &[
            ("gallery", "Project gallery"),
            ("contact-form", "Contact form"),
            ("testimonials", "Testimonials"),
            ("blog", "Blog"),
            ("seo", "SEO setup"),
        ],
    ),
    (
        "blog",
        &[
            ("blog", "Publishing tools"),
            ("newsletter", "Newsletter"),
            ("comments", "Comments"),
            ("seo", "SEO setup"),
            ("analytics", "Analytics"),
        ],
    ),
    (
        "webapp",
        &[
            ("user-accounts", "User accounts"),
            ("payments", "Subscriptions & payments"),
            ("dashboard", "Admin dashboard"),
            ("api-integrations", "Third-party integrations"),
            ("notifications", "Email notifications"),
            ("analytics", "Analytics"),
        ],
    ),
    (
        "other",
        &[
            ("contact-form", "Contact form"),
            ("blog", "Blog"),
            ("booking", "Online booking"),
            ("payments", "Online payments"),
            ("seo", "SEO setup"),
            ("analytics", "Analytics"),
        ],
    ),
];

fn table_rows(table: Table, project_type: &str) -> &'static [(&'static str, &'static str)] {
    table
        .iter()
        .find(|(key, _)| *key == project_type)
        .or_else(|| table.iter().find(|(key, _)| *key == FALLBACK_PROJECT_TYPE))
        .map(|(_, rows)| *rows)
        .unwrap_or(&[])
}

/// Options for `table` given a project type, falling back to `other`.
pub fn lookup_options(table: LookupTable, project_type: &str) -> Vec<Choice> {
    let rows = match table {
        LookupTable::Budget => table_rows(BUDGETS, project_type),
        LookupTable::Features => table_rows(FEATURES, project_type),
    };
    rows.iter().map(|(v, l)| Choice::new(v, l)).collect()
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Catalog {
    questions: Vec<Question>,
}

static STANDARD: OnceLock<Arc<Catalog>> = OnceLock::new();

impl Catalog {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// The shared standard catalog, built once per process.
    pub fn shared() -> Arc<Catalog> {
        STANDARD.get_or_init(|| Arc::new(Catalog::standard())).clone()
    }

    pub fn standard() -> Self {
        use QuestionType::*;
        use Topic::*;

        let questions = vec![
            Question::new(
                "greeting",
                "",
                "Name",
                "Hi! I'm the {{company}} project assistant. I'll ask a few quick questions about your project. First, what's your name?",
                Text,
                Contact,
            )
            .validated(Validator::Name),
            Question::new(
                "email",
                "email",
                "Email",
                "Nice to meet you, {{name}}! What's the best email address to reach you?",
                Email,
                Contact,
            )
            .validated(Validator::Email),
            Question::new(
                "phone",
                "phone",
                "Phone",
                "What phone number can we use if email doesn't get through? (optional, press enter to skip)",
                Tel,
                Contact,
            )
            .optional()
            .validated(Validator::Phone),
            Question::new(
                "business",
                "businessName",
                "Business",
                "What's the name of your business or project? (optional)",
                Text,
                Contact,
            )
            .optional(),
            Question::new(
                "has-website",
                "hasWebsite",
                "Existing website",
                "Do you already have a website?",
                Select,
                Project,
            )
            .choices(&[("yes", "Yes, I have one"), ("no", "No, starting fresh")]),
            Question::new(
                "current-url",
                "currentUrl",
                "Current website",
                "What's the address of your current site?",
                Url,
                Project,
            )
            .validated(Validator::Url)
            .when(Condition::equals("hasWebsite", "yes")),
            Question::new(
                "project-type",
                PROJECT_TYPE_FIELD,
                "Project type",
                "What kind of project are you planning, {{name}}?",
                Select,
                Project,
            )
            .choices(PROJECT_TYPES),
            Question::new(
                "product-count",
                "productCount",
                "Products",
                "Roughly how many products will you sell?",
                Select,
                Project,
            )
            .choices(&[
                ("1-10", "1 – 10"),
                ("11-50", "11 – 50"),
                ("51-200", "51 – 200"),
                ("200-plus", "More than 200"),
            ])
            .when(Condition::equals(PROJECT_TYPE_FIELD, "ecommerce")),
            Question::new(
                "features",
                "features",
                "Features",
                "Which features do you need? Pick as many as you like.",
                Multiselect,
                Scope,
            )
            .lookup(LookupTable::Features),
            Question::new(
                "payment-provider",
                "paymentProvider",
                "Payment provider",
                "Do you have a preferred payment provider?",
                Select,
                Scope,
            )
            .choices(&[
                ("stripe", "Stripe"),
                ("paypal", "PayPal"),
                ("square", "Square"),
                ("unsure", "No preference"),
            ])
            .when(Condition::includes_any(
                "features",
                &["online-store", "payments", "booking"],
            )),
            Question::new(
                "budget",
                "budget",
                "Budget",
                "What budget range are you working with?",
                Select,
                Scope,
            )
            .lookup(LookupTable::Budget),
            Question::new(
                "timeline",
                "timeline",
                "Timeline",
                "When would you like to launch?",
                Select,
                Logistics,
            )
            .choices(&[
                ("asap", "As soon as possible"),
                ("1-3-months", "In 1 – 3 months"),
                ("3-6-months", "In 3 – 6 months"),
                ("flexible", "I'm flexible"),
            ]),
            Question::new(
                "content",
                "contentReady",
                "Content",
                "Is your content (text, photos, logo) ready?",
                Select,
                Logistics,
            )
            .choices(&[
                ("ready", "Yes, it's ready"),
                ("partial", "Some of it"),
                ("need-help", "I'll need help with it"),
            ]),
            Question::new(
                "details",
                "details",
                "Details",
                "Anything else we should know about your project? (optional)",
                Textarea,
                Logistics,
            )
            .optional()
            .validated(Validator::MinLength(10)),
            Question::new(
                "referral",
                "referral",
                "Referral",
                "Last one: how did you hear about {{company}}? (optional)",
                Select,
                Logistics,
            )
            .optional()
            .choices(&[
                ("search", "Search engine"),
                ("social", "Social media"),
                ("referral", "A friend or client"),
                ("other", "Somewhere else"),
            ]),
        ];

        Self { questions }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, position: usize) -> Option<&Question> {
        self.questions.get(position)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
