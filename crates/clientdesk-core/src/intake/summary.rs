//! Review summary of collected answers, grouped by topic.

use super::answers::{AnswerStore, AnswerValue};
use super::catalog::{Catalog, Choice, Question, Topic};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryItem {
    pub position: usize,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarySection {
    pub topic: Topic,
    pub title: String,
    pub items: Vec<SummaryItem>,
}

/// Human-readable form of an answer: option labels for choice questions.
pub fn display_value(question: &Question, value: &AnswerValue, options: &[Choice]) -> String {
    if !question.kind.is_choice() {
        return value.to_string();
    }
    value
        .values()
        .iter()
        .map(|v| {
            options
                .iter()
                .find(|c| c.value == *v)
                .map(|c| c.label.clone())
                .unwrap_or_else(|| v.to_string())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reachable, answered questions grouped by topic in catalog order.
pub fn build_summary(catalog: &Catalog, answers: &AnswerStore) -> Vec<SummarySection> {
    let mut sections: Vec<SummarySection> = Vec::new();
    for (position, question) in catalog.questions().iter().enumerate() {
        if !question.is_reachable(answers) {
            continue;
        }
        let Some(value) = answers.get(question.answer_field()) else {
            continue;
        };
        let options = question.resolve_options(answers);
        let item = SummaryItem {
            position,
            label: question.label.clone(),
            value: display_value(question, value, &options),
        };
        match sections.iter_mut().find(|s| s.topic == question.topic) {
            Some(section) => section.items.push(item),
            None => sections.push(SummarySection {
                topic: question.topic,
                title: question.topic.title().to_string(),
                items: vec![item],
            }),
        }
    }
    sections.sort_by_key(|s| s.topic);
    sections
}

/// Plain-text rendering used by the conversation. Item numbers are 1-based
/// catalog positions so they can be passed straight to an edit command.
pub fn format_summary(sections: &[SummarySection]) -> String {
    let mut out = String::new();
    for section in sections {
        out.push_str(&format!("{}\n", section.title));
        for item in &section.items {
            out.push_str(&format!("  {:>2}. {}: {}\n", item.position + 1, item.label, item.value));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::catalog::PROJECT_TYPE_FIELD;

    #[test]
    fn groups_by_topic_and_uses_labels() {
        let catalog = Catalog::standard();
        let mut answers = AnswerStore::new();
        answers.insert("name", "Ada".into());
        answers.insert("timeline", "asap".into());
        answers.insert(PROJECT_TYPE_FIELD, "blog".into());
        answers.insert(
            "features",
            vec!["blog".to_string(), "newsletter".to_string()].into(),
        );

        let sections = build_summary(&catalog, &answers);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Contact", "Project", "Scope & budget", "Logistics"]);

        let scope = &sections[2];
        assert_eq!(scope.items[0].value, "Publishing tools, Newsletter");
        assert_eq!(sections[3].items[0].value, "As soon as possible");
    }

    #[test]
    fn skips_unreachable_answers() {
        let catalog = Catalog::standard();
        let mut answers = AnswerStore::new();
        answers.insert("hasWebsite", "no".into());
        answers.insert("currentUrl", "example.com".into());
        let sections = build_summary(&catalog, &answers);
        let labels: Vec<&str> = sections
            .iter()
            .flat_map(|s| s.items.iter().map(|i| i.label.as_str()))
            .collect();
        assert_eq!(labels, vec!["Existing website"]);
    }

    #[test]
    fn format_numbers_from_one() {
        let catalog = Catalog::standard();
        let mut answers = AnswerStore::new();
        answers.insert("name", "Ada".into());
        let text = format_summary(&build_summary(&catalog, &answers));
        assert!(text.contains("Contact\n"));
        assert!(text.contains(" 1. Name: Ada"));
    }
}
