//! Conditional visibility of catalog questions.

use super::answers::AnswerStore;
use serde::{Deserialize, Serialize};

/// A dependency on an earlier answer.
///
/// Both variants are evaluated the same way: the stored answer (scalar or
/// list) and the required value(s) are treated as sets, and the condition
/// holds when they intersect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Equals { field: String, value: String },
    IncludesAny { field: String, values: Vec<String> },
}

impl Condition {
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn includes_any(field: impl Into<String>, values: &[&str]) -> Self {
        Condition::IncludesAny {
            field: field.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Condition::Equals { field, .. } | Condition::IncludesAny { field, .. } => field,
        }
    }

    fn required(&self) -> Vec<&str> {
        match self {
            Condition::Equals { value, .. } => vec![value.as_str()],
            Condition::IncludesAny { values, .. } => values.iter().map(String::as_str).collect(),
        }
    }

    /// A missing answer never satisfies a condition.
    pub fn is_met(&self, answers: &AnswerStore) -> bool {
        let Some(stored) = answers.get(self.field()) else {
            return false;
        };
        let required = self.required();
        stored.values().iter().any(|v| required.contains(v))
    }
}
