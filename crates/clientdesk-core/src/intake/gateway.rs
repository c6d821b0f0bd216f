//! Delivery of the finished answer set to the studio backend.

use super::answers::AnswerStore;
use crate::error::{ClientdeskError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub answers: AnswerStore,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(answers: AnswerStore, submitted_at: DateTime<Utc>) -> Self {
        Self {
            answers,
            submitted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub body: serde_json::Value,
}

/// Anything that can accept a finished intake.
///
/// Failures must be reported as [`ClientdeskError::Submission`] so the flow
/// keeps its answers and offers a retry.
pub trait SubmissionGateway {
    fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt>;
}

// ---------------------------------------------------------------------------
// HttpGateway
// ---------------------------------------------------------------------------

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(15);

/// POSTs the submission as JSON. Any 2xx with a JSON body is success.
pub struct HttpGateway {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpGateway {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(SUBMIT_TIMEOUT)
            .build()
            .map_err(|e| ClientdeskError::Submission(format!("http client setup failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SubmissionGateway for HttpGateway {
    fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(submission)
            .send()
            .map_err(|e| {
                ClientdeskError::Submission(format!("could not reach {}: {e}", self.endpoint))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientdeskError::Submission(format!(
                "server responded with {status}"
            )));
        }

        let body: serde_json::Value = response.json().map_err(|_| {
            ClientdeskError::Submission("server returned a non-JSON response".to_string())
        })?;
        let id = body.get("id").and_then(serde_json::Value::as_i64);
        tracing::info!(endpoint = %self.endpoint, ?id, "intake submitted");
        Ok(SubmissionReceipt { id, body })
    }
}
