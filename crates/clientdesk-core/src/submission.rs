//! Stored intake submissions and the database-backed gateway.

use crate::db::{Database, Page, PageRequest};
use crate::error::{ClientdeskError, Result};
use crate::intake::answers::AnswerStore;
use crate::intake::catalog::{EMAIL_FIELD, NAME_FIELD, PROJECT_TYPE_FIELD};
use crate::intake::gateway::{Submission, SubmissionGateway, SubmissionReceipt};
use crate::notification::{self, NewNotification, NotificationKind, STUDIO_INBOX};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub client_name: Option<String>,
    pub email: Option<String>,
    pub project_type: Option<String>,
    pub answers: AnswerStore,
    pub submitted_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, client_name, email, project_type, answers, submitted_at, received_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<SubmissionRecord> {
    let answers: String = row.get(4)?;
    Ok(SubmissionRecord {
        id: row.get(0)?,
        client_name: row.get(1)?,
        email: row.get(2)?,
        project_type: row.get(3)?,
        answers: serde_json::from_str(&answers).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        submitted_at: row.get(5)?,
        received_at: row.get(6)?,
    })
}

fn notification_for(record: &SubmissionRecord) -> NewNotification {
    let who = record
        .client_name
        .clone()
        .or_else(|| record.email.clone())
        .unwrap_or_else(|| "someone".to_string());
    let project = record.project_type.as_deref().unwrap_or("unspecified");
    NewNotification::new(
        STUDIO_INBOX,
        NotificationKind::Intake,
        format!("New intake from {who}"),
        format!("Project type: {project}"),
    )
}

/// Store a submission and post an `intake` notification to the studio
/// inbox, both in one transaction.
pub fn record(db: &mut Database, submission: &Submission) -> Result<SubmissionRecord> {
    if submission.answers.is_empty() {
        return Err(ClientdeskError::validation(
            "answers",
            "submission has no answers",
        ));
    }
    let answers = &submission.answers;
    let tx = db.conn_mut().transaction()?;
    tx.execute(
        "INSERT INTO submissions (client_name, email, project_type, answers, submitted_at, received_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            answers.text(NAME_FIELD),
            answers.text(EMAIL_FIELD),
            answers.text(PROJECT_TYPE_FIELD),
            serde_json::to_string(answers)?,
            submission.submitted_at,
            Utc::now(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    let stored = get(&tx, id)?;
    notification::create(&tx, &notification_for(&stored))?;
    tx.commit()?;
    tracing::info!(id, email = ?stored.email, "submission stored");
    Ok(stored)
}

pub fn get(conn: &Connection, id: i64) -> Result<SubmissionRecord> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM submissions WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or(ClientdeskError::SubmissionNotFound(id))
}

/// Newest first.
pub fn list(conn: &Connection, request: PageRequest) -> Result<Page<SubmissionRecord>> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM submissions", [], |row| row.get(0))?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM submissions ORDER BY received_at DESC, id DESC LIMIT ?1 OFFSET ?2"
    ))?;
    let items = stmt
        .query_map(params![request.limit(), request.offset()], from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Page::new(items, request, total.max(0) as u64))
}

// ---------------------------------------------------------------------------
// DbGateway
// ---------------------------------------------------------------------------

/// Writes submissions straight into the local database. Used by sessions
/// hosted in the server, which would otherwise POST to themselves.
#[derive(Debug, Clone)]
pub struct DbGateway {
    path: PathBuf,
}

impl DbGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SubmissionGateway for DbGateway {
    fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt> {
        let stored = Database::open_migrated(&self.path)
            .and_then(|mut db| record(&mut db, submission))
            .map_err(|e| ClientdeskError::Submission(e.to_string()))?;
        Ok(SubmissionReceipt {
            id: Some(stored.id),
            body: serde_json::json!({ "id": stored.id, "status": "received" }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::Migrator;

    fn db() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        Migrator::new(&mut db).migrate_up().unwrap();
        db
    }

    fn submission(name: &str) -> Submission {
        let mut answers = AnswerStore::new();
        answers.insert("name", name.into());
        answers.insert("email", format!("{}@example.com", name.to_lowercase()).into());
        answers.insert("projectType", "business".into());
        answers.insert(
            "features",
            vec!["contact-form".to_string(), "booking".to_string()].into(),
        );
        Submission::new(answers, Utc::now())
    }

    #[test]
    fn record_stores_and_notifies() {
        let mut db = db();
        let stored = record(&mut db, &submission("Ada")).unwrap();
        assert_eq!(stored.client_name.as_deref(), Some("Ada"));
        assert_eq!(stored.email.as_deref(), Some("ada@example.com"));
        assert_eq!(stored.project_type.as_deref(), Some("business"));
        assert_eq!(
            stored.answers.get("features").unwrap().values(),
            vec!["contact-form", "booking"]
        );

        let inbox =
            notification::list(db.conn(), STUDIO_INBOX, true, PageRequest::default()).unwrap();
        assert_eq!(inbox.total, 1);
        assert_eq!(inbox.items[0].kind, NotificationKind::Intake);
        assert_eq!(inbox.items[0].title, "New intake from Ada");
    }

    #[test]
    fn empty_submission_rejected() {
        let mut db = db();
        let empty = Submission::new(AnswerStore::new(), Utc::now());
        assert!(matches!(
            record(&mut db, &empty),
            Err(ClientdeskError::Validation { .. })
        ));
        assert_eq!(list(db.conn(), PageRequest::default()).unwrap().total, 0);
    }

    #[test]
    fn list_newest_first() {
        let mut db = db();
        record(&mut db, &submission("Ada")).unwrap();
        record(&mut db, &submission("Grace")).unwrap();
        let page = list(db.conn(), PageRequest::default()).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].client_name.as_deref(), Some("Grace"));
    }

    #[test]
    fn db_gateway_writes_file_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(".clientdesk/clientdesk.db");
        let gateway = DbGateway::new(&path);
        let receipt = gateway.submit(&submission("Ada")).unwrap();
        assert_eq!(receipt.id, Some(1));
        assert_eq!(receipt.body["status"], "received");

        let db = Database::open(&path).unwrap();
        assert_eq!(get(db.conn(), 1).unwrap().client_name.as_deref(), Some("Ada"));
    }
}
