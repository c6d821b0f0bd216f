//! Portal notification feed.

use crate::db::{Page, PageRequest};
use crate::error::{ClientdeskError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Recipient for notifications addressed to the studio itself.
pub const STUDIO_INBOX: &str = "studio";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Intake,
    Proposal,
    Message,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Intake => "intake",
            NotificationKind::Proposal => "proposal",
            NotificationKind::Message => "message",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = ClientdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "intake" => Ok(NotificationKind::Intake),
            "proposal" => Ok(NotificationKind::Proposal),
            "message" => Ok(NotificationKind::Message),
            other => Err(ClientdeskError::validation(
                "kind",
                format!("unknown notification kind '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub recipient: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub recipient: String,
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl NewNotification {
    pub fn new(
        recipient: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            kind,
            title: title.into(),
            body: body.into(),
        }
    }
}

const COLUMNS: &str = "id, recipient, kind, title, body, created_at, read_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let kind: String = row.get(2)?;
    Ok(Notification {
        id: row.get(0)?,
        recipient: row.get(1)?,
        kind: kind.parse().map_err(|e: ClientdeskError| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        title: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
        read_at: row.get(6)?,
    })
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

pub fn create(conn: &Connection, new: &NewNotification) -> Result<Notification> {
    if new.recipient.trim().is_empty() {
        return Err(ClientdeskError::validation(
            "recipient",
            "recipient is required",
        ));
    }
    if new.title.trim().is_empty() {
        return Err(ClientdeskError::validation("title", "title is required"));
    }
    let now = Utc::now();
    conn.execute(
        "INSERT INTO notifications (recipient, kind, title, body, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new.recipient, new.kind.as_str(), new.title, new.body, now],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(id, recipient = %new.recipient, kind = %new.kind, "notification created");
    get(conn, id)
}

pub fn get(conn: &Connection, id: i64) -> Result<Notification> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM notifications WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or(ClientdeskError::NotificationNotFound(id))
}

/// Newest first.
pub fn list(
    conn: &Connection,
    recipient: &str,
    unread_only: bool,
    request: PageRequest,
) -> Result<Page<Notification>> {
    let filter = if unread_only {
        "recipient = ?1 AND read_at IS NULL"
    } else {
        "recipient = ?1"
    };
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM notifications WHERE {filter}"),
        params![recipient],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM notifications WHERE {filter}
         ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let items = stmt
        .query_map(
            params![recipient, request.limit(), request.offset()],
            from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Page::new(items, request, total.max(0) as u64))
}

pub fn unread_count(conn: &Connection, recipient: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM notifications WHERE recipient = ?1 AND read_at IS NULL",
        params![recipient],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

/// Marking an already-read notification keeps its original `read_at`.
pub fn mark_read(conn: &Connection, id: i64) -> Result<Notification> {
    let changed = conn.execute(
        "UPDATE notifications SET read_at = COALESCE(read_at, ?1) WHERE id = ?2",
        params![Utc::now(), id],
    )?;
    if changed == 0 {
        return Err(ClientdeskError::NotificationNotFound(id));
    }
    get(conn, id)
}

/// Returns how many notifications were newly marked.
pub fn mark_all_read(conn: &Connection, recipient: &str) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE notifications SET read_at = ?1 WHERE recipient = ?2 AND read_at IS NULL",
        params![Utc::now(), recipient],
    )?;
    Ok(changed)
}
