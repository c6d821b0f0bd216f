use super::pricing::{format_currency, PriceBreakdown, ProposalBuilder};
use super::tiers::TierLevel;
use crate::db::{Database, Page, PageRequest};
use crate::error::{ClientdeskError, Result};
use crate::intake::catalog::Validator;
use crate::notification::{self, NewNotification, NotificationKind};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub id: i64,
    pub submission_id: Option<i64>,
    pub client_email: String,
    pub project_type: String,
    pub tier: TierLevel,
    pub builder: ProposalBuilder,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

impl ProposalRecord {
    /// Recompute the breakdown from the stored selection.
    pub fn breakdown(&self) -> Result<PriceBreakdown> {
        self.builder.calculate()
    }
}

const COLUMNS: &str =
    "id, submission_id, client_email, project_type, tier, builder, total, created_at";

fn conversion_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<ProposalRecord> {
    let tier: String = row.get(4)?;
    let builder: String = row.get(5)?;
    Ok(ProposalRecord {
        id: row.get(0)?,
        submission_id: row.get(1)?,
        client_email: row.get(2)?,
        project_type: row.get(3)?,
        tier: tier.parse().map_err(|e| conversion_error(4, e))?,
        builder: serde_json::from_str(&builder).map_err(|e| conversion_error(5, e))?,
        total: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Price and store a proposal, then notify the client that it is ready.
pub fn save(
    db: &mut Database,
    client_email: &str,
    submission_id: Option<i64>,
    builder: &ProposalBuilder,
) -> Result<ProposalRecord> {
    if let Some(message) = Validator::Email.check(client_email) {
        return Err(ClientdeskError::validation("client_email", message));
    }
    let breakdown = builder.calculate()?;

    let tx = db.conn_mut().transaction()?;
    tx.execute(
        "INSERT INTO proposals (submission_id, client_email, project_type, tier, builder, total, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            submission_id,
            client_email,
            builder.project_type,
            breakdown.tier.as_str(),
            serde_json::to_string(builder)?,
            breakdown.total,
            Utc::now(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    notification::create(
        &tx,
        &NewNotification::new(
            client_email,
            NotificationKind::Proposal,
            "Your proposal is ready",
            format!(
                "{} tier for your {} project: {}",
                breakdown.tier,
                builder.project_type,
                format_currency(breakdown.total)
            ),
        ),
    )?;
    let stored = get(&tx, id)?;
    tx.commit()?;
    tracing::info!(id, client = client_email, total = breakdown.total, "proposal saved");
    Ok(stored)
}

pub fn get(conn: &Connection, id: i64) -> Result<ProposalRecord> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM proposals WHERE id = ?1"),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or(ClientdeskError::ProposalNotFound(id))
}

/// Newest first, optionally for one client.
pub fn list(
    conn: &Connection,
    client_email: Option<&str>,
    request: PageRequest,
) -> Result<Page<ProposalRecord>> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM proposals WHERE ?1 IS NULL OR client_email = ?1",
        params![client_email],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM proposals WHERE ?1 IS NULL OR client_email = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let items = stmt
        .query_map(
            params![client_email, request.limit(), request.offset()],
            from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Page::new(items, request, total.max(0) as u64))
}
