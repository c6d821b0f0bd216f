//! Versioned schema migrations.
//!
//! Applied versions are recorded in `schema_migrations`. Each migration runs
//! in its own transaction together with its bookkeeping row, so a failure
//! leaves the database at the previous version.

use crate::db::Database;
use crate::error::{ClientdeskError, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_submissions",
        up: "CREATE TABLE submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                client_name TEXT,
                email TEXT,
                project_type TEXT,
                answers TEXT NOT NULL,
                submitted_at TEXT NOT NULL,
                received_at TEXT NOT NULL
            );
            CREATE INDEX idx_submissions_email ON submissions(email);",
        down: "DROP TABLE submissions;",
    },
    Migration {
        version: 2,
        name: "create_proposals",
        up: "CREATE TABLE proposals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                submission_id INTEGER REFERENCES submissions(id) ON DELETE SET NULL,
                client_email TEXT NOT NULL,
                project_type TEXT NOT NULL,
                tier TEXT NOT NULL,
                builder TEXT NOT NULL,
                total REAL NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX idx_proposals_client_email ON proposals(client_email);",
        down: "DROP TABLE proposals;",
    },
    Migration {
        version: 3,
        name: "create_notifications",
        up: "CREATE TABLE notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipient TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('intake', 'proposal', 'message')),
                title TEXT NOT NULL,
                body TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                read_at TEXT
            );
            CREATE INDEX idx_notifications_recipient ON notifications(recipient, read_at);",
        down: "DROP TABLE notifications;",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationStatus {
    pub version: u32,
    pub name: String,
    pub applied_at: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

pub struct Migrator<'a> {
    db: &'a mut Database,
    migrations: &'a [Migration],
}

impl<'a> Migrator<'a> {
    pub fn new(db: &'a mut Database) -> Self {
        Self::with_migrations(db, MIGRATIONS)
    }

    /// `migrations` must be sorted by ascending version.
    pub fn with_migrations(db: &'a mut Database, migrations: &'a [Migration]) -> Self {
        Self { db, migrations }
    }

    fn ensure_table(&self) -> Result<()> {
        self.db.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn applied(&self) -> Result<Vec<(u32, DateTime<Utc>)>> {
        self.ensure_table()?;
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT version, applied_at FROM schema_migrations ORDER BY version")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, u32>(0)?, row.get::<_, DateTime<Utc>>(1)?))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Highest applied version, 0 for a fresh database.
    pub fn current_version(&self) -> Result<u32> {
        Ok(self.applied()?.last().map(|(v, _)| *v).unwrap_or(0))
    }

    pub fn status(&self) -> Result<Vec<MigrationStatus>> {
        let applied = self.applied()?;
        Ok(self
            .migrations
            .iter()
            .map(|m| MigrationStatus {
                version: m.version,
                name: m.name.to_string(),
                applied_at: applied
                    .iter()
                    .find(|(v, _)| *v == m.version)
                    .map(|(_, at)| *at),
            })
            .collect())
    }

    pub fn pending(&self) -> Result<Vec<Migration>> {
        let applied = self.applied()?;
        Ok(self
            .migrations
            .iter()
            .filter(|m| !applied.iter().any(|(v, _)| *v == m.version))
            .copied()
            .collect())
    }

    /// Apply every pending migration in order. Returns the versions applied.
    pub fn migrate_up(&mut self) -> Result<Vec<u32>> {
        let known = self.migrations.last().map(|m| m.version).unwrap_or(0);
        let current = self.current_version()?;
        if current > known {
            return Err(ClientdeskError::Migration(format!(
                "database is at schema version {current}, newer than this build ({known})"
            )));
        }

        let mut done = Vec::new();
        for migration in self.pending()? {
            let tx = self.db.conn_mut().transaction()?;
            tx.execute_batch(migration.up).map_err(|e| {
                ClientdeskError::Migration(format!(
                    "{} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            tx.execute(
                "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, Utc::now()],
            )?;
            tx.commit()?;
            tracing::info!(version = migration.version, name = migration.name, "migration applied");
            done.push(migration.version);
        }
        Ok(done)
    }

    /// Undo the newest `steps` applied migrations. Returns the versions rolled back.
    pub fn rollback(&mut self, steps: usize) -> Result<Vec<u32>> {
        let migrations = self.migrations;
        let applied = self.applied()?;
        let mut done = Vec::new();
        for (version, _) in applied.iter().rev().take(steps) {
            let migration = migrations
                .iter()
                .find(|m| m.version == *version)
                .ok_or_else(|| {
                    ClientdeskError::Migration(format!(
                        "no down migration known for version {version}"
                    ))
                })?;
            let tx = self.db.conn_mut().transaction()?;
            tx.execute_batch(migration.down).map_err(|e| {
                ClientdeskError::Migration(format!(
                    "rollback of {} ({}) failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            tx.execute(
                "DELETE FROM schema_migrations WHERE version = ?1",
                params![migration.version],
            )?;
            tx.commit()?;
            tracing::info!(version = migration.version, name = migration.name, "migration rolled back");
            done.push(migration.version);
        }
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(db: &Database, name: &str) -> bool {
        db.conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .unwrap()
            == 1
    }

    #[test]
    fn versions_are_ascending() {
        for pair in MIGRATIONS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }

    #[test]
    fn fresh_database_has_everything_pending() {
        let mut db = Database::open_in_memory().unwrap();
        let migrator = Migrator::new(&mut db);
        assert_eq!(migrator.current_version().unwrap(), 0);
        assert_eq!(migrator.pending().unwrap().len(), MIGRATIONS.len());
        assert!(migrator.status().unwrap().iter().all(|s| !s.is_applied()));
    }

    #[test]
    fn migrate_up_is_idempotent() {
        let mut db = Database::open_in_memory().unwrap();
        let applied = Migrator::new(&mut db).migrate_up().unwrap();
        assert_eq!(applied, vec![1, 2, 3]);
        assert!(Migrator::new(&mut db).migrate_up().unwrap().is_empty());
        for table in ["submissions", "proposals", "notifications"] {
            assert!(table_exists(&db, table), "{table}");
        }
        let status = Migrator::new(&mut db).status().unwrap();
        assert!(status.iter().all(MigrationStatus::is_applied));
    }

    #[test]
    fn rollback_steps() {
        let mut db = Database::open_in_memory().unwrap();
        Migrator::new(&mut db).migrate_up().unwrap();

        let rolled = Migrator::new(&mut db).rollback(2).unwrap();
        assert_eq!(rolled, vec![3, 2]);
        assert!(!table_exists(&db, "notifications"));
        assert!(!table_exists(&db, "proposals"));
        assert!(table_exists(&db, "submissions"));
        assert_eq!(Migrator::new(&mut db).current_version().unwrap(), 1);

        // More steps than applied migrations just empties the schema.
        assert_eq!(Migrator::new(&mut db).rollback(10).unwrap(), vec![1]);
        assert_eq!(Migrator::new(&mut db).pending().unwrap().len(), 3);
    }

    #[test]
    fn failed_migration_leaves_previous_version() {
        const BROKEN: &[Migration] = &[
            Migration {
                version: 1,
                name: "ok",
                up: "CREATE TABLE a (id INTEGER);",
                down: "DROP TABLE a;",
            },
            Migration {
                version: 2,
                name: "broken",
                up: "CREATE TABLE b (id INTEGER); CREATE TABLE a (id INTEGER);",
                down: "DROP TABLE b;",
            },
        ];
        let mut db = Database::open_in_memory().unwrap();
        let err = Migrator::with_migrations(&mut db, BROKEN)
            .migrate_up()
            .unwrap_err();
        assert!(matches!(err, ClientdeskError::Migration(_)));
        assert_eq!(
            Migrator::with_migrations(&mut db, BROKEN)
                .current_version()
                .unwrap(),
            1
        );
        assert!(!table_exists(&db, "b"));
    }

    #[test]
    fn newer_database_is_refused() {
        let mut db = Database::open_in_memory().unwrap();
        Migrator::new(&mut db).migrate_up().unwrap();
        let older = &MIGRATIONS[..1];
        assert!(matches!(
            Migrator::with_migrations(&mut db, older).migrate_up(),
            Err(ClientdeskError::Migration(_))
        ));
    }
}
