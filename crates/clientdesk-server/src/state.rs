use clientdesk_core::config::Config;
use clientdesk_core::db::Database;
use clientdesk_core::error::{ClientdeskError, Result};
use clientdesk_core::intake::{FileProgressStore, IntakeFlow, Transcript};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A live intake conversation hosted by the server.
pub type IntakeSession = IntakeFlow<FileProgressStore, Transcript>;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    /// Live engines keyed by session id. Handlers lock, drive one engine and
    /// unlock inside `spawn_blocking`.
    pub sessions: Arc<Mutex<HashMap<String, IntakeSession>>>,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The project config, or defaults when `clientdesk init` has not run.
    pub fn config(&self) -> Result<Config> {
        match Config::load(&self.root) {
            Ok(config) => Ok(config),
            Err(ClientdeskError::NotInitialized) => Ok(Config::new("Studio")),
            Err(e) => Err(e),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.config()?.database_path(&self.root))
    }

    /// Open the database with all migrations applied.
    pub fn open_db(&self) -> Result<Database> {
        Database::open_migrated(&self.database_path()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_stores_root() {
        let state = AppState::new(PathBuf::from("/tmp/test"));
        assert_eq!(state.root, PathBuf::from("/tmp/test"));
        assert!(state.sessions.lock().unwrap().is_empty());
    }

    #[test]
    fn uninitialized_root_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = AppState::new(dir.path().to_path_buf());
        let config = state.config().unwrap();
        assert_eq!(config.branding.company_name, "Studio");
        assert_eq!(
            state.database_path().unwrap(),
            dir.path().join(".clientdesk/clientdesk.db")
        );
    }

    #[test]
    fn open_db_migrates() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = AppState::new(dir.path().to_path_buf());
        let mut db = state.open_db().unwrap();
        let migrator = clientdesk_core::migrations::Migrator::new(&mut db);
        assert!(migrator.pending().unwrap().is_empty());
    }
}
