use crate::error::{ClientdeskError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CLIENTDESK_DIR: &str = ".clientdesk";
pub const INTAKE_DIR: &str = ".clientdesk/intake";

pub const CONFIG_FILE: &str = ".clientdesk/config.yaml";
pub const DEFAULT_DATABASE_FILE: &str = ".clientdesk/clientdesk.db";

/// Snapshot key used by the terminal intake when none is given.
pub const DEFAULT_PROGRESS_KEY: &str = "terminal";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn clientdesk_dir(root: &Path) -> PathBuf {
    root.join(CLIENTDESK_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn intake_dir(root: &Path) -> PathBuf {
    root.join(INTAKE_DIR)
}

/// Location of the saved progress snapshot for one client key.
pub fn progress_path(root: &Path, key: &str) -> PathBuf {
    intake_dir(root).join(format!("{key}.json"))
}

// ---------------------------------------------------------------------------
// Key validation
// ---------------------------------------------------------------------------

static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn key_re() -> &'static Regex {
    KEY_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-]*$").unwrap())
}

/// Progress keys become file names, so only a conservative alphabet is allowed.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > 64 || !key_re().is_match(key) {
        return Err(ClientdeskError::InvalidKey(key.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
