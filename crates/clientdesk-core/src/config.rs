use crate::error::{ClientdeskError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BrandingConfig
// ---------------------------------------------------------------------------

/// Display strings shown by the intake conversation and the portal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandingConfig {
    pub company_name: String,
    #[serde(default = "default_prompt_prefix")]
    pub prompt_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_email: Option<String>,
}

fn default_prompt_prefix() -> String {
    "$".to_string()
}

impl BrandingConfig {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            prompt_prefix: default_prompt_prefix(),
            tagline: None,
            support_email: None,
        }
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self::new("Studio")
    }
}

// ---------------------------------------------------------------------------
// IntakeConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    #[serde(default = "default_submit_url")]
    pub submit_url: String,
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u32,
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,
}

fn default_submit_url() -> String {
    format!("http://localhost:{}/api/submissions", default_port())
}

fn default_retention_hours() -> u32 {
    24
}

fn default_typing_delay_ms() -> u64 {
    250
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            submit_url: default_submit_url(),
            retention_hours: default_retention_hours(),
            typing_delay_ms: default_typing_delay_ms(),
        }
    }
}

impl IntakeConfig {
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.retention_hours))
    }
}

// ---------------------------------------------------------------------------
// DatabaseConfig / ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DATABASE_FILE)
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub branding: BrandingConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            branding: BrandingConfig::new(company_name),
            intake: IntakeConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ClientdeskError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Absolute database location; relative paths are resolved against `root`.
    pub fn database_path(&self, root: &Path) -> PathBuf {
        if self.database.path.is_absolute() {
            self.database.path.clone()
        } else {
            root.join(&self.database.path)
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.branding.company_name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "branding.company_name is empty".to_string(),
            });
        }

        if let Some(email) = &self.branding.support_email {
            if crate::intake::catalog::Validator::Email.check(email).is_some() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("branding.support_email '{email}' does not look like an email"),
                });
            }
        }

        if self.intake.retention_hours == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "intake.retention_hours is 0: saved progress will never resume"
                    .to_string(),
            });
        }

        let url = self.intake.submit_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("intake.submit_url '{url}' is not an http(s) URL"),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
