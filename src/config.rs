//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/visitor-gate/config.toml`).
//! Every section and field has a default, so an empty file is valid.
//! `DATABASE_URL` and `JWT_SECRET` override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::application::{LifecycleSettings, OperatorCredential};
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::recognition::RecognitionConfig;
use crate::infrastructure::{DatabaseConfig, SmtpConfig};

pub const CONFIG_ENV: &str = "VISITOR_GATE_CONFIG";

const DEV_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// `~/.config/visitor-gate/config.toml`, or `./config.toml` when the home
/// directory cannot be resolved.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("visitor-gate").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub operators: Vec<OperatorConfig>,
    pub approval: ApprovalConfig,
    /// Absent: emails are written to the log only
    pub mail: Option<SmtpConfig>,
    /// Absent: plate recognition is disabled
    pub recognition: Option<RecognitionConfig>,
    pub uploads: UploadsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight work on shutdown
    pub shutdown_timeout: u64,
    /// Prefix for links in emails, e.g. `https://gate.example.com`
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            shutdown_timeout: 30,
            public_base_url: "http://localhost:5000".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// `sqlite://path?mode=rwc` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let defaults = DatabaseConfig::default();
        Self {
            url: defaults.url,
            max_connections: defaults.max_connections,
        }
    }
}

impl DatabaseSection {
    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiration_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl SecurityConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(self.jwt_secret.clone(), self.jwt_expiration_hours)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Super-admin account provisioned at startup.
#[derive(Clone, Deserialize)]
pub struct OperatorConfig {
    pub name: String,
    pub email: String,
    /// bcrypt hash, never the plain password
    pub password_hash: String,
}

impl std::fmt::Debug for OperatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorConfig")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl From<&OperatorConfig> for OperatorCredential {
    fn from(op: &OperatorConfig) -> Self {
        OperatorCredential {
            name: op.name.clone(),
            email: op.email.clone(),
            password_hash: op.password_hash.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    pub token_ttl_hours: i64,
    /// Seconds between expired-token sweeps
    pub sweep_interval_secs: u64,
    pub duplicate_window_minutes: i64,
    /// Upper bound on one email send
    pub notification_timeout_secs: u64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: 24,
            sweep_interval_secs: 3600,
            duplicate_window_minutes: 10,
            notification_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadsConfig {
    pub directory: PathBuf,
    /// Cap on one multipart submission
    pub max_bytes: usize,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("uploads"),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Read, parse, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = url;
        }
        if let Some(secret) = var("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.security.jwt_secret = secret;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("security.jwt_secret must not be empty".into()));
        }
        if self.security.jwt_expiration_hours <= 0 {
            return Err(ConfigError::Invalid("security.jwt_expiration_hours must be positive".into()));
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::Invalid("security.bcrypt_cost must be between 4 and 31".into()));
        }
        if self.approval.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("approval.token_ttl_hours must be positive".into()));
        }
        if self.approval.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid("approval.sweep_interval_secs must be positive".into()));
        }
        if !self.server.public_base_url.starts_with("http://") && !self.server.public_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid("server.public_base_url must be an http(s) URL".into()));
        }
        Ok(())
    }

    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        let defaults = LifecycleSettings::default();
        LifecycleSettings {
            token_ttl: chrono::Duration::hours(self.approval.token_ttl_hours),
            duplicate_window: chrono::Duration::minutes(self.approval.duplicate_window_minutes),
            notification_timeout: Duration::from_secs(self.approval.notification_timeout_secs),
            recognition_timeout: self
                .recognition
                .as_ref()
                .map(|r| Duration::from_secs(r.timeout_secs))
                .unwrap_or(defaults.recognition_timeout),
        }
    }

    pub fn operator_credentials(&self) -> Vec<OperatorCredential> {
        self.operators.iter().map(OperatorCredential::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [server]
        port = 8080
        public_base_url = "https://gate.example.com"

        [security]
        jwt_secret = "file-secret"
        bcrypt_cost = 10

        [[operators]]
        name = "Root"
        email = "root@example.com"
        password_hash = "$2b$12$abcdefghijklmnopqrstuuJz7U5rY0XlQ1k8vWc3tZz2h5bH4eG6a"

        [approval]
        duplicate_window_minutes = 5

        [mail]
        host = "smtp.example.com"
        from_email = "gate@example.com"

        [recognition]
        endpoint = "http://localhost:5001/detect-bike-number"
        timeout_secs = 3
    "#;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.approval.token_ttl_hours, 24);
        assert!(config.mail.is_none());
        assert!(config.recognition.is_none());
        assert!(config.security.uses_dev_secret());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sections_are_parsed() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.server.address(), "0.0.0.0:8080");
        assert_eq!(config.security.bcrypt_cost, 10);
        assert_eq!(config.operators.len(), 1);
        assert_eq!(config.operator_credentials()[0].email, "root@example.com");
        assert_eq!(config.mail.as_ref().unwrap().port, 587);

        let settings = config.lifecycle_settings();
        assert_eq!(settings.duplicate_window, chrono::Duration::minutes(5));
        assert_eq!(settings.recognition_timeout, Duration::from_secs(3));
    }

    #[test]
    fn environment_overrides_file() {
        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        config.apply_env_overrides(|key| match key {
            "DATABASE_URL" => Some("sqlite::memory:".to_string()),
            "JWT_SECRET" => Some("env-secret".to_string()),
            _ => None,
        });
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.security.jwt_secret, "env-secret");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config = AppConfig::from_toml("[security]\nbcrypt_cost = 2").unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml("[server]\npublic_base_url = \"gate.example.com\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("file-secret"));
        assert!(!debug.contains("$2b$12$"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
