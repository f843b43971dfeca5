//! Configuration file structure
//!
//! `divforms.json`, every field optional. Loading applies environment
//! overrides and then validates.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::{CliError, CliResult};
use crate::auth::JwtConfig;
use crate::forms::DEFAULT_PUBLISH_ATTEMPTS;
use crate::http_server::HttpServerConfig;
use crate::observability::LoggingConfig;
use crate::schema::SchemaLimits;

/// Environment variable that replaces `jwt.secret`
pub const JWT_SECRET_ENV: &str = "DIVFORMS_JWT_SECRET";

const REDACTED: &str = "<redacted>";

/// Token signing settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtSettings {
    /// HS256 signing secret (required, non-empty)
    #[serde(default)]
    pub secret: String,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_issuer")]
    pub audience: String,

    /// Access token lifetime (default: 12 hours)
    #[serde(default = "default_ttl_minutes")]
    pub access_token_ttl_minutes: i64,
}

fn default_issuer() -> String {
    "divforms".to_string()
}

fn default_ttl_minutes() -> i64 {
    12 * 60
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_issuer(),
            audience: default_issuer(),
            access_token_ttl_minutes: default_ttl_minutes(),
        }
    }
}

impl JwtSettings {
    pub fn to_jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.secret.clone(),
            access_token_ttl: chrono::Duration::minutes(self.access_token_ttl_minutes),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
        }
    }
}

/// Account created at startup when no superadmin exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapAdmin {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub jwt: JwtSettings,

    #[serde(default)]
    pub schema_limits: SchemaLimits,

    /// Compare-and-swap attempts per publish (default: 16)
    #[serde(default = "default_publish_attempts")]
    pub publish_max_attempts: u32,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub bootstrap_superadmin: Option<BootstrapAdmin>,
}

fn default_publish_attempts() -> u32 {
    DEFAULT_PUBLISH_ATTEMPTS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            jwt: JwtSettings::default(),
            schema_limits: SchemaLimits::default(),
            publish_max_attempts: default_publish_attempts(),
            logging: LoggingConfig::default(),
            bootstrap_superadmin: None,
        }
    }
}

impl Config {
    /// Defaults plus a freshly generated signing secret
    pub fn generated() -> Self {
        let mut config = Self::default();
        config.jwt.secret = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        config
    }

    /// Load configuration from file, apply environment overrides, validate
    pub fn load(path: &Path) -> CliResult<Self> {
        let mut config = Self::read(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without overrides or validation
    pub fn read(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secret) = lookup(JWT_SECRET_ENV).filter(|s| !s.is_empty()) {
            self.jwt.secret = secret;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        if self.jwt.secret.trim().is_empty() {
            return Err(CliError::config_error(format!(
                "jwt.secret must be set (or provide {})",
                JWT_SECRET_ENV
            )));
        }

        if self.jwt.access_token_ttl_minutes <= 0 {
            return Err(CliError::config_error("jwt.access_token_ttl_minutes must be > 0"));
        }

        if self.server.port == 0 {
            return Err(CliError::config_error("server.port must be > 0"));
        }

        if self.server.max_body_bytes == 0 {
            return Err(CliError::config_error("server.max_body_bytes must be > 0"));
        }

        if self.schema_limits.max_schema_bytes == 0 || self.schema_limits.max_schema_depth == 0 {
            return Err(CliError::config_error("schema_limits must be > 0"));
        }

        if self.publish_max_attempts == 0 {
            return Err(CliError::config_error("publish_max_attempts must be > 0"));
        }

        if let Some(admin) = &self.bootstrap_superadmin {
            if admin.email.trim().is_empty() || admin.password.is_empty() {
                return Err(CliError::config_error(
                    "bootstrap_superadmin needs an email and a password",
                ));
            }
        }

        Ok(())
    }

    /// JSON view with secrets replaced
    pub fn redacted(&self) -> CliResult<Value> {
        let mut value = serde_json::to_value(self)?;
        value["jwt"]["secret"] = Value::from(REDACTED);
        if let Some(admin) = value.get_mut("bootstrap_superadmin").filter(|v| v.is_object()) {
            admin["password"] = Value::from(REDACTED);
        }
        Ok(value)
    }
}
