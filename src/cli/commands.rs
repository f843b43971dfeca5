//! CLI command implementations
//!
//! `serve` boot sequence:
//! 1. Configuration load (file, environment overrides, validation)
//! 2. Logging initialisation
//! 3. Store and service wiring
//! 4. Superadmin bootstrap
//! 5. HTTP activation

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use super::args::Command;
use super::config::{BootstrapAdmin, Config};
use super::errors::{CliError, CliResult};
use super::io::write_response;
use crate::auth::crypto::PasswordPolicy;
use crate::auth::{Role, User, UserRepository};
use crate::http_server::{AppState, HttpServer, StateOptions};
use crate::observability::init_logging;
use crate::schema::InMemoryValidatorCache;
use crate::store::Repositories;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config } => serve(&config),
        Command::CheckConfig { config } => check_config(&config),
    }
}

/// Write a default configuration file with a generated signing secret.
///
/// Refuses to overwrite an existing file.
pub fn init(config_path: &Path) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::already_initialized(config_path));
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let config = Config::generated();
    fs::write(config_path, serde_json::to_string_pretty(&config)?)?;

    write_response(json!({
        "initialized": true,
        "config": config_path.display().to_string(),
    }))
}

/// Validate a configuration file and print it with secrets redacted
pub fn check_config(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    write_response(config.redacted()?)
}

/// Create the configured superadmin unless one already exists.
///
/// Returns whether an account was created.
pub async fn bootstrap_superadmin(
    users: &dyn UserRepository,
    admin: &BootstrapAdmin,
) -> CliResult<bool> {
    let existing = users
        .count_by_role(Role::Superadmin)
        .await
        .map_err(|e| CliError::boot_failed(e.to_string()))?;
    if existing > 0 {
        return Ok(false);
    }

    let user = User::new(
        &admin.full_name,
        &admin.email,
        &admin.password,
        Role::Superadmin,
        &PasswordPolicy::default(),
    )
    .map_err(|e| CliError::boot_failed(format!("bootstrap superadmin: {}", e)))?;

    users
        .create(&user)
        .await
        .map_err(|e| CliError::boot_failed(format!("bootstrap superadmin: {}", e)))?;

    info!(user = %user.id, email = %user.email, "bootstrap superadmin created");
    Ok(true)
}

/// Load config, wire services and serve HTTP until stopped
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    init_logging(&config.logging);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let repos = Repositories::in_memory();

        match &config.bootstrap_superadmin {
            Some(admin) => {
                bootstrap_superadmin(repos.users.as_ref(), admin).await?;
            }
            None => warn!("no bootstrap_superadmin configured; administrative routes are unreachable"),
        }

        let state = AppState::new(
            repos,
            StateOptions {
                jwt: config.jwt.to_jwt_config(),
                schema_limits: config.schema_limits,
                publish_max_attempts: config.publish_max_attempts,
                cache: Arc::new(InMemoryValidatorCache::new()),
            },
        );

        info!(
            addr = %config.server.socket_addr(),
            log_format = %config.logging.format,
            "starting divforms"
        );

        HttpServer::new(config.server.clone(), Arc::new(state))
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

#[cfg(test)]
mod tests {
    use super::super::errors::CliErrorCode;
    use super::*;
    use crate::auth::user::InMemoryUserRepository;
    use tempfile::TempDir;

    fn admin() -> BootstrapAdmin {
        BootstrapAdmin {
            full_name: "Root".into(),
            email: "root@example.com".into(),
            password: "rootpass".into(),
        }
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("conf").join("divforms.json");

        init(&path).unwrap();

        let config = Config::read(&path).unwrap();
        config.validate().unwrap();
        assert!(!config.jwt.secret.is_empty());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("divforms.json");

        init(&path).unwrap();
        let err = init(&path).unwrap_err();

        assert_eq!(err.code(), &CliErrorCode::AlreadyInitialized);
    }

    #[test]
    fn test_check_config_rejects_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = check_config(&temp.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[tokio::test]
    async fn test_bootstrap_creates_once() {
        let users = InMemoryUserRepository::new();

        assert!(bootstrap_superadmin(&users, &admin()).await.unwrap());
        assert!(!bootstrap_superadmin(&users, &admin()).await.unwrap());
        assert_eq!(users.count_by_role(Role::Superadmin).await.unwrap(), 1);
    }
}
