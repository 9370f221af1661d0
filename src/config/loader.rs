//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{FolioConfig, PostgreSQLConfig};
use super::secret_string;
use crate::domain::errors::FolioError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into FolioConfig
/// 4. Applies environment variable overrides (FOLIO_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use folio::config::loader::load_config;
///
/// let config = load_config("folio.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<FolioConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(FolioError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        FolioError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: FolioConfig = toml::from_str(&contents)
        .map_err(|e| FolioError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        FolioError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| FolioError::Other(format!("invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(FolioError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        FolioError::Configuration(format!("Invalid value '{value}' for environment variable {name}"))
    })
}

fn env_override<T: std::str::FromStr>(name: &str, target: &mut T) -> Result<()> {
    if let Ok(val) = std::env::var(name) {
        *target = parse_override(name, &val)?;
    }
    Ok(())
}

/// Applies environment variable overrides using FOLIO_* prefix
///
/// Environment variables follow the pattern: FOLIO_<SECTION>_<KEY>
/// For example: FOLIO_TRANSFORM_BATCH_SIZE, FOLIO_POSTGRESQL_CONNECTION_STRING
///
/// A `FOLIO_POSTGRESQL_CONNECTION_STRING` without a `[postgresql]` section
/// creates the section with default pool settings.
fn apply_env_overrides(config: &mut FolioConfig) -> Result<()> {
    // Application overrides
    env_override("FOLIO_APPLICATION_LOG_LEVEL", &mut config.application.log_level)?;

    // Source overrides
    env_override("FOLIO_SOURCE_DIRECTORY", &mut config.source.directory)?;

    // Transform overrides
    env_override(
        "FOLIO_TRANSFORM_MAX_PARALLEL_DB_QUERIES",
        &mut config.transform.max_parallel_db_queries,
    )?;
    env_override("FOLIO_TRANSFORM_BATCH_SIZE", &mut config.transform.batch_size)?;
    env_override("FOLIO_TRANSFORM_PRIVACY", &mut config.transform.privacy)?;

    // PostgreSQL overrides
    if let Ok(val) = std::env::var("FOLIO_POSTGRESQL_CONNECTION_STRING") {
        match config.postgresql {
            Some(ref mut postgresql) => postgresql.connection_string = secret_string(val),
            None => {
                config.postgresql = Some(PostgreSQLConfig {
                    connection_string: secret_string(val),
                    max_connections: 10,
                    connection_timeout_seconds: 30,
                    statement_timeout_seconds: 600,
                })
            }
        }
    }
    if let Some(ref mut postgresql) = config.postgresql {
        env_override(
            "FOLIO_POSTGRESQL_MAX_CONNECTIONS",
            &mut postgresql.max_connections,
        )?;
        env_override(
            "FOLIO_POSTGRESQL_CONNECTION_TIMEOUT_SECONDS",
            &mut postgresql.connection_timeout_seconds,
        )?;
        env_override(
            "FOLIO_POSTGRESQL_STATEMENT_TIMEOUT_SECONDS",
            &mut postgresql.statement_timeout_seconds,
        )?;
    }

    // Logging overrides
    env_override("FOLIO_LOGGING_LOCAL_ENABLED", &mut config.logging.local_enabled)?;
    env_override("FOLIO_LOGGING_LOCAL_PATH", &mut config.logging.local_path)?;
    env_override("FOLIO_LOGGING_LOCAL_ROTATION", &mut config.logging.local_rotation)?;

    Ok(())
}
