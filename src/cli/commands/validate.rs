//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Folio configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates after substitution and overrides
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Source Directory: {}", config.source.directory);
        println!(
            "  Max Parallel DB Queries: {}",
            config.transform.max_parallel_db_queries
        );
        println!("  Batch Size: {}", config.transform.batch_size);
        println!("  Privacy: {}", config.transform.privacy);
        match &config.postgresql {
            Some(pg_config) => {
                println!("  PostgreSQL Connection: {}", pg_config.connection_string_safe());
                println!("  Max Connections: {}", pg_config.max_connections);
            }
            None => println!("  PostgreSQL: not configured (step one only)"),
        }
        if config.logging.local_enabled {
            println!(
                "  Log Files: {} ({})",
                config.logging.local_path, config.logging.local_rotation
            );
        }
        println!();
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_valid_config_exits_zero() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, "[transform]\nbatch_size = 100\n").unwrap();

        let code = ValidateArgs {}
            .execute(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_invalid_config_exits_two() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, "[transform]\nbatch_size = 0\n").unwrap();

        let code = ValidateArgs {}
            .execute(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
