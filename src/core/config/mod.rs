//! Layered server configuration.
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML file
//! (`leadserver.toml` unless `--config` names another), then `LEADSERVER_*`
//! environment variables with `__` separating nested keys, e.g.
//! `LEADSERVER_CRM__DEFAULT_PAGE_SIZE=50`.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "leadserver.toml";
pub const ENV_PREFIX: &str = "LEADSERVER_";

pub type ConfigError = figment::Error;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub crm: CrmConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub pool_size: u32,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            pool_size: 10,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    /// Configured URL, falling back to `DATABASE_URL`.
    pub fn resolved_url(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .filter(|u| !u.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    /// Quiet period before an inline field edit is committed.
    pub field_edit_delay_ms: u64,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Daily reports with fewer leads than this are flagged.
    pub low_performance_threshold: usize,
    pub follow_up_window_days: i64,
    pub chart_days: u32,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            field_edit_delay_ms: 1000,
            default_page_size: 25,
            max_page_size: 100,
            low_performance_threshold: 5,
            follow_up_window_days: 7,
            chart_days: 30,
        }
    }
}

impl AppConfig {
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(path).extract()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.database.pool_size, 10);
        assert!(config.database.run_migrations);
        assert_eq!(config.crm.field_edit_delay_ms, 1000);
        assert_eq!(config.crm.default_page_size, 25);
        assert_eq!(config.crm.low_performance_threshold, 5);
        assert_eq!(config.crm.follow_up_window_days, 7);
    }

    #[test]
    fn test_toml_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
                [server]
                port = 9000

                [crm]
                default_page_size = 10
                max_page_size = 50
                "#,
            )?;
            jail.set_env("LEADSERVER_CRM__DEFAULT_PAGE_SIZE", "20");
            jail.set_env("LEADSERVER_DATABASE__URL", "postgres://localhost/leads");

            let config = AppConfig::load(Some(Path::new("custom.toml")))?;
            assert_eq!(config.server.port, 9000);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.crm.default_page_size, 20);
            assert_eq!(config.crm.max_page_size, 50);
            assert_eq!(
                config.database.url.as_deref(),
                Some("postgres://localhost/leads")
            );
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load(None)?;
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }
}
