//! Server settings, read from the command line and the environment.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::filtering::PageLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppEnv {
    Production,
    Development,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DbEngine {
    Sqlite,
    Postgres,
    Mysql,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required when APP_ENV=production")]
    Missing(&'static str),
    #[error("DEFAULT_PER_PAGE ({default}) must be between 1 and MAX_PER_PAGE ({max})")]
    PageLimits { default: u64, max: u64 },
}

#[derive(Debug, Clone, Parser)]
#[command(name = "eosc-perf", about = "Benchmark result catalog API")]
pub struct Settings {
    #[arg(long, env = "APP_ENV", value_enum, default_value = "production")]
    pub app_env: AppEnv,

    /// Full connection string; takes precedence over the `DB_*` parts
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "DB_ENGINE", value_enum)]
    pub db_engine: Option<DbEngine>,

    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    #[arg(long, env = "DB_HOST")]
    pub db_host: Option<String>,

    #[arg(long, env = "DB_PORT")]
    pub db_port: Option<u16>,

    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:5000")]
    pub bind_address: String,

    #[arg(long, env = "DEFAULT_PER_PAGE", default_value_t = 20)]
    pub default_per_page: u64,

    #[arg(long, env = "MAX_PER_PAGE", default_value_t = 100)]
    pub max_per_page: u64,

    /// Seconds a listing may take before it is abandoned; 0 disables the limit
    #[arg(long, env = "QUERY_TIMEOUT_SECS", default_value_t = 30)]
    pub query_timeout_secs: u64,

    #[arg(long, env = "RUN_MIGRATIONS", default_value_t = false)]
    pub run_migrations: bool,
}

impl Settings {
    /// Connection string for the configured store.
    ///
    /// In development every missing part falls back to a local SQLite file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] in production when neither `DATABASE_URL`
    /// nor a complete set of `DB_*` parts is given.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.database_url {
            return Ok(url.clone());
        }

        let engine = match (self.db_engine, self.app_env) {
            (Some(engine), _) => engine,
            (None, AppEnv::Development) => DbEngine::Sqlite,
            (None, AppEnv::Production) => return Err(ConfigError::Missing("DB_ENGINE")),
        };

        if engine == DbEngine::Sqlite {
            let name = self.part(&self.db_name, "DB_NAME", "eosc-perf.db")?;
            return Ok(format!("sqlite://{name}?mode=rwc"));
        }

        let (scheme, port) = match engine {
            DbEngine::Postgres => ("postgres", 5432),
            _ => ("mysql", 3306),
        };
        let user = self.part(&self.db_user, "DB_USER", "eosc")?;
        let password = self.part(&self.db_password, "DB_PASSWORD", "eosc")?;
        let host = self.part(&self.db_host, "DB_HOST", "localhost")?;
        let port = match (self.db_port, self.app_env) {
            (Some(port), _) => port,
            (None, AppEnv::Development) => port,
            (None, AppEnv::Production) => return Err(ConfigError::Missing("DB_PORT")),
        };
        let name = self.part(&self.db_name, "DB_NAME", "eosc-perf")?;
        Ok(format!("{scheme}://{user}:{password}@{host}:{port}/{name}"))
    }

    fn part(
        &self,
        value: &Option<String>,
        name: &'static str,
        fallback: &str,
    ) -> Result<String, ConfigError> {
        match (value, self.app_env) {
            (Some(value), _) => Ok(value.clone()),
            (None, AppEnv::Development) => Ok(fallback.to_string()),
            (None, AppEnv::Production) => Err(ConfigError::Missing(name)),
        }
    }

    /// # Errors
    ///
    /// [`ConfigError::PageLimits`] when the default page size is zero or
    /// larger than the maximum.
    pub fn page_limits(&self) -> Result<PageLimits, ConfigError> {
        if self.default_per_page == 0 || self.default_per_page > self.max_per_page {
            return Err(ConfigError::PageLimits {
                default: self.default_per_page,
                max: self.max_per_page,
            });
        }
        Ok(PageLimits {
            default_per_page: self.default_per_page,
            max_per_page: self.max_per_page,
        })
    }

    #[must_use]
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_secs > 0).then(|| Duration::from_secs(self.query_timeout_secs))
    }
}
