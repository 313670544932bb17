//! Centralized configuration (command-line flags with environment fallbacks).
//!
//! A `.env` file in the working directory is loaded first, so anything it sets
//! behaves like a real environment variable. Flags win over both.

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, ValueEnum};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("database DSN must be provided via --db-dsn or DB_DSN")]
    MissingDsn,
    #[error("--db-max-open-conns must be at least 1")]
    ZeroPoolSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "contacts-web", about = "Server-rendered contact manager")]
pub struct Config {
    /// The port to run the app on.
    #[arg(long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Environment (development|staging|production).
    #[arg(long = "env", env = "APP_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,

    /// Include the full error chain in server error responses.
    #[arg(long, env = "DEBUG", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub debug: bool,

    /// Also log requests for static assets.
    #[arg(long, env = "VERBOSE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub verbose: bool,

    #[command(flatten)]
    pub db: DatabaseConfig,
}

#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// PostgreSQL DSN (required, no default).
    #[arg(long = "db-dsn", env = "DB_DSN", hide_env_values = true)]
    pub dsn: String,

    /// Maximum open connections in the pool.
    #[arg(long = "db-max-open-conns", env = "DB_MAX_OPEN_CONNS", default_value_t = 25)]
    pub max_open_conns: u32,

    /// Idle connections kept open (capped at the open-connection limit).
    #[arg(long = "db-max-idle-conns", env = "DB_MAX_IDLE_CONNS", default_value_t = 25)]
    pub max_idle_conns: u32,

    /// How long a connection may sit idle before it is closed, e.g. `15m`.
    #[arg(
        long = "db-max-idle-time",
        env = "DB_MAX_IDLE_TIME",
        default_value = "15m",
        value_parser = humantime::parse_duration
    )]
    pub max_idle_time: Duration,
}

impl Config {
    /// Loads `.env`, then parses the process arguments.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_args(std::env::args_os())
    }

    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cfg = Self::try_parse_from(args)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db.dsn.trim().is_empty() {
            return Err(ConfigError::MissingDsn);
        }
        if self.db.max_open_conns == 0 {
            return Err(ConfigError::ZeroPoolSize);
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
