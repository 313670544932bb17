//! Logging setup.

use crate::infra::config::{Config, Environment};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(cfg: &Config) -> &'static str {
    if cfg.verbose {
        "contacts_app=debug,contacts_web=debug,tower_http=debug"
    } else {
        "contacts_app=info,contacts_web=info,tower_http=info"
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default filter.
///
/// Production logs are emitted as JSON lines; other environments get the
/// human-readable formatter.
pub fn init(cfg: &Config) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(cfg).into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if cfg.environment == Environment::Production {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_file(true).with_line_number(true))
            .try_init()?;
    }

    tracing::info!(environment = %cfg.environment, "logging initialized");
    Ok(())
}
