use std::net::{Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::logging;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Name of this instance, used in log output.
    pub name: String,

    pub logging: LoggingConfig,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub events: EventsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "directory-api".to_string(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
            database: DatabaseConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives, e.g. `info` or `directory_api=debug,info`.
    pub level: String,
    pub mode: logging::Mode,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            mode: logging::Mode::Default,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_address: SocketAddr,
    pub tls: Option<TlsConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv6Addr::UNSPECIFIED, 4000)),
            tls: None,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TlsConfig {
    /// Path to the PEM certificate chain.
    pub cert: PathBuf,
    /// Path to the PEM private key.
    pub key: PathBuf,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub uri: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "postgres://root@localhost:5432/directory".to_string(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Minutes around an event's start time during which it counts as live.
    pub live_margin_minutes: i64,
    /// Rows per page in paginated listings.
    pub page_size: i64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            live_margin_minutes: 15,
            page_size: 10,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "directory-api", about = "Event directory management API server")]
struct Args {
    /// Path to a TOML config file.
    #[arg(long, env = "EVD_CONFIG")]
    config: Option<PathBuf>,
}

impl AppConfig {
    /// Loads configuration from the `--config` file (or `EVD_CONFIG`) if
    /// given, then applies `EVD_*` environment overrides on top.
    pub fn parse() -> anyhow::Result<Self> {
        let args = Args::parse();

        let mut config = match &args.config {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            None => Self::default(),
        };

        if let Ok(uri) = std::env::var("EVD_DATABASE_URI") {
            config.database.uri = uri;
        }
        if let Ok(addr) = std::env::var("EVD_API_BIND_ADDRESS") {
            config.api.bind_address = addr.parse().context("invalid EVD_API_BIND_ADDRESS")?;
        }
        if let Ok(level) = std::env::var("EVD_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.events.live_margin_minutes < 0 {
            anyhow::bail!("events.live_margin_minutes must not be negative");
        }
        if self.events.page_size < 1 {
            anyhow::bail!("events.page_size must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.events.page_size, 10);
        assert_eq!(config.events.live_margin_minutes, 15);
        assert!(config.api.tls.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            name = "directory-api-test"

            [api]
            bind_address = "127.0.0.1:8080"

            [events]
            live_margin_minutes = 30
        "#,
        )
        .unwrap();

        assert_eq!(config.name, "directory-api-test");
        assert_eq!(config.api.bind_address, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.events.live_margin_minutes, 30);
        // Untouched sections fall back to defaults.
        assert_eq!(config.events.page_size, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_page_size() {
        let config = AppConfig {
            events: EventsConfig {
                page_size: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
