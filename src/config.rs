use std::env as std_env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use config::{Config, Environment, File};
use serde::Deserialize;

/// SMTP settings for the outbound notification sink. Absent in most
/// deployments; notifications degrade to log-only when unset.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    /// From address, e.g. "Stockroom <noreply@stockroom.example>"
    pub from: String,
}

/// Application configuration, loaded from `config/{default,local}.toml`
/// plus `STOCKROOM__`-prefixed environment overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,

    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Access token lifetime in seconds.
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,

    #[serde(default)]
    pub auto_migrate: bool,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub db_min_connections: u32,

    /// Stock level at or below which a low-stock notification fires.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i32,

    #[serde(default)]
    pub smtp: Option<SmtpConfig>,

    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_jwt_expiration() -> u64 {
    3600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_low_stock_threshold() -> i32 {
    5
}
fn default_environment() -> String {
    "development".to_string()
}

impl AppConfig {
    /// Minimal configuration used by tests and tooling.
    pub fn new(database_url: String, jwt_secret: String) -> Self {
        Self {
            database_url,
            jwt_secret,
            host: "127.0.0.1".to_string(),
            port: default_port(),
            jwt_expiration: default_jwt_expiration(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_max_connections(),
            db_min_connections: default_min_connections(),
            low_stock_threshold: default_low_stock_threshold(),
            smtp: None,
            environment: "test".to_string(),
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        let ip: IpAddr = self
            .host
            .parse()
            .unwrap_or_else(|_| IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Loads configuration from layered sources: `config/default.toml`,
/// `config/{environment}.toml`, then `STOCKROOM__*` env vars (e.g.
/// `STOCKROOM__DATABASE_URL`, `STOCKROOM__SMTP__HOST`).
pub fn load_config() -> Result<AppConfig, config::ConfigError> {
    let environment =
        std_env::var("STOCKROOM_ENV").unwrap_or_else(|_| "development".to_string());

    let cfg = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{environment}")).required(false))
        .add_source(
            Environment::with_prefix("STOCKROOM")
                .prefix_separator("__")
                .separator("__"),
        )
        .set_override("environment", environment.clone())?
        .build()?;

    cfg.try_deserialize()
}

/// Initializes the global tracing subscriber. `RUST_LOG` takes precedence
/// over the configured level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("stockroom_api={level},tower_http=debug");
    let filter_directive = std_env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = AppConfig::new("sqlite::memory:".into(), "secret".into());
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.low_stock_threshold, 5);
        assert_eq!(cfg.jwt_expiration, 3600);
        assert!(!cfg.is_production());
        assert!(cfg.smtp.is_none());
    }

    #[test]
    fn listen_addr_falls_back_on_bad_host() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), "secret".into());
        cfg.host = "not-an-ip".into();
        assert_eq!(cfg.listen_addr().ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }
}
