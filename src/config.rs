use std::env;

use crate::report::document::DocumentSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub max_pool_size: u32,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub company_name: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads the process environment; call `dotenvy::dotenv()` first to pick
    /// up a `.env` file
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            server_host: var("SERVER_HOST", "0.0.0.0"),
            server_port: var("SERVER_PORT", "8080")
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database_url: var("DATABASE_URL", "sqlite://carpentry.db"),
            max_pool_size: var("MAX_POOL_SIZE", "5").parse().unwrap_or(5),
            jwt_secret: lookup("JWT_SECRET")
                .filter(|secret| !secret.is_empty())
                .ok_or(ConfigError::Missing("JWT_SECRET"))?,
            jwt_expiration_hours: var("JWT_EXPIRATION_HOURS", "168").parse().unwrap_or(168),
            company_name: var("COMPANY_NAME", "Carpentry Workshop"),
            log_format: match var("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn document_settings(&self) -> DocumentSettings {
        DocumentSettings::new(self.company_name.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("{0} must be set")]
    Missing(&'static str),
}
