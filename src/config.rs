use std::env;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sender: SenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SenderConfig {
    /// Hex-encoded 32-byte key used to seal sender passwords at rest.
    /// Read from env var `SENDER_ENCRYPTION_KEY`.
    pub encryption_key: String,
    /// Relay used when a sender is created without an explicit host.
    pub default_smtp_host: String,
    pub default_smtp_port: u16,
}

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 465;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/tour.db".to_string()),
                max_connections: max_connections_from_env()?,
            },
            sender: SenderConfig {
                encryption_key: env::var("SENDER_ENCRYPTION_KEY")
                    .map_err(|_| ConfigError::MissingEnv("SENDER_ENCRYPTION_KEY".to_string()))?,
                default_smtp_host: env::var("SENDER_DEFAULT_SMTP_HOST")
                    .unwrap_or_else(|_| DEFAULT_SMTP_HOST.to_string()),
                default_smtp_port: match env::var("SENDER_DEFAULT_SMTP_PORT") {
                    Ok(v) => v.parse().map_err(|_| {
                        ConfigError::InvalidValue("SENDER_DEFAULT_SMTP_PORT".to_string())
                    })?,
                    Err(_) => DEFAULT_SMTP_PORT,
                },
            },
        })
    }

    /// Configuration for tooling that never touches sender credentials.
    pub fn database_from_env() -> Result<DatabaseConfig, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Config::default().database;
        Ok(DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: max_connections_from_env()?,
        })
    }
}

fn max_connections_from_env() -> Result<u32, ConfigError> {
    match env::var("DATABASE_MAX_CONNECTIONS") {
        Ok(v) => match v.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidValue(
                "DATABASE_MAX_CONNECTIONS".to_string(),
            )),
        },
        Err(_) => Ok(5),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig {
                url: "sqlite://data/tour.db".to_string(),
                max_connections: 5,
            },
            sender: SenderConfig {
                encryption_key: String::new(),
                default_smtp_host: DEFAULT_SMTP_HOST.to_string(),
                default_smtp_port: DEFAULT_SMTP_PORT,
            },
        }
    }
}
