use crate::data::StoreLocation;
use crate::domain::error::StoreError;
use crate::infrastructure::security::HashParams;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// Reasons the process refuses to start serving.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("{0} is not set")]
    MissingVar(&'static str),
    #[error("{name} has an invalid value: {value:?}")]
    InvalidVar { name: &'static str, value: String },
    #[error("Unsupported credential store scheme in DATABASE_URL (expected memory:// or file://<path>)")]
    UnsupportedStore,
    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("Invalid password hashing parameters: {0}")]
    Hasher(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreLocation,
    pub host: String,
    pub port: u16,
    pub hash: HashParams,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Reads configuration from the process environment. Call
    /// `dotenv::dotenv()` beforehand to pick up a `.env` file.
    pub fn from_env() -> Result<Self, StartupError> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(StartupError::MissingVar("DATABASE_URL"))?;
        let store = StoreLocation::parse(&database_url).ok_or(StartupError::UnsupportedStore)?;

        let defaults = HashParams::default();
        let hash = HashParams {
            m_cost: parse_var("ARGON2_M_COST", defaults.m_cost)?,
            t_cost: parse_var("ARGON2_T_COST", defaults.t_cost)?,
            p_cost: parse_var("ARGON2_P_COST", defaults.p_cost)?,
        };

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(StartupError::InvalidVar {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            store,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| DEFAULT_HOST.into()),
            port: parse_var("APP_PORT", DEFAULT_PORT)?,
            hash,
            log_format,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, StartupError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| StartupError::InvalidVar { name, value }),
        Err(_) => Ok(default),
    }
}
