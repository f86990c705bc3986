use std::collections::HashMap;
use std::env;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{key} must be set unless AUTH_DEV_MODE=true")]
    Missing { key: &'static str },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth_dev_mode: bool,
    pub jwt_secret: Option<String>,
    pub jwt_audience: String,
    pub atomic_procedures: bool,
    pub session_timeout_seconds: u64,
    pub quiz_max_questions: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_map(values: &HashMap<&str, &str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| values.get(key).map(|v| v.to_string()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            auth_dev_mode: parse_var(&lookup, "AUTH_DEV_MODE", defaults.auth_dev_mode)?,
            jwt_secret: lookup("JWT_SECRET").filter(|secret| !secret.is_empty()),
            jwt_audience: lookup("JWT_AUDIENCE").unwrap_or(defaults.jwt_audience),
            atomic_procedures: parse_var(
                &lookup,
                "ATOMIC_PROCEDURES",
                defaults.atomic_procedures,
            )?,
            session_timeout_seconds: parse_var(
                &lookup,
                "SESSION_TIMEOUT_SECONDS",
                defaults.session_timeout_seconds,
            )?,
            quiz_max_questions: parse_var(
                &lookup,
                "QUIZ_MAX_QUESTIONS",
                defaults.quiz_max_questions,
            )?,
        };

        if !config.auth_dev_mode && config.jwt_secret.is_none() {
            return Err(ConfigError::Missing { key: "JWT_SECRET" });
        }
        if config.quiz_max_questions == 0 {
            return Err(ConfigError::Invalid {
                key: "QUIZ_MAX_QUESTIONS",
                value: "0".to_string(),
            });
        }
        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "sqlite://cognita.db?mode=rwc".to_string(),
            auth_dev_mode: false,
            jwt_secret: None,
            jwt_audience: "authenticated".to_string(),
            atomic_procedures: true,
            session_timeout_seconds: 1800,
            quiz_max_questions: 10,
        }
    }
}
