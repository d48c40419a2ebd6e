use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Signing configuration for [`crate::auth::TokenCodec`].
#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub algorithm: Algorithm,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field("refresh_token_ttl_days", &self.refresh_token_ttl_days)
            .finish()
    }
}

#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub cors_origins: Vec<String>,
    pub auth: AuthSettings,
}

/// A startup misconfiguration. Always fatal.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn positive_ttl<F>(lookup: &F, key: &'static str) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = required(lookup, key)?;
    match raw.trim().parse::<i64>() {
        Ok(ttl) if ttl > 0 => Ok(ttl),
        Ok(_) => Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".into(),
        }),
        Err(e) => Err(ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

fn hmac_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: "ALGORITHM",
        reason,
    };
    let algorithm = Algorithm::from_str(name.trim()).map_err(|e| invalid(e.to_string()))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(invalid(format!(
            "{:?} needs a key pair; only HS256, HS384 and HS512 are supported",
            other
        ))),
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth = AuthSettings {
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            algorithm: match lookup("ALGORITHM") {
                Some(name) if !name.trim().is_empty() => hmac_algorithm(&name)?,
                _ => Algorithm::HS256,
            },
            access_token_ttl_minutes: positive_ttl(&lookup, "JWT_ACCESS_TOKEN_TTL")?,
            refresh_token_ttl_days: positive_ttl(&lookup, "JWT_REFRESH_TOKEN_TTL")?,
        };

        let server_port = match lookup("SERVER_PORT") {
            Some(port) => port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    key: "SERVER_PORT",
                    reason: e.to_string(),
                }
            })?,
            None => 8080,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            server_port,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            cors_origins,
            auth,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
