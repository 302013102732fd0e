//! Configuration loading from the process environment.

use std::sync::Arc;

use pe_percentile::{PercentileLookup, StoreError, SupabaseStore, DEFAULT_TIMEOUT_MS};

pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_KEY: &str = "SUPABASE_KEY";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_TIMEOUT_MS: &str = "SUPABASE_TIMEOUT_MS";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} is not set")]
    Missing(&'static str),

    #[error("Environment variable {var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to create store client: {0}")]
    Store(#[from] StoreError),
}

/// Server settings. Credentials are required; everything else has a default.
#[derive(Clone)]
pub struct Settings {
    pub supabase_url: String,
    pub supabase_key: String,
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable source.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let supabase_url =
            non_empty(ENV_SUPABASE_URL).ok_or(ConfigError::Missing(ENV_SUPABASE_URL))?;
        let supabase_key =
            non_empty(ENV_SUPABASE_KEY).ok_or(ConfigError::Missing(ENV_SUPABASE_KEY))?;
        let host = non_empty(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(non_empty(ENV_PORT), ENV_PORT, DEFAULT_PORT)?;
        let timeout_ms = parse_or(non_empty(ENV_TIMEOUT_MS), ENV_TIMEOUT_MS, DEFAULT_TIMEOUT_MS)?;

        Ok(Self {
            supabase_url,
            supabase_key,
            host,
            port,
            timeout_ms,
        })
    }

    /// Listen address (`host:port`).
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the process-wide lookup service. Called once at startup.
    pub fn connect(&self) -> Result<PercentileLookup, ConfigError> {
        let store = SupabaseStore::new(&self.supabase_url, &self.supabase_key, self.timeout_ms)?;
        tracing::info!("Store endpoint: {}", store.endpoint());
        Ok(PercentileLookup::new(Arc::new(store)))
    }
}

fn parse_or<T>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Load a `.env` file from the working directory, if one exists.
///
/// Returns a note for the caller to log once tracing is up.
pub fn load_dotenv() -> Option<String> {
    match dotenvy::dotenv() {
        Ok(path) => Some(format!("Loaded environment from {}", path.display())),
        Err(e) if e.not_found() => None,
        Err(e) => Some(format!("Ignoring unreadable .env file: {e}")),
    }
}
