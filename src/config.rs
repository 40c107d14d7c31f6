//! Environment-sourced configuration.
//!
//! All settings come from the process environment (optionally seeded from a
//! `.env` file by `main`). They are read once at startup into an immutable
//! `Config` and passed to the components that need them. Presence is checked
//! where a variable is first used, so a missing mail setting does not stop
//! the report itself from being generated.

use crate::error::Error;
use std::env;

/// Default SMTP submission port when `SMTP_PORT` is not set.
const DEFAULT_SMTP_PORT: u16 = 587;

/// Root configuration, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Document store connection settings.
    pub store: StoreConfig,

    /// Mail transport and addressing settings.
    pub mail: MailConfig,
}

/// Where the enrichment call records live.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// MongoDB connection string (`MONGO_URI`).
    pub uri: Option<String>,

    /// Database name (`DB_NAME`).
    pub database: Option<String>,

    /// Collection name (`COLLECTION_NAME`).
    pub collection: Option<String>,
}

/// How the report email is sent and addressed.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP host (`SMTP_SERVER`).
    pub server: Option<String>,

    /// SMTP port (`SMTP_PORT`).
    pub port: u16,

    /// Transport password (`SMTP_PASSWORD`).
    pub password: Option<String>,

    /// Sender address (`DEFAULT_FROM_EMAIL`). Also used as the SMTP
    /// username, matching how the transport account is provisioned.
    pub from_email: Option<String>,

    /// Report recipient (`RECIPIENT_EMAIL`).
    pub recipient: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            server: None,
            port: DEFAULT_SMTP_PORT,
            password: None,
            from_email: None,
            recipient: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Exists so tests can supply variables without mutating the
    /// process-global environment.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = get("SMTP_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);

        Self {
            store: StoreConfig {
                uri: get("MONGO_URI"),
                database: get("DB_NAME"),
                collection: get("COLLECTION_NAME"),
            },
            mail: MailConfig {
                server: get("SMTP_SERVER"),
                port,
                password: get("SMTP_PASSWORD"),
                from_email: get("DEFAULT_FROM_EMAIL"),
                recipient: get("RECIPIENT_EMAIL"),
            },
        }
    }
}

/// Resolve an optional setting, failing with the variable name when it is
/// unset. Empty values count as unset.
pub fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, Error> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Configuration(format!("{} is not set", name)))
}
