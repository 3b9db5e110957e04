//! Runtime configuration read from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::crm::HUBSPOT_API_BASE_URL;
use crate::email::DEFAULT_RECONNECT_DELAY;
use crate::error::ConfigError;
use crate::ingest::DEFAULT_POLL_INTERVAL;
use crate::logging::LogFormat;
use crate::secrets::resolve_secret;

pub const DEFAULT_IMAP_PORT: u16 = 993;
pub const DEFAULT_FOLDER: &str = "INBOX";
pub const DEFAULT_STORE_PATH: &str = "processed_emails.json";

/// Connection settings for the watched mailbox.
#[derive(Debug)]
pub struct MailboxConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub folder: String,
}

/// Connection settings for the CRM API.
#[derive(Debug)]
pub struct CrmConfig {
    pub base_url: Url,
    pub api_key: SecretString,
}

#[derive(Debug)]
pub struct Config {
    pub mailbox: MailboxConfig,
    /// Substring the header sender must contain for a message to be handled.
    pub target_sender: String,
    pub crm: CrmConfig,
    pub processed_store_path: PathBuf,
    pub poll_interval: Duration,
    pub reconnect_delay: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let mailbox = MailboxConfig {
            host: env.required("EMAIL_HOST")?,
            port: env.parsed("EMAIL_PORT", DEFAULT_IMAP_PORT)?,
            username: env.required("EMAIL_USER")?,
            password: env.secret("EMAIL_PASS", "EMAIL_PASS_FILE")?,
            folder: env
                .optional("EMAIL_FOLDER")
                .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
        };

        let crm = CrmConfig {
            base_url: env.url("HUBSPOT_BASE_URL", HUBSPOT_API_BASE_URL)?,
            api_key: env.secret("HUBSPOT_API_KEY", "HUBSPOT_API_KEY_FILE")?,
        };

        let log_format = match env.optional("LEADRELAY_LOG_FORMAT") {
            Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                name: "LEADRELAY_LOG_FORMAT",
                value,
                reason,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            mailbox,
            target_sender: env.required("TARGET_EMAIL")?,
            crm,
            processed_store_path: env
                .optional("PROCESSED_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
            poll_interval: env.seconds("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL)?,
            reconnect_delay: env.seconds("RECONNECT_DELAY_SECS", DEFAULT_RECONNECT_DELAY)?,
            log_format,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing { name })
    }

    fn secret(
        &self,
        name: &'static str,
        file_name: &'static str,
    ) -> Result<SecretString, ConfigError> {
        let direct = self.optional(name);
        let file = self.optional(file_name);
        if direct.is_none() && file.is_none() {
            return Err(ConfigError::Missing { name });
        }
        resolve_secret(direct.as_deref(), file.as_deref())
            .map_err(|source| ConfigError::Secret { name, source })
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr + PartialEq + Default,
        T::Err: std::fmt::Display,
    {
        let Some(value) = self.optional(name) else {
            return Ok(default);
        };
        let parsed = value.parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            value: value.clone(),
            reason: e.to_string(),
        })?;
        if parsed == T::default() {
            return Err(ConfigError::Invalid {
                name,
                value,
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(parsed)
    }

    fn seconds(&self, name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        let secs = self.parsed::<u64>(name, default.as_secs())?;
        Ok(Duration::from_secs(secs))
    }

    fn url(&self, name: &'static str, default: &str) -> Result<Url, ConfigError> {
        let value = self.optional(name).unwrap_or_else(|| default.to_string());
        Url::parse(&value).map_err(|e| ConfigError::Invalid {
            name,
            value,
            reason: e.to_string(),
        })
    }
}
