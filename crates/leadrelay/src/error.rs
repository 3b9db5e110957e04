use thiserror::Error;

use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum LeadRelayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mailbox error: {0}")]
    Email(#[from] crate::email::EmailError),

    #[error("Processed store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("CRM error: {0}")]
    Crm(#[from] crate::crm::CrmError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required environment variable '{name}' is not set")]
    Missing { name: &'static str },

    #[error("Invalid value '{value}' for '{name}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Could not resolve secret '{name}': {source}")]
    Secret {
        name: &'static str,
        #[source]
        source: SecretError,
    },
}

pub type Result<T> = std::result::Result<T, LeadRelayError>;
