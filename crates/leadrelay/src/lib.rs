pub mod config;
pub mod crm;
pub mod email;
pub mod error;
pub mod ingest;
pub mod lead;
pub mod logging;
pub mod secrets;
pub mod store;

pub use config::{Config, CrmConfig, MailboxConfig};
pub use crm::{CrmError, CrmSink, DealProperties, DealReceipt, HubSpotClient};
pub use email::{
    ConnectionState, EmailError, ImapClient, MailTransport, MailboxSession, MessageTracker,
    ParsedMessage, RawMessage,
};
pub use error::{ConfigError, LeadRelayError, Result};
pub use ingest::{CycleReport, IngestionLoop, MessageOutcome};
pub use lead::{extract, LeadRecord};
pub use logging::{init_logging, LogFormat};
pub use secrets::{resolve_secret, SecretError};
pub use store::{open_store, ProcessedStore, StoreError};
