//! Mailbox access for the lead inbox.
//!
//! This module provides the IMAP transport, the connection state machine
//! that wraps it, MIME decoding of fetched messages, and the tracker that
//! remembers which messages already became deals.

pub mod client;
pub mod error;
pub mod parser;
pub mod session;
pub mod tracker;
pub mod transport;

pub use client::ImapClient;
pub use error::EmailError;
pub use parser::{canonical_message_id, ParsedMessage};
pub use session::{ConnectionState, MailboxSession, DEFAULT_RECONNECT_DELAY};
pub use tracker::{MessageTracker, TrackerStats};
pub use transport::{MailTransport, RawMessage};
