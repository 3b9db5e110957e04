//! MIME decoding of fetched messages.

use log::debug;
use mail_parser::{Message, MessageParser};
use sha2::{Digest, Sha256};

use crate::lead::{self, LeadRecord};

use super::error::{EmailError, Result};
use super::transport::RawMessage;

/// Domain used when a message-id has to be synthesized.
const SYNTHETIC_ID_DOMAIN: &str = "leadrelay.local";

/// A decoded email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Server UID the message was fetched under.
    pub uid: u32,
    /// Idempotency key in `<id>` form: the `Message-ID` header, or a content
    /// hash if absent.
    pub message_id: String,
    /// Display name from the `From` header.
    pub from_name: String,
    /// Address from the `From` header.
    pub from_address: String,
    pub subject: Option<String>,
    /// Plain-text body. An HTML-only message is converted to text.
    pub body: String,
}

impl ParsedMessage {
    /// Decodes a fetched message.
    pub fn parse(raw: &RawMessage) -> Result<Self> {
        let message = MessageParser::default()
            .parse(raw.body.as_slice())
            .ok_or_else(|| EmailError::ParseError("Failed to parse email message".to_string()))?;

        let (from_name, from_address) = header_sender(&message);
        let message_id = message
            .message_id()
            .map(canonical_message_id)
            .filter(|id| id != "<>")
            .unwrap_or_else(|| synthesize_message_id(&raw.body));

        // body_text renders the HTML part when there is no text/plain part.
        let body = message
            .body_text(0)
            .map(|b| b.into_owned())
            .unwrap_or_default();

        debug!(
            "Parsed email UID={} id={} subject={:?}",
            raw.uid,
            message_id,
            message.subject().unwrap_or("(no subject)")
        );

        Ok(Self {
            uid: raw.uid,
            message_id,
            from_name,
            from_address,
            subject: message.subject().map(|s| s.to_string()),
            body,
        })
    }

    /// Formats the header sender as `Name <address>`, or just the address.
    pub fn from_display(&self) -> String {
        if self.from_name.is_empty() {
            self.from_address.clone()
        } else {
            format!("{} <{}>", self.from_name, self.from_address)
        }
    }

    /// Returns true if the header sender contains `filter`, ignoring case.
    pub fn is_from(&self, filter: &str) -> bool {
        self.from_display()
            .to_lowercase()
            .contains(&filter.to_lowercase())
    }

    /// Runs field extraction over the body and fills in the header sender.
    pub fn to_lead(&self) -> LeadRecord {
        lead::extract_with_sender(&self.from_name, &self.from_address, &self.body)
    }
}

fn header_sender(message: &Message) -> (String, String) {
    message
        .from()
        .and_then(|addr| addr.first())
        .map(|addr| {
            (
                addr.name().unwrap_or_default().trim().to_string(),
                addr.address().unwrap_or_default().trim().to_string(),
            )
        })
        .unwrap_or_default()
}

/// Normalizes a message id to its bracketed `<local@domain>` form, so
/// `abc@x`, `<abc@x>` and ` <abc@x> ` all compare equal.
pub fn canonical_message_id(id: &str) -> String {
    let bare = id.trim();
    let bare = bare.strip_prefix('<').unwrap_or(bare);
    let bare = bare.strip_suffix('>').unwrap_or(bare);
    format!("<{}>", bare.trim())
}

/// Builds a stable identifier from the message bytes for mail without a
/// `Message-ID` header.
fn synthesize_message_id(raw: &[u8]) -> String {
    let digest = Sha256::digest(raw);
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("<{}@{}>", hex, SYNTHETIC_ID_DOMAIN)
}
