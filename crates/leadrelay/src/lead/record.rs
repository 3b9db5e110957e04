//! The structured lead record produced by extraction.

use serde::{Deserialize, Serialize};

/// One prospective customer inquiry pulled out of a forwarded notification.
///
/// Every field is a plain `String` that defaults to empty, so a record always
/// serializes every key and downstream consumers never see a missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeadRecord {
    /// Display name from the message's `From` header.
    pub actual_from_name: String,
    /// Address from the message's `From` header.
    pub actual_from_email: String,
    /// Name of the original inquirer, taken from the forwarded block.
    pub sender_name: String,
    /// Company of the original inquirer, when the forwarded block lists one.
    pub company: String,
    /// Email address of the original inquirer.
    pub sender_email: String,
    /// Phone number of the original inquirer.
    pub phone: String,
    /// Identifier from a `(Listing ID : ...)` token.
    pub listing_id: String,
    /// First street-address-shaped line of the body.
    pub listing_address: String,
    /// Text following `Space Required:`.
    pub space_required: String,
    /// The human-written note, starting at the greeting line.
    pub message: String,
}

impl LeadRecord {
    /// Returns true if the forwarded block yielded any way to identify or
    /// reach the inquirer.
    pub fn has_sender(&self) -> bool {
        !self.sender_name.is_empty() || !self.sender_email.is_empty() || !self.phone.is_empty()
    }

    /// Trims surrounding whitespace from every field.
    pub(crate) fn trimmed(mut self) -> Self {
        for field in [
            &mut self.actual_from_name,
            &mut self.actual_from_email,
            &mut self.sender_name,
            &mut self.company,
            &mut self.sender_email,
            &mut self.phone,
            &mut self.listing_id,
            &mut self.listing_address,
            &mut self.space_required,
            &mut self.message,
        ] {
            let trimmed = field.trim();
            if trimmed.len() != field.len() {
                *field = trimmed.to_string();
            }
        }
        self
    }
}
