//! Mapping from a lead record to deal properties.

use serde::{Deserialize, Serialize};

use crate::lead::LeadRecord;

/// Properties of the deal created for a lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DealProperties {
    pub dealname: String,
    pub description: String,
}

impl DealProperties {
    pub fn from_lead(lead: &LeadRecord) -> Self {
        Self {
            dealname: format!(
                "Inquiry: {} with Space Required {}",
                lead.listing_address, lead.space_required
            ),
            description: format!(
                "Sender: {}\nEmail: {}\nPhone: {}\nMessage: {}\nSpace Required: {}",
                lead.sender_name, lead.sender_email, lead.phone, lead.message, lead.space_required
            ),
        }
    }
}

/// Request body for the deal-creation endpoint.
#[derive(Debug, Serialize)]
pub struct CreateDealRequest<'a> {
    pub properties: &'a DealProperties,
}

/// The fields of the creation response we look at.
#[derive(Debug, Default, Deserialize)]
pub struct CreateDealResponse {
    #[serde(default)]
    pub id: Option<String>,
}
