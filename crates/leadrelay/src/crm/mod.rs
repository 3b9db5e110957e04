//! CRM sink: turns a lead record into a deal.

use async_trait::async_trait;

use crate::lead::LeadRecord;

pub mod deal;
pub mod error;
pub mod hubspot;

pub use deal::DealProperties;
pub use error::CrmError;
pub use hubspot::{HubSpotClient, HUBSPOT_API_BASE_URL};

/// Acknowledgement for a created deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealReceipt {
    /// Identifier assigned by the CRM, when it returned one.
    pub id: Option<String>,
    pub dealname: String,
}

/// Destination for extracted leads.
#[async_trait]
pub trait CrmSink: Send + Sync {
    /// Creates one deal for `lead`. Any error means no deal was confirmed.
    async fn create_deal(&self, lead: &LeadRecord) -> error::Result<DealReceipt>;
}
