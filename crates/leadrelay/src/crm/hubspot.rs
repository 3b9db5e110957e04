//! HubSpot deal creation over the CRM v3 REST API.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::CrmConfig;
use crate::lead::LeadRecord;

use super::deal::{CreateDealRequest, CreateDealResponse, DealProperties};
use super::error::{CrmError, Result};
use super::{CrmSink, DealReceipt};

/// Default API host.
pub const HUBSPOT_API_BASE_URL: &str = "https://api.hubapi.com";

const DEALS_ENDPOINT: &str = "crm/v3/objects/deals";

/// Maximum length for error bodies carried into logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Truncates an API error body to keep log lines bounded.
fn sanitize_error_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_LENGTH {
        let truncated: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated)", truncated)
    } else {
        body.to_string()
    }
}

/// Creates deals through the HubSpot CRM API with a private-app token.
pub struct HubSpotClient {
    http: Client,
    deals_url: Url,
    access_token: SecretString,
}

impl HubSpotClient {
    pub fn new(config: CrmConfig) -> Result<Self> {
        let mut base = config.base_url;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            http: Client::new(),
            deals_url: base.join(DEALS_ENDPOINT)?,
            access_token: config.api_key,
        })
    }

    pub fn deals_url(&self) -> &Url {
        &self.deals_url
    }
}

#[async_trait]
impl CrmSink for HubSpotClient {
    async fn create_deal(&self, lead: &LeadRecord) -> Result<DealReceipt> {
        let properties = DealProperties::from_lead(lead);
        debug!("Creating deal '{}'", properties.dealname);

        let response = self
            .http
            .post(self.deals_url.clone())
            .bearer_auth(self.access_token.expose_secret())
            .json(&CreateDealRequest {
                properties: &properties,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrmError::Rejected {
                status: status.as_u16(),
                body: sanitize_error_body(&body),
            });
        }

        // Only success matters; a body we cannot read still means the deal exists.
        let created: CreateDealResponse = response.json().await.unwrap_or_default();
        info!(
            "Deal created successfully: {}",
            created.id.as_deref().unwrap_or("(no id returned)")
        );

        Ok(DealReceipt {
            id: created.id,
            dealname: properties.dealname,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(base: &str) -> HubSpotClient {
        HubSpotClient::new(CrmConfig {
            base_url: Url::parse(base).unwrap(),
            api_key: SecretString::from("pat-test-token"),
        })
        .unwrap()
    }

    fn lead() -> LeadRecord {
        LeadRecord {
            sender_name: "Jane Doe".to_string(),
            sender_email: "jane@acme.com".to_string(),
            phone: "555-123-4567".to_string(),
            listing_address: "1234 Main Street, Houston, TX 77002".to_string(),
            space_required: "2,000 sq ft".to_string(),
            message: "Hi, I need a warehouse.".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_deals_url() {
        assert_eq!(
            client_for("https://api.hubapi.com").deals_url().as_str(),
            "https://api.hubapi.com/crm/v3/objects/deals"
        );
        assert_eq!(
            client_for("https://proxy.example.com/hubspot").deals_url().as_str(),
            "https://proxy.example.com/hubspot/crm/v3/objects/deals"
        );
    }

    #[test]
    fn test_sanitize_error_body() {
        assert_eq!(sanitize_error_body("short"), "short");
        let long = "é".repeat(300);
        let sanitized = sanitize_error_body(&long);
        assert!(sanitized.ends_with("... (truncated)"));
        assert_eq!(sanitized.chars().filter(|c| *c == 'é').count(), 200);
    }

    #[tokio::test]
    async fn test_create_deal_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/crm/v3/objects/deals")
            .match_header("authorization", "Bearer pat-test-token")
            .match_body(Matcher::Json(serde_json::json!({
                "properties": {
                    "dealname": "Inquiry: 1234 Main Street, Houston, TX 77002 with Space Required 2,000 sq ft",
                    "description": "Sender: Jane Doe\nEmail: jane@acme.com\nPhone: 555-123-4567\nMessage: Hi, I need a warehouse.\nSpace Required: 2,000 sq ft"
                }
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "9876", "properties": {}}"#)
            .create_async()
            .await;

        let receipt = client_for(&server.url()).create_deal(&lead()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(receipt.id.as_deref(), Some("9876"));
        assert!(receipt.dealname.starts_with("Inquiry: 1234 Main Street"));
    }

    #[tokio::test]
    async fn test_create_deal_rejected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/crm/v3/objects/deals")
            .with_status(401)
            .with_body(r#"{"status":"error","message":"Authentication credentials not found"}"#)
            .create_async()
            .await;

        let err = client_for(&server.url())
            .create_deal(&lead())
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            CrmError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Authentication credentials not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_success_without_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/crm/v3/objects/deals")
            .with_status(200)
            .create_async()
            .await;

        let receipt = client_for(&server.url()).create_deal(&lead()).await.unwrap();
        assert_eq!(receipt.id, None);
    }
}
