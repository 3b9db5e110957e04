//! Full pipeline against a mock CRM endpoint and the on-disk stores.

mod common;

use std::time::Duration;

use mockito::Matcher;
use secrecy::SecretString;
use url::Url;

use leadrelay::{
    open_store, CrmConfig, HubSpotClient, IngestionLoop, MailboxSession, MessageTracker,
};

use common::{EmailBuilder, FakeMailbox, TARGET};

fn hubspot(server: &mockito::ServerGuard) -> HubSpotClient {
    HubSpotClient::new(CrmConfig {
        base_url: Url::parse(&server.url()).unwrap(),
        api_key: SecretString::from("pat-e2e"),
    })
    .unwrap()
}

fn ingest_loop(
    mailbox: &FakeMailbox,
    store_path: &std::path::Path,
    sink: HubSpotClient,
) -> IngestionLoop<FakeMailbox, HubSpotClient> {
    let tracker = MessageTracker::open(open_store(store_path).unwrap()).unwrap();
    let session = MailboxSession::new(mailbox.clone(), "INBOX");
    IngestionLoop::new(session, tracker, sink, TARGET).with_poll_interval(Duration::from_secs(30))
}

#[tokio::test]
async fn test_deal_posted_once_with_sqlite_store() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/crm/v3/objects/deals")
        .match_header("authorization", "Bearer pat-e2e")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "properties": {
                "dealname": "Inquiry: 1234 Main Street, Houston, TX 77002 with Space Required 2,000 sq ft"
            }
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": "4242"}"#)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("state").join("processed.db");
    let mailbox = FakeMailbox::default();

    let first = mailbox.deliver(EmailBuilder::new().build());
    let report = ingest_loop(&mailbox, &store_path, hubspot(&server))
        .run_cycle()
        .await
        .unwrap();
    assert_eq!(report.created, 1);
    assert!(mailbox.is_seen(first));

    // A restarted process sees the id in the database and skips the message.
    let second = mailbox.deliver(EmailBuilder::new().build());
    let mut restarted = ingest_loop(&mailbox, &store_path, hubspot(&server));
    let report = restarted.run_cycle().await.unwrap();
    assert_eq!(report.duplicates, 1);
    assert!(mailbox.is_seen(second));
    assert_eq!(restarted.tracker().stats().persisted, Some(1));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejected_deal_is_retried_next_cycle() {
    let mut server = mockito::Server::new_async().await;
    let rejected = server
        .mock("POST", "/crm/v3/objects/deals")
        .with_status(429)
        .with_body(r#"{"status":"error","category":"RATE_LIMITS"}"#)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("processed_emails.json");
    let mailbox = FakeMailbox::default();
    let uid = mailbox.deliver(EmailBuilder::new().build());

    let mut ingest = ingest_loop(&mailbox, &store_path, hubspot(&server));
    let report = ingest.run_cycle().await.unwrap();
    assert_eq!(report.crm_failures, 1);
    assert!(!mailbox.is_seen(uid));
    assert!(!store_path.exists());
    rejected.assert_async().await;
    rejected.remove_async().await;

    let accepted = server
        .mock("POST", "/crm/v3/objects/deals")
        .with_status(201)
        .with_body(r#"{"id": "77"}"#)
        .expect(1)
        .create_async()
        .await;

    let report = ingest.run_cycle().await.unwrap();
    assert_eq!(report.created, 1);
    assert!(mailbox.is_seen(uid));
    accepted.assert_async().await;

    let stored: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    assert_eq!(stored, vec!["<lead-1@listings.example>"]);
}

#[tokio::test]
async fn test_invalid_deal_is_not_posted_again() {
    let mut server = mockito::Server::new_async().await;
    let invalid = server
        .mock("POST", "/crm/v3/objects/deals")
        .with_status(400)
        .with_body(r#"{"status":"error","category":"VALIDATION_ERROR"}"#)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("processed_emails.json");
    let mailbox = FakeMailbox::default();
    let uid = mailbox.deliver(EmailBuilder::new().build());

    let mut ingest = ingest_loop(&mailbox, &store_path, hubspot(&server));
    let report = ingest.run_cycle().await.unwrap();
    assert_eq!(report.crm_rejections, 1);
    assert!(mailbox.is_seen(uid));
    assert!(!store_path.exists());

    let report = ingest.run_cycle().await.unwrap();
    assert_eq!(report.fetched, 0);
    invalid.assert_async().await;
}
