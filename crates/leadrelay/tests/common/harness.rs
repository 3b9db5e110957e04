//! Fakes and the harness wiring them into an ingestion loop.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use leadrelay::crm::CrmError;
use leadrelay::email::error::{EmailError, Result as EmailResult};
use leadrelay::store::JsonFileStore;
use leadrelay::{
    CrmSink, DealProperties, DealReceipt, IngestionLoop, LeadRecord, MailTransport,
    MailboxSession, MessageTracker, RawMessage,
};

use super::builders::TARGET;

/// Mailbox operations a test can fail or count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Open,
    Login,
    Select,
    Search,
    Fetch,
    MarkSeen,
    Logout,
}

struct StoredMessage {
    body: Vec<u8>,
    seen: bool,
}

#[derive(Default)]
struct MailboxState {
    messages: BTreeMap<u32, StoredMessage>,
    next_uid: u32,
    failures: VecDeque<Op>,
    calls: Vec<Op>,
    connected: bool,
    resets: usize,
}

/// In-memory mailbox. Clones share the same state.
#[derive(Clone, Default)]
pub struct FakeMailbox {
    state: Arc<Mutex<MailboxState>>,
}

impl FakeMailbox {
    /// Adds an unseen message and returns its UID.
    pub fn deliver(&self, body: Vec<u8>) -> u32 {
        let mut state = self.state.lock().unwrap();
        state.next_uid += 1;
        let uid = state.next_uid;
        state.messages.insert(uid, StoredMessage { body, seen: false });
        uid
    }

    /// Makes the next call of `op` fail once. Queued failures fire in order.
    pub fn fail_next(&self, op: Op) {
        self.state.lock().unwrap().failures.push_back(op);
    }

    pub fn is_seen(&self, uid: u32) -> bool {
        self.state.lock().unwrap().messages[&uid].seen
    }

    pub fn unseen(&self) -> Vec<u32> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .iter()
            .filter(|(_, m)| !m.seen)
            .map(|(uid, _)| *uid)
            .collect()
    }

    pub fn calls(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    pub fn resets(&self) -> usize {
        self.state.lock().unwrap().resets
    }

    fn step(&self, op: Op) -> EmailResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        if state.failures.front() == Some(&op) {
            state.failures.pop_front();
            return Err(EmailError::ConnectionFailed(format!(
                "connection reset during {:?}",
                op
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MailTransport for FakeMailbox {
    async fn open(&mut self) -> EmailResult<()> {
        self.step(Op::Open)?;
        self.state.lock().unwrap().connected = true;
        Ok(())
    }

    async fn login(&mut self) -> EmailResult<()> {
        self.step(Op::Login)
    }

    async fn select(&mut self, _folder: &str) -> EmailResult<()> {
        self.step(Op::Select)
    }

    async fn search_unseen(&mut self) -> EmailResult<Vec<u32>> {
        self.step(Op::Search)?;
        Ok(self.unseen())
    }

    async fn fetch(&mut self, uids: &[u32]) -> EmailResult<Vec<RawMessage>> {
        self.step(Op::Fetch)?;
        let state = self.state.lock().unwrap();
        Ok(uids
            .iter()
            .filter_map(|uid| {
                state.messages.get(uid).map(|m| RawMessage {
                    uid: *uid,
                    body: m.body.clone(),
                })
            })
            .collect())
    }

    async fn mark_seen(&mut self, uid: u32) -> EmailResult<()> {
        self.step(Op::MarkSeen)?;
        if let Some(message) = self.state.lock().unwrap().messages.get_mut(&uid) {
            message.seen = true;
        }
        Ok(())
    }

    async fn logout(&mut self) -> EmailResult<()> {
        self.step(Op::Logout)?;
        self.state.lock().unwrap().connected = false;
        Ok(())
    }

    fn reset(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.connected = false;
        state.resets += 1;
    }
}

/// CRM sink that records every lead it accepts.
#[derive(Clone, Default)]
pub struct RecordingSink {
    created: Arc<Mutex<Vec<LeadRecord>>>,
    attempts: Arc<Mutex<usize>>,
    failures_left: Arc<Mutex<(usize, u16)>>,
}

impl RecordingSink {
    /// Makes the next `count` deal creations fail with a 503.
    pub fn fail_next(&self, count: usize) {
        self.fail_with(count, 503);
    }

    /// Makes the next `count` deal creations fail with `status`.
    pub fn fail_with(&self, count: usize, status: u16) {
        *self.failures_left.lock().unwrap() = (count, status);
    }

    pub fn created(&self) -> Vec<LeadRecord> {
        self.created.lock().unwrap().clone()
    }

    /// Number of create calls, failed ones included.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl CrmSink for RecordingSink {
    async fn create_deal(&self, lead: &LeadRecord) -> Result<DealReceipt, CrmError> {
        *self.attempts.lock().unwrap() += 1;

        let mut failures_left = self.failures_left.lock().unwrap();
        if failures_left.0 > 0 {
            failures_left.0 -= 1;
            return Err(CrmError::Rejected {
                status: failures_left.1,
                body: "deal not created".to_string(),
            });
        }
        drop(failures_left);

        let mut created = self.created.lock().unwrap();
        created.push(lead.clone());
        Ok(DealReceipt {
            id: Some(format!("deal-{}", created.len())),
            dealname: DealProperties::from_lead(lead).dealname,
        })
    }
}

/// A fake mailbox and sink sharing one temporary processed-id store.
pub struct TestHarness {
    _dir: TempDir,
    pub store_path: PathBuf,
    pub mailbox: FakeMailbox,
    pub sink: RecordingSink,
}

impl TestHarness {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let store_path = dir.path().join("processed_emails.json");
        Self {
            _dir: dir,
            store_path,
            mailbox: FakeMailbox::default(),
            sink: RecordingSink::default(),
        }
    }

    /// Builds a loop over the shared fakes, loading the store from disk.
    ///
    /// Calling this twice simulates a process restart.
    pub fn ingest_loop(&self) -> IngestionLoop<FakeMailbox, RecordingSink> {
        let tracker = MessageTracker::open(Box::new(JsonFileStore::new(&self.store_path)))
            .expect("Failed to open processed store");
        let session = MailboxSession::new(self.mailbox.clone(), "INBOX")
            .with_reconnect_delay(Duration::from_secs(5));
        IngestionLoop::new(session, tracker, self.sink.clone(), TARGET)
            .with_poll_interval(Duration::from_secs(30))
    }

    /// Ids currently persisted in the store file.
    pub fn stored_ids(&self) -> Vec<String> {
        match std::fs::read_to_string(&self.store_path) {
            Ok(content) => serde_json::from_str(&content).expect("store is not valid JSON"),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
