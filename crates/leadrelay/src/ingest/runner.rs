//! Ingestion loop driving the mailbox session, tracker and CRM sink.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::crm::CrmSink;
use crate::email::{
    ConnectionState, EmailError, MailTransport, MailboxSession, MessageTracker, ParsedMessage,
    RawMessage,
};

use super::report::{CycleReport, MessageOutcome};

/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Polls one mailbox and forwards matching leads to the CRM.
///
/// The loop owns its session and tracker; one cycle runs to completion
/// before the next can start.
pub struct IngestionLoop<T: MailTransport, S: CrmSink> {
    session: MailboxSession<T>,
    tracker: MessageTracker,
    sink: S,
    target_sender: String,
    poll_interval: Duration,
}

impl<T: MailTransport, S: CrmSink> IngestionLoop<T, S> {
    pub fn new(
        session: MailboxSession<T>,
        tracker: MessageTracker,
        sink: S,
        target_sender: impl Into<String>,
    ) -> Self {
        Self {
            session,
            tracker,
            sink,
            target_sender: target_sender.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn session(&self) -> &MailboxSession<T> {
        &self.session
    }

    pub fn tracker(&self) -> &MessageTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs cycles until `shutdown` turns true or its sender is dropped.
    ///
    /// The first cycle starts immediately. While the session is faulted,
    /// interval ticks are ignored and the scheduled reconnect starts the
    /// next cycle instead.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Watching '{}' for mail from '{}' every {:?}",
            self.session.folder(),
            self.target_sender,
            self.poll_interval
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let reconnect_at = self.session.reconnect_at();

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = time::sleep_until(reconnect_at.unwrap_or_else(Instant::now)), if reconnect_at.is_some() => {
                    info!("Reconnecting mailbox session");
                    self.cycle().await;
                }
                _ = ticker.tick() => {
                    if self.session.state() == ConnectionState::Faulted {
                        debug!("Poll skipped: waiting for reconnect");
                        continue;
                    }
                    self.cycle().await;
                }
            }
        }

        if let Err(e) = self.session.close().await {
            warn!("Failed to close mailbox session on shutdown: {}", e);
        }
        info!("Ingestion loop stopped");
    }

    async fn cycle(&mut self) {
        let span = info_span!("ingest_cycle", folder = %self.session.folder());
        match self.run_cycle().instrument(span).await {
            Ok(report) if report.fetched > 0 => info!("Cycle complete: {}", report),
            Ok(_) => debug!("Cycle complete: no unseen messages"),
            Err(e) => error!("Cycle aborted: {}", e),
        }
    }

    /// Runs one poll: connect if needed, handle every unseen message, close.
    ///
    /// A session fault aborts the cycle; messages not yet marked seen are
    /// picked up again by the next cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, EmailError> {
        if self.session.state() != ConnectionState::Authenticated {
            self.session.connect().await?;
        }

        let messages = self.session.poll_unseen().await?;
        let mut report = CycleReport {
            fetched: messages.len(),
            ..Default::default()
        };

        for raw in &messages {
            let outcome = self.process_message(raw).await;
            report.record(outcome);

            if outcome.marks_seen() {
                self.session.mark_seen(raw.uid).await?;
            }
        }

        // Every message is settled by now, so a failed logout only faults
        // the session for the next cycle.
        if let Err(e) = self.session.close().await {
            warn!("Logout failed after cycle ({}): {}", report, e);
        }
        Ok(report)
    }

    /// Handles one fetched message up to, but not including, flagging it seen.
    pub async fn process_message(&mut self, raw: &RawMessage) -> MessageOutcome {
        let parsed = match ParsedMessage::parse(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping UID {}: {}", raw.uid, e);
                return MessageOutcome::DecodeFailed;
            }
        };

        if !parsed.is_from(&self.target_sender) {
            debug!(
                "Skipping UID {} from '{}': sender does not match",
                parsed.uid,
                parsed.from_display()
            );
            return MessageOutcome::FilteredOut;
        }

        if self.tracker.has(&parsed.message_id) {
            debug!("Skipping already processed message {}", parsed.message_id);
            return MessageOutcome::Duplicate;
        }

        let lead = parsed.to_lead();
        if !lead.has_sender() {
            warn!(
                "No sender details found in message {} ({:?})",
                parsed.message_id,
                parsed.subject.as_deref().unwrap_or("(no subject)")
            );
            return MessageOutcome::EmptyLead;
        }

        match self.sink.create_deal(&lead).await {
            Ok(receipt) => {
                info!(
                    "Created deal '{}' for message {}",
                    receipt.dealname, parsed.message_id
                );
                self.tracker.mark_processed(&parsed.message_id);
                MessageOutcome::Created
            }
            Err(e) if e.is_permanent() => {
                error!(
                    "CRM refused deal for message {}, not retrying: {}",
                    parsed.message_id, e
                );
                MessageOutcome::CrmRejected
            }
            Err(e) => {
                error!(
                    "Failed to create deal for message {}: {}",
                    parsed.message_id, e
                );
                MessageOutcome::CrmFailed
            }
        }
    }
}
