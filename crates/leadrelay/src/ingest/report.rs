//! Per-message outcomes and the per-cycle tally.

use std::fmt;

/// What happened to one fetched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// A deal was created and the message id recorded.
    Created,
    /// The header sender did not match the target filter.
    FilteredOut,
    /// The message id was already processed.
    Duplicate,
    /// Extraction found no sender name, email or phone.
    EmptyLead,
    /// The raw message could not be decoded.
    DecodeFailed,
    /// The CRM did not confirm the deal; another attempt may succeed.
    CrmFailed,
    /// The CRM refused the deal outright; retrying would fail the same way.
    CrmRejected,
}

impl MessageOutcome {
    /// Whether the message is finished with and may be flagged `\Seen`.
    ///
    /// A retryable CRM failure leaves the message unseen so the next poll
    /// retries it.
    pub fn marks_seen(self) -> bool {
        !matches!(self, MessageOutcome::CrmFailed)
    }
}

/// Counts for one ingestion cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub created: usize,
    pub filtered: usize,
    pub duplicates: usize,
    pub empty_leads: usize,
    pub decode_failures: usize,
    pub crm_failures: usize,
    pub crm_rejections: usize,
}

impl CycleReport {
    pub fn record(&mut self, outcome: MessageOutcome) {
        match outcome {
            MessageOutcome::Created => self.created += 1,
            MessageOutcome::FilteredOut => self.filtered += 1,
            MessageOutcome::Duplicate => self.duplicates += 1,
            MessageOutcome::EmptyLead => self.empty_leads += 1,
            MessageOutcome::DecodeFailed => self.decode_failures += 1,
            MessageOutcome::CrmFailed => self.crm_failures += 1,
            MessageOutcome::CrmRejected => self.crm_rejections += 1,
        }
    }

    /// Number of messages that reached an outcome.
    pub fn handled(&self) -> usize {
        self.created
            + self.filtered
            + self.duplicates
            + self.empty_leads
            + self.decode_failures
            + self.crm_failures
            + self.crm_rejections
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched={} created={} filtered={} duplicates={} empty={} undecodable={} crm_failed={} crm_rejected={}",
            self.fetched,
            self.created,
            self.filtered,
            self.duplicates,
            self.empty_leads,
            self.decode_failures,
            self.crm_failures,
            self.crm_rejections
        )
    }
}
