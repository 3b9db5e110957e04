//! Mailbox connection state machine.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──open──▶ Ready ──login──▶ Authenticated
//!      ▲                        │                  │                 │   │
//!      │                        └──────error───────┴──────error──────┘   │
//!      │                                      ▼                          │
//!      │                                   Faulted ──backoff──▶ Connecting
//!      └────────────────────────────close────────────────────────────────┘
//! ```
//!
//! Every error raised by the transport moves the session to `Faulted` and
//! schedules exactly one reconnect after a fixed delay. The caller decides
//! when to act on it by waiting on [`MailboxSession::reconnect_at`].

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::error::{EmailError, Result};
use super::transport::{MailTransport, RawMessage};

/// Default fixed delay between a fault and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    /// Transport is open, login has not completed.
    Ready,
    Authenticated,
    Faulted,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Ready => "ready",
            ConnectionState::Authenticated => "authenticated",
            ConnectionState::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

/// Owns the transport and its connection state.
pub struct MailboxSession<T: MailTransport> {
    transport: T,
    folder: String,
    reconnect_delay: Duration,
    state: ConnectionState,
    reconnect_at: Option<Instant>,
    reconnects_scheduled: u64,
    last_error: Option<String>,
}

impl<T: MailTransport> MailboxSession<T> {
    /// Creates a disconnected session polling `folder`.
    pub fn new(transport: T, folder: impl Into<String>) -> Self {
        Self {
            transport,
            folder: folder.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            state: ConnectionState::Disconnected,
            reconnect_at: None,
            reconnects_scheduled: 0,
            last_error: None,
        }
    }

    /// Sets the fixed backoff between a fault and the next connection attempt.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// When the pending reconnect is due, if the session is faulted.
    pub fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Total number of reconnects scheduled since the session was created.
    pub fn reconnects_scheduled(&self) -> u64 {
        self.reconnects_scheduled
    }

    /// Message of the error that caused the most recent fault.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Opens the transport and logs in.
    ///
    /// Allowed from `Disconnected` and `Faulted`; calling it while already
    /// authenticated is a no-op.
    pub async fn connect(&mut self) -> Result<()> {
        match self.state {
            ConnectionState::Authenticated => return Ok(()),
            ConnectionState::Disconnected | ConnectionState::Faulted => {}
            state => {
                return Err(EmailError::InvalidState {
                    operation: "connect",
                    state,
                })
            }
        }

        self.state = ConnectionState::Connecting;
        self.reconnect_at = None;
        debug!("Mailbox session connecting");

        if let Err(e) = self.transport.open().await {
            return Err(self.fault(e));
        }
        self.state = ConnectionState::Ready;

        if let Err(e) = self.transport.login().await {
            return Err(self.fault(e));
        }
        self.state = ConnectionState::Authenticated;
        self.last_error = None;
        info!("Mailbox session authenticated");
        Ok(())
    }

    /// Opens the folder read-write and fetches every unseen message.
    ///
    /// Messages are fetched without setting `\Seen`; call
    /// [`mark_seen`](Self::mark_seen) once a message has been handled.
    pub async fn poll_unseen(&mut self) -> Result<Vec<RawMessage>> {
        self.require_authenticated("poll_unseen")?;

        if let Err(e) = self.transport.select(&self.folder).await {
            return Err(self.fault(e));
        }

        let uids = match self.transport.search_unseen().await {
            Ok(uids) => uids,
            Err(e) => return Err(self.fault(e)),
        };

        if uids.is_empty() {
            debug!("No unseen messages in '{}'", self.folder);
            return Ok(Vec::new());
        }

        match self.transport.fetch(&uids).await {
            Ok(messages) => Ok(messages),
            Err(e) => Err(self.fault(e)),
        }
    }

    /// Sets `\Seen` on a message fetched in the current cycle.
    pub async fn mark_seen(&mut self, uid: u32) -> Result<()> {
        self.require_authenticated("mark_seen")?;

        if let Err(e) = self.transport.mark_seen(uid).await {
            return Err(self.fault(e));
        }
        Ok(())
    }

    /// Logs out after a completed cycle.
    pub async fn close(&mut self) -> Result<()> {
        if self.state != ConnectionState::Authenticated {
            return Ok(());
        }

        if let Err(e) = self.transport.logout().await {
            return Err(self.fault(e));
        }
        self.state = ConnectionState::Disconnected;
        debug!("Mailbox session closed");
        Ok(())
    }

    fn require_authenticated(&self, operation: &'static str) -> Result<()> {
        if self.state == ConnectionState::Authenticated {
            Ok(())
        } else {
            Err(EmailError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Moves to `Faulted`, drops the connection and schedules one reconnect.
    fn fault(&mut self, err: EmailError) -> EmailError {
        self.transport.reset();
        self.state = ConnectionState::Faulted;
        self.last_error = Some(err.to_string());

        if self.reconnect_at.is_none() {
            self.reconnect_at = Some(Instant::now() + self.reconnect_delay);
            self.reconnects_scheduled += 1;
            warn!(
                "Mailbox session faulted: {}. Reconnecting in {:?}",
                err, self.reconnect_delay
            );
        }

        err
    }
}
