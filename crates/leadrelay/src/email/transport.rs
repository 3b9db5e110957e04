//! The seam between the mailbox session state machine and the wire protocol.

use async_trait::async_trait;

use super::error::Result;

/// One mailbox item as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Server-assigned UID. Only meaningful for the current mailbox and
    /// connection; never use it as an idempotency key.
    pub uid: u32,
    /// Full RFC 5322 message bytes.
    pub body: Vec<u8>,
}

/// Low-level mailbox operations the session drives.
///
/// Implementations do not track connection state themselves beyond what they
/// need to issue commands; [`MailboxSession`](super::session::MailboxSession)
/// owns the state machine and calls these in a valid order.
#[async_trait]
pub trait MailTransport: Send {
    /// Opens the transport (TCP + TLS) and reads the server greeting.
    async fn open(&mut self) -> Result<()>;

    /// Logs in with the configured credentials.
    async fn login(&mut self) -> Result<()>;

    /// Opens `folder` read-write.
    async fn select(&mut self, folder: &str) -> Result<()>;

    /// Returns the UIDs of unseen messages in ascending order.
    async fn search_unseen(&mut self) -> Result<Vec<u32>>;

    /// Fetches full message bodies without setting `\Seen`.
    async fn fetch(&mut self, uids: &[u32]) -> Result<Vec<RawMessage>>;

    /// Sets `\Seen` on a message.
    async fn mark_seen(&mut self, uid: u32) -> Result<()>;

    /// Logs out and closes the connection.
    async fn logout(&mut self) -> Result<()>;

    /// Drops any open connection without talking to the server.
    fn reset(&mut self);
}
