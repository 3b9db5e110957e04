//! IMAP client for connecting to the lead mailbox.

use std::net::{SocketAddr, ToSocketAddrs};

use async_imap::{Client, Session};
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, info, warn};
use secrecy::ExposeSecret;

use crate::config::MailboxConfig;

use super::error::{EmailError, Result};
use super::transport::{MailTransport, RawMessage};

type AsyncTcpStream = async_io::Async<std::net::TcpStream>;
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

enum Connection {
    /// TLS is up but we have not logged in yet.
    Greeted(Client<TlsStream>),
    Authenticated(Session<TlsStream>),
}

/// IMAP client that searches, fetches and flags messages in one mailbox.
pub struct ImapClient {
    config: MailboxConfig,
    connection: Option<Connection>,
}

impl ImapClient {
    /// Creates a new IMAP client with the given configuration.
    pub fn new(config: MailboxConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// Checks if the client currently holds an open connection.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn session_mut(&mut self) -> Result<&mut Session<TlsStream>> {
        match self.connection.as_mut() {
            Some(Connection::Authenticated(session)) => Ok(session),
            _ => Err(EmailError::ConnectionFailed("Not logged in".to_string())),
        }
    }
}

/// Resolves `host`, connects to the first reachable address and starts TLS.
async fn dial(host: &str, port: u16) -> Result<TlsStream> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| EmailError::ConnectionFailed(format!("{}:{}: {}", host, port, e)))?
        .collect();

    let mut last_error = None;
    for addr in addrs {
        match AsyncTcpStream::connect(addr).await {
            Ok(tcp) => {
                debug!("TCP connected to {}", addr);
                return Ok(TlsConnector::new().connect(host, tcp).await?);
            }
            Err(e) => {
                debug!("TCP connect to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(EmailError::ConnectionFailed(match last_error {
        Some(e) => format!("{}:{}: {}", host, port, e),
        None => format!("{}:{} did not resolve to any address", host, port),
    }))
}

#[async_trait]
impl MailTransport for ImapClient {
    async fn open(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        info!(
            "Opening mailbox connection to {}:{}",
            self.config.host, self.config.port
        );
        let stream = dial(&self.config.host, self.config.port).await?;
        self.connection = Some(Connection::Greeted(Client::new(stream)));
        Ok(())
    }

    async fn login(&mut self) -> Result<()> {
        let client = match self.connection.take() {
            Some(Connection::Greeted(client)) => client,
            Some(authenticated @ Connection::Authenticated(_)) => {
                self.connection = Some(authenticated);
                return Ok(());
            }
            None => return Err(EmailError::ConnectionFailed("Not connected".to_string())),
        };

        let session = client
            .login(&self.config.username, self.config.password.expose_secret())
            .await
            .map_err(|(e, _)| EmailError::AuthenticationFailed(e.to_string()))?;

        info!("Logged in to mailbox as {}", self.config.username);
        self.connection = Some(Connection::Authenticated(session));
        Ok(())
    }

    async fn select(&mut self, folder: &str) -> Result<()> {
        let session = self.session_mut()?;

        let mailbox = session
            .select(folder)
            .await
            .map_err(|e| EmailError::FolderNotFound(folder.to_string(), e.to_string()))?;

        debug!("Selected '{}' ({} messages)", folder, mailbox.exists);
        Ok(())
    }

    async fn search_unseen(&mut self) -> Result<Vec<u32>> {
        let session = self.session_mut()?;

        let mut unseen: Vec<u32> = session.uid_search("UNSEEN").await?.into_iter().collect();
        unseen.sort_unstable();
        debug!("{} unseen messages", unseen.len());
        Ok(unseen)
    }

    async fn fetch(&mut self, uids: &[u32]) -> Result<Vec<RawMessage>> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }

        let session = self.session_mut()?;

        let uid_set = uids
            .iter()
            .map(|u| u.to_string())
            .collect::<Vec<_>>()
            .join(",");
        debug!("Fetching UIDs {}", uid_set);

        // BODY.PEEK[] leaves \Seen alone; flags are set once a message is handled.
        let messages = session.uid_fetch(&uid_set, "(UID BODY.PEEK[])").await?;
        futures_util::pin_mut!(messages);

        let mut results = Vec::with_capacity(uids.len());
        while let Some(message) = messages.next().await {
            let message = message?;
            match (message.uid, message.body()) {
                (Some(uid), Some(body)) => results.push(RawMessage {
                    uid,
                    body: body.to_vec(),
                }),
                _ => warn!("Fetched message {} is missing UID or body", message.message),
            }
        }

        results.sort_by_key(|m| m.uid);
        Ok(results)
    }

    async fn mark_seen(&mut self, uid: u32) -> Result<()> {
        let session = self.session_mut()?;

        let updates = session
            .uid_store(uid.to_string(), "+FLAGS (\\Seen)")
            .await?;
        futures_util::pin_mut!(updates);
        while let Some(update) = updates.next().await {
            update?;
        }

        debug!("Marked UID {} as seen", uid);
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        match self.connection.take() {
            Some(Connection::Authenticated(mut session)) => {
                session.logout().await?;
                debug!("Logged out of mailbox");
            }
            Some(Connection::Greeted(_)) => {
                debug!("Closing connection that never authenticated");
            }
            None => {}
        }
        Ok(())
    }

    fn reset(&mut self) {
        if self.connection.take().is_some() {
            debug!("Dropped IMAP connection without logout");
        }
    }
}

impl Drop for ImapClient {
    fn drop(&mut self) {
        if self.connection.is_some() {
            warn!("Mailbox connection dropped without logout");
        }
    }
}
