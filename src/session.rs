//! Process-wide holder of the active disposable mailbox.

use crate::{Mailbox, Message, MessageSummary, Provider, SessionError};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

type SessionResult<T> = std::result::Result<T, SessionError>;

/// Owns the single active [`Mailbox`] and forwards mailbox operations to a [`Provider`].
///
/// There is one active mailbox for the whole process: the last successful
/// [`create_mailbox`](Self::create_mailbox) wins for every caller. The lock
/// only guards the mailbox reference; provider calls run outside it.
#[derive(Debug)]
pub struct MailboxSession<P> {
    provider: P,
    active: RwLock<Option<Mailbox>>,
}

impl<P: Provider> MailboxSession<P> {
    /// Create a session with no active mailbox.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            active: RwLock::new(None),
        }
    }

    /// The currently active mailbox, if any.
    pub async fn active(&self) -> Option<Mailbox> {
        self.active.read().await.clone()
    }

    /// Provision a new address and make it the active mailbox.
    ///
    /// The previous mailbox is dropped without notifying the provider.
    pub async fn create_mailbox(&self) -> SessionResult<Mailbox> {
        let address = self.provider.create_address().await.map_err(|e| {
            warn!("failed to create mailbox: {}", e);
            SessionError::ProviderUnavailable(e)
        })?;

        let mailbox = Mailbox { address };
        let previous = self.active.write().await.replace(mailbox.clone());
        match previous {
            Some(old) => info!("replaced mailbox {} with {}", old.address, mailbox.address),
            None => info!("created mailbox {}", mailbox.address),
        }

        Ok(mailbox)
    }

    /// List the active inbox in provider order.
    pub async fn list_inbox(&self) -> SessionResult<Vec<MessageSummary>> {
        let address = self.active_address().await?;
        let messages = self.provider.list_inbox(&address).await.map_err(|e| {
            warn!("failed to list inbox of {}: {}", address, e);
            SessionError::ProviderUnavailable(e)
        })?;
        debug!("{} message(s) in {}", messages.len(), address);
        Ok(messages)
    }

    /// Fetch a full message from the active inbox.
    pub async fn get_message(&self, id: u64) -> SessionResult<Message> {
        let address = self.active_address().await?;
        self.lookup(&address, id).await
    }

    /// Download an attachment of a message in the active inbox.
    ///
    /// The first attachment whose file name matches exactly wins.
    pub async fn get_attachment(&self, message_id: u64, filename: &str) -> SessionResult<Vec<u8>> {
        let address = self.active_address().await?;
        let message = self.lookup(&address, message_id).await?;

        if message.attachment(filename).is_none() {
            debug!("message {} has no attachment {:?}", message_id, filename);
            return Err(SessionError::AttachmentNotFound);
        }

        self.provider
            .fetch_attachment(&address, message_id, filename)
            .await
            .map_err(|e| {
                warn!("failed to download {:?} from message {}: {}", filename, message_id, e);
                SessionError::ProviderUnavailable(e)
            })
    }

    async fn active_address(&self) -> SessionResult<String> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|mailbox| mailbox.address.clone())
            .ok_or(SessionError::NoActiveMailbox)
    }

    async fn lookup(&self, address: &str, id: u64) -> SessionResult<Message> {
        match self.provider.fetch_message(address, id).await {
            Ok(Some(message)) => Ok(message),
            Ok(None) => Err(SessionError::MessageNotFound(id)),
            Err(e) => {
                warn!("failed to fetch message {} of {}: {}", id, address, e);
                Err(SessionError::ProviderUnavailable(e))
            }
        }
    }
}
