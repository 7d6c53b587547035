//! Capability interface for temporary email providers.

use crate::{Message, MessageSummary, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Operations the session needs from a temporary email service.
///
/// [`Client`](crate::Client) implements this against GuerrillaMail; tests
/// plug in in-memory providers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Issue a new disposable address.
    async fn create_address(&self) -> Result<String>;

    /// List the inbox of `address` in provider order.
    async fn list_inbox(&self, address: &str) -> Result<Vec<MessageSummary>>;

    /// Fetch a full message. `Ok(None)` means the id does not resolve in this mailbox.
    async fn fetch_message(&self, address: &str, id: u64) -> Result<Option<Message>>;

    /// Download the raw bytes of the named attachment of message `message_id`.
    async fn fetch_attachment(
        &self,
        address: &str,
        message_id: u64,
        filename: &str,
    ) -> Result<Vec<u8>>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    async fn create_address(&self) -> Result<String> {
        (**self).create_address().await
    }

    async fn list_inbox(&self, address: &str) -> Result<Vec<MessageSummary>> {
        (**self).list_inbox(address).await
    }

    async fn fetch_message(&self, address: &str, id: u64) -> Result<Option<Message>> {
        (**self).fetch_message(address, id).await
    }

    async fn fetch_attachment(
        &self,
        address: &str,
        message_id: u64,
        filename: &str,
    ) -> Result<Vec<u8>> {
        (**self).fetch_attachment(address, message_id, filename).await
    }
}
