//! Error types for the provider client and the mailbox session.

use thiserror::Error;

/// Errors raised while talking to the temporary email provider.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or non-2xx status from the provider.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The API token could not be scraped from the landing page.
    #[error("failed to parse API token")]
    TokenParse,
    /// The provider answered with an unexpected shape.
    #[error("unexpected response: {0}")]
    ResponseParse(String),
    /// The provider answered with invalid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Outcomes of a [`MailboxSession`](crate::MailboxSession) operation that did not succeed.
///
/// This is the only error set the HTTP layer ever sees; provider faults are
/// folded into [`SessionError::ProviderUnavailable`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(#[source] Error),

    #[error("no active mailbox, create one first")]
    NoActiveMailbox,

    #[error("Message {0} not found")]
    MessageNotFound(u64),

    #[error("Attachment not found")]
    AttachmentNotFound,
}

impl From<Error> for SessionError {
    fn from(err: Error) -> Self {
        Self::ProviderUnavailable(err)
    }
}
