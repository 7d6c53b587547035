//! Mailbox and message types shared by the session and the HTTP layer.

use serde::Serialize;

/// A provisioned disposable address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mailbox {
    /// Full address issued by the provider.
    pub address: String,
}

/// Inbox listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    /// Message identifier, only meaningful within the mailbox that produced it.
    pub id: u64,
    /// Sender address.
    pub from_addr: String,
    /// Subject line.
    pub subject: String,
    /// Receive time as `YYYY-MM-DD HH:MM:SS`.
    pub date_str: String,
}

/// A fully fetched message.
///
/// Serializes to `{id, from_addr, subject, body, date_str}`; attachment
/// metadata stays server-side and is only used for attachment lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: u64,
    pub from_addr: String,
    pub subject: String,
    /// Message body as returned by the provider.
    pub body: String,
    pub date_str: String,
    #[serde(skip)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// First attachment whose filename matches exactly (case-sensitive).
    pub fn attachment(&self, filename: &str) -> Option<&Attachment> {
        self.attachments.iter().find(|a| a.filename == filename)
    }
}

/// Attachment metadata from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// File name, the lookup key within its message.
    pub filename: String,
    /// MIME type reported by the provider, if any.
    pub content_type: Option<String>,
}
