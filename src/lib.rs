//! # Temporary mail HTTP API
//! A small JSON-over-HTTP façade for disposable email: provision an address, list its inbox, read messages and download attachments. The mail itself lives at an external provider; GuerrillaMail ships as the default [`Client`].
//!
//! ## Session model
//! [`MailboxSession`] holds one active [`Mailbox`] for the whole process. Creating a new one replaces it for every caller; there is no per-client scoping.
//!
//! ## Endpoints
//! - `POST /api/v1/create_email` → `{"address": ...}`
//! - `GET /api/v1/inbox` → `[{"id", "from_addr", "subject", "date_str"}]`
//! - `GET /api/v1/messages/{id}` → `{"id", "from_addr", "subject", "body", "date_str"}`
//! - `GET /api/v1/messages/{id}/attachments/{filename}` → raw bytes
//!
//! ## Errors
//! Provider calls fail with [`Error`]; the session folds those into the closed [`SessionError`] set, which [`server::ApiError`] maps to HTTP statuses.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use tempmail_api::{Client, MailboxSession, server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new().await?;
//!     let session = Arc::new(MailboxSession::new(client));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//!     server::serve(listener, server::router(session)).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
pub mod content_type;
mod error;
mod models;
mod provider;
pub mod server;
mod session;

pub use client::{Client, ClientBuilder};
pub use config::{ProviderConfig, ServerConfig};
pub use error::{Error, SessionError};
pub use models::{Attachment, Mailbox, Message, MessageSummary};
pub use provider::Provider;
pub use session::MailboxSession;

/// Result type alias for provider operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
