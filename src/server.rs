//! HTTP routes for the mailbox session.

use crate::{MailboxSession, Provider, SessionError, content_type};
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Error rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal Server Error" })),
            )
                .into_response(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MessageNotFound(_) | SessionError::AttachmentNotFound => {
                Self::NotFound(err.to_string())
            }
            SessionError::ProviderUnavailable(_) | SessionError::NoActiveMailbox => {
                error!("request failed: {}", err);
                Self::Internal
            }
        }
    }
}

/// Message lookups answer 404 when no mailbox exists yet.
fn lookup_error(err: SessionError) -> ApiError {
    match err {
        SessionError::NoActiveMailbox => ApiError::NotFound(err.to_string()),
        other => other.into(),
    }
}

/// Plain decimal digits only; `+5` or ` 5` do not name a message.
fn parse_message_id(raw: &str) -> Result<u64, ApiError> {
    let invalid = || ApiError::NotFound("Invalid message id".to_string());
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    raw.parse().map_err(|_| invalid())
}

/// Build the API router over a shared session.
pub fn router<P>(session: Arc<MailboxSession<P>>) -> Router
where
    P: Provider + 'static,
{
    Router::new()
        .route("/api/v1/create_email", post(create_email::<P>))
        .route("/api/v1/inbox", get(inbox::<P>))
        .route("/api/v1/messages/:message_id", get(read_message::<P>))
        .route(
            "/api/v1/messages/:message_id/attachments/:filename",
            get(download_attachment::<P>),
        )
        .with_state(session)
}

/// Serve `router` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server running on http://{}", addr);
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn create_email<P: Provider>(
    State(session): State<Arc<MailboxSession<P>>>,
) -> Result<impl IntoResponse, ApiError> {
    let mailbox = session.create_mailbox().await?;
    Ok(Json(mailbox))
}

async fn inbox<P: Provider>(
    State(session): State<Arc<MailboxSession<P>>>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = session.list_inbox().await?;
    Ok(Json(messages))
}

async fn read_message<P: Provider>(
    State(session): State<Arc<MailboxSession<P>>>,
    Path(message_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_message_id(&message_id)?;
    let message = session.get_message(id).await.map_err(lookup_error)?;
    Ok(Json(message))
}

async fn download_attachment<P: Provider>(
    State(session): State<Arc<MailboxSession<P>>>,
    Path((message_id, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_message_id(&message_id)?;
    let bytes = session
        .get_attachment(id, &filename)
        .await
        .map_err(lookup_error)?;

    let headers = [
        (header::CONTENT_TYPE, content_type::resolve(&filename).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={filename}"),
        ),
    ];
    Ok((headers, bytes))
}
