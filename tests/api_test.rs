//! End-to-end tests for the HTTP API.
//!
//! Each test starts the router on a random port and talks to it with
//! `reqwest`. Most tests back the session with an in-memory provider; the
//! last one wires the real GuerrillaMail `Client` to an `httpmock` server.

use async_trait::async_trait;
use httpmock::prelude::*;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempmail_api::{
    Attachment, Client, Error, MailboxSession, Message, MessageSummary, Provider, Result, server,
};
use tokio::net::TcpListener;

/// Provider with canned inboxes keyed by address.
///
/// Addresses are handed out as `box1@test.local`, `box2@test.local`, ...
#[derive(Default)]
struct StaticProvider {
    created: AtomicUsize,
    inboxes: HashMap<String, Vec<Message>>,
    files: HashMap<(u64, String), Vec<u8>>,
    down: bool,
    reads_down: bool,
}

impl StaticProvider {
    fn with_message(mut self, address: &str, message: Message) -> Self {
        self.inboxes
            .entry(address.to_string())
            .or_default()
            .push(message);
        self
    }

    fn with_file(mut self, message_id: u64, filename: &str, bytes: &[u8]) -> Self {
        self.files
            .insert((message_id, filename.to_string()), bytes.to_vec());
        self
    }

    fn check(&self) -> Result<()> {
        if self.down {
            Err(Error::ResponseParse("provider down".into()))
        } else {
            Ok(())
        }
    }

    /// Address creation may still work while mailbox reads fail.
    fn check_reads(&self) -> Result<()> {
        self.check()?;
        if self.reads_down {
            Err(Error::ResponseParse("inbox backend down".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Provider for StaticProvider {
    async fn create_address(&self) -> Result<String> {
        self.check()?;
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("box{n}@test.local"))
    }

    async fn list_inbox(&self, address: &str) -> Result<Vec<MessageSummary>> {
        self.check_reads()?;
        Ok(self
            .inboxes
            .get(address)
            .map(|list| {
                list.iter()
                    .map(|m| MessageSummary {
                        id: m.id,
                        from_addr: m.from_addr.clone(),
                        subject: m.subject.clone(),
                        date_str: m.date_str.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_message(&self, address: &str, id: u64) -> Result<Option<Message>> {
        self.check_reads()?;
        Ok(self
            .inboxes
            .get(address)
            .and_then(|list| list.iter().find(|m| m.id == id).cloned()))
    }

    async fn fetch_attachment(
        &self,
        _address: &str,
        message_id: u64,
        filename: &str,
    ) -> Result<Vec<u8>> {
        self.check_reads()?;
        self.files
            .get(&(message_id, filename.to_string()))
            .cloned()
            .ok_or_else(|| Error::ResponseParse("missing file".into()))
    }
}

fn message(id: u64, subject: &str, attachments: &[&str]) -> Message {
    Message {
        id,
        from_addr: "alice@example.com".to_string(),
        subject: subject.to_string(),
        body: format!("Body of {subject}"),
        date_str: "2024-09-26 12:34:56".to_string(),
        attachments: attachments
            .iter()
            .map(|name| Attachment {
                filename: (*name).to_string(),
                content_type: None,
            })
            .collect(),
    }
}

/// Start the API on a random port and return its base URL.
async fn spawn_api<P: Provider + 'static>(provider: P) -> String {
    let session = Arc::new(MailboxSession::new(provider));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, server::router(session)));
    format!("http://{addr}")
}

async fn create(http: &reqwest::Client, base: &str) -> String {
    let response = http
        .post(format!("{base}/api/v1/create_email"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["address"].as_str().unwrap().to_string()
}

// ── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inbox_before_create_is_server_error() {
    let base = spawn_api(StaticProvider::default()).await;

    let response = reqwest::get(format!("{base}/api/v1/inbox")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_message_before_create_is_not_found() {
    let base = spawn_api(StaticProvider::default()).await;

    let response = reqwest::get(format!("{base}/api/v1/messages/1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_failure_is_server_error() {
    let base = spawn_api(StaticProvider {
        down: true,
        ..Default::default()
    })
    .await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/v1/create_email"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_read_failures_are_server_errors() {
    let base = spawn_api(StaticProvider {
        reads_down: true,
        ..Default::default()
    })
    .await;
    let http = reqwest::Client::new();
    create(&http, &base).await;

    for path in [
        "/api/v1/inbox",
        "/api/v1/messages/1",
        "/api/v1/messages/1/attachments/a.txt",
    ] {
        let response = http.get(format!("{base}{path}")).send().await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "unexpected status for {path}"
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
    }
}

#[tokio::test]
async fn test_second_create_replaces_mailbox() {
    let provider = StaticProvider::default()
        .with_message("box1@test.local", message(1, "first inbox", &[]))
        .with_message("box2@test.local", message(2, "second inbox", &[]));
    let base = spawn_api(provider).await;
    let http = reqwest::Client::new();

    assert_eq!(create(&http, &base).await, "box1@test.local");
    assert_eq!(create(&http, &base).await, "box2@test.local");

    let inbox: Value = http
        .get(format!("{base}/api/v1/inbox"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        inbox,
        json!([{
            "id": 2,
            "from_addr": "alice@example.com",
            "subject": "second inbox",
            "date_str": "2024-09-26 12:34:56",
        }])
    );

    let stale = http
        .get(format!("{base}/api/v1/messages/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_read_message() {
    let provider =
        StaticProvider::default().with_message("box1@test.local", message(3, "Hello", &[]));
    let base = spawn_api(provider).await;
    let http = reqwest::Client::new();
    create(&http, &base).await;

    let response = http
        .get(format!("{base}/api/v1/messages/3"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "id": 3,
            "from_addr": "alice@example.com",
            "subject": "Hello",
            "body": "Body of Hello",
            "date_str": "2024-09-26 12:34:56",
        })
    );
}

#[tokio::test]
async fn test_unknown_message_is_not_found() {
    let base = spawn_api(StaticProvider::default()).await;
    let http = reqwest::Client::new();
    create(&http, &base).await;

    let response = http
        .get(format!("{base}/api/v1/messages/404"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Message 404 not found");
}

#[tokio::test]
async fn test_non_numeric_message_id_is_not_found() {
    let base = spawn_api(StaticProvider::default()).await;
    let http = reqwest::Client::new();
    create(&http, &base).await;

    let response = http
        .get(format!("{base}/api/v1/messages/abc"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signed_message_id_is_not_found() {
    let provider =
        StaticProvider::default().with_message("box1@test.local", message(5, "Five", &[]));
    let base = spawn_api(provider).await;
    let http = reqwest::Client::new();
    create(&http, &base).await;

    let ok = http
        .get(format!("{base}/api/v1/messages/5"))
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let response = http
        .get(format!("{base}/api/v1/messages/+5"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Invalid message id" }));
}

#[tokio::test]
async fn test_download_attachment() {
    let pdf = b"%PDF-1.4\x00\xff binary";
    let provider = StaticProvider::default()
        .with_message("box1@test.local", message(9, "Files", &["report.pdf"]))
        .with_file(9, "report.pdf", pdf);
    let base = spawn_api(provider).await;
    let http = reqwest::Client::new();
    create(&http, &base).await;

    let response = http
        .get(format!("{base}/api/v1/messages/9/attachments/report.pdf"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "attachment; filename=report.pdf"
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), pdf);
}

#[tokio::test]
async fn test_unknown_attachment_is_not_found() {
    let provider = StaticProvider::default()
        .with_message("box1@test.local", message(9, "Files", &["report.pdf"]));
    let base = spawn_api(provider).await;
    let http = reqwest::Client::new();
    create(&http, &base).await;

    let response = http
        .get(format!("{base}/api/v1/messages/9/attachments/REPORT.pdf"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Attachment not found" }));
}

#[tokio::test]
async fn test_guerrillamail_end_to_end() {
    let mock = MockServer::start_async().await;
    mock.mock_async(|when, then| {
        when.method(GET).path("/");
        then.status(200).body("api_token : 'tok42'");
    })
    .await;
    mock.mock_async(|when, then| {
        when.method(POST)
            .path("/ajax.php")
            .query_param("f", "set_email_user");
        then.status(200)
            .json_body(json!({ "email_addr": "xyz@guerrillamailblock.com" }));
    })
    .await;
    mock.mock_async(|when, then| {
        when.method(GET)
            .path("/ajax.php")
            .query_param("f", "check_email")
            .query_param("in", "xyz");
        then.status(200).json_body(json!({
            "list": [{
                "mail_id": "101",
                "mail_from": "bob@example.com",
                "mail_subject": "Invoice",
                "mail_timestamp": "1727353896",
            }],
        }));
    })
    .await;
    mock.mock_async(|when, then| {
        when.method(GET)
            .path("/ajax.php")
            .query_param("f", "fetch_email")
            .query_param("email_id", "101");
        then.status(200).json_body(json!({
            "mail_id": "101",
            "mail_from": "bob@example.com",
            "mail_subject": "Invoice",
            "mail_body": "Please pay",
            "mail_timestamp": "1727353896",
            "att_info": [{ "f": "invoice.txt", "t": "text/plain", "p": "2" }],
        }));
    })
    .await;
    mock.mock_async(|when, then| {
        when.method(GET)
            .path("/inbox")
            .query_param("email_id", "101")
            .query_param("part_id", "2");
        then.status(200).body("amount due: 10");
    })
    .await;

    let client = Client::builder()
        .base_url(mock.base_url())
        .build()
        .await
        .unwrap();
    let base = spawn_api(client).await;
    let http = reqwest::Client::new();

    assert_eq!(create(&http, &base).await, "xyz@guerrillamailblock.com");

    let inbox: Value = http
        .get(format!("{base}/api/v1/inbox"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let first = &inbox[0];
    assert_eq!(first["date_str"], "2024-09-26 12:31:36");

    let message: Value = http
        .get(format!("{base}/api/v1/messages/{}", first["id"]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(message["from_addr"], first["from_addr"]);
    assert_eq!(message["subject"], first["subject"]);
    assert_eq!(message["body"], "Please pay");

    let attachment = http
        .get(format!("{base}/api/v1/messages/101/attachments/invoice.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(attachment.status(), StatusCode::OK);
    assert_eq!(attachment.headers()[CONTENT_TYPE], "text/plain");
    assert_eq!(attachment.bytes().await.unwrap().as_ref(), b"amount due: 10");

    let missing = http
        .get(format!("{base}/api/v1/messages/101/attachments/missing.pdf"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Attachment not found" }));
}
