//! GuerrillaMail async client implementation.

use crate::{Attachment, Error, Message, MessageSummary, Provider, Result};
use async_trait::async_trait;
use chrono::DateTime;
use rand::Rng;
use rand::distr::Alphanumeric;
use regex::Regex;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, REFERER, USER_AGENT,
};
use serde::{Deserialize, Deserializer};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Async client for GuerrillaMail temporary email service.
///
/// Use [`Client::new`] for defaults or [`Client::builder`] for custom settings
/// like proxies, TLS behavior, endpoints and a custom user agent.
///
/// The API token is scraped from the landing page on first use and cached.
/// A failed address request drops the cached token so the next call
/// bootstraps again.
#[derive(Debug)]
pub struct Client {
    http: reqwest::Client,
    api_token: RwLock<Option<String>>,
    user_agent: String,
    base_url: String,
    ajax_url: String,
}

impl Client {
    /// Create a builder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new GuerrillaMail client.
    ///
    /// Connects to GuerrillaMail and retrieves the API token.
    ///
    /// # Examples
    /// ```no_run
    /// # use tempmail_api::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), tempmail_api::Error> {
    /// let client = Client::new().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new() -> Result<Self> {
        ClientBuilder::new().build().await
    }

    /// Create a temporary email address.
    ///
    /// # Arguments
    /// * `alias` - The email alias (part before @)
    ///
    /// # Returns
    /// The full email address assigned by GuerrillaMail
    pub async fn create_email(&self, alias: &str) -> Result<String> {
        let params = [("f", "set_email_user")];
        let form = [
            ("email_user", alias),
            ("lang", "en"),
            ("site", "guerrillamail.com"),
            ("in", " Set cancel"),
        ];

        let token = self.api_token().await?;
        let response: serde_json::Value = self
            .http
            .post(&self.ajax_url)
            .query(&params)
            .form(&form)
            .headers(self.headers(&token))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .get("email_addr")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::ResponseParse("missing email_addr".into()))
    }

    /// Get messages for an email address, in the order GuerrillaMail lists them.
    ///
    /// Entries that do not carry a numeric `mail_id` or fail to decode are skipped.
    pub async fn get_messages(&self, email: &str) -> Result<Vec<MessageSummary>> {
        let response = self.get_api("check_email", email, None).await?;

        let messages = response
            .get("list")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| match serde_json::from_value::<RawMessage>(v.clone()) {
                        Ok(raw) => Some(raw),
                        Err(e) => {
                            warn!("skipping undecodable inbox entry: {}", e);
                            None
                        }
                    })
                    .filter_map(RawMessage::into_summary)
                    .collect()
            })
            .unwrap_or_default();

        Ok(messages)
    }

    /// Fetch the full content of a specific email.
    ///
    /// Returns `None` when GuerrillaMail does not know `mail_id` for this inbox.
    pub async fn fetch_email(&self, email: &str, mail_id: u64) -> Result<Option<Message>> {
        let id = mail_id.to_string();
        let response = self.get_api("fetch_email", email, Some(&id)).await?;

        if response.get("mail_id").is_none() {
            debug!("fetch_email returned no message for id {}", mail_id);
            return Ok(None);
        }

        let raw: RawEmailDetails = serde_json::from_value(response)?;
        raw.into_message().map(Some)
    }

    /// Download an attachment by file name.
    ///
    /// The first attachment of the message whose name matches `filename`
    /// exactly is downloaded.
    pub async fn download_attachment(
        &self,
        email: &str,
        mail_id: u64,
        filename: &str,
    ) -> Result<Vec<u8>> {
        let id = mail_id.to_string();
        let response = self.get_api("fetch_email", email, Some(&id)).await?;
        let raw: RawEmailDetails = serde_json::from_value(response)?;

        let part = raw
            .att_info
            .into_iter()
            .find(|a| a.f == filename)
            .ok_or_else(|| Error::ResponseParse(format!("no attachment named {filename}")))?;

        let params = [
            ("get_att", ""),
            ("lang", "en"),
            ("email_id", id.as_str()),
            ("part_id", part.p.as_str()),
        ];

        let token = self.api_token().await?;
        let mut headers = self.headers(&token);
        headers.remove(CONTENT_TYPE);

        let bytes = self
            .http
            .get(format!("{}/inbox", self.base_url))
            .query(&params)
            .headers(headers)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(bytes.to_vec())
    }

    /// Common GET API request pattern.
    async fn get_api(
        &self,
        function: &str,
        email: &str,
        email_id: Option<&str>,
    ) -> Result<serde_json::Value> {
        let alias = Self::extract_alias(email);
        let timestamp = Self::timestamp();

        let mut params = vec![
            ("f", function.to_string()),
            ("site", "guerrillamail.com".to_string()),
            ("in", alias.to_string()),
            ("_", timestamp),
        ];

        if let Some(id) = email_id {
            params.insert(1, ("email_id", id.to_string()));
        }

        if function == "check_email" {
            params.insert(1, ("seq", "1".to_string()));
        }

        let token = self.api_token().await?;
        let mut headers = self.headers(&token);
        headers.remove(CONTENT_TYPE);

        self.http
            .get(&self.ajax_url)
            .query(&params)
            .headers(headers)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(Into::into)
    }

    /// Cached API token, bootstrapping from the landing page when absent.
    async fn api_token(&self) -> Result<String> {
        if let Some(token) = self.api_token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut slot = self.api_token.write().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }
        let token = self.fetch_api_token().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token so the next request bootstraps again.
    async fn reset_api_token(&self) {
        self.api_token.write().await.take();
    }

    async fn fetch_api_token(&self) -> Result<String> {
        let response = self
            .http
            .get(&self.base_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        // api_token : 'xxxxxxxx'
        let token_re =
            Regex::new(r"api_token\s*:\s*'(\w+)'").map_err(|e| Error::ResponseParse(e.to_string()))?;
        let token = token_re
            .captures(&response)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(Error::TokenParse)?;

        info!("GuerrillaMail session bootstrapped against {}", self.base_url);
        Ok(token)
    }

    /// Extract alias from email address.
    fn extract_alias(email: &str) -> &str {
        email.split('@').next().unwrap_or(email)
    }

    /// Generate timestamp for cache-busting.
    fn timestamp() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string()
    }

    /// Build headers for API requests.
    fn headers(&self, api_token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
        );
        if let Ok(value) = HeaderValue::from_str(&format!("ApiToken {api_token}")) {
            headers.insert("Authorization", value);
        }
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );
        if let Ok(value) = HeaderValue::from_str(&self.base_url) {
            headers.insert(ORIGIN, value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{}/", self.base_url)) {
            headers.insert(REFERER, value);
        }
        headers
    }
}

#[async_trait]
impl Provider for Client {
    async fn create_address(&self) -> Result<String> {
        let alias = random_alias();
        debug!("requesting GuerrillaMail address with alias {}", alias);
        let result = self.create_email(&alias).await;
        if result.is_err() {
            self.reset_api_token().await;
        }
        result
    }

    async fn list_inbox(&self, address: &str) -> Result<Vec<MessageSummary>> {
        self.get_messages(address).await
    }

    async fn fetch_message(&self, address: &str, id: u64) -> Result<Option<Message>> {
        self.fetch_email(address, id).await
    }

    async fn fetch_attachment(
        &self,
        address: &str,
        message_id: u64,
        filename: &str,
    ) -> Result<Vec<u8>> {
        self.download_attachment(address, message_id, filename)
            .await
    }
}

fn random_alias() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ALIAS_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Render a unix timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
fn format_timestamp(timestamp: &str) -> Option<String> {
    let secs: i64 = timestamp.trim().parse().ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Inbox entry as returned by `check_email`.
#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(deserialize_with = "string_or_number")]
    mail_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    mail_from: String,
    #[serde(default, deserialize_with = "null_as_default")]
    mail_subject: String,
    #[serde(default, deserialize_with = "string_or_number")]
    mail_timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    mail_date: String,
}

impl RawMessage {
    fn into_summary(self) -> Option<MessageSummary> {
        let id = match self.mail_id.parse() {
            Ok(id) => id,
            Err(_) => {
                warn!("skipping message with non-numeric id {:?}", self.mail_id);
                return None;
            }
        };
        Some(MessageSummary {
            id,
            date_str: format_timestamp(&self.mail_timestamp).unwrap_or(self.mail_date),
            from_addr: self.mail_from,
            subject: self.mail_subject,
        })
    }
}

/// Full message as returned by `fetch_email`.
#[derive(Debug, Deserialize)]
struct RawEmailDetails {
    #[serde(deserialize_with = "string_or_number")]
    mail_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    mail_from: String,
    #[serde(default, deserialize_with = "null_as_default")]
    mail_subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    mail_body: String,
    #[serde(default, deserialize_with = "string_or_number")]
    mail_timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    mail_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    att_info: Vec<RawAttachment>,
}

impl RawEmailDetails {
    fn into_message(self) -> Result<Message> {
        let id = self
            .mail_id
            .parse()
            .map_err(|_| Error::ResponseParse(format!("non-numeric mail_id {:?}", self.mail_id)))?;
        Ok(Message {
            id,
            date_str: format_timestamp(&self.mail_timestamp).unwrap_or(self.mail_date),
            from_addr: self.mail_from,
            subject: self.mail_subject,
            body: self.mail_body,
            attachments: self
                .att_info
                .into_iter()
                .map(|a| Attachment {
                    filename: a.f,
                    content_type: a.t,
                })
                .collect(),
        })
    }
}

/// Attachment descriptor inside `att_info`.
#[derive(Debug, Deserialize)]
struct RawAttachment {
    /// File name.
    f: String,
    /// MIME type.
    #[serde(default)]
    t: Option<String>,
    /// Part id used by the download endpoint.
    #[serde(deserialize_with = "string_or_number")]
    p: String,
}

const BASE_URL: &str = "https://www.guerrillamail.com";
const USER_AGENT_VALUE: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:131.0) Gecko/20100101 Firefox/131.0";
const ALIAS_LEN: usize = 10;

/// Builder for configuring a GuerrillaMail client.
///
/// Start with [`Client::builder`] to override defaults.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    proxy: Option<String>,
    danger_accept_invalid_certs: bool,
    user_agent: String,
    base_url: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - No proxy
    /// - `danger_accept_invalid_certs = true`
    /// - Default user agent
    /// - `https://www.guerrillamail.com` as base URL, `{base}/ajax.php` as AJAX endpoint
    pub fn new() -> Self {
        Self {
            proxy: None,
            danger_accept_invalid_certs: true,
            user_agent: USER_AGENT_VALUE.to_string(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Set a proxy URL (e.g., "http://127.0.0.1:8080").
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Control whether to accept invalid TLS certificates (default: true).
    pub fn danger_accept_invalid_certs(mut self, value: bool) -> Self {
        self.danger_accept_invalid_certs = value;
        self
    }

    /// Override the default user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the site URL used for the token bootstrap, the AJAX API and
    /// attachment downloads.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the client and fetch the initial API token.
    ///
    /// This performs a network request to GuerrillaMail to bootstrap the session.
    pub async fn build(self) -> Result<Client> {
        let client = self.build_lazy()?;
        client.api_token().await?;
        Ok(client)
    }

    /// Build the client without contacting GuerrillaMail.
    ///
    /// The API token is fetched by the first request that needs it.
    pub fn build_lazy(self) -> Result<Client> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(self.danger_accept_invalid_certs);

        if let Some(proxy_url) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        // Cookie store keeps the provider session between requests
        let http = builder.cookie_store(true).build()?;

        Ok(Client {
            http,
            api_token: RwLock::new(None),
            user_agent: self.user_agent,
            ajax_url: format!("{}/ajax.php", self.base_url),
            base_url: self.base_url,
        })
    }
}
