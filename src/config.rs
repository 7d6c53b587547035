//! Server and provider configuration

use crate::client::ClientBuilder;
use crate::{Error, Result};
use std::env;
use std::net::SocketAddr;

const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub provider: ProviderConfig,
}

/// GuerrillaMail connection settings
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub base_url: Option<String>,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
    pub accept_invalid_certs: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Reads from `.env` file if present. All variables are optional:
    /// - `TEMPMAIL_BIND` (default: `127.0.0.1:5000`)
    /// - `GUERRILLA_BASE_URL` (default: `https://www.guerrillamail.com`)
    /// - `GUERRILLA_PROXY`
    /// - `GUERRILLA_USER_AGENT`
    /// - `GUERRILLA_ACCEPT_INVALID_CERTS` (default: `true`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bind: env::var("TEMPMAIL_BIND")
                .unwrap_or_else(|_| DEFAULT_BIND.to_string())
                .parse()
                .map_err(|e| Error::Config(format!("Invalid TEMPMAIL_BIND: {e}")))?,
            provider: ProviderConfig {
                base_url: env::var("GUERRILLA_BASE_URL").ok(),
                proxy: env::var("GUERRILLA_PROXY").ok(),
                user_agent: env::var("GUERRILLA_USER_AGENT").ok(),
                accept_invalid_certs: env::var("GUERRILLA_ACCEPT_INVALID_CERTS")
                    .map_or(Ok(true), |v| parse_bool(&v))
                    .map_err(|e| {
                        Error::Config(format!("Invalid GUERRILLA_ACCEPT_INVALID_CERTS: {e}"))
                    })?,
            },
        })
    }
}

impl ProviderConfig {
    /// Client builder carrying these settings.
    pub fn client_builder(&self) -> ClientBuilder {
        let mut builder =
            ClientBuilder::new().danger_accept_invalid_certs(self.accept_invalid_certs);
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(proxy);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        builder
    }
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_boolean_flags() {
        assert_eq!(parse_bool("TRUE"), Ok(true));
        assert_eq!(parse_bool(" 0 "), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }
}
