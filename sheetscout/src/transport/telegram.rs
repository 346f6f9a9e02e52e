//! Telegram Bot API transport.
//!
//! Long polling over `getUpdates` and replies through `sendMessage`, on a
//! blocking reqwest client. The bot token is part of every method URL, so it
//! is scrubbed from any error text this module produces.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace};

use super::{ChatId, Notifier, Transport, Update};
use crate::config::TelegramConfig;
use crate::errors::{SearchError, SearchResult};

const USER_AGENT: &str = concat!("sheetscout/", env!("CARGO_PKG_VERSION"));

/// Longest text `sendMessage` accepts, in characters
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Extra time the HTTP client waits beyond the long-poll window
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    update_id: i64,
    message: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    chat: RawChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        let (chat_id, text) = match raw.message {
            Some(message) => (Some(message.chat.id), message.text),
            None => (None, None),
        };
        Update {
            update_id: raw.update_id,
            chat_id,
            text,
        }
    }
}

/// Bot API client (blocking)
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
    poll_timeout: Duration,
}

impl TelegramClient {
    /// Builds a client from the `telegram` section of the configuration
    pub fn from_config(config: &TelegramConfig) -> SearchResult<Self> {
        let token = config
            .bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SearchError::config_error("missing telegram.bot_token"))?;
        Self::new(&config.api_base, token, config.poll_timeout)
    }

    pub fn new(api_base: &str, token: &str, poll_timeout: Duration) -> SearchResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(poll_timeout + POLL_GRACE)
            .build()
            .map_err(|e| SearchError::config_error(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            poll_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Replaces the bot token in `text`
    fn redact(&self, text: &str) -> String {
        text.replace(&self.token, "<token>")
    }

    /// Sends a request and unwraps the Bot API envelope
    fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::blocking::RequestBuilder,
    ) -> SearchResult<T> {
        let response = request.send().map_err(|e| {
            SearchError::transport(format!(
                "{} failed: {}",
                method,
                self.redact(&e.without_url().to_string())
            ))
        })?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().map_err(|e| {
            SearchError::transport(format!(
                "{} returned HTTP {} with an unreadable body: {}",
                method,
                status.as_u16(),
                self.redact(&e.without_url().to_string())
            ))
        })?;

        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| "no description".to_string());
            return Err(SearchError::transport(format!(
                "{} rejected (HTTP {}): {}",
                method,
                status.as_u16(),
                self.redact(&description)
            )));
        }

        envelope
            .result
            .ok_or_else(|| SearchError::transport(format!("{} returned no result", method)))
    }
}

impl Transport for TelegramClient {
    fn get_updates(&self, offset: Option<i64>) -> SearchResult<Vec<Update>> {
        let mut params = vec![
            ("timeout", self.poll_timeout.as_secs().to_string()),
            ("allowed_updates", "[\"message\"]".to_string()),
        ];
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }

        trace!("Polling for updates from offset {:?}", offset);
        let request = self.http.get(self.method_url("getUpdates")).query(&params);
        let raw: Vec<RawUpdate> = self.call("getUpdates", request)?;
        debug!("Received {} updates", raw.len());

        Ok(raw.into_iter().map(Update::from).collect())
    }
}

impl Notifier for TelegramClient {
    fn reply(&self, chat_id: ChatId, text: &str) -> SearchResult<()> {
        let text = clamp_message(text);
        let request = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }));

        let _sent: serde_json::Value = self.call("sendMessage", request)?;
        debug!("Replied to chat {}", chat_id);
        Ok(())
    }
}

/// Cuts `text` to the platform limit, marking the cut with an ellipsis
fn clamp_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut clamped: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    clamped.push('…');
    clamped
}
