use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use balcao_core::config::WhatsAppConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("message delivery request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("message delivery rejected with status {status}")]
    Rejected { status: u16 },
}

/// Delivers one text message to a chat participant. Callers log failures and
/// move on; a failed send never changes the webhook acknowledgment.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, recipient: &str, body: &str) -> Result<(), SendError>;
}

/// WhatsApp Cloud API text sender.
pub struct GraphApiSender {
    http: Client,
    api_base_url: String,
    phone_number_id: String,
    access_token: SecretString,
}

#[derive(Serialize)]
struct TextMessageRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: TextBody<'a>,
}

#[derive(Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

impl GraphApiSender {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, SendError> {
        let http = Client::builder().timeout(std::time::Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            phone_number_id: config.phone_number_id.clone(),
            access_token: config.access_token.clone(),
        })
    }
}

#[async_trait]
impl MessageSender for GraphApiSender {
    async fn send_text(&self, recipient: &str, body: &str) -> Result<(), SendError> {
        let url = format!("{}/{}/messages", self.api_base_url, self.phone_number_id);
        let payload = TextMessageRequest {
            messaging_product: "whatsapp",
            to: recipient,
            message_type: "text",
            text: TextBody { body },
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SendError::Rejected { status: response.status().as_u16() });
        }

        info!(event_name = "whatsapp.message_sent", recipient = %recipient, "message delivered");
        Ok(())
    }
}

/// Discards every send. Stand-in wherever delivery is irrelevant.
#[derive(Default)]
pub struct NoopSender;

#[async_trait]
impl MessageSender for NoopSender {
    async fn send_text(&self, _recipient: &str, _body: &str) -> Result<(), SendError> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub body: String,
}

/// Captures sends for assertions; can be switched to reject everything.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SentMessage>>,
    reject: AtomicBool,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_all(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_text(&self, recipient: &str, body: &str) -> Result<(), SendError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(SendError::Rejected { status: 500 });
        }

        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentMessage { recipient: recipient.to_owned(), body: body.to_owned() });
        Ok(())
    }
}
