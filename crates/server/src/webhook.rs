use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::processor::{InboundMessage, MessageProcessor};

#[derive(Clone)]
pub struct WebhookState {
    pub verify_token: SecretString,
    pub processor: Arc<MessageProcessor>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/webhook", get(verify).post(receive))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Platform subscription handshake: echo the challenge for a matching
/// verify token, reject everything else with 403.
pub async fn verify(
    State(state): State<WebhookState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let subscribed = params.mode.as_deref() == Some("subscribe")
        && params.verify_token.as_deref() == Some(state.verify_token.expose_secret());

    if subscribed {
        info!(event_name = "webhook.verified", "webhook verification handshake accepted");
        (StatusCode::OK, params.challenge.unwrap_or_default()).into_response()
    } else {
        warn!(
            event_name = "webhook.verification_rejected",
            "webhook verification handshake rejected"
        );
        StatusCode::FORBIDDEN.into_response()
    }
}

/// Message ingest. Always acknowledges with 200: the platform expects a fast
/// acknowledgment and retries on anything else, and processing failures are
/// surfaced to the customer through chat replies, never through HTTP.
pub async fn receive(
    State(state): State<WebhookState>,
    Json(envelope): Json<WebhookEnvelope>,
) -> StatusCode {
    match extract_message(&envelope) {
        Some(message) => {
            state.processor.process(message).await;
        }
        None => {
            debug!(event_name = "webhook.ignored", "webhook payload carried no text message");
        }
    }

    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub timestamp: String,
}

pub async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "✅ Bot WhatsApp + Bling rodando!",
        timestamp: Utc::now().to_rfc3339(),
    })
}

// Every field is optional so a structurally unexpected payload deserializes
// to an envelope that simply yields no message.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    object: Option<String>,
    #[serde(default)]
    entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookEntry {
    #[serde(default)]
    changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookChange {
    #[serde(default)]
    value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<WebhookMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookMessage {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    text: Option<TextPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct TextPayload {
    #[serde(default)]
    body: Option<String>,
}

/// Pulls the first text message out of the first entry/change/value that
/// carries one. Anything malformed or non-text is a no-op.
fn extract_message(envelope: &WebhookEnvelope) -> Option<InboundMessage> {
    if envelope.object.as_deref() != Some("whatsapp_business_account") {
        return None;
    }

    let message = envelope
        .entry
        .iter()
        .flat_map(|entry| entry.changes.iter())
        .find(|change| !change.value.messages.is_empty())
        .map(|change| &change.value.messages[0])?;

    let sender_id = message.from.as_deref()?.to_owned();
    let text = message.text.as_ref()?.body.as_deref()?.to_owned();
    if sender_id.is_empty() || text.is_empty() {
        return None;
    }

    Some(InboundMessage { sender_id, text })
}

#[cfg(test)]
mod tests {
    use super::{extract_message, WebhookEnvelope};

    fn envelope(raw: &str) -> WebhookEnvelope {
        serde_json::from_str(raw).expect("test payload should be valid JSON")
    }

    #[test]
    fn extracts_the_first_text_message() {
        let envelope = envelope(
            r#"{
                "object": "whatsapp_business_account",
                "entry": [{
                    "changes": [{
                        "value": {
                            "messages": [
                                { "from": "5511999990000", "text": { "body": "oi" } },
                                { "from": "5511888887777", "text": { "body": "segundo" } }
                            ]
                        }
                    }]
                }]
            }"#,
        );

        let message = extract_message(&envelope).expect("message should be extracted");
        assert_eq!(message.sender_id, "5511999990000");
        assert_eq!(message.text, "oi");
    }

    #[test]
    fn skips_changes_without_messages() {
        let envelope = envelope(
            r#"{
                "object": "whatsapp_business_account",
                "entry": [{
                    "changes": [
                        { "value": { "messages": [] } },
                        { "value": { "messages": [{ "from": "551100", "text": { "body": "ola" } }] } }
                    ]
                }]
            }"#,
        );

        let message = extract_message(&envelope).expect("second change carries the message");
        assert_eq!(message.sender_id, "551100");
    }

    #[test]
    fn ignores_foreign_objects_and_structural_gaps() {
        assert!(extract_message(&envelope(r#"{ "object": "instagram", "entry": [] }"#)).is_none());
        assert!(extract_message(&envelope(r#"{}"#)).is_none());
        assert!(extract_message(&envelope(
            r#"{ "object": "whatsapp_business_account", "entry": [{ "changes": [] }] }"#
        ))
        .is_none());
        // Status-only notification: a message without a text body.
        assert!(extract_message(&envelope(
            r#"{
                "object": "whatsapp_business_account",
                "entry": [{ "changes": [{ "value": { "messages": [{ "from": "551100" }] } }] }]
            }"#
        ))
        .is_none());
    }
}
