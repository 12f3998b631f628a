//! Black-box webhook flow: requests go through the real router and replies
//! leave through a recording sender, with the catalog upstream scripted.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use balcao_catalog::{CatalogBackend, CatalogError, CatalogService};
use balcao_core::{replies, Product};
use balcao_server::processor::MessageProcessor;
use balcao_server::webhook::{router, WebhookState};
use balcao_whatsapp::{EscalationNotifier, RecordingSender};
use chrono::Duration;
use rust_decimal::Decimal;
use tower::util::ServiceExt;

struct FailingBackend;

#[async_trait]
impl CatalogBackend for FailingBackend {
    async fn fetch_page(&self, _limit: u32) -> Result<Vec<Product>, CatalogError> {
        Err(CatalogError::MalformedEnvelope)
    }
}

struct FixedBackend(Vec<Product>);

#[async_trait]
impl CatalogBackend for FixedBackend {
    async fn fetch_page(&self, _limit: u32) -> Result<Vec<Product>, CatalogError> {
        Ok(self.0.clone())
    }
}

fn state(backend: Arc<dyn CatalogBackend>) -> (WebhookState, Arc<RecordingSender>) {
    let sender = Arc::new(RecordingSender::new());
    let catalog = CatalogService::new(backend, Duration::seconds(3600), 100);
    let notifier = EscalationNotifier::new(sender.clone(), Some("5511888887777".to_owned()));
    let processor = Arc::new(MessageProcessor::new(catalog, sender.clone(), notifier));
    (WebhookState { verify_token: "verify-secret".to_owned().into(), processor }, sender)
}

fn message_envelope(from: &str, text: &str) -> String {
    format!(
        r#"{{
            "object": "whatsapp_business_account",
            "entry": [{{
                "changes": [{{
                    "value": {{
                        "messages": [{{ "from": "{from}", "text": {{ "body": "{text}" }} }}]
                    }}
                }}]
            }}]
        }}"#
    )
}

fn post_webhook(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request should build")
}

#[tokio::test]
async fn verification_handshake_echoes_the_challenge() {
    let (state, _sender) = state(Arc::new(FailingBackend));

    let response = router(state)
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=verify-secret&hub.challenge=12345")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(&body[..], b"12345");
}

#[tokio::test]
async fn verification_handshake_rejects_a_bad_token() {
    let (state, _sender) = state(Arc::new(FailingBackend));

    let response = router(state)
        .oneshot(
            Request::builder()
                .uri("/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=12345")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stock_question_with_cold_cache_and_dead_upstream_gets_the_retry_reply() {
    let (state, sender) = state(Arc::new(FailingBackend));

    let response = router(state)
        .oneshot(post_webhook(message_envelope("5511999990000", "Olá, vocês têm estoque?")))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK, "ingest always acknowledges with 200");

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "5511999990000");
    assert_eq!(sent[0].body, replies::STOCK_UNAVAILABLE);
}

#[tokio::test]
async fn price_question_lists_products_from_the_upstream() {
    let backend = Arc::new(FixedBackend(vec![
        Product { name: "Fone".to_owned(), price: Decimal::new(9990, 2), stock: 3 },
        Product { name: "Cabo".to_owned(), price: Decimal::new(1999, 2), stock: 0 },
    ]));
    let (state, sender) = state(backend);

    let response = router(state)
        .oneshot(post_webhook(message_envelope("5511999990000", "quanto custa o fone?")))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("• *Fone*: R$ 99.90"));
    assert!(sent[0].body.contains("• *Cabo*: R$ 19.99"));
}

#[tokio::test]
async fn defect_report_alerts_the_operator_and_replies() {
    let (state, sender) = state(Arc::new(FailingBackend));

    let response = router(state)
        .oneshot(post_webhook(message_envelope("5511999990000", "meu fone está com defeito")))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let sent = sender.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].recipient, "5511888887777");
    assert!(sent[0].body.contains(replies::DEFECT_ALERT_SUBJECT));
    assert_eq!(sent[1].recipient, "5511999990000");
    assert_eq!(sent[1].body, replies::DEFECT_HANDOFF);
}

#[tokio::test]
async fn malformed_envelope_is_acknowledged_and_ignored() {
    let (state, sender) = state(Arc::new(FailingBackend));

    let response = router(state)
        .oneshot(post_webhook(r#"{ "object": "whatsapp_business_account", "entry": [] }"#.to_owned()))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn status_endpoint_reports_the_service_online() {
    let (state, _sender) = state(Arc::new(FailingBackend));

    let response = router(state)
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request should build"))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("status JSON");
    assert_eq!(payload["status"], "✅ Bot WhatsApp + Bling rodando!");
    assert!(payload["timestamp"].is_string());
}
