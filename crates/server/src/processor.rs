use std::sync::Arc;

use balcao_core::{classify, respond};
use balcao_catalog::CatalogService;
use balcao_whatsapp::{EscalationNotifier, MessageSender};
use tracing::{info, warn};

/// One inbound customer message, as extracted from the webhook envelope.
/// Transient: nothing about the conversation is persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: String,
    pub text: String,
}

/// Runs one message to completion: classify, gather catalog data when the
/// intent needs it, attempt the operator escalation, reply to the customer.
///
/// The processor owns effect sequencing; the rule logic only returns
/// descriptors. Send failures (reply or escalation) are logged and never
/// reach the webhook acknowledgment.
pub struct MessageProcessor {
    catalog: CatalogService,
    sender: Arc<dyn MessageSender>,
    notifier: EscalationNotifier,
}

impl MessageProcessor {
    pub fn new(
        catalog: CatalogService,
        sender: Arc<dyn MessageSender>,
        notifier: EscalationNotifier,
    ) -> Self {
        Self { catalog, sender, notifier }
    }

    /// Returns the reply text so tests can assert on it.
    pub async fn process(&self, message: InboundMessage) -> String {
        let intent = classify(&message.text);
        info!(
            event_name = "message.received",
            sender = %message.sender_id,
            intent = intent.label(),
            "inbound message classified"
        );

        let products =
            if intent.needs_catalog() { self.catalog.products().await } else { Vec::new() };
        let response = respond(intent, &message.sender_id, &message.text, &products);

        if let Some(escalation) = &response.escalation {
            self.notifier.notify(escalation).await;
        }

        if let Err(error) = self.sender.send_text(&message.sender_id, &response.reply).await {
            warn!(
                event_name = "message.reply_failed",
                sender = %message.sender_id,
                error = %error,
                "customer reply delivery failed"
            );
        }

        response.reply
    }
}
