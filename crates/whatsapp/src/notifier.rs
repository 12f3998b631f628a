use std::sync::Arc;

use balcao_core::{replies, Escalation};
use tracing::{debug, info, warn};

use crate::sender::MessageSender;

/// Side-channel operator alerts.
///
/// Fire-and-forget: a delivery failure is logged and swallowed, and the
/// customer-facing reply is never blocked or altered by it.
pub struct EscalationNotifier {
    sender: Arc<dyn MessageSender>,
    operator_phone: Option<String>,
}

impl EscalationNotifier {
    pub fn new(sender: Arc<dyn MessageSender>, operator_phone: Option<String>) -> Self {
        Self { sender, operator_phone }
    }

    pub async fn notify(&self, escalation: &Escalation) {
        let Some(operator) = &self.operator_phone else {
            debug!(
                event_name = "escalation.skipped",
                subject = escalation.subject,
                "no operator phone configured, escalation skipped"
            );
            return;
        };

        let alert = replies::operator_alert(
            escalation.subject,
            &escalation.sender_id,
            &escalation.original_text,
        );

        match self.sender.send_text(operator, &alert).await {
            Ok(()) => info!(
                event_name = "escalation.sent",
                subject = escalation.subject,
                "operator alerted"
            ),
            Err(error) => warn!(
                event_name = "escalation.send_failed",
                subject = escalation.subject,
                error = %error,
                "operator alert delivery failed"
            ),
        }
    }
}
