//! WhatsApp delivery for the balcao webhook relay.
//!
//! Outbound sends go through the `MessageSender` trait so the processing
//! pipeline and the tests never touch the Graph API directly:
//! - `GraphApiSender` - Cloud API text messages with bearer auth
//! - `RecordingSender` / `NoopSender` - test doubles
//! - `EscalationNotifier` - fire-and-forget operator alerts

pub mod notifier;
pub mod sender;

pub use notifier::EscalationNotifier;
pub use sender::{GraphApiSender, MessageSender, NoopSender, RecordingSender, SendError, SentMessage};
