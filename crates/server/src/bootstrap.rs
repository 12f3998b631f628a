use std::sync::Arc;

use balcao_catalog::{BlingBackend, CatalogError, CatalogService};
use balcao_core::config::AppConfig;
use balcao_whatsapp::{EscalationNotifier, GraphApiSender, MessageSender, SendError};
use chrono::Duration;
use thiserror::Error;
use tracing::info;

use crate::processor::MessageProcessor;
use crate::webhook::WebhookState;

pub struct Application {
    pub config: AppConfig,
    pub state: WebhookState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("catalog client construction failed: {0}")]
    Catalog(#[source] CatalogError),
    #[error("whatsapp client construction failed: {0}")]
    WhatsApp(#[source] SendError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let backend = BlingBackend::new(&config.bling).map_err(BootstrapError::Catalog)?;
    let catalog = CatalogService::new(
        Arc::new(backend),
        Duration::seconds(config.bling.cache_window_secs as i64),
        config.bling.page_limit,
    );

    let sender: Arc<dyn MessageSender> =
        Arc::new(GraphApiSender::new(&config.whatsapp).map_err(BootstrapError::WhatsApp)?);
    let notifier = EscalationNotifier::new(sender.clone(), config.whatsapp.operator_phone.clone());
    let processor = Arc::new(MessageProcessor::new(catalog, sender, notifier));

    let state =
        WebhookState { verify_token: config.webhook.verify_token.clone(), processor };

    info!(event_name = "system.bootstrap.ready", "application bootstrap complete");
    Ok(Application { config, state })
}
