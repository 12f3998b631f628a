use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use balcao_core::config::BlingConfig;
use balcao_core::Product;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::CatalogCache;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("catalog response was missing the product envelope")]
    MalformedEnvelope,
}

/// One bulk page fetch against the upstream commerce API.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn fetch_page(&self, limit: u32) -> Result<Vec<Product>, CatalogError>;
}

/// Bling API v2 product listing client.
pub struct BlingBackend {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl BlingBackend {
    pub fn new(config: &BlingConfig) -> Result<Self, CatalogError> {
        let http =
            Client::builder().timeout(StdDuration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl CatalogBackend for BlingBackend {
    async fn fetch_page(&self, limit: u32) -> Result<Vec<Product>, CatalogError> {
        let url = format!("{}/Api/v2/produtos/json", self.base_url);
        let limit = limit.to_string();

        let envelope = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.expose_secret()), ("limite", limit.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<BlingEnvelope>()
            .await?;

        parse_envelope(envelope)
    }
}

// Bling wraps the listing as retorno.produtos[].produto and serializes the
// numeric fields as strings.
#[derive(Debug, Deserialize)]
struct BlingEnvelope {
    retorno: Option<BlingRetorno>,
}

#[derive(Debug, Deserialize)]
struct BlingRetorno {
    produtos: Option<Vec<BlingProdutoWrapper>>,
}

#[derive(Debug, Deserialize)]
struct BlingProdutoWrapper {
    produto: BlingProduto,
}

#[derive(Debug, Deserialize)]
struct BlingProduto {
    #[serde(default)]
    nome: String,
    #[serde(default)]
    preco: Option<Value>,
    #[serde(default)]
    estoque: Option<Value>,
}

fn parse_envelope(envelope: BlingEnvelope) -> Result<Vec<Product>, CatalogError> {
    let produtos = envelope
        .retorno
        .and_then(|retorno| retorno.produtos)
        .ok_or(CatalogError::MalformedEnvelope)?;

    Ok(produtos
        .into_iter()
        .map(|wrapper| Product {
            name: wrapper.produto.nome,
            price: coerce_decimal(wrapper.produto.preco.as_ref()),
            stock: coerce_stock(wrapper.produto.estoque.as_ref()),
        })
        .collect())
}

// Malformed numeric fields coerce to zero instead of failing the payload.
fn coerce_decimal(value: Option<&Value>) -> Decimal {
    match value {
        Some(Value::String(raw)) => raw.trim().parse().unwrap_or(Decimal::ZERO),
        Some(Value::Number(number)) => number.to_string().parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

fn coerce_stock(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::String(raw)) => raw.trim().parse().unwrap_or(0),
        Some(Value::Number(number)) => {
            number.as_u64().and_then(|quantity| u32::try_from(quantity).ok()).unwrap_or(0)
        }
        _ => 0,
    }
}

/// Cache-fronted catalog reads.
pub struct CatalogService {
    backend: Arc<dyn CatalogBackend>,
    cache: CatalogCache,
    page_limit: u32,
}

impl CatalogService {
    pub fn new(backend: Arc<dyn CatalogBackend>, window: Duration, page_limit: u32) -> Self {
        Self { backend, cache: CatalogCache::new(window), page_limit }
    }

    /// Best-known product list. Never fails: upstream trouble degrades to
    /// the last cached snapshot, which may be stale or empty.
    pub async fn products(&self) -> Vec<Product> {
        self.products_at(Utc::now()).await
    }

    pub async fn products_at(&self, now: DateTime<Utc>) -> Vec<Product> {
        if self.cache.is_fresh(now) {
            debug!(event_name = "catalog.cache_hit", "serving catalog from cache");
            return self.cache.get();
        }

        match self.backend.fetch_page(self.page_limit).await {
            Ok(products) if !products.is_empty() => {
                info!(
                    event_name = "catalog.refreshed",
                    product_count = products.len(),
                    "catalog refreshed from upstream"
                );
                self.cache.set(products.clone(), now);
                products
            }
            Ok(_) => {
                warn!(
                    event_name = "catalog.empty_page",
                    "upstream returned an empty product page, keeping cached snapshot"
                );
                self.cache.get()
            }
            Err(error) => {
                warn!(
                    event_name = "catalog.fetch_failed",
                    error = %error,
                    "catalog fetch failed, falling back to cached snapshot"
                );
                self.cache.get()
            }
        }
    }
}
