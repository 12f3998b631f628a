//! Keyword intent classification and reply generation.
//!
//! A single ordered rule table drives dispatch: rules are evaluated top to
//! bottom against the normalized message text and the first match wins. A
//! message mixing keywords from several intents ("tenho um problema com a
//! entrega") therefore resolves deterministically to the highest-priority
//! rule. Matching is substring containment, not whole-word, so multi-word
//! keywords must stay intact in the table and longer phrases must be listed
//! before any shorter keyword they contain.

use crate::product::{format_price, Product};
use crate::replies;
use crate::text::normalize;

/// How many catalog items a listing reply shows.
pub const LISTING_LIMIT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    DefectReport,
    StockInquiry,
    PriceInquiry,
    DeliveryInquiry,
    Greeting,
    Unknown,
}

impl Intent {
    /// Listing intents need a catalog snapshot before a reply can be built.
    pub fn needs_catalog(&self) -> bool {
        matches!(self, Self::StockInquiry | Self::PriceInquiry)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DefectReport => "defect_report",
            Self::StockInquiry => "stock_inquiry",
            Self::PriceInquiry => "price_inquiry",
            Self::DeliveryInquiry => "delivery_inquiry",
            Self::Greeting => "greeting",
            Self::Unknown => "unknown",
        }
    }
}

struct Rule {
    intent: Intent,
    keywords: &'static [&'static str],
}

// Keywords are stored pre-normalized (lowercase, no diacritics).
const RULES: &[Rule] = &[
    Rule {
        intent: Intent::DefectReport,
        keywords: &["defeito", "garantia", "problema", "nao funciona"],
    },
    Rule {
        intent: Intent::StockInquiry,
        keywords: &["tem em estoque", "disponivel", "em estoque", "voces tem"],
    },
    Rule { intent: Intent::PriceInquiry, keywords: &["preco", "quanto custa", "valor", "custa"] },
    Rule {
        intent: Intent::DeliveryInquiry,
        keywords: &["entrega", "frete", "uber", "como recebo"],
    },
    Rule { intent: Intent::Greeting, keywords: &["oi", "ola", "e ai", "tudo bem"] },
];

/// Classifies one raw message. Stateless: no memory across messages.
pub fn classify(raw_text: &str) -> Intent {
    let normalized = normalize(raw_text);
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| normalized.contains(keyword)))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Unknown)
}

/// Side-channel operator alert descriptor. Returned next to the reply so the
/// dispatch layer, not the rule logic, decides whether and when the send
/// happens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Escalation {
    pub subject: &'static str,
    pub sender_id: String,
    pub original_text: String,
}

impl Escalation {
    fn new(subject: &'static str, sender_id: &str, original_text: &str) -> Self {
        Self {
            subject,
            sender_id: sender_id.to_owned(),
            original_text: original_text.to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub reply: String,
    pub escalation: Option<Escalation>,
}

impl Response {
    fn plain(reply: String) -> Self {
        Self { reply, escalation: None }
    }
}

/// Builds the reply (and optional escalation descriptor) for a classified
/// message. Pure: catalog data is passed in, never fetched here. Intents that
/// do not list products ignore `products`; callers pass an empty slice.
pub fn respond(intent: Intent, sender_id: &str, raw_text: &str, products: &[Product]) -> Response {
    match intent {
        Intent::DefectReport => Response {
            reply: replies::DEFECT_HANDOFF.to_owned(),
            escalation: Some(Escalation::new(replies::DEFECT_ALERT_SUBJECT, sender_id, raw_text)),
        },
        Intent::StockInquiry => Response::plain(stock_listing(products)),
        Intent::PriceInquiry => Response::plain(price_listing(products)),
        Intent::DeliveryInquiry => Response {
            reply: replies::DELIVERY_OPTIONS.to_owned(),
            escalation: Some(Escalation::new(
                replies::DELIVERY_ALERT_SUBJECT,
                sender_id,
                raw_text,
            )),
        },
        Intent::Greeting => Response::plain(replies::WELCOME_MENU.to_owned()),
        Intent::Unknown => Response::plain(replies::FALLBACK_MENU.to_owned()),
    }
}

// An empty snapshot means the catalog could not be reached and the cache is
// still cold; the customer gets a retry message rather than an error.
fn stock_listing(products: &[Product]) -> String {
    if products.is_empty() {
        return replies::STOCK_UNAVAILABLE.to_owned();
    }

    let mut body = String::from(replies::STOCK_HEADER);
    let mut any_in_stock = false;
    for product in products.iter().take(LISTING_LIMIT).filter(|product| product.in_stock()) {
        any_in_stock = true;
        body.push_str(&format!(
            "✅ *{}*\n   Preço: R$ {}\n   Estoque: {} unidades\n\n",
            product.name,
            format_price(product.price),
            product.stock,
        ));
    }

    if !any_in_stock {
        return replies::OUT_OF_STOCK.to_owned();
    }

    body.push_str(replies::STOCK_FOOTER);
    body
}

fn price_listing(products: &[Product]) -> String {
    if products.is_empty() {
        return replies::PRICES_UNAVAILABLE.to_owned();
    }

    let mut body = String::from(replies::PRICE_HEADER);
    for product in products.iter().take(LISTING_LIMIT) {
        body.push_str(&format!("• *{}*: R$ {}\n", product.name, format_price(product.price)));
    }
    body.push_str(replies::PRICE_FOOTER);
    body
}
