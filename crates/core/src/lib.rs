//! Domain core for the balcao webhook relay.
//!
//! Everything in this crate is pure and synchronous: text normalization,
//! the ordered intent rule table, reply rendering, and the layered
//! application configuration. Network effects (catalog fetches, WhatsApp
//! sends) live in the sibling crates and are driven by the descriptors
//! returned here.

pub mod config;
pub mod intent;
pub mod product;
pub mod replies;
pub mod text;

pub use intent::{classify, respond, Escalation, Intent, Response};
pub use product::{format_price, Product};
pub use text::normalize;
