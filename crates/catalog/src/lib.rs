//! Catalog access for the balcao webhook relay.
//!
//! The whole upstream catalog is one cache unit: Bling only exposes bulk
//! fetch, so the product list is replaced wholesale and aged as a single
//! snapshot. Upstream trouble never surfaces as an error to callers; it
//! degrades to the last cached snapshot, signalled only by a possibly-empty
//! list.

pub mod cache;
pub mod client;

pub use cache::CatalogCache;
pub use client::{BlingBackend, CatalogBackend, CatalogError, CatalogService};
