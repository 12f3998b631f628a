use std::sync::{Mutex, MutexGuard};

use balcao_core::Product;
use chrono::{DateTime, Duration, Utc};

/// Time-windowed snapshot of the upstream product list.
///
/// One mutex guards both the list and its fetch timestamp, so `get`, `set`
/// and `is_fresh` are each atomic and a reader can never observe a product
/// list paired with a mismatched timestamp. `fetched_at` only advances on
/// successful refreshes.
pub struct CatalogCache {
    window: Duration,
    state: Mutex<CacheState>,
}

struct CacheState {
    products: Vec<Product>,
    fetched_at: Option<DateTime<Utc>>,
}

impl CatalogCache {
    pub fn new(window: Duration) -> Self {
        Self { window, state: Mutex::new(CacheState { products: Vec::new(), fetched_at: None }) }
    }

    /// True iff the snapshot is non-empty and younger than the freshness
    /// window. A snapshot exactly as old as the window is stale.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let state = self.lock();
        match state.fetched_at {
            Some(fetched_at) if !state.products.is_empty() => now - fetched_at < self.window,
            _ => false,
        }
    }

    /// Replaces the product list and its timestamp in one critical section.
    pub fn set(&self, products: Vec<Product>, now: DateTime<Utc>) {
        let mut state = self.lock();
        state.products = products;
        state.fetched_at = Some(now);
    }

    /// Current product list, possibly empty or stale.
    pub fn get(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    /// Consistent (products, fetched_at) pair.
    pub fn snapshot(&self) -> (Vec<Product>, Option<DateTime<Utc>>) {
        let state = self.lock();
        (state.products.clone(), state.fetched_at)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // A poisoned lock only means a panic elsewhere; the cache data is
        // still a consistent pair.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
