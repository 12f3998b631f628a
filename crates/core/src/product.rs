use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One upstream catalog item. Sourced verbatim from the commerce backend,
/// recreated wholesale on every successful cache refresh, never mutated
/// locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Renders a price with exactly two fractional digits.
///
/// Rounding is half-to-even, so `19.999` becomes `"20.00"` and `2.345`
/// becomes `"2.34"`.
pub fn format_price(price: Decimal) -> String {
    format!("{:.2}", price.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
}
