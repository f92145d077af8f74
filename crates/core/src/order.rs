use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unvalidated order shape produced by extraction. `quantity` is `None` when
/// the model omitted it or returned something non-numeric; a present value may
/// still be zero or negative, and `product_name` may not exist in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateOrder {
    pub product_name: String,
    pub quantity: Option<Decimal>,
    pub unit: String,
}

/// Validated order with a computed total. Exists only after a successful
/// catalog match and quantity check; `total = unit_price * quantity` exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedOrder {
    pub product_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub total: Decimal,
}

impl PricedOrder {
    /// Quantity + unit as shown to the customer, e.g. `2 kg` or just `2`
    /// when the extractor produced no unit.
    pub fn quantity_label(&self) -> String {
        if self.unit.is_empty() {
            self.quantity.to_string()
        } else {
            format!("{} {}", self.quantity, self.unit)
        }
    }
}
