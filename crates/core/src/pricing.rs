use rust_decimal::Decimal;

use crate::catalog::Catalog;
use crate::errors::PricingError;
use crate::order::{CandidateOrder, PricedOrder};

pub trait PricingEngine: Send + Sync {
    fn price(&self, candidate: &CandidateOrder) -> Result<PricedOrder, PricingError>;
}

/// Deterministic pricing against the startup catalog. Validation is terminal
/// in one step each: unknown product, then quantity, then the exact decimal
/// multiply. A failed attempt is final for that message.
pub struct CatalogPricingEngine {
    catalog: Catalog,
}

impl CatalogPricingEngine {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl PricingEngine for CatalogPricingEngine {
    fn price(&self, candidate: &CandidateOrder) -> Result<PricedOrder, PricingError> {
        let entry = self.catalog.find(&candidate.product_name).ok_or_else(|| {
            PricingError::ProductNotFound { product: candidate.product_name.trim().to_string() }
        })?;

        let quantity = match candidate.quantity {
            Some(quantity) if quantity > Decimal::ZERO => quantity,
            _ => return Err(PricingError::InvalidQuantity),
        };

        Ok(PricedOrder {
            product_name: entry.name.clone(),
            quantity,
            unit: candidate.unit.clone(),
            unit_price: entry.unit_price,
            total: entry.unit_price * quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::catalog::{Catalog, CatalogEntry};
    use crate::errors::PricingError;
    use crate::order::CandidateOrder;

    use super::{CatalogPricingEngine, PricingEngine};

    fn engine() -> CatalogPricingEngine {
        CatalogPricingEngine::new(Catalog::new(vec![
            CatalogEntry { name: "sugar".to_string(), unit_price: Decimal::from(40) },
            CatalogEntry { name: "oil".to_string(), unit_price: Decimal::from(120) },
        ]))
    }

    fn candidate(product: &str, quantity: Option<Decimal>, unit: &str) -> CandidateOrder {
        CandidateOrder {
            product_name: product.to_string(),
            quantity,
            unit: unit.to_string(),
        }
    }

    #[test]
    fn prices_two_kg_of_sugar() {
        let priced = engine()
            .price(&candidate("sugar", Some(Decimal::from(2)), "kg"))
            .expect("sugar should price");

        assert_eq!(priced.unit_price, Decimal::from(40));
        assert_eq!(priced.total, Decimal::from(80));
        assert_eq!(priced.unit, "kg");
    }

    #[test]
    fn prices_one_liter_of_oil() {
        let priced = engine()
            .price(&candidate("oil", Some(Decimal::ONE), "liter"))
            .expect("oil should price");

        assert_eq!(priced.unit_price, Decimal::from(120));
        assert_eq!(priced.total, Decimal::from(120));
    }

    #[test]
    fn fractional_quantity_multiplies_without_precision_loss() {
        let quantity = "1.5".parse::<Decimal>().expect("literal quantity");
        let priced = engine()
            .price(&candidate("sugar", Some(quantity), "kg"))
            .expect("fractional sugar should price");

        assert_eq!(priced.total, Decimal::from(60));
    }

    #[test]
    fn unknown_product_is_terminal() {
        let error = engine()
            .price(&candidate("flour", Some(Decimal::from(2)), "kg"))
            .expect_err("flour is not in the catalog");

        assert_eq!(error, PricingError::ProductNotFound { product: "flour".to_string() });
    }

    #[test]
    fn product_lookup_matches_any_case() {
        let priced = engine()
            .price(&candidate("SUGAR", Some(Decimal::from(3)), "kg"))
            .expect("uppercase product should resolve");
        assert_eq!(priced.total, Decimal::from(120));
    }

    #[test]
    fn negative_quantity_is_invalid() {
        let error = engine()
            .price(&candidate("sugar", Some(Decimal::from(-3)), "kg"))
            .expect_err("negative quantity must not price");
        assert_eq!(error, PricingError::InvalidQuantity);
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let error = engine()
            .price(&candidate("sugar", Some(Decimal::ZERO), "kg"))
            .expect_err("zero quantity must not price");
        assert_eq!(error, PricingError::InvalidQuantity);
    }

    #[test]
    fn missing_quantity_is_invalid_even_for_known_products() {
        let error = engine()
            .price(&candidate("oil", None, "liter"))
            .expect_err("missing quantity must not price");
        assert_eq!(error, PricingError::InvalidQuantity);
    }

    #[test]
    fn product_check_runs_before_quantity_check() {
        // Unknown product with a broken quantity still reports the product.
        let error = engine()
            .price(&candidate("flour", None, "kg"))
            .expect_err("unknown product should be terminal first");
        assert!(matches!(error, PricingError::ProductNotFound { .. }));
    }
}
