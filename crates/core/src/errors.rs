use thiserror::Error;

/// Terminal pricing outcomes other than a priced order. Each variant maps to
/// a distinct user-facing reply; none is ever retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("product `{product}` is not in the catalog")]
    ProductNotFound { product: String },
    #[error("order quantity is missing, zero, or negative")]
    InvalidQuantity,
}

impl PricingError {
    pub fn user_message(&self) -> String {
        match self {
            Self::ProductNotFound { product } => {
                format!("Sorry, we do not sell {product}.")
            }
            Self::InvalidQuantity => {
                "Please include a valid quantity, for example: 2 kg sugar.".to_string()
            }
        }
    }
}
