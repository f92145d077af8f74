use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tally_core::order::CandidateOrder;
use thiserror::Error;
use tracing::debug;

use crate::llm::LlmClient;

/// Extraction could not produce a candidate order. The reason is internal
/// detail for logging; the customer always gets the same reply.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("order extraction failed: {reason}")]
pub struct ExtractionFailed {
    reason: String,
}

impl ExtractionFailed {
    fn because(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Converts free text into a `CandidateOrder` through one LLM call per
/// invocation. Every malformed outcome - unreachable service, non-JSON text,
/// missing fields - is caught here and mapped to `ExtractionFailed`.
pub struct OrderExtractor {
    llm: Arc<dyn LlmClient>,
}

/// Exact shape the model is instructed to return.
#[derive(Debug, Deserialize)]
struct ExtractedOrderWire {
    product: String,
    #[serde(default)]
    quantity: Value,
    #[serde(default)]
    unit: Option<String>,
}

impl OrderExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn extract(&self, text: &str) -> Result<CandidateOrder, ExtractionFailed> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ExtractionFailed::because("message text is empty"));
        }

        let prompt = build_prompt(trimmed);
        let raw = match self.llm.complete(&prompt).await {
            Ok(raw) => raw,
            Err(error) => {
                debug!(event_name = "agent.extract.llm_error", error = %error, "llm call failed");
                return Err(ExtractionFailed::because(format!("llm call failed: {error}")));
            }
        };

        parse_response(&raw).map_err(|failed| {
            debug!(
                event_name = "agent.extract.parse_error",
                error = %failed,
                "llm response did not match the expected order shape"
            );
            failed
        })
    }
}

fn build_prompt(message: &str) -> String {
    format!(
        "Extract the order from the customer message below.\n\
         Reply with JSON only, no prose, in exactly this shape:\n\
         {{\"product\": \"sugar\", \"quantity\": 2, \"unit\": \"kg\"}}\n\
         Use null for anything the message does not state.\n\n\
         Customer message: {message}"
    )
}

fn parse_response(raw: &str) -> Result<CandidateOrder, ExtractionFailed> {
    let body = strip_code_fences(raw);
    let wire: ExtractedOrderWire = serde_json::from_str(body)
        .map_err(|error| ExtractionFailed::because(format!("response was not order json: {error}")))?;

    let product_name = wire.product.trim().to_string();
    if product_name.is_empty() {
        return Err(ExtractionFailed::because("response contained no product name"));
    }

    Ok(CandidateOrder {
        product_name,
        quantity: normalize_quantity(&wire.quantity),
        unit: wire.unit.map(|unit| unit.trim().to_string()).unwrap_or_default(),
    })
}

/// The model may return the quantity as a JSON number or a numeric string.
/// Anything else (null, objects, unparsable text) becomes `None` and is
/// rejected later by the pricing engine as an invalid quantity.
fn normalize_quantity(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => number.to_string().parse().ok(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop an optional language tag after the opening fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
