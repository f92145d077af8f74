//! Order pipeline
//!
//! Sequences extraction, pricing, rendering, and the reply for one inbound
//! message. All branching lives in the extractor and the pricing engine; this
//! module only wires their terminal outcomes to customer replies.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_agent::OrderExtractor;
use tally_core::errors::PricingError;
use tally_core::order::PricedOrder;
use tally_core::pricing::PricingEngine;
use tally_whatsapp::client::{Notifier, SendError};
use tally_whatsapp::webhook::InboundTextMessage;
use thiserror::Error;
use tracing::info;

use crate::invoice::{InvoiceRenderer, RenderError};

pub const REPLY_NOT_UNDERSTOOD: &str =
    "Sorry, I could not understand your order. Please send it like: 2 kg sugar.";

/// Delivery-side fault: the reply or the invoice could not be produced.
/// Surfaced as a server error at the boundary, never retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reply delivery failed: {0}")]
    Delivery(#[from] SendError),
    #[error("invoice rendering failed: {0}")]
    Render(#[from] RenderError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Order priced, invoice delivered.
    Invoiced { total: Decimal },
    /// Extraction failed; the sender was asked to rephrase.
    NotUnderstood,
    /// Pricing rejected the candidate; the sender got the specific reason.
    NotPriced(PricingError),
}

pub struct Pipeline {
    extractor: OrderExtractor,
    pricing: Arc<dyn PricingEngine>,
    renderer: Arc<InvoiceRenderer>,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    pub fn new(
        extractor: OrderExtractor,
        pricing: Arc<dyn PricingEngine>,
        renderer: Arc<InvoiceRenderer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { extractor, pricing, renderer, notifier }
    }

    pub fn renderer(&self) -> &InvoiceRenderer {
        &self.renderer
    }

    /// Run one message through extract → price → render → reply. Business
    /// failures are answered to the sender and reported as an `Ok` outcome;
    /// only delivery faults escape as errors.
    pub async fn handle(
        &self,
        message: &InboundTextMessage,
    ) -> Result<PipelineOutcome, PipelineError> {
        let candidate = match self.extractor.extract(&message.body).await {
            Ok(candidate) => candidate,
            Err(failed) => {
                info!(
                    event_name = "pipeline.extraction_failed",
                    sender = %message.from,
                    error = %failed,
                    "could not extract an order from the message"
                );
                self.notifier.send_text(&message.from, REPLY_NOT_UNDERSTOOD).await?;
                return Ok(PipelineOutcome::NotUnderstood);
            }
        };

        let priced = match self.pricing.price(&candidate) {
            Ok(priced) => priced,
            Err(error) => {
                info!(
                    event_name = "pipeline.pricing_rejected",
                    sender = %message.from,
                    product = %candidate.product_name,
                    error = %error,
                    "candidate order failed pricing validation"
                );
                self.notifier.send_text(&message.from, &error.user_message()).await?;
                return Ok(PipelineOutcome::NotPriced(error));
            }
        };

        let artifact = self.renderer.render(&priced, &message.from).await?;
        self.notifier.send_text(&message.from, &confirmation_text(&priced)).await?;
        self.notifier
            .send_document(
                &message.from,
                &artifact.public_url,
                &artifact.file_name,
                &format!("Invoice {}", artifact.invoice_number),
            )
            .await?;

        info!(
            event_name = "pipeline.invoiced",
            sender = %message.from,
            product = %priced.product_name,
            total = %priced.total,
            invoice_number = %artifact.invoice_number,
            "order priced and invoice delivered"
        );
        Ok(PipelineOutcome::Invoiced { total: priced.total })
    }
}

fn confirmation_text(order: &PricedOrder) -> String {
    format!(
        "Order confirmed: {} {}. Unit price {}, total {}. Your invoice is on the way.",
        order.quantity_label(),
        order.product_name,
        order.unit_price,
        order.total
    )
}
