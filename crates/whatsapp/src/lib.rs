//! WhatsApp Cloud API integration
//!
//! This crate provides the messaging-platform interface for tally:
//! - **Verification** (`verify`) - the `hub.mode`/`hub.verify_token` webhook
//!   subscription handshake
//! - **Inbound payloads** (`webhook`) - the nested entry/changes/value shape
//!   delivered on message webhooks, reduced to the first text message
//! - **Outbound client** (`client`) - text and document sends against the
//!   `/{phone_number_id}/messages` endpoint with bearer authentication
//!
//! # Key Types
//!
//! - `Notifier` - trait the pipeline replies through
//! - `WhatsAppClient` - production `Notifier` over HTTP
//! - `VerifyOutcome` - tri-state result of the subscription handshake

pub mod client;
pub mod verify;
pub mod webhook;

pub use client::{Notifier, SendError, WhatsAppClient};
pub use verify::{verify_subscription, VerifyOutcome, VerifyParams};
pub use webhook::{first_text_message, InboundTextMessage, WebhookPayload};
