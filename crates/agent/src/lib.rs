//! Order extraction - LLM-backed free-text understanding
//!
//! This crate turns an inbound chat message into a structured candidate order:
//! - `LlmClient` - pluggable completion trait with an OpenAI-compatible HTTP
//!   implementation (`llm` module)
//! - `OrderExtractor` - prompt construction and strict response parsing
//!   (`extractor` module)
//!
//! # Safety Principle
//!
//! The LLM is strictly a translator. It never decides prices or totals; those
//! are deterministic decisions made by the pricing core against the catalog.
//! Anything the model returns that is not the exact expected JSON shape is
//! normalized to `ExtractionFailed` - no fault from this crate ever reaches
//! the boundary unhandled.

pub mod extractor;
pub mod llm;

pub use extractor::{ExtractionFailed, OrderExtractor};
pub use llm::{ChatCompletionsClient, LlmClient};
