use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tally_core::config::WhatsAppConfig;
use thiserror::Error;
use tracing::info;

/// Outbound send failure. Treated as a delivery fault at the boundary: never
/// retried and never shown to the end user.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("platform request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("platform rejected the send with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Reply surface the pipeline talks to. Production sends go through
/// `WhatsAppClient`; tests substitute a recording implementation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError>;

    async fn send_document(
        &self,
        to: &str,
        link: &str,
        file_name: &str,
        caption: &str,
    ) -> Result<(), SendError>;
}

pub struct WhatsAppClient {
    http: reqwest::Client,
    api_base: String,
    phone_number_id: String,
    bearer_token: SecretString,
}

impl WhatsAppClient {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            phone_number_id: config.phone_number_id.clone(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    async fn post_message(&self, payload: serde_json::Value) -> Result<(), SendError> {
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);
        let response = self
            .http
            .post(url)
            .bearer_auth(self.bearer_token.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::Rejected { status: status.as_u16(), body });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WhatsAppClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), SendError> {
        self.post_message(json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        }))
        .await?;

        info!(
            event_name = "whatsapp.send.text",
            recipient = %to,
            "text message sent"
        );
        Ok(())
    }

    async fn send_document(
        &self,
        to: &str,
        link: &str,
        file_name: &str,
        caption: &str,
    ) -> Result<(), SendError> {
        self.post_message(json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "document",
            "document": { "link": link, "filename": file_name, "caption": caption },
        }))
        .await?;

        info!(
            event_name = "whatsapp.send.document",
            recipient = %to,
            file_name = %file_name,
            "document message sent"
        );
        Ok(())
    }
}
