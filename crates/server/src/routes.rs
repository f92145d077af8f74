//! HTTP boundary
//!
//! - `GET  /webhook`  — platform verification handshake
//! - `POST /webhook`  — message delivery; always acknowledged with 200 unless
//!   a delivery fault or unexpected error occurs (500)
//! - `GET  /health`   — liveness and renderer mode
//! - `GET  /invoices/{file}` — rendered invoice artifacts

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tally_core::config::AppConfig;
use tally_whatsapp::verify::{verify_subscription, VerifyOutcome, VerifyParams};
use tally_whatsapp::webhook::{first_text_message, WebhookPayload};
use tower_http::services::ServeDir;
use tracing::{debug, error, warn};

use crate::health;
use crate::pipeline::Pipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<Pipeline>,
}

pub fn router(state: AppState) -> Router {
    let invoice_dir = state.config.server.invoice_dir.clone();
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/health", get(health::health))
        .nest_service("/invoices", ServeDir::new(invoice_dir))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

async fn verify_webhook(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> (StatusCode, String) {
    let params = VerifyParams {
        mode: query.mode,
        verify_token: query.verify_token,
        challenge: query.challenge,
    };

    match verify_subscription(&params, state.config.whatsapp.verify_token.expose_secret()) {
        VerifyOutcome::Verified { challenge } => (StatusCode::OK, challenge),
        VerifyOutcome::Forbidden => {
            warn!(event_name = "webhook.verify.forbidden", "verification token mismatch");
            (StatusCode::FORBIDDEN, "verification failed".to_string())
        }
        VerifyOutcome::MissingParams => {
            (StatusCode::BAD_REQUEST, "missing hub.mode or hub.verify_token".to_string())
        }
    }
}

async fn receive_webhook(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let payload: WebhookPayload = match serde_json::from_value(body) {
        Ok(payload) => payload,
        Err(parse_error) => {
            // Acknowledge and drop deliveries that do not carry the expected
            // message structure; the platform retries non-200 responses.
            debug!(
                event_name = "webhook.receive.unrecognized_payload",
                error = %parse_error,
                "delivery did not match the message payload shape"
            );
            return StatusCode::OK;
        }
    };

    let Some(message) = first_text_message(&payload) else {
        debug!(
            event_name = "webhook.receive.no_text_message",
            "delivery acknowledged without a text message"
        );
        return StatusCode::OK;
    };

    match state.pipeline.handle(&message).await {
        Ok(_outcome) => StatusCode::OK,
        Err(fault) => {
            error!(
                event_name = "webhook.receive.delivery_fault",
                sender = %message.from,
                error = %fault,
                "pipeline failed to deliver a reply"
            );
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tally_agent::{LlmClient, OrderExtractor};
    use tally_core::config::AppConfig;
    use tally_core::pricing::CatalogPricingEngine;
    use tally_whatsapp::client::{Notifier, SendError};
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    use crate::invoice::InvoiceRenderer;
    use crate::pipeline::Pipeline;

    use super::{router, AppState};

    struct ScriptedLlm(String);

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct SinkNotifier {
        fail_sends: bool,
    }

    #[async_trait]
    impl Notifier for SinkNotifier {
        async fn send_text(&self, _to: &str, _body: &str) -> Result<(), SendError> {
            if self.fail_sends {
                return Err(SendError::Rejected { status: 401, body: "bad token".to_string() });
            }
            Ok(())
        }

        async fn send_document(
            &self,
            _to: &str,
            _link: &str,
            _file_name: &str,
            _caption: &str,
        ) -> Result<(), SendError> {
            if self.fail_sends {
                return Err(SendError::Rejected { status: 401, body: "bad token".to_string() });
            }
            Ok(())
        }
    }

    fn test_state(dir: &TempDir, llm_response: &str, fail_sends: bool) -> AppState {
        let mut config = AppConfig::default();
        config.whatsapp.verify_token = "shared-secret".to_string().into();
        config.server.invoice_dir = dir.path().to_path_buf();

        let mut renderer = InvoiceRenderer::new(
            config.server.invoice_dir.clone(),
            config.server.public_base_url.clone(),
        )
        .expect("renderer should build");
        renderer.force_html_mode();

        let pipeline = Pipeline::new(
            OrderExtractor::new(Arc::new(ScriptedLlm(llm_response.to_string()))),
            Arc::new(CatalogPricingEngine::new(config.catalog.build())),
            Arc::new(renderer),
            Arc::new(SinkNotifier { fail_sends }),
        );

        AppState { config: Arc::new(config), pipeline: Arc::new(pipeline) }
    }

    fn sugar_response() -> &'static str {
        r#"{"product": "sugar", "quantity": 2, "unit": "kg"}"#
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should collect");
        String::from_utf8(bytes.to_vec()).expect("body should be utf-8")
    }

    fn delivery(text: &str) -> String {
        format!(
            r#"{{
                "entry": [{{
                    "changes": [{{
                        "value": {{
                            "messages": [{{
                                "from": "15550001111",
                                "text": {{ "body": "{text}" }}
                            }}]
                        }}
                    }}]
                }}]
            }}"#
        )
    }

    #[tokio::test]
    async fn verification_returns_the_challenge_for_a_matching_secret() {
        let dir = TempDir::new().expect("temp dir");
        let app = router(test_state(&dir, sugar_response(), false));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.mode=subscribe&hub.verify_token=shared-secret&hub.challenge=1158201444")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "1158201444");
    }

    #[tokio::test]
    async fn verification_rejects_a_wrong_secret_with_403() {
        let dir = TempDir::new().expect("temp dir");
        let app = router(test_state(&dir, sugar_response(), false));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.mode=subscribe&hub.verify_token=guess&hub.challenge=1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn verification_rejects_missing_params_with_400() {
        let dir = TempDir::new().expect("temp dir");
        let app = router(test_state(&dir, sugar_response(), false));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.challenge=1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn text_delivery_is_processed_and_acknowledged() {
        let dir = TempDir::new().expect("temp dir");
        let app = router(test_state(&dir, sugar_response(), false));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(delivery("2 kg sugar")))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn message_less_delivery_is_acknowledged_without_work() {
        let dir = TempDir::new().expect("temp dir");
        let app = router(test_state(&dir, sugar_response(), false));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let leftover: Vec<_> = std::fs::read_dir(dir.path())
            .expect("invoice dir should be readable")
            .collect();
        assert!(leftover.is_empty(), "no invoice should be rendered for an ignored delivery");
    }

    #[tokio::test]
    async fn delivery_fault_surfaces_as_a_server_error() {
        let dir = TempDir::new().expect("temp dir");
        let app = router(test_state(&dir, sugar_response(), true));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(delivery("2 kg sugar")))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn rendered_invoices_are_served_statically() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("INV-test.html"), "<html>invoice</html>")
            .expect("fixture artifact");
        let app = router(test_state(&dir, sugar_response(), false));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/invoices/INV-test.html")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("invoice"));
    }

    #[tokio::test]
    async fn health_reports_ready() {
        let dir = TempDir::new().expect("temp dir");
        let app = router(test_state(&dir, sugar_response(), false));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("\"ready\""));
    }
}
