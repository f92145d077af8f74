use std::path::PathBuf;
use std::sync::Arc;

use tally_agent::{ChatCompletionsClient, OrderExtractor};
use tally_core::config::{AppConfig, ConfigError, LoadOptions};
use tally_core::pricing::CatalogPricingEngine;
use tally_whatsapp::client::WhatsAppClient;
use thiserror::Error;
use tracing::info;

use crate::invoice::{InvoiceRenderer, RenderError};
use crate::pipeline::Pipeline;

pub struct Application {
    pub config: Arc<AppConfig>,
    pub pipeline: Arc<Pipeline>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not create invoice directory `{path}`: {source}")]
    InvoiceDir { path: PathBuf, source: std::io::Error },
    #[error("llm client initialization failed: {0}")]
    LlmClient(#[source] anyhow::Error),
    #[error("platform client initialization failed: {0}")]
    Platform(#[source] reqwest::Error),
    #[error(transparent)]
    Renderer(#[from] RenderError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        "starting application bootstrap"
    );
    let config = Arc::new(config);

    tokio::fs::create_dir_all(&config.server.invoice_dir).await.map_err(|source| {
        BootstrapError::InvoiceDir { path: config.server.invoice_dir.clone(), source }
    })?;

    let catalog = config.catalog.build();
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        products = catalog.len(),
        "catalog loaded"
    );

    let llm = ChatCompletionsClient::new(&config.llm).map_err(BootstrapError::LlmClient)?;
    let notifier = WhatsAppClient::new(&config.whatsapp).map_err(BootstrapError::Platform)?;
    let renderer = InvoiceRenderer::new(
        config.server.invoice_dir.clone(),
        config.server.public_base_url.clone(),
    )?;

    let pipeline = Arc::new(Pipeline::new(
        OrderExtractor::new(Arc::new(llm)),
        Arc::new(CatalogPricingEngine::new(catalog)),
        Arc::new(renderer),
        Arc::new(notifier),
    ));

    info!(
        event_name = "system.bootstrap.ready",
        "application bootstrap complete"
    );

    Ok(Application { config, pipeline })
}
