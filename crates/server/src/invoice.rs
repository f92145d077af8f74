//! Invoice rendering
//!
//! Renders a priced order into an invoice document using an HTML template
//! and conversion via an external tool (wkhtmltopdf). When the converter is
//! not installed the rendered HTML itself becomes the artifact, so the
//! pipeline keeps working on machines without the binary.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;

use chrono::Utc;
use tally_core::order::PricedOrder;
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered invoice on disk, addressable through the static file route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvoiceArtifact {
    pub invoice_number: String,
    pub file_name: String,
    pub path: PathBuf,
    pub public_url: String,
}

pub struct InvoiceRenderer {
    tera: Tera,
    wkhtmltopdf_path: Option<String>,
    invoice_dir: PathBuf,
    public_base_url: String,
}

impl InvoiceRenderer {
    pub fn new(invoice_dir: PathBuf, public_base_url: String) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.register_filter("money", tera_money_filter);
        tera.add_raw_template("invoice.html.tera", include_str!("../templates/invoice.html.tera"))
            .map_err(|error| RenderError::Template(error.to_string()))?;

        let wkhtmltopdf_path =
            which::which("wkhtmltopdf").ok().map(|path| path.to_string_lossy().to_string());

        if let Some(path) = &wkhtmltopdf_path {
            info!(path = %path, "wkhtmltopdf found, invoices will be rendered as PDF");
        } else {
            warn!("wkhtmltopdf not found in PATH, invoices will be rendered as HTML");
        }

        Ok(Self {
            tera,
            wkhtmltopdf_path,
            invoice_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn pdf_conversion_available(&self) -> bool {
        self.wkhtmltopdf_path.is_some()
    }

    #[cfg(test)]
    pub(crate) fn force_html_mode(&mut self) {
        self.wkhtmltopdf_path = None;
    }

    /// Render an invoice for `order` addressed to `customer` and write the
    /// artifact into the invoice directory. File names are timestamp-based
    /// with a random suffix so concurrent invocations never collide.
    pub async fn render(
        &self,
        order: &PricedOrder,
        customer: &str,
    ) -> Result<InvoiceArtifact, RenderError> {
        let issued_at = Utc::now();
        let invoice_number = format!("INV-{}", issued_at.format("%Y%m%d%H%M%S"));
        let file_stem =
            format!("{invoice_number}-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);

        let mut context = Context::new();
        context.insert("invoice_number", &invoice_number);
        context.insert("issued_at", &issued_at.format("%Y-%m-%d").to_string());
        context.insert("customer", customer);
        context.insert("product", &order.product_name);
        context.insert("quantity", &order.quantity_label());
        context.insert("unit_price", &order.unit_price);
        context.insert("total", &order.total);

        let html = self
            .tera
            .render("invoice.html.tera", &context)
            .map_err(|error| RenderError::Template(error.to_string()))?;

        let (file_name, path) = if let Some(converter) = &self.wkhtmltopdf_path {
            let file_name = format!("{file_stem}.pdf");
            let path = self.invoice_dir.join(&file_name);
            self.convert_html_to_pdf(&html, converter, &path).await?;
            (file_name, path)
        } else {
            let file_name = format!("{file_stem}.html");
            let path = self.invoice_dir.join(&file_name);
            tokio::fs::write(&path, &html).await?;
            (file_name, path)
        };

        info!(
            event_name = "invoice.rendered",
            invoice_number = %invoice_number,
            file_name = %file_name,
            "invoice artifact written"
        );

        Ok(InvoiceArtifact {
            invoice_number,
            public_url: format!("{}/invoices/{file_name}", self.public_base_url),
            file_name,
            path,
        })
    }

    async fn convert_html_to_pdf(
        &self,
        html: &str,
        converter: &str,
        pdf_path: &std::path::Path,
    ) -> Result<(), RenderError> {
        let html_path =
            std::env::temp_dir().join(format!("invoice_{}.html", uuid::Uuid::new_v4()));
        tokio::fs::write(&html_path, html).await?;

        let output = Command::new(converter)
            .arg("--page-size")
            .arg("A4")
            .arg("--encoding")
            .arg("utf-8")
            .arg("--enable-local-file-access")
            .arg(&html_path)
            .arg(pdf_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        let _ = tokio::fs::remove_file(&html_path).await;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Conversion(stderr.to_string()));
        }

        Ok(())
    }
}

/// Two-decimal money display for templates. Decimals arrive serialized as
/// strings, so both string and number inputs are accepted.
/// Usage: `total | money`
fn tera_money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let num = match value {
        tera::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        tera::Value::String(s) => s.parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(tera::Value::String(format!("{num:.2}")))
}
