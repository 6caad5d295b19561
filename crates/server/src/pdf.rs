//! PDF generation for quote documents.
//!
//! The document payload is rendered through a tera template and converted
//! with wkhtmltopdf when available; otherwise the HTML itself is returned
//! for browser-side printing. Figures are already rounded by the rendering
//! adapter; the template only formats.

use std::collections::HashMap;
use std::process::Stdio;

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{error, info, warn};

use devisio_core::render::DocumentPayload;

/// Register custom tera filters used by quote templates.
///
/// - `money`: 2-decimal formatting, e.g. `amount | money`
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("money", tera_money_filter);
}

fn tera_money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let num = match value {
        tera::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        tera::Value::String(s) => s.parse::<f64>().unwrap_or(0.0),
        tera::Value::Null => 0.0,
        _ => 0.0,
    };
    Ok(tera::Value::String(format!("{num:.2}")))
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("template error: {0}")]
    Template(String),
    #[error("payload error: {0}")]
    Payload(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug)]
pub struct PdfGenerator {
    tera: Tera,
    wkhtmltopdf_path: Option<String>,
}

impl PdfGenerator {
    /// Create a generator loading templates from `template_dir`.
    pub fn new(template_dir: &str) -> Result<Self, PdfError> {
        let mut tera = Tera::new(&format!("{template_dir}/**/*"))
            .map_err(|e| PdfError::Template(e.to_string()))?;
        register_template_filters(&mut tera);
        Ok(Self { tera, wkhtmltopdf_path: find_wkhtmltopdf() })
    }

    /// Create a generator with the embedded template, used as a fallback when
    /// the filesystem templates are unavailable and in tests.
    pub fn with_embedded_templates() -> Self {
        let mut tera = Tera::default();
        register_template_filters(&mut tera);
        tera.add_raw_template(
            "quote.html.tera",
            include_str!("../../../templates/quotes/quote.html.tera"),
        )
        .expect("embedded quote template must parse");

        Self { tera, wkhtmltopdf_path: find_wkhtmltopdf() }
    }

    pub fn render_html(&self, payload: &DocumentPayload) -> Result<String, PdfError> {
        let context = Context::from_serialize(payload)
            .map_err(|e| PdfError::Payload(e.to_string()))?;
        self.tera
            .render("quote.html.tera", &context)
            .map_err(|e| PdfError::Template(e.to_string()))
    }

    /// Render the payload; PDF bytes when wkhtmltopdf is present, HTML
    /// fallback otherwise.
    pub async fn generate(&self, payload: &DocumentPayload) -> Result<PdfResult, PdfError> {
        let html = self.render_html(payload)?;

        if let Some(ref wkhtmltopdf) = self.wkhtmltopdf_path {
            match convert_html_to_pdf(&html, wkhtmltopdf).await {
                Ok(pdf_bytes) => Ok(PdfResult::Pdf(pdf_bytes)),
                Err(e) => {
                    warn!(error = %e, "PDF conversion failed, falling back to HTML");
                    Ok(PdfResult::Html(html))
                }
            }
        } else {
            Ok(PdfResult::Html(html))
        }
    }
}

fn find_wkhtmltopdf() -> Option<String> {
    let path = which::which("wkhtmltopdf").ok().map(|p| p.to_string_lossy().to_string());
    if path.is_none() {
        warn!("wkhtmltopdf not found in PATH - PDF downloads will serve printable HTML");
    }
    path
}

async fn convert_html_to_pdf(html: &str, wkhtmltopdf_path: &str) -> Result<Vec<u8>, PdfError> {
    let temp_dir = std::env::temp_dir();
    let stem = uuid::Uuid::new_v4();
    let html_path = temp_dir.join(format!("quote_{stem}.html"));
    let pdf_path = temp_dir.join(format!("quote_{stem}.pdf"));

    tokio::fs::write(&html_path, html).await?;

    let output = Command::new(wkhtmltopdf_path)
        .arg("--page-size")
        .arg("A4")
        .arg("--margin-top")
        .arg("10mm")
        .arg("--margin-bottom")
        .arg("10mm")
        .arg("--margin-left")
        .arg("10mm")
        .arg("--margin-right")
        .arg("10mm")
        .arg("--encoding")
        .arg("utf-8")
        .arg(&html_path)
        .arg(&pdf_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!(stderr = %stderr, "wkhtmltopdf failed");
        return Err(PdfError::Conversion(stderr.to_string()));
    }

    let pdf_bytes = tokio::fs::read(&pdf_path).await?;

    let _ = tokio::fs::remove_file(&html_path).await;
    let _ = tokio::fs::remove_file(&pdf_path).await;

    info!(size = pdf_bytes.len(), "PDF generated");
    Ok(pdf_bytes)
}

pub enum PdfResult {
    Pdf(Vec<u8>),
    Html(String),
}

impl PdfResult {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Pdf(bytes) => bytes,
            Self::Html(html) => html.as_bytes(),
        }
    }

    pub fn into_response(self, filename: &str) -> Response {
        match self {
            Self::Pdf(bytes) => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/pdf")
                .header(
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                )
                .body(Body::from(bytes))
                .unwrap(),
            Self::Html(html) => Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
                .body(Body::from(html))
                .unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use devisio_core::domain::client::Client;
    use devisio_core::domain::product::{Product, ProductId};
    use devisio_core::domain::quote::{Quote, QuoteKind};
    use devisio_core::render::build_document;

    use super::PdfGenerator;

    fn payload() -> devisio_core::render::DocumentPayload {
        let client = Client {
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            email: "jean@example.com".to_string(),
            ..Client::default()
        };
        let mut quote = Quote::create(client, "Alarme maison", QuoteKind::NewInstallation, Utc::now());
        let central = Product {
            id: ProductId("central".to_string()),
            reference: "AJX-HUB2".to_string(),
            name: "Centrale d'alarme".to_string(),
            category: "Intrusion".to_string(),
            description: String::new(),
            price_ht: Decimal::from(450),
            default_vat_rate: Decimal::from(20),
            active: true,
            optionable: false,
            upsell: false,
        };
        quote.add_or_update_line(&central, Some(2)).expect("line");
        build_document(&quote, &[], Utc::now())
    }

    #[test]
    fn embedded_template_renders_quote_figures() {
        let generator = PdfGenerator::with_embedded_templates();
        let html = generator.render_html(&payload()).expect("render");

        assert!(html.contains("Alarme maison"));
        assert!(html.contains("AJX-HUB2"));
        assert!(html.contains("Jean Dupont"));
        assert!(html.contains("1080.00"), "TTC figure must appear, formatted by the money filter");
        assert!(html.contains("432.00"), "40% deposit must appear");
    }

    #[tokio::test]
    async fn generate_falls_back_to_html_without_wkhtmltopdf() {
        let mut generator = PdfGenerator::with_embedded_templates();
        generator.wkhtmltopdf_path = None;

        let result = generator.generate(&payload()).await.expect("generate");
        match result {
            super::PdfResult::Html(html) => assert!(html.contains("Alarme maison")),
            super::PdfResult::Pdf(_) => panic!("expected HTML fallback"),
        }
    }
}
