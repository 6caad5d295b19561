//! One-way, best-effort push of quotes to the Extrabat ERP.
//!
//! The core never reads back from the ERP; a failed push is logged and
//! reported as a soft warning, and must not block saving or accepting the
//! quote locally. Quotes whose client has no Extrabat id are skipped.

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use devisio_core::domain::quote::Quote;
use devisio_core::pricing::round_money;

#[derive(Debug, Error)]
pub enum ErpError {
    #[error("extrabat request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("extrabat rejected the quote: status {status}: {body}")]
    Api { status: u16, body: String },
}

/// Reference assigned by the ERP to a pushed quote.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErpQuoteRef {
    pub id: i64,
    pub number: String,
}

#[async_trait]
pub trait ErpSync: Send + Sync {
    /// Push the quote; returns `None` when there is nothing to sync (no
    /// Extrabat client id, or sync disabled).
    async fn push_quote(&self, quote: &Quote) -> Result<Option<ErpQuoteRef>, ErpError>;
}

#[derive(Debug, Serialize, PartialEq)]
pub struct QuotePayload {
    pub client_id: i64,
    pub label: String,
    pub total_ht: Decimal,
    pub total_ttc: Decimal,
    pub lines: Vec<LinePayload>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LinePayload {
    pub reference: String,
    pub label: String,
    pub quantity: u32,
    pub unit_price_ht: Decimal,
}

/// Flatten a quote into the ERP wire shape. Zero-quantity lines are
/// proposals, not orders, and are not exported.
pub fn quote_payload(quote: &Quote) -> Option<QuotePayload> {
    let client_id = quote.client.extrabat_id?;
    let totals = quote.totals();

    Some(QuotePayload {
        client_id,
        label: quote.title.clone(),
        total_ht: round_money(totals.ht),
        total_ttc: round_money(totals.ttc),
        lines: quote
            .lines
            .iter()
            .filter(|line| line.quantity > 0)
            .map(|line| LinePayload {
                reference: line.reference.clone(),
                label: line.name.clone(),
                quantity: line.quantity,
                unit_price_ht: round_money(line.unit_price_ht),
            })
            .collect(),
    })
}

pub struct ExtrabatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl ExtrabatClient {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into(), api_key }
    }
}

#[async_trait]
impl ErpSync for ExtrabatClient {
    async fn push_quote(&self, quote: &Quote) -> Result<Option<ErpQuoteRef>, ErpError> {
        let Some(payload) = quote_payload(quote) else {
            return Ok(None);
        };

        let url = format!("{}/api/v2/quotes", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ErpError::Api { status: status.as_u16(), body });
        }

        let reference: ErpQuoteRef = response.json().await?;
        info!(
            event_name = "erp.quote.pushed",
            quote_id = %quote.id.0,
            erp_id = reference.id,
            erp_number = %reference.number,
            "quote pushed to Extrabat"
        );
        Ok(Some(reference))
    }
}

/// Stand-in used when the integration is disabled.
#[derive(Default)]
pub struct NoopErpSync;

#[async_trait]
impl ErpSync for NoopErpSync {
    async fn push_quote(&self, _quote: &Quote) -> Result<Option<ErpQuoteRef>, ErpError> {
        Ok(None)
    }
}
