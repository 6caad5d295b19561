//! SystemPay hosted-page redirect form.
//!
//! The deposit amount is computed once from the totals calculator at
//! form-build time; the stored payment-link token is invalidated by any
//! totals-affecting mutation, so a built form can never drift from the quote
//! it was derived from. The IPN callback is handled out-of-band and is not
//! part of the quote state machine.

use std::collections::BTreeMap;

use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;

use devisio_core::config::PaymentConfig;
use devisio_core::domain::quote::Quote;
use devisio_core::pricing::round_money;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment is not enabled in configuration")]
    Disabled,
    #[error("quote has no active payment link")]
    NoPaymentLink,
    #[error("deposit amount must be positive")]
    NonPositiveAmount,
}

/// Everything the front end needs to POST the client to the gateway.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentForm {
    pub action_url: String,
    pub fields: BTreeMap<String, String>,
    pub signature: String,
}

/// Build the redirect form for the quote's deposit.
///
/// `deposit` comes straight from the totals calculator (or from the
/// acceptance snapshot once signed); this function only formats and signs.
pub fn build_redirect_form(
    quote: &Quote,
    deposit: Decimal,
    config: &PaymentConfig,
    now: DateTime<Utc>,
) -> Result<PaymentForm, PaymentError> {
    if !config.enabled {
        return Err(PaymentError::Disabled);
    }
    let token = quote.payment_link_token.as_ref().ok_or(PaymentError::NoPaymentLink)?;

    let amount_cents = (round_money(deposit) * Decimal::ONE_HUNDRED).normalize();
    if amount_cents <= Decimal::ZERO {
        return Err(PaymentError::NonPositiveAmount);
    }

    let mut fields = BTreeMap::new();
    fields.insert("vads_action_mode".to_string(), "INTERACTIVE".to_string());
    fields.insert("vads_amount".to_string(), amount_cents.to_string());
    fields.insert("vads_ctx_mode".to_string(), config.mode.as_vads_ctx_mode().to_string());
    fields.insert("vads_currency".to_string(), config.currency_code.clone());
    fields.insert("vads_page_action".to_string(), "PAYMENT".to_string());
    fields.insert("vads_payment_config".to_string(), "SINGLE".to_string());
    fields.insert("vads_site_id".to_string(), config.site_id.clone());
    fields.insert("vads_trans_date".to_string(), now.format("%Y%m%d%H%M%S").to_string());
    fields.insert("vads_trans_id".to_string(), trans_id(now));
    fields.insert("vads_version".to_string(), "V2".to_string());
    fields.insert("vads_order_id".to_string(), quote.id.0.clone());
    fields.insert("vads_order_info".to_string(), token.0.clone());
    fields.insert("vads_cust_email".to_string(), quote.client.email.clone());
    fields.insert("vads_cust_first_name".to_string(), quote.client.first_name.clone());
    fields.insert("vads_cust_last_name".to_string(), quote.client.last_name.clone());
    fields.insert("vads_url_return".to_string(), config.return_url.clone());

    let signature = sign_fields(&fields, config.certificate.expose_secret());

    Ok(PaymentForm { action_url: config.gateway_url.clone(), fields, signature })
}

/// SystemPay signature: the values of every `vads_`-prefixed field in
/// alphabetical key order, joined with `+`, the certificate appended, then
/// HMAC-SHA-256 under the certificate, base64-encoded.
pub fn sign_fields(fields: &BTreeMap<String, String>, certificate: &str) -> String {
    let joined: Vec<&str> = fields
        .iter()
        .filter(|(key, _)| key.starts_with("vads_"))
        .map(|(_, value)| value.as_str())
        .collect();
    let data = format!("{}+{certificate}", joined.join("+"));

    let mut mac = Hmac::<Sha256>::new_from_slice(certificate.as_bytes())
        .expect("hmac accepts any key length");
    mac.update(data.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// Six digits, unique within the day, derived from the build instant.
fn trans_id(now: DateTime<Utc>) -> String {
    format!("{:06}", now.timestamp() % 1_000_000)
}
