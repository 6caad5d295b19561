//! Transactional email over the Brevo HTTP API.
//!
//! Each message may fail independently; the acceptance flow reports failures
//! as soft warnings and never retries automatically.

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::info;

use devisio_core::config::EmailConfig;
use devisio_core::domain::acceptance::AcceptanceRecord;
use devisio_core::domain::quote::Quote;
use devisio_core::pricing::round_money;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("email provider rejected the message: status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("recipient has no usable email address")]
    MissingRecipient,
}

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html: String,
    pub attachment_pdf: Option<Vec<u8>>,
    pub attachment_name: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

pub struct BrevoMailer {
    http: reqwest::Client,
    api_base_url: String,
    api_key: SecretString,
    sender_name: String,
    sender_email: String,
}

impl BrevoMailer {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            sender_name: config.sender_name.clone(),
            sender_email: config.sender_email.clone(),
        }
    }
}

#[async_trait]
impl Mailer for BrevoMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !message.to.contains('@') {
            return Err(EmailError::MissingRecipient);
        }

        let mut payload = serde_json::json!({
            "sender": { "name": self.sender_name, "email": self.sender_email },
            "to": [{ "email": message.to, "name": message.to_name }],
            "subject": message.subject,
            "htmlContent": message.html,
        });
        if let Some(pdf) = &message.attachment_pdf {
            let content = base64::engine::general_purpose::STANDARD.encode(pdf);
            let name = message.attachment_name.as_deref().unwrap_or("devis.pdf");
            payload["attachment"] = serde_json::json!([{ "content": content, "name": name }]);
        }

        let url = format!("{}/v3/smtp/email", self.api_base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .header("api-key", self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Api { status: status.as_u16(), body });
        }

        info!(event_name = "email.sent", subject = %message.subject, "transactional email sent");
        Ok(())
    }
}

/// Swallows messages when email is disabled in config.
#[derive(Default)]
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, _message: EmailMessage) -> Result<(), EmailError> {
        Ok(())
    }
}

/// Test double capturing outgoing messages.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: std::sync::Arc<std::sync::Mutex<Vec<EmailMessage>>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::Api { status: 503, body: "simulated outage".to_string() });
        }
        match self.sent.lock() {
            Ok(mut sent) => sent.push(message),
            Err(poisoned) => poisoned.into_inner().push(message),
        }
        Ok(())
    }
}

/// Confirmation sent to the client after an acceptance.
pub fn acceptance_client_email(
    quote: &Quote,
    record: &AcceptanceRecord,
    company_name: &str,
    pdf: Option<Vec<u8>>,
) -> EmailMessage {
    let client_name = quote.client.full_name();
    let html = format!(
        "<html><body>\
         <h2>Confirmation de votre devis</h2>\
         <p>Bonjour {client_name},</p>\
         <p>Nous vous confirmons l'acceptation de votre devis \
         « {title} » signé par {signatory}.</p>\
         <p>Montant TTC : {ttc} €</p>\
         <p>Notre équipe vous contactera prochainement pour planifier l'intervention.</p>\
         <p>{company_name}</p>\
         </body></html>",
        title = quote.title,
        signatory = record.signatory_name,
        ttc = round_money(record.total_ttc),
    );

    EmailMessage {
        to: quote.client.email.clone(),
        to_name: Some(client_name),
        subject: format!("Votre devis « {} » est confirmé", quote.title),
        html,
        attachment_pdf: pdf,
        attachment_name: Some("devis-accepte.pdf".to_string()),
    }
}

/// Internal notification sent to the business inbox.
pub fn acceptance_company_email(
    quote: &Quote,
    record: &AcceptanceRecord,
    company_email: &str,
    pdf: Option<Vec<u8>>,
) -> EmailMessage {
    let with_options = if quote.selected_add_ons.is_empty() { "" } else { " (avec options)" };
    let html = format!(
        "<html><body>\
         <h2>Devis accepté{with_options}</h2>\
         <p>Client : {client}</p>\
         <p>Affaire : {title}</p>\
         <p>Signataire : {signatory}</p>\
         <p>Montant TTC : {ttc} €</p>\
         <p>Acompte (40%) : {deposit} €</p>\
         </body></html>",
        client = quote.client.full_name(),
        title = quote.title,
        signatory = record.signatory_name,
        ttc = round_money(record.total_ttc),
        deposit = round_money(record.deposit),
    );

    EmailMessage {
        to: company_email.to_string(),
        to_name: None,
        subject: format!("Devis accepté - {} - {}", quote.client.full_name(), quote.title),
        html,
        attachment_pdf: pdf,
        attachment_name: Some("devis-accepte.pdf".to_string()),
    }
}
