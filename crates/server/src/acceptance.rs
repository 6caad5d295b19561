//! Acceptance and decline orchestration.
//!
//! The pure transition lives on the aggregate; this service adds the
//! conditional persistence (the row must still be pending at write time) and
//! the one-time side effects: internal notification, confirmation email to
//! the client and notification email to the business, each carrying the PDF
//! snapshot. Side effects are best-effort: a failure becomes a warning on the
//! outcome and never rolls back the committed acceptance.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use devisio_core::config::CompanyConfig;
use devisio_core::domain::acceptance::{AcceptanceRecord, DeclineRecord};
use devisio_core::domain::product::Product;
use devisio_core::domain::quote::Quote;
use devisio_core::errors::ApplicationError;
use devisio_core::notify::{Notification, NotificationKind, NotificationSink};
use devisio_core::pricing::round_money;
use devisio_core::render::build_document;
use devisio_db::repositories::{ProductRepository, QuoteRepository, RepositoryError};

use crate::email::{acceptance_client_email, acceptance_company_email, Mailer};
use crate::pdf::PdfGenerator;

/// A conflict means the row was resolved or modified concurrently: nothing
/// committed, the whole operation may be retried.
fn persistence(error: RepositoryError) -> ApplicationError {
    match error {
        RepositoryError::Conflict { entity, id } => {
            ApplicationError::Conflict(format!("{entity} `{id}` changed concurrently"))
        }
        other => ApplicationError::Persistence(other.to_string()),
    }
}

#[derive(Debug)]
pub struct AcceptanceOutcome {
    pub record: AcceptanceRecord,
    /// Soft side-effect failures, for the "accepted, but..." user message.
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct DeclineOutcome {
    pub record: DeclineRecord,
    pub warnings: Vec<String>,
}

pub struct AcceptanceService {
    quotes: Arc<dyn QuoteRepository>,
    products: Arc<dyn ProductRepository>,
    notifications: Arc<dyn NotificationSink>,
    mailer: Arc<dyn Mailer>,
    pdf: Option<Arc<PdfGenerator>>,
    company: CompanyConfig,
}

impl AcceptanceService {
    pub fn new(
        quotes: Arc<dyn QuoteRepository>,
        products: Arc<dyn ProductRepository>,
        notifications: Arc<dyn NotificationSink>,
        mailer: Arc<dyn Mailer>,
        pdf: Option<Arc<PdfGenerator>>,
        company: CompanyConfig,
    ) -> Self {
        Self { quotes, products, notifications, mailer, pdf, company }
    }

    pub async fn accept(
        &self,
        token: &str,
        signatory_name: &str,
        accepted_terms: bool,
    ) -> Result<AcceptanceOutcome, ApplicationError> {
        let mut quote = self
            .quotes
            .find_by_token(token)
            .await
            .map_err(persistence)?
            .ok_or(ApplicationError::Unavailable)?;
        let add_on_products = self.resolve_selected_products(&quote).await?;

        let record = quote.accept(signatory_name, accepted_terms, &add_on_products, Utc::now())?;
        self.quotes.record_acceptance(&quote).await.map_err(persistence)?;

        info!(
            event_name = "acceptance.committed",
            quote_id = %quote.id.0,
            signatory = %record.signatory_name,
            total_ttc = %round_money(record.total_ttc),
            "quote accepted"
        );

        let mut warnings = Vec::new();
        self.record_acceptance_notification(&quote, &record, &mut warnings).await;
        self.send_acceptance_emails(&quote, &record, &add_on_products, &mut warnings).await;

        Ok(AcceptanceOutcome { record, warnings })
    }

    pub async fn decline(
        &self,
        token: &str,
        reason: &str,
    ) -> Result<DeclineOutcome, ApplicationError> {
        let mut quote = self
            .quotes
            .find_by_token(token)
            .await
            .map_err(persistence)?
            .ok_or(ApplicationError::Unavailable)?;

        let record = quote.decline(reason, Utc::now())?;
        self.quotes.record_decline(&quote).await.map_err(persistence)?;

        info!(event_name = "acceptance.declined", quote_id = %quote.id.0, "quote declined");

        let mut warnings = Vec::new();
        let notification = Notification::new(
            NotificationKind::QuoteDeclined,
            Some(quote.id.clone()),
            format!("Devis refusé - {}", quote.client.full_name()),
            format!("Le devis « {} » a été refusé : {}", quote.title, record.reason),
            Utc::now(),
        );
        if let Err(e) = self.notifications.record(notification).await {
            warn!(error = %e, quote_id = %quote.id.0, "decline notification failed");
            warnings.push("internal notification failed".to_string());
        }

        Ok(DeclineOutcome { record, warnings })
    }

    async fn resolve_selected_products(
        &self,
        quote: &Quote,
    ) -> Result<Vec<Product>, ApplicationError> {
        let mut products = Vec::with_capacity(quote.selected_add_ons.len());
        for product_id in quote.selected_add_ons.keys() {
            if let Some(product) =
                self.products.find_by_id(product_id).await.map_err(persistence)?
            {
                products.push(product);
            }
        }
        Ok(products)
    }

    async fn record_acceptance_notification(
        &self,
        quote: &Quote,
        record: &AcceptanceRecord,
        warnings: &mut Vec<String>,
    ) {
        let with_options = if quote.selected_add_ons.is_empty() { "" } else { " avec options" };
        let notification = Notification::new(
            NotificationKind::QuoteAccepted,
            Some(quote.id.clone()),
            format!("Nouveau devis accepté - {}", quote.client.full_name()),
            format!(
                "Le devis « {} » a été accepté par {}{with_options}",
                quote.title, record.signatory_name
            ),
            Utc::now(),
        )
        .with_metadata("total_ttc", round_money(record.total_ttc).to_string())
        .with_metadata("deposit", round_money(record.deposit).to_string());

        if let Err(e) = self.notifications.record(notification).await {
            warn!(error = %e, quote_id = %quote.id.0, "acceptance notification failed");
            warnings.push("internal notification failed".to_string());
        }
    }

    async fn send_acceptance_emails(
        &self,
        quote: &Quote,
        record: &AcceptanceRecord,
        add_on_products: &[Product],
        warnings: &mut Vec<String>,
    ) {
        let pdf_bytes = match &self.pdf {
            Some(generator) => {
                let payload = build_document(quote, add_on_products, Utc::now());
                match generator.generate(&payload).await {
                    Ok(result) => Some(result.bytes().to_vec()),
                    Err(e) => {
                        error!(error = %e, quote_id = %quote.id.0, "acceptance PDF failed");
                        warnings.push("could not generate the PDF snapshot".to_string());
                        None
                    }
                }
            }
            None => None,
        };

        if quote.client.has_email() {
            let message = acceptance_client_email(
                quote,
                record,
                &self.company.name,
                pdf_bytes.clone(),
            );
            if let Err(e) = self.mailer.send(message).await {
                warn!(error = %e, quote_id = %quote.id.0, "client confirmation email failed");
                warnings.push(
                    "confirmation email to the client failed, we will contact them".to_string(),
                );
            }
        } else {
            warnings.push("client has no email address, no confirmation sent".to_string());
        }

        let message =
            acceptance_company_email(quote, record, &self.company.email, pdf_bytes);
        if let Err(e) = self.mailer.send(message).await {
            warn!(error = %e, quote_id = %quote.id.0, "company notification email failed");
            warnings.push("notification email to the company failed".to_string());
        }
    }
}
