//! Public viewer routes, reached only through the opaque access token.
//!
//! JSON API:
//! - `GET  /quote/{token}`                         — aggregate view + effective totals
//! - `POST /quote/{token}/lines/{line_id}/quantity` — adjust effective quantity
//! - `POST /quote/{token}/add-ons/{product_id}`     — select/deselect an optional product
//! - `POST /quote/{token}/accept`                   — binding acceptance
//! - `POST /quote/{token}/decline`                  — terminal decline
//! - `GET  /quote/{token}/pdf`                      — document download
//! - `GET  /pay/{payment_token}`                    — deposit redirect form
//!
//! Every token-resolution failure returns the same "unavailable" body: a
//! wrong token, an expired link and a deleted quote are indistinguishable.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use devisio_core::config::PaymentConfig;
use devisio_core::domain::acceptance::{AcceptanceState, AcceptanceStatus};
use devisio_core::domain::client::Client;
use devisio_core::domain::product::{Product, ProductId};
use devisio_core::domain::quote::{Quote, QuoteKind, QuoteLineId, QuoteOptions};
use devisio_core::errors::{ApplicationError, DomainError, InterfaceError};
use devisio_core::pricing::{round_money, QuoteTotals};
use devisio_core::render::build_document;
use devisio_db::repositories::{ProductRepository, QuoteRepository};

use crate::acceptance::AcceptanceService;
use crate::payment;
use crate::pdf::PdfGenerator;

#[derive(Clone)]
pub struct PortalState {
    pub quotes: Arc<dyn QuoteRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub acceptance: Arc<AcceptanceService>,
    pub pdf: Option<Arc<PdfGenerator>>,
    pub payment: PaymentConfig,
}

#[derive(Debug, Serialize)]
pub struct PortalError {
    pub error: String,
}

type PortalFailure = (StatusCode, Json<PortalError>);

/// The single opaque outcome for every token-resolution failure.
fn unavailable() -> PortalFailure {
    let interface = ApplicationError::Unavailable.into_interface(Uuid::new_v4().to_string());
    (StatusCode::NOT_FOUND, Json(PortalError { error: interface.user_message().to_string() }))
}

fn internal(error: impl std::fmt::Display) -> PortalFailure {
    error!(error = %error, "portal database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(PortalError { error: "an internal error occurred".to_string() }),
    )
}

fn adjustment_save_failure(error: devisio_db::repositories::RepositoryError) -> PortalFailure {
    match error {
        devisio_db::repositories::RepositoryError::Conflict { .. } => (
            StatusCode::CONFLICT,
            Json(PortalError { error: "this quote can no longer be adjusted".to_string() }),
        ),
        other => internal(other),
    }
}

fn domain_failure(error: DomainError) -> PortalFailure {
    match error {
        DomainError::QuoteLocked { .. } => (
            StatusCode::CONFLICT,
            Json(PortalError { error: "this quote can no longer be adjusted".to_string() }),
        ),
        DomainError::UnknownLine(_) => (
            StatusCode::NOT_FOUND,
            Json(PortalError { error: "line not found on this quote".to_string() }),
        ),
        other => (StatusCode::BAD_REQUEST, Json(PortalError { error: other.to_string() })),
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    pub signatory_name: String,
    pub accepted_terms: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeclineRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct PortalLineView {
    pub id: String,
    pub reference: String,
    pub name: String,
    pub description: String,
    /// Quantity as staff quoted it; preserved under client adjustments.
    pub quantity: u32,
    pub effective_quantity: u32,
    pub unit_price_ht: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OptionalProductView {
    pub id: String,
    pub reference: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price_ht: Decimal,
    pub vat_rate: Decimal,
    pub selected_quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct PortalQuoteView {
    pub title: String,
    pub kind: QuoteKind,
    pub client: Client,
    pub intro_text: Option<String>,
    pub observations: String,
    pub options: QuoteOptions,
    pub acceptance_status: AcceptanceStatus,
    pub accepted_at: Option<DateTime<Utc>>,
    pub lines: Vec<PortalLineView>,
    pub optional_products: Vec<OptionalProductView>,
    pub totals: QuoteTotals,
}

#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    pub effective_quantity: u32,
    pub totals: QuoteTotals,
}

#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    pub success: bool,
    pub message: String,
    pub accepted_at: DateTime<Utc>,
    pub total_ttc: Decimal,
    pub deposit: Decimal,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeclineResponse {
    pub success: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: PortalState) -> Router {
    Router::new()
        .route("/quote/{token}", get(view_quote))
        .route("/quote/{token}/lines/{line_id}/quantity", post(adjust_line_quantity))
        .route("/quote/{token}/add-ons/{product_id}", post(select_add_on))
        .route("/quote/{token}/accept", post(accept_quote))
        .route("/quote/{token}/decline", post(decline_quote))
        .route("/quote/{token}/pdf", get(download_pdf))
        .route("/pay/{payment_token}", get(payment_form))
        .with_state(state)
}

async fn resolve_quote(state: &PortalState, token: &str) -> Result<Quote, PortalFailure> {
    match state.quotes.find_by_token(token).await {
        Ok(Some(quote)) => Ok(quote),
        Ok(None) => {
            warn!(event_name = "portal.token.rejected", "invalid or expired quote token");
            Err(unavailable())
        }
        Err(e) => Err(internal(e)),
    }
}

async fn optionable_products(state: &PortalState) -> Result<Vec<Product>, PortalFailure> {
    state.products.list_optionable().await.map_err(internal)
}

/// Products backing the quote's current selections; accepted quotes may
/// reference products that have since been retired from the option catalog,
/// so this resolves by id rather than re-filtering the listing.
async fn selected_products(
    state: &PortalState,
    quote: &Quote,
) -> Result<Vec<Product>, PortalFailure> {
    let mut products = Vec::with_capacity(quote.selected_add_ons.len());
    for product_id in quote.selected_add_ons.keys() {
        if let Some(product) = state.products.find_by_id(product_id).await.map_err(internal)? {
            products.push(product);
        }
    }
    Ok(products)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn view_quote(
    Path(token): Path<String>,
    State(state): State<PortalState>,
) -> Result<Json<PortalQuoteView>, PortalFailure> {
    let quote = resolve_quote(&state, &token).await?;
    let optionable = optionable_products(&state).await?;
    let selected = selected_products(&state, &quote).await?;

    let lines = quote
        .lines
        .iter()
        .map(|line| PortalLineView {
            id: line.id.0.clone(),
            reference: line.reference.clone(),
            name: line.name.clone(),
            description: line.description.clone(),
            quantity: line.quantity,
            effective_quantity: quote.effective_quantity(line),
            unit_price_ht: round_money(line.unit_price_ht),
        })
        .collect();

    let optional_products = optionable
        .iter()
        .map(|product| OptionalProductView {
            id: product.id.0.clone(),
            reference: product.reference.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            price_ht: round_money(product.price_ht),
            vat_rate: product.default_vat_rate,
            selected_quantity: quote.selected_add_ons.get(&product.id).copied().unwrap_or(0),
        })
        .collect();

    let accepted_at = match &quote.acceptance {
        AcceptanceState::Accepted(record) => Some(record.accepted_at),
        _ => None,
    };

    Ok(Json(PortalQuoteView {
        title: quote.title.clone(),
        kind: quote.kind,
        client: quote.client.clone(),
        intro_text: quote.intro.as_ref().map(|intro| intro.text().to_string()),
        observations: quote.observations.clone(),
        options: quote.options,
        acceptance_status: quote.acceptance_status(),
        accepted_at,
        totals: quote.display_totals(&selected).rounded(),
        lines,
        optional_products,
    }))
}

async fn adjust_line_quantity(
    Path((token, line_id)): Path<(String, String)>,
    State(state): State<PortalState>,
    Json(body): Json<AdjustRequest>,
) -> Result<Json<AdjustResponse>, PortalFailure> {
    let mut quote = resolve_quote(&state, &token).await?;
    let line_id = QuoteLineId(line_id);

    let effective_quantity =
        quote.adjust_line_quantity(&line_id, body.delta).map_err(domain_failure)?;
    state.quotes.save_client_adjustments(&quote).await.map_err(|e| {
        warn!(error = %e, quote_id = %quote.id.0, "client adjustment save failed");
        adjustment_save_failure(e)
    })?;

    let selected = selected_products(&state, &quote).await?;
    Ok(Json(AdjustResponse {
        effective_quantity,
        totals: quote.display_totals(&selected).rounded(),
    }))
}

async fn select_add_on(
    Path((token, product_id)): Path<(String, String)>,
    State(state): State<PortalState>,
    Json(body): Json<AdjustRequest>,
) -> Result<Json<AdjustResponse>, PortalFailure> {
    let mut quote = resolve_quote(&state, &token).await?;

    let product = state
        .products
        .find_by_id(&ProductId(product_id.clone()))
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(PortalError { error: format!("product `{product_id}` not found") }),
            )
        })?;

    let selected_quantity = quote.select_add_on(&product, body.delta).map_err(domain_failure)?;
    state.quotes.save_client_adjustments(&quote).await.map_err(adjustment_save_failure)?;

    let selected = selected_products(&state, &quote).await?;
    Ok(Json(AdjustResponse {
        effective_quantity: selected_quantity,
        totals: quote.display_totals(&selected).rounded(),
    }))
}

async fn accept_quote(
    Path(token): Path<String>,
    State(state): State<PortalState>,
    Json(body): Json<AcceptRequest>,
) -> Result<Json<AcceptResponse>, PortalFailure> {
    let outcome = state
        .acceptance
        .accept(&token, &body.signatory_name, body.accepted_terms)
        .await
        .map_err(accept_failure)?;

    info!(
        event_name = "portal.quote.accepted",
        signatory = %outcome.record.signatory_name,
        "quote accepted via public viewer"
    );

    let message = if outcome.warnings.is_empty() {
        "Devis accepté. Vous recevrez une confirmation par email.".to_string()
    } else {
        // The acceptance itself is committed; only side effects failed.
        "Devis accepté, mais l'envoi des emails de confirmation a échoué. \
         Nous vous contacterons prochainement."
            .to_string()
    };

    Ok(Json(AcceptResponse {
        success: true,
        message,
        accepted_at: outcome.record.accepted_at,
        total_ttc: round_money(outcome.record.total_ttc),
        deposit: round_money(outcome.record.deposit),
        warnings: outcome.warnings,
    }))
}

async fn decline_quote(
    Path(token): Path<String>,
    State(state): State<PortalState>,
    Json(body): Json<DeclineRequest>,
) -> Result<Json<DeclineResponse>, PortalFailure> {
    state.acceptance.decline(&token, &body.reason).await.map_err(accept_failure)?;

    Ok(Json(DeclineResponse {
        success: true,
        message: "Devis refusé. Notre équipe en a été informée.".to_string(),
    }))
}

/// Map the acceptance service's application error through the shared
/// interface taxonomy. Validation failures keep their specific message;
/// everything else gets the taxonomy's user-safe wording.
fn accept_failure(error: ApplicationError) -> PortalFailure {
    if let ApplicationError::Persistence(ref message) = error {
        error!(error = %message, "acceptance persistence failure");
    }

    let interface = error.into_interface(Uuid::new_v4().to_string());
    let (status, message) = match &interface {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::NotFound { .. } => {
            (StatusCode::NOT_FOUND, interface.user_message().to_string())
        }
        InterfaceError::Conflict { .. } => {
            (StatusCode::CONFLICT, interface.user_message().to_string())
        }
        InterfaceError::ServiceUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, interface.user_message().to_string())
        }
        InterfaceError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, interface.user_message().to_string())
        }
    };
    (status, Json(PortalError { error: message }))
}

async fn download_pdf(
    Path(token): Path<String>,
    State(state): State<PortalState>,
) -> Result<impl IntoResponse, PortalFailure> {
    let quote = resolve_quote(&state, &token).await?;

    let generator = state.pdf.as_ref().ok_or_else(|| {
        error!("PDF generator not initialized");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(PortalError { error: "PDF generation not available".to_string() }),
        )
    })?;

    let selected = selected_products(&state, &quote).await?;
    let payload = build_document(&quote, &selected, Utc::now());
    let filename = format!("Devis_{}.pdf", quote.id.0);

    match generator.generate(&payload).await {
        Ok(result) => {
            info!(event_name = "portal.pdf.generated", quote_id = %quote.id.0, "PDF generated");
            Ok(result.into_response(&filename))
        }
        Err(e) => {
            error!(error = %e, quote_id = %quote.id.0, "PDF generation failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PortalError { error: "could not generate the document".to_string() }),
            ))
        }
    }
}

async fn payment_form(
    Path(payment_token): Path<String>,
    State(state): State<PortalState>,
) -> Result<Json<payment::PaymentForm>, PortalFailure> {
    let quote = match state.quotes.find_by_payment_token(&payment_token).await {
        Ok(Some(quote)) => quote,
        Ok(None) => return Err(unavailable()),
        Err(e) => return Err(internal(e)),
    };

    let deposit = match &quote.acceptance {
        AcceptanceState::Accepted(record) => record.deposit,
        _ => {
            let selected = selected_products(&state, &quote).await?;
            quote.display_totals(&selected).deposit
        }
    };

    payment::build_redirect_form(&quote, deposit, &state.payment, Utc::now()).map_err(|e| {
        warn!(error = %e, quote_id = %quote.id.0, "payment form build failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(PortalError { error: "payment is not available for this quote".to_string() }),
        )
    })
    .map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::Json;
    use chrono::Utc;
    use rust_decimal::Decimal;

    use devisio_core::config::{CompanyConfig, PaymentConfig, PaymentMode};
    use devisio_core::domain::acceptance::AcceptanceStatus;
    use devisio_core::domain::client::Client;
    use devisio_core::domain::product::{Product, ProductId};
    use devisio_core::domain::quote::{Quote, QuoteKind};
    use devisio_core::notify::InMemoryNotificationSink;
    use devisio_db::repositories::{
        InMemoryProductRepository, InMemoryQuoteRepository, ProductRepository, QuoteRepository,
    };

    use crate::acceptance::AcceptanceService;
    use crate::email::RecordingMailer;

    use super::*;

    fn product(id: &str, price: i64, vat_rate: i64, optionable: bool) -> Product {
        Product {
            id: ProductId(id.to_string()),
            reference: format!("REF-{id}"),
            name: format!("Product {id}"),
            category: "Intrusion".to_string(),
            description: String::new(),
            price_ht: Decimal::from(price),
            default_vat_rate: Decimal::from(vat_rate),
            active: true,
            optionable,
            upsell: false,
        }
    }

    async fn state() -> (PortalState, String, String) {
        let quotes = Arc::new(InMemoryQuoteRepository::default());
        let products = Arc::new(InMemoryProductRepository::default());
        products.save(&product("central", 100, 20, false)).await.expect("save");
        products.save(&product("siren", 50, 10, true)).await.expect("save");

        let client = Client {
            first_name: "Jean".to_string(),
            last_name: "Dupont".to_string(),
            email: "jean@example.com".to_string(),
            ..Client::default()
        };
        let mut quote =
            Quote::create(client, "Alarme maison", QuoteKind::NewInstallation, Utc::now());
        let central = product("central", 100, 20, false);
        quote.add_or_update_line(&central, Some(2)).expect("line");
        let token = quote.access_token.0.clone();
        let line_id = quote.lines[0].id.0.clone();
        quotes.create(&quote).await.expect("create");

        let acceptance = Arc::new(AcceptanceService::new(
            quotes.clone(),
            products.clone(),
            Arc::new(InMemoryNotificationSink::default()),
            Arc::new(RecordingMailer::default()),
            None,
            CompanyConfig {
                name: "Bruneau Protection".to_string(),
                email: "contact@bruneau.example".to_string(),
                phone: String::new(),
            },
        ));

        let state = PortalState {
            quotes,
            products,
            acceptance,
            pdf: None,
            payment: PaymentConfig {
                enabled: true,
                gateway_url: "https://paiement.systempay.fr/vads-payment/".to_string(),
                site_id: "12345678".to_string(),
                certificate: "test-certificate".to_string().into(),
                mode: PaymentMode::Test,
                currency_code: "978".to_string(),
                return_url: "https://devis.example.com/payment/result".to_string(),
            },
        };

        (state, token, line_id)
    }

    #[tokio::test]
    async fn view_combines_lines_options_and_display_totals() {
        let (state, token, _) = state().await;

        let Json(view) = view_quote(Path(token), State(state)).await.expect("view");

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 2);
        assert_eq!(view.lines[0].effective_quantity, 2);
        assert_eq!(view.optional_products.len(), 1);
        assert_eq!(view.optional_products[0].selected_quantity, 0);
        assert_eq!(view.totals.ttc, Decimal::from(240));
        assert_eq!(view.acceptance_status, AcceptanceStatus::Pending);
    }

    #[tokio::test]
    async fn wrong_tokens_get_the_uniform_unavailable_answer() {
        let (state, _, _) = state().await;

        let (status, Json(body)) = view_quote(Path("0000deadbeef".to_string()), State(state))
            .await
            .expect_err("wrong token");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "This quote is unavailable or the link has expired.");
    }

    #[tokio::test]
    async fn quantity_adjustment_floors_at_one_and_recomputes_totals() {
        let (state, token, line_id) = state().await;

        let Json(response) = adjust_line_quantity(
            Path((token.clone(), line_id.clone())),
            State(state.clone()),
            Json(AdjustRequest { delta: -5 }),
        )
        .await
        .expect("adjust");

        assert_eq!(response.effective_quantity, 1);
        assert_eq!(response.totals.ttc, Decimal::from(120));

        // The staff quantity is untouched in the store.
        let stored = state.quotes.find_by_token(&token).await.expect("find").expect("present");
        assert_eq!(stored.lines[0].quantity, 2);
        assert_eq!(stored.quantity_overrides.len(), 1);
    }

    #[tokio::test]
    async fn add_on_selection_round_trip() {
        let (state, token, _) = state().await;

        let Json(response) = select_add_on(
            Path((token.clone(), "siren".to_string())),
            State(state.clone()),
            Json(AdjustRequest { delta: 1 }),
        )
        .await
        .expect("select");
        assert_eq!(response.effective_quantity, 1);
        // 2 x 100 @ 20% + 50 @ 10% -> 295.
        assert_eq!(response.totals.ttc, Decimal::from(295));

        let Json(response) = select_add_on(
            Path((token, "siren".to_string())),
            State(state),
            Json(AdjustRequest { delta: -3 }),
        )
        .await
        .expect("deselect");
        assert_eq!(response.effective_quantity, 0);
        assert_eq!(response.totals.ttc, Decimal::from(240));
    }

    #[tokio::test]
    async fn non_optionable_products_are_rejected() {
        let (state, token, _) = state().await;

        let (status, _) = select_add_on(
            Path((token, "central".to_string())),
            State(state),
            Json(AdjustRequest { delta: 1 }),
        )
        .await
        .expect_err("not optionable");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn end_to_end_adjust_select_accept_then_freeze() {
        let (state, token, line_id) = state().await;

        select_add_on(
            Path((token.clone(), "siren".to_string())),
            State(state.clone()),
            Json(AdjustRequest { delta: 1 }),
        )
        .await
        .expect("select add-on");

        let Json(accepted) = accept_quote(
            Path(token.clone()),
            State(state.clone()),
            Json(AcceptRequest {
                signatory_name: "Jean Dupont".to_string(),
                accepted_terms: true,
            }),
        )
        .await
        .expect("accept");

        assert!(accepted.success);
        assert_eq!(accepted.total_ttc, Decimal::from(295));
        assert_eq!(accepted.deposit, Decimal::new(11800, 2));

        // Second acceptance is rejected.
        let (status, _) = accept_quote(
            Path(token.clone()),
            State(state.clone()),
            Json(AcceptRequest {
                signatory_name: "Jean Dupont".to_string(),
                accepted_terms: true,
            }),
        )
        .await
        .expect_err("second accept");
        assert_eq!(status, StatusCode::CONFLICT);

        // And so are further adjustments.
        let (status, _) = adjust_line_quantity(
            Path((token, line_id)),
            State(state),
            Json(AdjustRequest { delta: 1 }),
        )
        .await
        .expect_err("adjust after accept");
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn acceptance_preconditions_map_to_bad_request() {
        let (state, token, _) = state().await;

        let (status, _) = accept_quote(
            Path(token.clone()),
            State(state.clone()),
            Json(AcceptRequest { signatory_name: "  ".to_string(), accepted_terms: true }),
        )
        .await
        .expect_err("no signatory");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = accept_quote(
            Path(token),
            State(state),
            Json(AcceptRequest {
                signatory_name: "Jean Dupont".to_string(),
                accepted_terms: false,
            }),
        )
        .await
        .expect_err("terms unchecked");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn decline_resolves_the_quote() {
        let (state, token, _) = state().await;

        let Json(response) = decline_quote(
            Path(token.clone()),
            State(state.clone()),
            Json(DeclineRequest { reason: "Budget dépassé".to_string() }),
        )
        .await
        .expect("decline");
        assert!(response.success);

        let stored = state.quotes.find_by_token(&token).await.expect("find").expect("present");
        assert_eq!(stored.acceptance_status(), AcceptanceStatus::Rejected);
    }

    #[tokio::test]
    async fn pdf_download_requires_an_initialized_generator() {
        let (state, token, _) = state().await;

        let result = download_pdf(Path(token), State(state)).await;
        let (status, _) = match result {
            Err(failure) => failure,
            Ok(_) => panic!("expected failure without a generator"),
        };
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn payment_form_resolves_by_payment_token_with_calculator_deposit() {
        let (state, token, _) = state().await;

        let mut quote =
            state.quotes.find_by_token(&token).await.expect("find").expect("present");
        let payment_token = quote.issue_payment_link();
        state.quotes.save_payment_link(&quote).await.expect("save link");

        let Json(form) =
            payment_form(Path(payment_token.0), State(state)).await.expect("form");
        // 2 x 100 @ 20% -> TTC 240, deposit 96.00 -> 9600 cents.
        assert_eq!(form.fields.get("vads_amount").map(String::as_str), Some("9600"));
    }

    #[tokio::test]
    async fn unknown_payment_tokens_share_the_opaque_outcome() {
        let (state, _, _) = state().await;

        let result = payment_form(Path("unknown".to_string()), State(state)).await;
        let (status, Json(body)) = match result {
            Err(failure) => failure,
            Ok(_) => panic!("expected unavailable"),
        };
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "This quote is unavailable or the link has expired.");
    }
}
