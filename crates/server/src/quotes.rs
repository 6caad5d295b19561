//! Staff-facing quote API.
//!
//! Every mutation loads the aggregate, applies one domain operation, and
//! persists through the version compare-and-swap. Client-owned fields
//! (quantity overrides, add-on selections) are never written here.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use devisio_core::config::PaymentConfig;
use devisio_core::domain::acceptance::AcceptanceState;
use devisio_core::domain::client::Client;
use devisio_core::domain::quote::{
    Quote, QuoteId, QuoteKind, QuoteLineId, QuoteOptions, QuoteVatRate,
};
use devisio_core::errors::DomainError;
use devisio_core::notify::Notification;
use devisio_core::pricing::{round_money, QuoteTotals};
use devisio_db::repositories::{
    NotificationRepository, ProductRepository, QuoteRepository, RepositoryError,
};
use devisio_extrabat::ErpSync;

use crate::intro::IntroGenerator;
use crate::payment::{self, PaymentForm};

#[derive(Clone)]
pub struct StaffState {
    pub quotes: Arc<dyn QuoteRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub intro: Arc<dyn IntroGenerator>,
    pub erp: Arc<dyn ErpSync>,
    pub payment: PaymentConfig,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

type ApiFailure = (StatusCode, Json<ApiError>);

fn bad_request(message: impl Into<String>) -> ApiFailure {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: message.into() }))
}

fn not_found(message: impl Into<String>) -> ApiFailure {
    (StatusCode::NOT_FOUND, Json(ApiError { error: message.into() }))
}

fn conflict(message: impl Into<String>) -> ApiFailure {
    (StatusCode::CONFLICT, Json(ApiError { error: message.into() }))
}

fn domain_failure(error: DomainError) -> ApiFailure {
    match error {
        DomainError::QuoteLocked { .. } => conflict("quote can no longer be modified"),
        DomainError::UnknownLine(_) => not_found(error.to_string()),
        other => bad_request(other.to_string()),
    }
}

fn repo_failure(error: RepositoryError) -> ApiFailure {
    match error {
        RepositoryError::Conflict { .. } => {
            conflict("the quote changed while you were working, reload and retry")
        }
        other => {
            error!(error = %other, "staff api database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: "an internal error occurred".to_string() }),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub client: Client,
    pub title: String,
    pub kind: Option<QuoteKind>,
}

#[derive(Debug, Serialize)]
pub struct CreateQuoteResponse {
    pub id: String,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    pub client: Option<Client>,
    pub title: Option<String>,
    pub observations: Option<String>,
    pub options: Option<QuoteOptions>,
}

#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    pub product_id: String,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    pub quantity: Option<u32>,
    pub unit_price_ht: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct VatRateRequest {
    pub rate: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct KindRequest {
    pub kind: QuoteKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroMode {
    Generate,
    Manual,
}

#[derive(Debug, Deserialize)]
pub struct IntroRequest {
    pub mode: IntroMode,
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentLinkResponse {
    pub token: String,
    pub form: PaymentForm,
}

#[derive(Debug, Serialize)]
pub struct QuoteView {
    #[serde(flatten)]
    pub quote: Quote,
    pub totals: QuoteTotals,
}

fn view(quote: Quote) -> QuoteView {
    let totals = quote.totals().rounded();
    QuoteView { quote, totals }
}

#[derive(Debug, Serialize)]
pub struct QuoteSummary {
    pub id: String,
    pub title: String,
    pub client_name: String,
    pub status: devisio_core::domain::quote::QuoteStatus,
    pub acceptance_status: devisio_core::domain::acceptance::AcceptanceStatus,
    pub total_ttc: Decimal,
    pub access_token: String,
    pub updated_at: chrono::DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: StaffState) -> Router {
    Router::new()
        .route("/api/quotes", post(create_quote).get(list_quotes))
        .route("/api/quotes/{id}", get(get_quote).delete(delete_quote))
        .route("/api/quotes/{id}/details", put(update_details))
        .route("/api/quotes/{id}/lines", post(add_line))
        .route("/api/quotes/{id}/lines/{line_id}", patch(update_line).delete(remove_line))
        .route("/api/quotes/{id}/vat-rate", put(set_vat_rate))
        .route("/api/quotes/{id}/kind", put(set_kind))
        .route("/api/quotes/{id}/intro", post(set_intro))
        .route("/api/quotes/{id}/payment-link", post(create_payment_link))
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/{id}/read", post(mark_notification_read))
        .with_state(state)
}

async fn load_quote(state: &StaffState, id: &str) -> Result<Quote, ApiFailure> {
    state
        .quotes
        .find_by_id(&QuoteId(id.to_string()))
        .await
        .map_err(repo_failure)?
        .ok_or_else(|| not_found(format!("quote `{id}` not found")))
}

/// Load, apply one staff mutation, persist with the version CAS.
async fn mutate(
    state: &StaffState,
    id: &str,
    apply: impl FnOnce(&mut Quote) -> Result<(), DomainError>,
) -> Result<Json<QuoteView>, ApiFailure> {
    let mut quote = load_quote(state, id).await?;
    apply(&mut quote).map_err(domain_failure)?;
    let new_version = state.quotes.save_staff(&quote).await.map_err(repo_failure)?;
    quote.version = new_version;
    Ok(Json(view(quote)))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_quote(
    State(state): State<StaffState>,
    Json(body): Json<CreateQuoteRequest>,
) -> Result<(StatusCode, Json<CreateQuoteResponse>), ApiFailure> {
    if body.client.last_name.trim().is_empty() {
        return Err(bad_request("client last name is required"));
    }

    let kind = body.kind.unwrap_or(QuoteKind::NewInstallation);
    let mut quote = Quote::create(body.client, body.title, kind, Utc::now());

    // Maintenance-upsell quotes start preloaded with the upsell catalog as
    // zero-quantity proposals.
    if kind == QuoteKind::MaintenanceUpsell {
        let upsell = state.products.list_upsell().await.map_err(repo_failure)?;
        for product in &upsell {
            quote.add_or_update_line(product, None).map_err(domain_failure)?;
        }
    }

    state.quotes.create(&quote).await.map_err(repo_failure)?;

    info!(event_name = "staff.quote.created", quote_id = %quote.id.0, "quote created");

    // One-way, best-effort ERP push; failure never blocks the local save.
    if let Err(e) = state.erp.push_quote(&quote).await {
        warn!(error = %e, quote_id = %quote.id.0, "extrabat push failed");
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateQuoteResponse { id: quote.id.0, access_token: quote.access_token.0 }),
    ))
}

async fn list_quotes(
    State(state): State<StaffState>,
) -> Result<Json<Vec<QuoteSummary>>, ApiFailure> {
    let quotes = state.quotes.list().await.map_err(repo_failure)?;

    let summaries = quotes
        .into_iter()
        .map(|quote| {
            let total_ttc = match &quote.acceptance {
                AcceptanceState::Accepted(record) => round_money(record.total_ttc),
                _ => round_money(quote.totals().ttc),
            };
            QuoteSummary {
                id: quote.id.0,
                title: quote.title,
                client_name: quote.client.full_name(),
                status: quote.status,
                acceptance_status: quote.acceptance.status(),
                total_ttc,
                access_token: quote.access_token.0,
                updated_at: quote.updated_at,
            }
        })
        .collect();

    Ok(Json(summaries))
}

async fn get_quote(
    Path(id): Path<String>,
    State(state): State<StaffState>,
) -> Result<Json<QuoteView>, ApiFailure> {
    let quote = load_quote(&state, &id).await?;
    Ok(Json(view(quote)))
}

async fn delete_quote(
    Path(id): Path<String>,
    State(state): State<StaffState>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let removed =
        state.quotes.delete(&QuoteId(id.clone())).await.map_err(repo_failure)?;
    if !removed {
        return Err(not_found(format!("quote `{id}` not found")));
    }
    info!(event_name = "staff.quote.deleted", quote_id = %id, "quote deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn update_details(
    Path(id): Path<String>,
    State(state): State<StaffState>,
    Json(body): Json<UpdateDetailsRequest>,
) -> Result<Json<QuoteView>, ApiFailure> {
    mutate(&state, &id, |quote| {
        if let Some(client) = body.client {
            quote.set_client(client)?;
        }
        if let Some(title) = body.title {
            quote.set_title(title)?;
        }
        if let Some(observations) = body.observations {
            quote.set_observations(observations)?;
        }
        if let Some(options) = body.options {
            quote.set_options(options)?;
        }
        Ok(())
    })
    .await
}

async fn add_line(
    Path(id): Path<String>,
    State(state): State<StaffState>,
    Json(body): Json<AddLineRequest>,
) -> Result<Json<QuoteView>, ApiFailure> {
    let product = state
        .products
        .find_by_id(&devisio_core::domain::product::ProductId(body.product_id.clone()))
        .await
        .map_err(repo_failure)?
        .ok_or_else(|| not_found(format!("product `{}` not found", body.product_id)))?;
    if !product.active {
        return Err(bad_request(format!("product `{}` is no longer active", body.product_id)));
    }

    mutate(&state, &id, |quote| {
        quote.add_or_update_line(&product, body.quantity)?;
        Ok(())
    })
    .await
}

async fn update_line(
    Path((id, line_id)): Path<(String, String)>,
    State(state): State<StaffState>,
    Json(body): Json<UpdateLineRequest>,
) -> Result<Json<QuoteView>, ApiFailure> {
    let line_id = QuoteLineId(line_id);
    mutate(&state, &id, |quote| {
        if let Some(quantity) = body.quantity {
            quote.set_line_quantity(&line_id, quantity)?;
        }
        if let Some(price) = body.unit_price_ht {
            quote.set_line_price(&line_id, price)?;
        }
        Ok(())
    })
    .await
}

async fn remove_line(
    Path((id, line_id)): Path<(String, String)>,
    State(state): State<StaffState>,
) -> Result<Json<QuoteView>, ApiFailure> {
    let line_id = QuoteLineId(line_id);
    mutate(&state, &id, |quote| quote.remove_line(&line_id)).await
}

async fn set_vat_rate(
    Path(id): Path<String>,
    State(state): State<StaffState>,
    Json(body): Json<VatRateRequest>,
) -> Result<Json<QuoteView>, ApiFailure> {
    let rate = QuoteVatRate::from_rate(body.rate).map_err(domain_failure)?;
    mutate(&state, &id, |quote| quote.set_vat_rate(rate)).await
}

async fn set_kind(
    Path(id): Path<String>,
    State(state): State<StaffState>,
    Json(body): Json<KindRequest>,
) -> Result<Json<QuoteView>, ApiFailure> {
    mutate(&state, &id, |quote| quote.switch_kind(body.kind)).await
}

async fn set_intro(
    Path(id): Path<String>,
    State(state): State<StaffState>,
    Json(body): Json<IntroRequest>,
) -> Result<Json<QuoteView>, ApiFailure> {
    let generator = state.intro.clone();
    mutate(&state, &id, move |quote| match body.mode {
        IntroMode::Generate => {
            let text = generator.generate(quote);
            quote.set_intro_generated(text, Utc::now())
        }
        IntroMode::Manual => {
            let text = body.text.unwrap_or_default();
            quote.set_intro_manual(text, Utc::now())
        }
    })
    .await
}

async fn create_payment_link(
    Path(id): Path<String>,
    State(state): State<StaffState>,
) -> Result<Json<PaymentLinkResponse>, ApiFailure> {
    let mut quote = load_quote(&state, &id).await?;

    // The deposit is derived once, here: from the acceptance snapshot when
    // signed, from the live calculator otherwise.
    let deposit = match &quote.acceptance {
        AcceptanceState::Accepted(record) => record.deposit,
        _ => {
            let add_ons = resolve_selected_products(&state, &quote).await?;
            quote.display_totals(&add_ons).deposit
        }
    };

    let token = quote.issue_payment_link();
    let form = payment::build_redirect_form(&quote, deposit, &state.payment, Utc::now())
        .map_err(|e| bad_request(e.to_string()))?;
    state.quotes.save_payment_link(&quote).await.map_err(repo_failure)?;

    info!(event_name = "staff.payment_link.created", quote_id = %quote.id.0, "payment link minted");
    Ok(Json(PaymentLinkResponse { token: token.0, form }))
}

async fn resolve_selected_products(
    state: &StaffState,
    quote: &Quote,
) -> Result<Vec<devisio_core::domain::product::Product>, ApiFailure> {
    let mut products = Vec::with_capacity(quote.selected_add_ons.len());
    for product_id in quote.selected_add_ons.keys() {
        if let Some(product) =
            state.products.find_by_id(product_id).await.map_err(repo_failure)?
        {
            products.push(product);
        }
    }
    Ok(products)
}

async fn list_notifications(
    State(state): State<StaffState>,
) -> Result<Json<Vec<Notification>>, ApiFailure> {
    let unread = state.notifications.list_unread().await.map_err(repo_failure)?;
    Ok(Json(unread))
}

async fn mark_notification_read(
    Path(id): Path<String>,
    State(state): State<StaffState>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let marked = state.notifications.mark_read(&id).await.map_err(repo_failure)?;
    if !marked {
        return Err(not_found(format!("notification `{id}` not found or already read")));
    }
    Ok(Json(serde_json::json!({ "read": true })))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Path, State};
    use axum::Json;
    use rust_decimal::Decimal;

    use devisio_core::config::PaymentConfig;
    use devisio_core::domain::client::Client;
    use devisio_core::domain::product::{Product, ProductId};
    use devisio_core::domain::quote::QuoteKind;
    use devisio_db::repositories::{NotificationRepository, ProductRepository, SqlNotificationRepository};
    use devisio_db::{connect_with_settings, migrations};
    use devisio_extrabat::NoopErpSync;

    use crate::intro::TemplateIntroGenerator;

    use super::*;

    async fn state() -> StaffState {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let products = Arc::new(devisio_db::repositories::SqlProductRepository::new(pool.clone()));
        products.save(&product("central", 450, 20, false, false)).await.expect("seed");
        products.save(&product("visit", 90, 20, false, true)).await.expect("seed");

        StaffState {
            quotes: Arc::new(devisio_db::repositories::SqlQuoteRepository::new(pool.clone())),
            products,
            notifications: Arc::new(SqlNotificationRepository::new(pool)),
            intro: Arc::new(TemplateIntroGenerator),
            erp: Arc::new(NoopErpSync),
            payment: PaymentConfig {
                enabled: true,
                gateway_url: "https://paiement.systempay.fr/vads-payment/".to_string(),
                site_id: "12345678".to_string(),
                certificate: "test-certificate".to_string().into(),
                mode: devisio_core::config::PaymentMode::Test,
                currency_code: "978".to_string(),
                return_url: "https://devis.example.com/payment/result".to_string(),
            },
        }
    }

    fn product(id: &str, price: i64, vat_rate: i64, optionable: bool, upsell: bool) -> Product {
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
            upsell,
        }
    }

    fn client() -> Client {
        Client {
            last_name: "Dupont".to_string(),
            first_name: "Jean".to_string(),
            email: "jean@example.com".to_string(),
            ..Client::default()
        }
    }

    async fn create(state: &StaffState, kind: QuoteKind) -> String {
        let (status, Json(response)) = create_quote(
            State(state.clone()),
            Json(CreateQuoteRequest {
                client: client(),
                title: "Alarme maison".to_string(),
                kind: Some(kind),
            }),
        )
        .await
        .expect("create");
        assert_eq!(status, StatusCode::CREATED);
        response.id
    }

    #[tokio::test]
    async fn create_requires_a_client_name() {
        let state = state().await;
        let result = create_quote(
            State(state),
            Json(CreateQuoteRequest {
                client: Client::default(),
                title: "Sans client".to_string(),
                kind: None,
            }),
        )
        .await;

        let (status, _) = result.expect_err("missing name");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upsell_quotes_are_preloaded_with_zero_quantity_proposals() {
        let state = state().await;
        let id = create(&state, QuoteKind::MaintenanceUpsell).await;

        let Json(view) = get_quote(Path(id), State(state)).await.expect("get");
        assert_eq!(view.quote.lines.len(), 1);
        assert_eq!(view.quote.lines[0].quantity, 0);
        assert_eq!(view.totals.ttc, Decimal::ZERO);
    }

    #[tokio::test]
    async fn line_lifecycle_add_update_remove() {
        let state = state().await;
        let id = create(&state, QuoteKind::NewInstallation).await;

        let Json(view) = add_line(
            Path(id.clone()),
            State(state.clone()),
            Json(AddLineRequest { product_id: "central".to_string(), quantity: Some(2) }),
        )
        .await
        .expect("add line");
        assert_eq!(view.totals.ttc, Decimal::from(1080));
        let line_id = view.quote.lines[0].id.0.clone();

        let Json(view) = update_line(
            Path((id.clone(), line_id.clone())),
            State(state.clone()),
            Json(UpdateLineRequest { quantity: Some(1), unit_price_ht: Some(Decimal::from(400)) }),
        )
        .await
        .expect("update line");
        assert_eq!(view.quote.lines[0].unit_price_ht, Decimal::from(400));
        assert_eq!(view.totals.ttc, Decimal::from(480));

        let Json(view) = remove_line(Path((id, line_id)), State(state)).await.expect("remove");
        assert!(view.quote.lines.is_empty());
        assert_eq!(view.totals.ttc, Decimal::ZERO);
    }

    #[tokio::test]
    async fn negative_price_is_rejected_by_the_api() {
        let state = state().await;
        let id = create(&state, QuoteKind::NewInstallation).await;
        let Json(view) = add_line(
            Path(id.clone()),
            State(state.clone()),
            Json(AddLineRequest { product_id: "central".to_string(), quantity: Some(1) }),
        )
        .await
        .expect("add line");
        let line_id = view.quote.lines[0].id.0.clone();

        let (status, _) = update_line(
            Path((id, line_id)),
            State(state),
            Json(UpdateLineRequest { quantity: None, unit_price_ht: Some(Decimal::from(-5)) }),
        )
        .await
        .expect_err("negative price");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn vat_rate_endpoint_accepts_only_legal_rates() {
        let state = state().await;
        let id = create(&state, QuoteKind::NewInstallation).await;

        let Json(view) = set_vat_rate(
            Path(id.clone()),
            State(state.clone()),
            Json(VatRateRequest { rate: Decimal::from(10) }),
        )
        .await
        .expect("reduced rate");
        assert_eq!(view.quote.vat_rate, QuoteVatRate::Reduced);

        let (status, _) = set_vat_rate(
            Path(id),
            State(state),
            Json(VatRateRequest { rate: Decimal::new(55, 1) }),
        )
        .await
        .expect_err("5.5 is not a quote rate");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn kind_switch_applies_the_bulk_quantity_effect() {
        let state = state().await;
        let id = create(&state, QuoteKind::NewInstallation).await;
        add_line(
            Path(id.clone()),
            State(state.clone()),
            Json(AddLineRequest { product_id: "central".to_string(), quantity: Some(2) }),
        )
        .await
        .expect("add line");

        let Json(view) = set_kind(
            Path(id.clone()),
            State(state.clone()),
            Json(KindRequest { kind: QuoteKind::MaintenanceUpsell }),
        )
        .await
        .expect("switch");
        assert_eq!(view.quote.lines[0].quantity, 0);

        let Json(view) = set_kind(
            Path(id),
            State(state),
            Json(KindRequest { kind: QuoteKind::NewInstallation }),
        )
        .await
        .expect("switch back");
        assert_eq!(view.quote.lines[0].quantity, 1);
    }

    #[tokio::test]
    async fn generated_intro_refuses_to_overwrite_a_manual_edit() {
        let state = state().await;
        let id = create(&state, QuoteKind::NewInstallation).await;

        set_intro(
            Path(id.clone()),
            State(state.clone()),
            Json(IntroRequest {
                mode: IntroMode::Manual,
                text: Some("Texte retravaillé.".to_string()),
            }),
        )
        .await
        .expect("manual intro");

        let (status, _) = set_intro(
            Path(id),
            State(state),
            Json(IntroRequest { mode: IntroMode::Generate, text: None }),
        )
        .await
        .expect_err("manual edit locks generation");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn payment_link_is_minted_and_stored() {
        let state = state().await;
        let id = create(&state, QuoteKind::NewInstallation).await;
        add_line(
            Path(id.clone()),
            State(state.clone()),
            Json(AddLineRequest { product_id: "central".to_string(), quantity: Some(2) }),
        )
        .await
        .expect("add line");

        let Json(response) =
            create_payment_link(Path(id.clone()), State(state.clone())).await.expect("link");
        // 2 x 450 at 20% -> TTC 1080, deposit 432.00 -> 43200 cents.
        assert_eq!(response.form.fields.get("vads_amount").map(String::as_str), Some("43200"));

        let Json(view) = get_quote(Path(id), State(state)).await.expect("get");
        assert_eq!(view.quote.payment_link_token.map(|t| t.0), Some(response.token));
    }

    #[tokio::test]
    async fn notifications_listing_and_read_flow() {
        let state = state().await;

        let notification = devisio_core::notify::Notification::new(
            devisio_core::notify::NotificationKind::QuoteAccepted,
            None,
            "Nouveau devis accepté",
            "Le devis a été accepté",
            chrono::Utc::now(),
        );
        state.notifications.record(&notification).await.expect("record");

        let Json(unread) = list_notifications(State(state.clone())).await.expect("list");
        assert_eq!(unread.len(), 1);

        mark_notification_read(Path(notification.id.clone()), State(state.clone()))
            .await
            .expect("mark read");
        let Json(unread) = list_notifications(State(state.clone())).await.expect("list");
        assert!(unread.is_empty());

        let (status, _) = mark_notification_read(Path(notification.id), State(state))
            .await
            .expect_err("second read");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_quote_ids_are_not_found() {
        let state = state().await;
        let (status, _) =
            get_quote(Path("missing".to_string()), State(state)).await.expect_err("missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
