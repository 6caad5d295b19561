use async_trait::async_trait;
use thiserror::Error;

use devisio_core::domain::product::{Product, ProductId};
use devisio_core::domain::quote::{Quote, QuoteId};
use devisio_core::notify::Notification;

pub mod codec;
pub mod memory;
pub mod notification;
pub mod product;
pub mod quote;

pub use memory::{InMemoryProductRepository, InMemoryQuoteRepository};
pub use notification::SqlNotificationRepository;
pub use product::SqlProductRepository;
pub use quote::SqlQuoteRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("quote `{quote_id}` has unsupported schema version {found}")]
    SchemaVersion { quote_id: String, found: i64 },
    #[error("conflicting concurrent write on {entity} `{id}`")]
    Conflict { entity: &'static str, id: String },
}

/// Persistence contract for the quote aggregate.
///
/// Writes are split by owner so the field-level last-write-wins policy holds:
/// staff saves never touch the client-owned override/add-on columns, client
/// adjustment saves touch nothing else. The acceptance and decline writes are
/// conditional on `acceptance_status = 'pending'` (and the loaded version) so
/// two concurrent resolutions cannot both succeed.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(&self, quote: &Quote) -> Result<(), RepositoryError>;

    /// Persist staff-owned fields, compare-and-swap on `version`. Returns the
    /// new version on success.
    async fn save_staff(&self, quote: &Quote) -> Result<i64, RepositoryError>;

    /// Persist the client-owned columns only (quantity overrides, add-on
    /// selections, payment-link invalidation).
    async fn save_client_adjustments(&self, quote: &Quote) -> Result<(), RepositoryError>;

    /// Persist an acceptance, conditional on the row still being pending.
    async fn record_acceptance(&self, quote: &Quote) -> Result<(), RepositoryError>;

    /// Persist a decline, conditional on the row still being pending.
    async fn record_decline(&self, quote: &Quote) -> Result<(), RepositoryError>;

    async fn save_payment_link(&self, quote: &Quote) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<Quote>, RepositoryError>;
    async fn find_by_payment_token(&self, token: &str) -> Result<Option<Quote>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Quote>, RepositoryError>;
    async fn delete(&self, id: &QuoteId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn list_optionable(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn list_upsell(&self) -> Result<Vec<Product>, RepositoryError>;
    async fn save(&self, product: &Product) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn record(&self, notification: &Notification) -> Result<(), RepositoryError>;
    async fn list_unread(&self) -> Result<Vec<Notification>, RepositoryError>;
    async fn mark_read(&self, id: &str) -> Result<bool, RepositoryError>;
}
