use std::collections::HashMap;

use tokio::sync::RwLock;

use devisio_core::domain::acceptance::AcceptanceStatus;
use devisio_core::domain::product::{Product, ProductId};
use devisio_core::domain::quote::{Quote, QuoteId};

use super::{ProductRepository, QuoteRepository, RepositoryError};

/// In-memory quote store mirroring the SQL repository's conditional-write
/// semantics, for exercising services without a database.
#[derive(Default)]
pub struct InMemoryQuoteRepository {
    quotes: RwLock<HashMap<String, Quote>>,
}

fn conflict(id: &QuoteId) -> RepositoryError {
    RepositoryError::Conflict { entity: "quote", id: id.0.clone() }
}

#[async_trait::async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn create(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        quotes.insert(quote.id.0.clone(), quote.clone());
        Ok(())
    }

    async fn save_staff(&self, quote: &Quote) -> Result<i64, RepositoryError> {
        let mut quotes = self.quotes.write().await;
        let stored = quotes.get_mut(&quote.id.0).ok_or_else(|| conflict(&quote.id))?;
        if stored.version != quote.version
            || stored.acceptance_status() != AcceptanceStatus::Pending
        {
            return Err(conflict(&quote.id));
        }

        let overrides = stored.quantity_overrides.clone();
        let add_ons = stored.selected_add_ons.clone();
        *stored = quote.clone();
        stored.version += 1;
        stored.quantity_overrides = overrides;
        stored.selected_add_ons = add_ons;
        Ok(stored.version)
    }

    async fn save_client_adjustments(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        let stored = quotes.get_mut(&quote.id.0).ok_or_else(|| conflict(&quote.id))?;
        if stored.acceptance_status() != AcceptanceStatus::Pending {
            return Err(conflict(&quote.id));
        }

        stored.quantity_overrides = quote.quantity_overrides.clone();
        stored.selected_add_ons = quote.selected_add_ons.clone();
        stored.payment_link_token = None;
        Ok(())
    }

    async fn record_acceptance(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        let stored = quotes.get_mut(&quote.id.0).ok_or_else(|| conflict(&quote.id))?;
        if stored.version != quote.version
            || stored.acceptance_status() != AcceptanceStatus::Pending
        {
            return Err(conflict(&quote.id));
        }

        stored.acceptance = quote.acceptance.clone();
        stored.status = quote.status;
        stored.quantity_overrides = quote.quantity_overrides.clone();
        stored.selected_add_ons = quote.selected_add_ons.clone();
        stored.version += 1;
        Ok(())
    }

    async fn record_decline(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        let stored = quotes.get_mut(&quote.id.0).ok_or_else(|| conflict(&quote.id))?;
        if stored.version != quote.version
            || stored.acceptance_status() != AcceptanceStatus::Pending
        {
            return Err(conflict(&quote.id));
        }

        stored.acceptance = quote.acceptance.clone();
        stored.version += 1;
        Ok(())
    }

    async fn save_payment_link(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        let stored = quotes.get_mut(&quote.id.0).ok_or_else(|| conflict(&quote.id))?;
        stored.payment_link_token = quote.payment_link_token.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        Ok(quotes.get(&id.0).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Quote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        Ok(quotes.values().find(|quote| quote.access_token.0 == token).cloned())
    }

    async fn find_by_payment_token(&self, token: &str) -> Result<Option<Quote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        Ok(quotes
            .values()
            .find(|quote| {
                quote.payment_link_token.as_ref().is_some_and(|stored| stored.0 == token)
            })
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Quote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        let mut all: Vec<Quote> = quotes.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }

    async fn delete(&self, id: &QuoteId) -> Result<bool, RepositoryError> {
        let mut quotes = self.quotes.write().await;
        Ok(quotes.remove(&id.0).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| p.active).cloned().collect())
    }

    async fn list_optionable(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| p.active && p.optionable).cloned().collect())
    }

    async fn list_upsell(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.values().filter(|p| p.active && p.upsell).cloned().collect())
    }

    async fn save(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product.clone());
        Ok(())
    }
}
