//! Deterministic demo dataset: a small security-equipment catalog and one
//! quote ready for the public viewer. Used by `devisio seed` and by tests
//! that want a realistic starting state.

use chrono::Utc;
use rust_decimal::Decimal;

use devisio_core::domain::client::Client;
use devisio_core::domain::product::{Product, ProductId};
use devisio_core::domain::quote::{Quote, QuoteKind};

use crate::repositories::{
    ProductRepository, QuoteRepository, RepositoryError, SqlProductRepository, SqlQuoteRepository,
};
use crate::DbPool;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub products: usize,
    pub quotes: usize,
    /// Access token of the demo quote, for opening the public viewer.
    pub demo_quote_token: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub product_count: i64,
    pub quote_count: i64,
}

pub struct SeedDataset;

fn catalog() -> Vec<Product> {
    let product = |id: &str,
                   reference: &str,
                   name: &str,
                   category: &str,
                   description: &str,
                   price_cents: i64,
                   vat_rate: i64,
                   optionable: bool,
                   upsell: bool| Product {
        id: ProductId(id.to_string()),
        reference: reference.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        price_ht: Decimal::new(price_cents, 2),
        default_vat_rate: Decimal::from(vat_rate),
        active: true,
        optionable,
        upsell,
    };

    vec![
        product(
            "hub-2",
            "AJX-HUB2",
            "Centrale d'alarme Hub 2",
            "Intrusion",
            "Centrale sans fil avec transmission 4G et levée de doute par images",
            45_000,
            20,
            false,
            false,
        ),
        product(
            "motion-cam",
            "AJX-MCAM",
            "Détecteur de mouvement à prise d'images",
            "Intrusion",
            "Détection intérieure avec photo de levée de doute",
            12_900,
            20,
            false,
            false,
        ),
        product(
            "door-protect",
            "AJX-DOOR",
            "Détecteur d'ouverture",
            "Intrusion",
            "Contact d'ouverture sans fil pour portes et fenêtres",
            5_900,
            20,
            false,
            false,
        ),
        product(
            "siren-out",
            "AJX-SIRO",
            "Sirène extérieure",
            "Intrusion",
            "Sirène extérieure avec flash, dissuasion en façade",
            14_900,
            10,
            true,
            false,
        ),
        product(
            "keypad",
            "AJX-KEYP",
            "Clavier de commande",
            "Intrusion",
            "Clavier sans fil pour armement et désarmement",
            8_900,
            20,
            true,
            false,
        ),
        product(
            "maintenance-visit",
            "SRV-VISIT",
            "Visite d'entretien annuelle",
            "Services",
            "Contrôle complet du système et remplacement des piles",
            9_000,
            20,
            false,
            true,
        ),
    ]
}

impl SeedDataset {
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let products = SqlProductRepository::new(pool.clone());
        let quotes = SqlQuoteRepository::new(pool.clone());

        let catalog = catalog();
        for product in &catalog {
            products.save(product).await?;
        }

        let client = Client {
            last_name: "Martin".to_string(),
            first_name: "Claire".to_string(),
            email: "claire.martin@example.com".to_string(),
            phone: "0612345678".to_string(),
            address: "12 rue des Peupliers".to_string(),
            postal_code: Some("27000".to_string()),
            city: Some("Évreux".to_string()),
            extrabat_id: None,
        };

        let mut quote = Quote::create(
            client,
            "Protection de la maison principale",
            QuoteKind::NewInstallation,
            Utc::now(),
        );
        let hub = &catalog[0];
        let motion = &catalog[1];
        let door = &catalog[2];
        quote.add_or_update_line(hub, Some(1)).expect("seed quote is editable");
        quote.add_or_update_line(motion, Some(2)).expect("seed quote is editable");
        quote.add_or_update_line(door, Some(3)).expect("seed quote is editable");
        quote.mark_sent();

        let token = quote.access_token.0.clone();
        quotes.create(&quote).await?;

        Ok(SeedResult { products: catalog.len(), quotes: 1, demo_quote_token: token })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let product_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product").fetch_one(pool).await?;
        let quote_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM quote").fetch_one(pool).await?;
        Ok(VerificationResult { product_count, quote_count })
    }
}

#[cfg(test)]
mod tests {
    use crate::fixtures::SeedDataset;
    use crate::repositories::{QuoteRepository, SqlQuoteRepository};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seed_loads_catalog_and_a_viewable_quote() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let result = SeedDataset::load(&pool).await.expect("seed");
        assert_eq!(result.products, 6);
        assert_eq!(result.quotes, 1);

        let verification = SeedDataset::verify(&pool).await.expect("verify");
        assert_eq!(verification.product_count, 6);
        assert_eq!(verification.quote_count, 1);

        let quotes = SqlQuoteRepository::new(pool);
        let quote = quotes
            .find_by_token(&result.demo_quote_token)
            .await
            .expect("find")
            .expect("demo quote resolvable by token");
        assert_eq!(quote.lines.len(), 3);
    }
}
