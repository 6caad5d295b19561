use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Catalog product, read-only from the quote engine's perspective.
///
/// Pricing is copied into a quote line at the moment the line is created, so
/// later catalog edits never retroactively alter an existing quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub reference: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price_ht: Decimal,
    pub default_vat_rate: Decimal,
    pub active: bool,
    /// May be offered to the client as an optional add-on in the public viewer.
    pub optionable: bool,
    /// Preloaded into maintenance-upsell quotes as a zero-quantity proposal.
    pub upsell: bool,
}
