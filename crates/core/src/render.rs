//! Rendering adapter: projects a quote snapshot (plus client add-on
//! selections and quantity overrides) into a display-ready document payload.
//!
//! The payload's figures come from the same totals calculator as the
//! interactive viewer, rounded once here. The PDF and the viewer can never
//! disagree on an amount because neither carries its own formula.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::client::Client;
use crate::domain::product::Product;
use crate::domain::quote::{Quote, QuoteKind, QuoteOptions, QuoteStatus};
use crate::pricing::{self, round_money};

#[derive(Clone, Debug, Serialize)]
pub struct DocumentLine {
    pub reference: String,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price_ht: Decimal,
    pub vat_rate: Decimal,
    pub total_ht: Decimal,
    pub total_vat: Decimal,
    pub total_ttc: Decimal,
}

#[derive(Clone, Debug, Serialize)]
pub struct DocumentTotals {
    pub ht: Decimal,
    /// Rate label -> VAT amount, e.g. `"20" -> 40.00`.
    pub vat_by_rate: BTreeMap<String, Decimal>,
    pub ttc: Decimal,
    pub deposit: Decimal,
    pub base_ht: Decimal,
    pub add_ons_ht: Decimal,
}

#[derive(Clone, Debug, Serialize)]
pub struct DocumentAcceptance {
    pub signatory_name: String,
    pub accepted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DocumentPayload {
    pub quote_id: String,
    pub title: String,
    pub kind: QuoteKind,
    pub status: QuoteStatus,
    pub client: Client,
    pub intro_text: Option<String>,
    pub observations: String,
    pub options: QuoteOptions,
    pub lines: Vec<DocumentLine>,
    pub add_ons: Vec<DocumentLine>,
    pub totals: DocumentTotals,
    pub acceptance: Option<DocumentAcceptance>,
    pub generated_at: DateTime<Utc>,
}

fn document_line(
    reference: &str,
    name: &str,
    description: &str,
    quantity: u32,
    unit_price_ht: Decimal,
    vat_rate: Decimal,
) -> DocumentLine {
    let total_ht = pricing::line_ht(quantity, unit_price_ht);
    let total_vat = pricing::line_vat(total_ht, vat_rate);
    DocumentLine {
        reference: reference.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        quantity,
        unit_price_ht: round_money(unit_price_ht),
        vat_rate,
        total_ht: round_money(total_ht),
        total_vat: round_money(total_vat),
        total_ttc: round_money(total_ht + total_vat),
    }
}

pub fn build_document(
    quote: &Quote,
    add_on_products: &[Product],
    now: DateTime<Utc>,
) -> DocumentPayload {
    let base_rate = quote.vat_rate.rate();
    let lines = quote
        .lines
        .iter()
        .map(|line| {
            document_line(
                &line.reference,
                &line.name,
                &line.description,
                quote.effective_quantity(line),
                line.unit_price_ht,
                base_rate,
            )
        })
        .collect();

    let add_ons = quote
        .selected_add_ons
        .iter()
        .filter_map(|(product_id, quantity)| {
            add_on_products.iter().find(|p| &p.id == product_id).map(|product| {
                document_line(
                    &product.reference,
                    &product.name,
                    &product.description,
                    *quantity,
                    product.price_ht,
                    product.default_vat_rate,
                )
            })
        })
        .collect();

    let totals = quote.display_totals(add_on_products);
    let totals = DocumentTotals {
        ht: round_money(totals.ht),
        vat_by_rate: totals
            .vat_by_rate
            .iter()
            .map(|(rate, amount)| (rate.normalize().to_string(), round_money(*amount)))
            .collect(),
        ttc: round_money(totals.ttc),
        deposit: round_money(totals.deposit),
        base_ht: round_money(totals.base_ht),
        add_ons_ht: round_money(totals.add_ons_ht),
    };

    let acceptance = match &quote.acceptance {
        crate::domain::acceptance::AcceptanceState::Accepted(record) => Some(DocumentAcceptance {
            signatory_name: record.signatory_name.clone(),
            accepted_at: record.accepted_at,
        }),
        _ => None,
    };

    DocumentPayload {
        quote_id: quote.id.0.clone(),
        title: quote.title.clone(),
        kind: quote.kind,
        status: quote.status,
        client: quote.client.clone(),
        intro_text: quote.intro.as_ref().map(|intro| intro.text().to_string()),
        observations: quote.observations.clone(),
        options: quote.options,
        lines,
        add_ons,
        totals,
        acceptance,
        generated_at: now,
    }
}
