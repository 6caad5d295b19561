//! Quote totals calculator.
//!
//! Pure aggregation of line amounts into HT / VAT-by-rate / TTC / deposit.
//! Every surface that shows money (staff editor, public viewer, PDF) derives
//! its figures from this module; totals are never stored as an independent
//! source of truth. Amounts stay unrounded internally; rounding to 2 decimals
//! happens only at presentation boundaries via [`round_money`].

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// One priced line, already resolved to its effective quantity and rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricedLine {
    pub quantity: u32,
    pub unit_price_ht: Decimal,
    pub vat_rate: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteTotals {
    pub ht: Decimal,
    /// VAT amount accumulated per distinct rate, across base lines and
    /// add-ons. Mixed rates stay separate so the document can list them.
    pub vat_by_rate: BTreeMap<Decimal, Decimal>,
    pub ttc: Decimal,
    pub deposit: Decimal,
    pub base_ht: Decimal,
    pub add_ons_ht: Decimal,
}

impl QuoteTotals {
    pub fn vat_total(&self) -> Decimal {
        self.vat_by_rate.values().copied().sum()
    }

    /// Presentation copy with every amount rounded to 2 decimals.
    pub fn rounded(&self) -> QuoteTotals {
        QuoteTotals {
            ht: round_money(self.ht),
            vat_by_rate: self
                .vat_by_rate
                .iter()
                .map(|(rate, amount)| (*rate, round_money(*amount)))
                .collect(),
            ttc: round_money(self.ttc),
            deposit: round_money(self.deposit),
            base_ht: round_money(self.base_ht),
            add_ons_ht: round_money(self.add_ons_ht),
        }
    }
}

/// Fixed 40% deposit policy.
pub fn deposit_rate() -> Decimal {
    Decimal::new(4, 1)
}

pub fn line_ht(quantity: u32, unit_price_ht: Decimal) -> Decimal {
    unit_price_ht * Decimal::from(quantity)
}

pub fn line_vat(line_ht: Decimal, vat_rate: Decimal) -> Decimal {
    line_ht * vat_rate / Decimal::ONE_HUNDRED
}

/// Aggregate base lines and selected add-ons into quote totals.
///
/// Deterministic and total: zero lines produce zero totals, never an error.
/// Invalid inputs (negative quantity or price) are rejected upstream by the
/// aggregate's mutation rules and cannot reach this function.
pub fn calculate(base_lines: &[PricedLine], add_ons: &[PricedLine]) -> QuoteTotals {
    let mut totals = QuoteTotals::default();

    for line in base_lines {
        let ht = line_ht(line.quantity, line.unit_price_ht);
        totals.base_ht += ht;
        *totals.vat_by_rate.entry(line.vat_rate).or_insert(Decimal::ZERO) +=
            line_vat(ht, line.vat_rate);
    }

    for line in add_ons {
        let ht = line_ht(line.quantity, line.unit_price_ht);
        totals.add_ons_ht += ht;
        *totals.vat_by_rate.entry(line.vat_rate).or_insert(Decimal::ZERO) +=
            line_vat(ht, line.vat_rate);
    }

    totals.ht = totals.base_ht + totals.add_ons_ht;
    totals.ttc = totals.ht + totals.vat_total();
    totals.deposit = totals.ttc * deposit_rate();
    totals
}

/// Presentation-time rounding: 2 decimals, midpoint away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
