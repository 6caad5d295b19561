use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::acceptance::{AcceptanceState, AcceptanceStatus};
use crate::domain::client::Client;
use crate::domain::product::{Product, ProductId};
use crate::errors::DomainError;
use crate::pricing::{self, PricedLine, QuoteTotals};
use crate::token::{AccessToken, PaymentLinkToken};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl QuoteId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuoteLineId(pub String);

impl QuoteLineId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

/// Quote kind drives the default quantity policy: a new installation sells
/// every line, a maintenance upsell proposes lines at quantity zero until the
/// client opts in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteKind {
    NewInstallation,
    MaintenanceUpsell,
}

impl QuoteKind {
    pub fn default_quantity(&self) -> u32 {
        match self {
            Self::NewInstallation => 1,
            Self::MaintenanceUpsell => 0,
        }
    }
}

/// The staff-selected VAT rate, applied to every base line. Add-on options
/// keep their product's own rate instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteVatRate {
    Reduced,
    Standard,
}

impl QuoteVatRate {
    pub fn rate(&self) -> Decimal {
        match self {
            Self::Reduced => Decimal::from(10),
            Self::Standard => Decimal::from(20),
        }
    }

    pub fn from_rate(rate: Decimal) -> Result<Self, DomainError> {
        if rate == Decimal::from(10) {
            Ok(Self::Reduced)
        } else if rate == Decimal::from(20) {
            Ok(Self::Standard)
        } else {
            Err(DomainError::UnsupportedVatRate(rate))
        }
    }
}

/// Coarse workflow marker, distinct from the acceptance state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Signed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteOptions {
    pub leasing: bool,
    pub monitoring: bool,
}

/// Introduction text with explicit provenance. A manual edit locks the field
/// against automatic regeneration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum IntroText {
    Auto { text: String, generated_at: DateTime<Utc> },
    Manual { text: String, edited_at: DateTime<Utc> },
}

impl IntroText {
    pub fn text(&self) -> &str {
        match self {
            Self::Auto { text, .. } | Self::Manual { text, .. } => text,
        }
    }
}

/// One priced line. Unit price is copied from the product at creation time
/// and editable by staff afterwards; the VAT rate is the quote's selected
/// rate, never stored per base line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub id: QuoteLineId,
    pub product_id: Option<ProductId>,
    pub reference: String,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price_ht: Decimal,
}

impl QuoteLine {
    pub fn total_ht(&self) -> Decimal {
        pricing::line_ht(self.quantity, self.unit_price_ht)
    }
}

/// The quote aggregate: owns every mutation rule. Staff mutate freely while
/// acceptance is pending; the public viewer mutates only quantity overrides
/// and add-on selections (see `viewer`); acceptance freezes everything.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    /// Optimistic-concurrency counter, bumped by every persisted write.
    pub version: i64,
    pub client: Client,
    pub title: String,
    pub kind: QuoteKind,
    pub vat_rate: QuoteVatRate,
    pub lines: Vec<QuoteLine>,
    pub observations: String,
    pub options: QuoteOptions,
    pub status: QuoteStatus,
    pub access_token: AccessToken,
    pub payment_link_token: Option<PaymentLinkToken>,
    pub acceptance: AcceptanceState,
    /// Client-side quantity adjustments, kept apart from the staff quantity
    /// so neither actor clobbers the other.
    pub quantity_overrides: BTreeMap<QuoteLineId, u32>,
    /// Client-selected optional products, quantity per product.
    pub selected_add_ons: BTreeMap<ProductId, u32>,
    pub intro: Option<IntroText>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    pub fn create(
        client: Client,
        title: impl Into<String>,
        kind: QuoteKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: QuoteId::generate(),
            version: 1,
            client,
            title: title.into(),
            kind,
            vat_rate: QuoteVatRate::Standard,
            lines: Vec::new(),
            observations: String::new(),
            options: QuoteOptions::default(),
            status: QuoteStatus::Draft,
            access_token: AccessToken::generate(),
            payment_link_token: None,
            acceptance: AcceptanceState::Pending,
            quantity_overrides: BTreeMap::new(),
            selected_add_ons: BTreeMap::new(),
            intro: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn acceptance_status(&self) -> AcceptanceStatus {
        self.acceptance.status()
    }

    pub(crate) fn ensure_editable(&self) -> Result<(), DomainError> {
        match self.acceptance.status() {
            AcceptanceStatus::Pending => Ok(()),
            status => Err(DomainError::QuoteLocked { status }),
        }
    }

    pub fn set_vat_rate(&mut self, rate: QuoteVatRate) -> Result<(), DomainError> {
        self.ensure_editable()?;
        if self.vat_rate != rate {
            self.vat_rate = rate;
            self.invalidate_payment_link();
        }
        Ok(())
    }

    /// Add a line for `product`, or replace the existing line's quantity and
    /// unit price if the product is already quoted. Quantity defaults to the
    /// kind's policy when not given.
    pub fn add_or_update_line(
        &mut self,
        product: &Product,
        quantity: Option<u32>,
    ) -> Result<QuoteLineId, DomainError> {
        self.ensure_editable()?;
        let quantity = quantity.unwrap_or_else(|| self.kind.default_quantity());

        let existing =
            self.lines.iter().position(|line| line.product_id.as_ref() == Some(&product.id));
        let line_id = match existing {
            Some(index) => {
                let line = &mut self.lines[index];
                line.quantity = quantity;
                line.unit_price_ht = product.price_ht;
                line.id.clone()
            }
            None => {
                let line = QuoteLine {
                    id: QuoteLineId::generate(),
                    product_id: Some(product.id.clone()),
                    reference: product.reference.clone(),
                    name: product.name.clone(),
                    description: product.description.clone(),
                    quantity,
                    unit_price_ht: product.price_ht,
                };
                let id = line.id.clone();
                self.lines.push(line);
                id
            }
        };

        self.invalidate_payment_link();
        Ok(line_id)
    }

    pub fn set_line_quantity(
        &mut self,
        line_id: &QuoteLineId,
        quantity: u32,
    ) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.line_mut(line_id)?.quantity = quantity;
        self.invalidate_payment_link();
        Ok(())
    }

    pub fn set_line_price(&mut self, line_id: &QuoteLineId, price: Decimal) -> Result<(), DomainError> {
        self.ensure_editable()?;
        if price < Decimal::ZERO {
            return Err(DomainError::NegativeUnitPrice);
        }
        self.line_mut(line_id)?.unit_price_ht = price;
        self.invalidate_payment_link();
        Ok(())
    }

    pub fn remove_line(&mut self, line_id: &QuoteLineId) -> Result<(), DomainError> {
        self.ensure_editable()?;
        let before = self.lines.len();
        self.lines.retain(|line| &line.id != line_id);
        if self.lines.len() == before {
            return Err(DomainError::UnknownLine(line_id.0.clone()));
        }
        self.quantity_overrides.remove(line_id);
        self.invalidate_payment_link();
        Ok(())
    }

    /// Switching to maintenance-upsell zeroes every line quantity (lines
    /// become proposals); switching back to new-installation restores
    /// quantity 1 only for lines currently at zero.
    pub fn switch_kind(&mut self, kind: QuoteKind) -> Result<(), DomainError> {
        self.ensure_editable()?;
        if self.kind == kind {
            return Ok(());
        }
        self.kind = kind;
        match kind {
            QuoteKind::MaintenanceUpsell => {
                for line in &mut self.lines {
                    line.quantity = 0;
                }
            }
            QuoteKind::NewInstallation => {
                for line in &mut self.lines {
                    if line.quantity == 0 {
                        line.quantity = 1;
                    }
                }
            }
        }
        self.invalidate_payment_link();
        Ok(())
    }

    pub fn set_client(&mut self, client: Client) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.client = client;
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.title = title.into();
        Ok(())
    }

    pub fn set_observations(&mut self, observations: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.observations = observations.into();
        Ok(())
    }

    pub fn set_options(&mut self, options: QuoteOptions) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.options = options;
        Ok(())
    }

    pub fn mark_sent(&mut self) {
        if self.status == QuoteStatus::Draft {
            self.status = QuoteStatus::Sent;
        }
    }

    /// Record generated introduction text. Refused once the field has been
    /// manually edited; callers wanting to override must go through
    /// [`Quote::set_intro_manual`].
    pub fn set_intro_generated(
        &mut self,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_editable()?;
        if matches!(self.intro, Some(IntroText::Manual { .. })) {
            return Err(DomainError::IntroManuallyEdited);
        }
        self.intro = Some(IntroText::Auto { text: text.into(), generated_at: now });
        Ok(())
    }

    pub fn set_intro_manual(
        &mut self,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_editable()?;
        self.intro = Some(IntroText::Manual { text: text.into(), edited_at: now });
        Ok(())
    }

    pub fn line(&self, line_id: &QuoteLineId) -> Option<&QuoteLine> {
        self.lines.iter().find(|line| &line.id == line_id)
    }

    fn line_mut(&mut self, line_id: &QuoteLineId) -> Result<&mut QuoteLine, DomainError> {
        self.lines
            .iter_mut()
            .find(|line| &line.id == line_id)
            .ok_or_else(|| DomainError::UnknownLine(line_id.0.clone()))
    }

    /// Quantity the client effectively ordered: their override when present,
    /// the staff quantity otherwise.
    pub fn effective_quantity(&self, line: &QuoteLine) -> u32 {
        self.quantity_overrides.get(&line.id).copied().unwrap_or(line.quantity)
    }

    pub fn base_priced_lines(&self, with_overrides: bool) -> Vec<PricedLine> {
        self.lines
            .iter()
            .map(|line| PricedLine {
                quantity: if with_overrides { self.effective_quantity(line) } else { line.quantity },
                unit_price_ht: line.unit_price_ht,
                vat_rate: self.vat_rate.rate(),
            })
            .collect()
    }

    /// Resolve the client's add-on selections against catalog products.
    /// Selections whose product is absent from `add_on_products` are skipped.
    pub fn selected_add_on_lines(&self, add_on_products: &[Product]) -> Vec<PricedLine> {
        self.selected_add_ons
            .iter()
            .filter_map(|(product_id, quantity)| {
                add_on_products.iter().find(|p| &p.id == product_id).map(|product| PricedLine {
                    quantity: *quantity,
                    unit_price_ht: product.price_ht,
                    vat_rate: product.default_vat_rate,
                })
            })
            .collect()
    }

    /// Staff-facing totals: staff quantities, no overrides, no add-ons.
    pub fn totals(&self) -> QuoteTotals {
        pricing::calculate(&self.base_priced_lines(false), &[])
    }

    /// Client-facing totals: overrides applied, selected add-ons included.
    pub fn display_totals(&self, add_on_products: &[Product]) -> QuoteTotals {
        pricing::calculate(
            &self.base_priced_lines(true),
            &self.selected_add_on_lines(add_on_products),
        )
    }

    /// A stale payment link must never charge an amount that no longer
    /// matches the quote, so every totals-affecting mutation drops it.
    pub fn invalidate_payment_link(&mut self) {
        self.payment_link_token = None;
    }

    pub fn issue_payment_link(&mut self) -> PaymentLinkToken {
        let token = PaymentLinkToken::generate();
        self.payment_link_token = Some(token.clone());
        token
    }
}
