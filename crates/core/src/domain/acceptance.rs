//! Acceptance state machine.
//!
//! The only transitions are `Pending -> Accepted` (client signature) and
//! `Pending -> Rejected` (client decline). Both are one-way: once resolved, a
//! quote never becomes editable again. The pure transition lives here; the
//! compare-and-swap persistence and one-time side effects are orchestrated by
//! the server's acceptance service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::Product;
use crate::domain::quote::{Quote, QuoteStatus};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Signature record frozen at acceptance time, including the totals snapshot
/// so later catalog or price changes cannot alter an accepted quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceRecord {
    pub signatory_name: String,
    pub accepted_terms: bool,
    pub accepted_at: DateTime<Utc>,
    pub total_ttc: Decimal,
    pub deposit: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeclineRecord {
    pub reason: String,
    pub declined_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AcceptanceState {
    Pending,
    Accepted(AcceptanceRecord),
    Rejected(DeclineRecord),
}

impl AcceptanceState {
    pub fn status(&self) -> AcceptanceStatus {
        match self {
            Self::Pending => AcceptanceStatus::Pending,
            Self::Accepted(_) => AcceptanceStatus::Accepted,
            Self::Rejected(_) => AcceptanceStatus::Rejected,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl Quote {
    /// Accept the quote on behalf of the client.
    ///
    /// Preconditions: acceptance still pending, non-empty signatory name,
    /// terms accepted. Any violation returns an error without touching state.
    /// On success the signature and the client-facing totals (overrides plus
    /// selected add-ons) are snapshotted into the record.
    pub fn accept(
        &mut self,
        signatory_name: &str,
        accepted_terms: bool,
        add_on_products: &[Product],
        now: DateTime<Utc>,
    ) -> Result<AcceptanceRecord, DomainError> {
        if !self.acceptance.is_pending() {
            return Err(DomainError::QuoteLocked { status: self.acceptance.status() });
        }
        let signatory = signatory_name.trim();
        if signatory.is_empty() {
            return Err(DomainError::MissingSignatory);
        }
        if !accepted_terms {
            return Err(DomainError::TermsNotAccepted);
        }

        let totals = self.display_totals(add_on_products);
        let record = AcceptanceRecord {
            signatory_name: signatory.to_string(),
            accepted_terms,
            accepted_at: now,
            total_ttc: totals.ttc,
            deposit: totals.deposit,
        };
        self.acceptance = AcceptanceState::Accepted(record.clone());
        self.status = QuoteStatus::Signed;
        Ok(record)
    }

    /// Decline the quote with a reason. Terminal, like acceptance.
    pub fn decline(&mut self, reason: &str, now: DateTime<Utc>) -> Result<DeclineRecord, DomainError> {
        if !self.acceptance.is_pending() {
            return Err(DomainError::QuoteLocked { status: self.acceptance.status() });
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::MissingDeclineReason);
        }

        let record = DeclineRecord { reason: reason.to_string(), declined_at: now };
        self.acceptance = AcceptanceState::Rejected(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use crate::domain::client::Client;
    use crate::domain::product::{Product, ProductId};
    use crate::domain::quote::{Quote, QuoteKind, QuoteStatus};
    use crate::errors::DomainError;
    use crate::pricing::round_money;

    use super::{AcceptanceState, AcceptanceStatus};

    fn base_product() -> Product {
        Product {
            id: ProductId("central".to_string()),
            reference: "AJX-HUB2".to_string(),
            name: "Centrale d'alarme".to_string(),
            category: "Intrusion".to_string(),
            description: String::new(),
            price_ht: Decimal::from(100),
            default_vat_rate: Decimal::from(20),
            active: true,
            optionable: false,
            upsell: false,
        }
    }

    fn option_product() -> Product {
        Product {
            id: ProductId("siren".to_string()),
            reference: "AJX-SIR".to_string(),
            name: "Sirène extérieure".to_string(),
            category: "Intrusion".to_string(),
            description: String::new(),
            price_ht: Decimal::from(50),
            default_vat_rate: Decimal::from(10),
            active: true,
            optionable: true,
            upsell: false,
        }
    }

    fn pending_quote() -> Quote {
        let mut quote =
            Quote::create(Client::default(), "Alarme maison", QuoteKind::NewInstallation, Utc::now());
        quote.add_or_update_line(&base_product(), Some(2)).expect("add line");
        quote
    }

    #[test]
    fn accept_snapshots_totals_including_add_ons() {
        let mut quote = pending_quote();
        let options = [option_product()];
        quote.select_add_on(&options[0], 1).expect("select option");

        let record = quote.accept("Jean Dupont", true, &options, Utc::now()).expect("accept");

        assert_eq!(record.signatory_name, "Jean Dupont");
        assert_eq!(record.total_ttc, Decimal::from(295));
        assert_eq!(round_money(record.deposit), Decimal::new(11800, 2));
        assert_eq!(quote.acceptance_status(), AcceptanceStatus::Accepted);
        assert_eq!(quote.status, QuoteStatus::Signed);
    }

    #[test]
    fn accept_requires_a_signatory_name() {
        let mut quote = pending_quote();
        let error = quote.accept("   ", true, &[], Utc::now()).expect_err("empty signatory");

        assert_eq!(error, DomainError::MissingSignatory);
        assert!(quote.acceptance.is_pending(), "failed precondition must not change state");
    }

    #[test]
    fn accept_requires_accepted_terms() {
        let mut quote = pending_quote();
        let error = quote.accept("Jean Dupont", false, &[], Utc::now()).expect_err("terms");

        assert_eq!(error, DomainError::TermsNotAccepted);
        assert!(quote.acceptance.is_pending());
    }

    #[test]
    fn second_accept_is_rejected_without_side_effects() {
        let mut quote = pending_quote();
        let first = quote.accept("Jean Dupont", true, &[], Utc::now()).expect("first accept");

        let error = quote.accept("Jean Dupont", true, &[], Utc::now()).expect_err("second accept");
        assert!(matches!(error, DomainError::QuoteLocked { status: AcceptanceStatus::Accepted }));

        match &quote.acceptance {
            AcceptanceState::Accepted(record) => {
                assert_eq!(record.accepted_at, first.accepted_at, "timestamp recorded exactly once")
            }
            other => panic!("expected accepted state, got {other:?}"),
        }
    }

    #[test]
    fn decline_is_terminal_and_requires_a_reason() {
        let mut quote = pending_quote();
        assert_eq!(
            quote.decline("  ", Utc::now()).expect_err("empty reason"),
            DomainError::MissingDeclineReason
        );

        let record = quote.decline("Budget dépassé", Utc::now()).expect("decline");
        assert_eq!(record.reason, "Budget dépassé");
        assert_eq!(quote.acceptance_status(), AcceptanceStatus::Rejected);

        assert!(matches!(
            quote.accept("Jean Dupont", true, &[], Utc::now()),
            Err(DomainError::QuoteLocked { status: AcceptanceStatus::Rejected })
        ));
    }

    #[test]
    fn accepted_quote_refuses_staff_mutations() {
        let mut quote = pending_quote();
        let line_id = quote.lines[0].id.clone();
        quote.accept("Jean Dupont", true, &[], Utc::now()).expect("accept");

        assert!(matches!(
            quote.set_line_quantity(&line_id, 9),
            Err(DomainError::QuoteLocked { .. })
        ));
        assert!(matches!(
            quote.switch_kind(QuoteKind::MaintenanceUpsell),
            Err(DomainError::QuoteLocked { .. })
        ));
    }
}
