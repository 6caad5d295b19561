//! Versioned wire shapes for the JSON columns of the `quote` row.
//!
//! Every structured column is decoded through an explicit `*V1` struct
//! rather than trusting ambient shape; the row-level `schema_version`
//! discriminates layouts, and loads reject versions this build does not
//! know instead of guessing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use devisio_core::domain::acceptance::{AcceptanceRecord, AcceptanceState, DeclineRecord};
use devisio_core::domain::client::Client;
use devisio_core::domain::product::ProductId;
use devisio_core::domain::quote::{IntroText, QuoteLine, QuoteLineId, QuoteOptions};

use super::RepositoryError;

pub const QUOTE_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientV1 {
    pub last_name: String,
    pub first_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub extrabat_id: Option<i64>,
}

impl From<&Client> for ClientV1 {
    fn from(client: &Client) -> Self {
        Self {
            last_name: client.last_name.clone(),
            first_name: client.first_name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            address: client.address.clone(),
            postal_code: client.postal_code.clone(),
            city: client.city.clone(),
            extrabat_id: client.extrabat_id,
        }
    }
}

impl From<ClientV1> for Client {
    fn from(value: ClientV1) -> Self {
        Self {
            last_name: value.last_name,
            first_name: value.first_name,
            email: value.email,
            phone: value.phone,
            address: value.address,
            postal_code: value.postal_code,
            city: value.city,
            extrabat_id: value.extrabat_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineV1 {
    pub id: String,
    pub product_id: Option<String>,
    pub reference: String,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price_ht: Decimal,
}

impl From<&QuoteLine> for LineV1 {
    fn from(line: &QuoteLine) -> Self {
        Self {
            id: line.id.0.clone(),
            product_id: line.product_id.as_ref().map(|id| id.0.clone()),
            reference: line.reference.clone(),
            name: line.name.clone(),
            description: line.description.clone(),
            quantity: line.quantity,
            unit_price_ht: line.unit_price_ht,
        }
    }
}

impl From<LineV1> for QuoteLine {
    fn from(value: LineV1) -> Self {
        Self {
            id: QuoteLineId(value.id),
            product_id: value.product_id.map(ProductId),
            reference: value.reference,
            name: value.name,
            description: value.description,
            quantity: value.quantity,
            unit_price_ht: value.unit_price_ht,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionsV1 {
    #[serde(default)]
    pub leasing: bool,
    #[serde(default)]
    pub monitoring: bool,
}

impl From<&QuoteOptions> for OptionsV1 {
    fn from(options: &QuoteOptions) -> Self {
        Self { leasing: options.leasing, monitoring: options.monitoring }
    }
}

impl From<OptionsV1> for QuoteOptions {
    fn from(value: OptionsV1) -> Self {
        Self { leasing: value.leasing, monitoring: value.monitoring }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum IntroV1 {
    Auto { text: String, generated_at: DateTime<Utc> },
    Manual { text: String, edited_at: DateTime<Utc> },
}

impl From<&IntroText> for IntroV1 {
    fn from(intro: &IntroText) -> Self {
        match intro {
            IntroText::Auto { text, generated_at } => {
                Self::Auto { text: text.clone(), generated_at: *generated_at }
            }
            IntroText::Manual { text, edited_at } => {
                Self::Manual { text: text.clone(), edited_at: *edited_at }
            }
        }
    }
}

impl From<IntroV1> for IntroText {
    fn from(value: IntroV1) -> Self {
        match value {
            IntroV1::Auto { text, generated_at } => Self::Auto { text, generated_at },
            IntroV1::Manual { text, edited_at } => Self::Manual { text, edited_at },
        }
    }
}

/// Payload for the `acceptance_json` column; the `acceptance_status` column
/// carries the discriminant so the conditional-write predicates stay plain SQL.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AcceptanceV1 {
    Accepted {
        signatory_name: String,
        accepted_terms: bool,
        accepted_at: DateTime<Utc>,
        total_ttc: Decimal,
        deposit: Decimal,
    },
    Rejected {
        reason: String,
        declined_at: DateTime<Utc>,
    },
}

impl AcceptanceV1 {
    pub fn from_state(state: &AcceptanceState) -> Option<Self> {
        match state {
            AcceptanceState::Pending => None,
            AcceptanceState::Accepted(record) => Some(Self::Accepted {
                signatory_name: record.signatory_name.clone(),
                accepted_terms: record.accepted_terms,
                accepted_at: record.accepted_at,
                total_ttc: record.total_ttc,
                deposit: record.deposit,
            }),
            AcceptanceState::Rejected(record) => Some(Self::Rejected {
                reason: record.reason.clone(),
                declined_at: record.declined_at,
            }),
        }
    }

    pub fn into_state(self) -> AcceptanceState {
        match self {
            Self::Accepted { signatory_name, accepted_terms, accepted_at, total_ttc, deposit } => {
                AcceptanceState::Accepted(AcceptanceRecord {
                    signatory_name,
                    accepted_terms,
                    accepted_at,
                    total_ttc,
                    deposit,
                })
            }
            Self::Rejected { reason, declined_at } => {
                AcceptanceState::Rejected(DeclineRecord { reason, declined_at })
            }
        }
    }
}

pub fn ensure_schema_version(quote_id: &str, found: i64) -> Result<(), RepositoryError> {
    if found == QUOTE_SCHEMA_VERSION {
        Ok(())
    } else {
        Err(RepositoryError::SchemaVersion { quote_id: quote_id.to_string(), found })
    }
}

pub fn encode<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Decode(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::Decode(e.to_string()))
}

pub fn encode_overrides(overrides: &BTreeMap<QuoteLineId, u32>) -> Result<String, RepositoryError> {
    let flat: BTreeMap<&str, u32> =
        overrides.iter().map(|(id, quantity)| (id.0.as_str(), *quantity)).collect();
    encode(&flat)
}

pub fn decode_overrides(raw: &str) -> Result<BTreeMap<QuoteLineId, u32>, RepositoryError> {
    let flat: BTreeMap<String, u32> = decode(raw)?;
    Ok(flat.into_iter().map(|(id, quantity)| (QuoteLineId(id), quantity)).collect())
}

pub fn encode_add_ons(add_ons: &BTreeMap<ProductId, u32>) -> Result<String, RepositoryError> {
    let flat: BTreeMap<&str, u32> =
        add_ons.iter().map(|(id, quantity)| (id.0.as_str(), *quantity)).collect();
    encode(&flat)
}

pub fn decode_add_ons(raw: &str) -> Result<BTreeMap<ProductId, u32>, RepositoryError> {
    let flat: BTreeMap<String, u32> = decode(raw)?;
    Ok(flat.into_iter().map(|(id, quantity)| (ProductId(id), quantity)).collect())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use devisio_core::domain::acceptance::{AcceptanceRecord, AcceptanceState};
    use devisio_core::domain::quote::{QuoteLine, QuoteLineId};

    use crate::repositories::RepositoryError;

    use super::{decode, decode_overrides, encode, encode_overrides, ensure_schema_version, AcceptanceV1, LineV1};

    #[test]
    fn unknown_schema_versions_are_rejected_not_guessed() {
        let error = ensure_schema_version("q-1", 99).expect_err("future version");
        assert!(matches!(
            error,
            RepositoryError::SchemaVersion { ref quote_id, found: 99 } if quote_id == "q-1"
        ));

        ensure_schema_version("q-1", super::QUOTE_SCHEMA_VERSION).expect("current version");
    }

    #[test]
    fn line_round_trips_through_v1() {
        let line = QuoteLine {
            id: QuoteLineId("l-1".to_string()),
            product_id: None,
            reference: "AJX-HUB2".to_string(),
            name: "Centrale".to_string(),
            description: String::new(),
            quantity: 2,
            unit_price_ht: Decimal::new(45_090, 2),
        };

        let raw = encode(&LineV1::from(&line)).expect("encode");
        let decoded: QuoteLine = decode::<LineV1>(&raw).expect("decode").into();
        assert_eq!(decoded, line);
    }

    #[test]
    fn malformed_json_maps_to_a_decode_error() {
        let error = decode::<LineV1>("{not-json").expect_err("malformed");
        assert!(matches!(error, RepositoryError::Decode(_)));
    }

    #[test]
    fn overrides_serialize_as_a_flat_id_to_quantity_map() {
        let mut overrides = std::collections::BTreeMap::new();
        overrides.insert(QuoteLineId("l-1".to_string()), 3);

        let raw = encode_overrides(&overrides).expect("encode");
        assert_eq!(raw, r#"{"l-1":3}"#);
        assert_eq!(decode_overrides(&raw).expect("decode"), overrides);
    }

    #[test]
    fn pending_acceptance_has_no_json_payload() {
        assert!(AcceptanceV1::from_state(&AcceptanceState::Pending).is_none());

        let record = AcceptanceRecord {
            signatory_name: "Jean Dupont".to_string(),
            accepted_terms: true,
            accepted_at: Utc::now(),
            total_ttc: Decimal::from(295),
            deposit: Decimal::from(118),
        };
        let payload = AcceptanceV1::from_state(&AcceptanceState::Accepted(record.clone()))
            .expect("accepted payload");
        match payload.into_state() {
            AcceptanceState::Accepted(round_tripped) => assert_eq!(round_tripped, record),
            other => panic!("expected accepted, got {other:?}"),
        }
    }
}
