use chrono::{DateTime, Utc};
use sqlx::Row;

use devisio_core::domain::acceptance::{AcceptanceState, AcceptanceStatus};
use devisio_core::domain::quote::{
    Quote, QuoteId, QuoteKind, QuoteLine, QuoteStatus, QuoteVatRate,
};
use devisio_core::token::{AccessToken, PaymentLinkToken};

use super::codec::{self, AcceptanceV1, ClientV1, IntroV1, LineV1, OptionsV1};
use super::{QuoteRepository, RepositoryError};
use crate::DbPool;

pub struct SqlQuoteRepository {
    pool: DbPool,
}

impl SqlQuoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn kind_as_str(kind: QuoteKind) -> &'static str {
    match kind {
        QuoteKind::NewInstallation => "new_installation",
        QuoteKind::MaintenanceUpsell => "maintenance_upsell",
    }
}

fn parse_kind(raw: &str) -> Result<QuoteKind, RepositoryError> {
    match raw {
        "new_installation" => Ok(QuoteKind::NewInstallation),
        "maintenance_upsell" => Ok(QuoteKind::MaintenanceUpsell),
        other => Err(RepositoryError::Decode(format!("unknown quote kind `{other}`"))),
    }
}

fn status_as_str(status: QuoteStatus) -> &'static str {
    match status {
        QuoteStatus::Draft => "draft",
        QuoteStatus::Sent => "sent",
        QuoteStatus::Signed => "signed",
    }
}

fn parse_status(raw: &str) -> Result<QuoteStatus, RepositoryError> {
    match raw {
        "draft" => Ok(QuoteStatus::Draft),
        "sent" => Ok(QuoteStatus::Sent),
        "signed" => Ok(QuoteStatus::Signed),
        other => Err(RepositoryError::Decode(format!("unknown quote status `{other}`"))),
    }
}

fn acceptance_status_as_str(status: AcceptanceStatus) -> &'static str {
    match status {
        AcceptanceStatus::Pending => "pending",
        AcceptanceStatus::Accepted => "accepted",
        AcceptanceStatus::Rejected => "rejected",
    }
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {e}")))
}

fn get_text(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<String, RepositoryError> {
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_quote(row: &sqlx::sqlite::SqliteRow) -> Result<Quote, RepositoryError> {
    let id: String = get_text(row, "id")?;
    let schema_version: i64 =
        row.try_get("schema_version").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    codec::ensure_schema_version(&id, schema_version)?;

    let version: i64 =
        row.try_get("version").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let vat_rate_raw = get_text(row, "vat_rate")?;
    let vat_rate = vat_rate_raw
        .parse()
        .map_err(|_| RepositoryError::Decode(format!("invalid vat rate `{vat_rate_raw}`")))
        .and_then(|rate| {
            QuoteVatRate::from_rate(rate)
                .map_err(|e| RepositoryError::Decode(e.to_string()))
        })?;

    let lines: Vec<QuoteLine> = codec::decode::<Vec<LineV1>>(&get_text(row, "lines_json")?)?
        .into_iter()
        .map(QuoteLine::from)
        .collect();

    let intro_raw: Option<String> =
        row.try_get("intro_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let intro = intro_raw
        .as_deref()
        .map(codec::decode::<IntroV1>)
        .transpose()?
        .map(Into::into);

    let acceptance_status = get_text(row, "acceptance_status")?;
    let acceptance_raw: Option<String> =
        row.try_get("acceptance_json").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let acceptance = match acceptance_status.as_str() {
        "pending" => AcceptanceState::Pending,
        "accepted" | "rejected" => {
            let raw = acceptance_raw.ok_or_else(|| {
                RepositoryError::Decode(format!(
                    "quote `{id}` is {acceptance_status} but has no acceptance payload"
                ))
            })?;
            codec::decode::<AcceptanceV1>(&raw)?.into_state()
        }
        other => {
            return Err(RepositoryError::Decode(format!("unknown acceptance status `{other}`")))
        }
    };

    let payment_link_token: Option<String> =
        row.try_get("payment_link_token").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Quote {
        id: QuoteId(id),
        version,
        client: codec::decode::<ClientV1>(&get_text(row, "client_json")?)?.into(),
        title: get_text(row, "title")?,
        kind: parse_kind(&get_text(row, "kind")?)?,
        vat_rate,
        lines,
        observations: get_text(row, "observations")?,
        options: codec::decode::<OptionsV1>(&get_text(row, "options_json")?)?.into(),
        status: parse_status(&get_text(row, "status")?)?,
        access_token: AccessToken(get_text(row, "access_token")?),
        payment_link_token: payment_link_token.map(PaymentLinkToken),
        acceptance,
        quantity_overrides: codec::decode_overrides(&get_text(row, "quantity_overrides_json")?)?,
        selected_add_ons: codec::decode_add_ons(&get_text(row, "selected_add_ons_json")?)?,
        intro,
        created_at: decode_timestamp(&get_text(row, "created_at")?)?,
        updated_at: decode_timestamp(&get_text(row, "updated_at")?)?,
    })
}

const QUOTE_COLUMNS: &str = "id, version, schema_version, title, kind, vat_rate, status,
    acceptance_status, client_json, lines_json, observations, options_json, intro_json,
    access_token, payment_link_token, quantity_overrides_json, selected_add_ons_json,
    acceptance_json, created_at, updated_at";

fn lines_json(quote: &Quote) -> Result<String, RepositoryError> {
    codec::encode(&quote.lines.iter().map(LineV1::from).collect::<Vec<_>>())
}

fn intro_json(quote: &Quote) -> Result<Option<String>, RepositoryError> {
    quote.intro.as_ref().map(|intro| codec::encode(&IntroV1::from(intro))).transpose()
}

fn acceptance_json(quote: &Quote) -> Result<Option<String>, RepositoryError> {
    AcceptanceV1::from_state(&quote.acceptance).map(|payload| codec::encode(&payload)).transpose()
}

#[async_trait::async_trait]
impl QuoteRepository for SqlQuoteRepository {
    async fn create(&self, quote: &Quote) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO quote
                (id, version, schema_version, title, kind, vat_rate, status, acceptance_status,
                 client_json, lines_json, observations, options_json, intro_json, access_token,
                 payment_link_token, quantity_overrides_json, selected_add_ons_json,
                 acceptance_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&quote.id.0)
        .bind(quote.version)
        .bind(codec::QUOTE_SCHEMA_VERSION)
        .bind(&quote.title)
        .bind(kind_as_str(quote.kind))
        .bind(quote.vat_rate.rate().to_string())
        .bind(status_as_str(quote.status))
        .bind(acceptance_status_as_str(quote.acceptance.status()))
        .bind(codec::encode(&ClientV1::from(&quote.client))?)
        .bind(lines_json(quote)?)
        .bind(&quote.observations)
        .bind(codec::encode(&OptionsV1::from(&quote.options))?)
        .bind(intro_json(quote)?)
        .bind(&quote.access_token.0)
        .bind(quote.payment_link_token.as_ref().map(|token| token.0.clone()))
        .bind(codec::encode_overrides(&quote.quantity_overrides)?)
        .bind(codec::encode_add_ons(&quote.selected_add_ons)?)
        .bind(acceptance_json(quote)?)
        .bind(quote.created_at.to_rfc3339())
        .bind(quote.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_staff(&self, quote: &Quote) -> Result<i64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE quote SET
                version = version + 1,
                title = ?,
                kind = ?,
                vat_rate = ?,
                status = ?,
                client_json = ?,
                lines_json = ?,
                observations = ?,
                options_json = ?,
                intro_json = ?,
                payment_link_token = ?,
                updated_at = ?
             WHERE id = ? AND version = ? AND acceptance_status = 'pending'",
        )
        .bind(&quote.title)
        .bind(kind_as_str(quote.kind))
        .bind(quote.vat_rate.rate().to_string())
        .bind(status_as_str(quote.status))
        .bind(codec::encode(&ClientV1::from(&quote.client))?)
        .bind(lines_json(quote)?)
        .bind(&quote.observations)
        .bind(codec::encode(&OptionsV1::from(&quote.options))?)
        .bind(intro_json(quote)?)
        .bind(quote.payment_link_token.as_ref().map(|token| token.0.clone()))
        .bind(Utc::now().to_rfc3339())
        .bind(&quote.id.0)
        .bind(quote.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict { entity: "quote", id: quote.id.0.clone() });
        }
        Ok(quote.version + 1)
    }

    async fn save_client_adjustments(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE quote SET
                quantity_overrides_json = ?,
                selected_add_ons_json = ?,
                payment_link_token = NULL,
                updated_at = ?
             WHERE id = ? AND acceptance_status = 'pending'",
        )
        .bind(codec::encode_overrides(&quote.quantity_overrides)?)
        .bind(codec::encode_add_ons(&quote.selected_add_ons)?)
        .bind(Utc::now().to_rfc3339())
        .bind(&quote.id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict { entity: "quote", id: quote.id.0.clone() });
        }
        Ok(())
    }

    async fn record_acceptance(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let payload = acceptance_json(quote)?.ok_or_else(|| {
            RepositoryError::Decode("record_acceptance called on a pending aggregate".to_string())
        })?;

        let result = sqlx::query(
            "UPDATE quote SET
                acceptance_status = 'accepted',
                acceptance_json = ?,
                status = 'signed',
                quantity_overrides_json = ?,
                selected_add_ons_json = ?,
                version = version + 1,
                updated_at = ?
             WHERE id = ? AND acceptance_status = 'pending' AND version = ?",
        )
        .bind(payload)
        .bind(codec::encode_overrides(&quote.quantity_overrides)?)
        .bind(codec::encode_add_ons(&quote.selected_add_ons)?)
        .bind(Utc::now().to_rfc3339())
        .bind(&quote.id.0)
        .bind(quote.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict { entity: "quote", id: quote.id.0.clone() });
        }
        Ok(())
    }

    async fn record_decline(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let payload = acceptance_json(quote)?.ok_or_else(|| {
            RepositoryError::Decode("record_decline called on a pending aggregate".to_string())
        })?;

        let result = sqlx::query(
            "UPDATE quote SET
                acceptance_status = 'rejected',
                acceptance_json = ?,
                version = version + 1,
                updated_at = ?
             WHERE id = ? AND acceptance_status = 'pending' AND version = ?",
        )
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .bind(&quote.id.0)
        .bind(quote.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict { entity: "quote", id: quote.id.0.clone() });
        }
        Ok(())
    }

    async fn save_payment_link(&self, quote: &Quote) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE quote SET payment_link_token = ?, updated_at = ? WHERE id = ?")
            .bind(quote.payment_link_token.as_ref().map(|token| token.0.clone()))
            .bind(Utc::now().to_rfc3339())
            .bind(&quote.id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict { entity: "quote", id: quote.id.0.clone() });
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {QUOTE_COLUMNS} FROM quote WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_quote(row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Quote>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {QUOTE_COLUMNS} FROM quote WHERE access_token = ?"))
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_quote(row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_payment_token(&self, token: &str) -> Result<Option<Quote>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {QUOTE_COLUMNS} FROM quote WHERE payment_link_token = ?"))
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(ref row) => Ok(Some(row_to_quote(row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Quote>, RepositoryError> {
        let rows =
            sqlx::query(&format!("SELECT {QUOTE_COLUMNS} FROM quote ORDER BY updated_at DESC"))
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_quote).collect()
    }

    async fn delete(&self, id: &QuoteId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM quote WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
