use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use devisio_core::domain::quote::QuoteId;
use devisio_core::notify::{Notification, NotificationKind, NotificationSink, NotifyError};

use super::{NotificationRepository, RepositoryError};
use crate::DbPool;

#[derive(Clone)]
pub struct SqlNotificationRepository {
    pool: DbPool,
}

impl SqlNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn kind_as_str(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::QuoteAccepted => "quote_accepted",
        NotificationKind::QuoteDeclined => "quote_declined",
    }
}

fn parse_kind(raw: &str) -> Result<NotificationKind, RepositoryError> {
    match raw {
        "quote_accepted" => Ok(NotificationKind::QuoteAccepted),
        "quote_declined" => Ok(NotificationKind::QuoteDeclined),
        other => Err(RepositoryError::Decode(format!("unknown notification kind `{other}`"))),
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    let kind_raw: String = row.try_get("kind").map_err(decode)?;
    let quote_id: Option<String> = row.try_get("quote_id").map_err(decode)?;
    let metadata_raw: String = row.try_get("metadata_json").map_err(decode)?;
    let metadata: BTreeMap<String, String> = serde_json::from_str(&metadata_raw)
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_raw: String = row.try_get("created_at").map_err(decode)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp: {e}")))?;

    Ok(Notification {
        id: row.try_get("id").map_err(decode)?,
        kind: parse_kind(&kind_raw)?,
        quote_id: quote_id.map(QuoteId),
        title: row.try_get("title").map_err(decode)?,
        message: row.try_get("message").map_err(decode)?,
        metadata,
        read: row.try_get("read").map_err(decode)?,
        created_at,
    })
}

#[async_trait]
impl NotificationRepository for SqlNotificationRepository {
    async fn record(&self, notification: &Notification) -> Result<(), RepositoryError> {
        let metadata = serde_json::to_string(&notification.metadata)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO notification
                (id, kind, quote_id, title, message, metadata_json, read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&notification.id)
        .bind(kind_as_str(notification.kind))
        .bind(notification.quote_id.as_ref().map(|id| id.0.clone()))
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(metadata)
        .bind(notification.read)
        .bind(notification.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_unread(&self) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, kind, quote_id, title, message, metadata_json, read, created_at
             FROM notification WHERE read = 0 ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_notification).collect()
    }

    async fn mark_read(&self, id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE notification SET read = 1 WHERE id = ? AND read = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// The acceptance flow records through the core sink trait; persistence
/// failures surface as soft warnings there, never as hard errors.
#[async_trait]
impl NotificationSink for SqlNotificationRepository {
    async fn record(&self, notification: Notification) -> Result<(), NotifyError> {
        NotificationRepository::record(self, &notification)
            .await
            .map_err(|e| NotifyError::Sink(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use devisio_core::domain::quote::QuoteId;
    use devisio_core::notify::{Notification, NotificationKind};

    use super::SqlNotificationRepository;
    use crate::repositories::NotificationRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlNotificationRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlNotificationRepository::new(pool)
    }

    fn sample(id_suffix: &str) -> Notification {
        Notification::new(
            NotificationKind::QuoteAccepted,
            Some(QuoteId(format!("q-{id_suffix}"))),
            "Nouveau devis accepté - Jean Dupont",
            "Le devis \"Alarme maison\" a été accepté par Jean Dupont",
            Utc::now(),
        )
        .with_metadata("total_ttc", "295.00")
    }

    #[tokio::test]
    async fn record_and_list_unread_round_trip() {
        let repo = setup().await;
        let notification = sample("1");

        repo.record(&notification).await.expect("record");
        let unread = repo.list_unread().await.expect("list");

        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0], notification);
    }

    #[tokio::test]
    async fn mark_read_removes_from_the_unread_list_once() {
        let repo = setup().await;
        let notification = sample("1");
        repo.record(&notification).await.expect("record");

        assert!(repo.mark_read(&notification.id).await.expect("mark"));
        assert!(!repo.mark_read(&notification.id).await.expect("second mark"), "already read");
        assert!(repo.list_unread().await.expect("list").is_empty());
    }
}
