use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::quote::QuoteId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    QuoteAccepted,
    QuoteDeclined,
}

/// Internal notification record surfaced in the staff notifications panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub quote_id: Option<QuoteId>,
    pub title: String,
    pub message: String,
    pub metadata: BTreeMap<String, String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        quote_id: Option<QuoteId>,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            quote_id,
            title: title.into(),
            message: message.into(),
            metadata: BTreeMap::new(),
            read: false,
            created_at: now,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification sink failure: {0}")]
    Sink(String),
}

/// Fire-and-forget sink. Failures are reported to the caller as soft
/// warnings; they must never roll back the action that produced the record.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn record(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[derive(Clone, Default)]
pub struct InMemoryNotificationSink {
    records: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryNotificationSink {
    pub fn records(&self) -> Vec<Notification> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotificationSink {
    async fn record(&self, notification: Notification) -> Result<(), NotifyError> {
        match self.records.lock() {
            Ok(mut records) => records.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
        Ok(())
    }
}
