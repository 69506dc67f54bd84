use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One day's medication record as seen by the adherence calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub date: NaiveDate,
    pub has_bleeding: bool,
}

impl LogEntry {
    pub fn new(date: NaiveDate, has_bleeding: bool) -> Self {
        Self { date, has_bleeding }
    }
}

/// A persisted medication log.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLog {
    pub id: Uuid,
    pub user_id: String,
    pub taken_on: NaiveDate,
    pub has_bleeding: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&MedicationLog> for LogEntry {
    fn from(log: &MedicationLog) -> Self {
        LogEntry::new(log.taken_on, log.has_bleeding)
    }
}

/// A user's notification setting for one platform (e.g. "web").
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSetting {
    pub user_id: String,
    pub platform: String,
    pub is_enabled: bool,
    /// Push endpoint extracted from `subscription`; empty when unsubscribed.
    pub endpoint: String,
    /// Raw browser `PushSubscription` JSON.
    pub subscription: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A candidate for one dispatch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub recipient_id: String,
    pub notification_enabled: bool,
    /// Opaque dedup key for the push destination.
    pub delivery_endpoint: String,
    /// Unparsed delivery keys (the stored `PushSubscription` JSON).
    pub delivery_keys: String,
}

impl From<NotificationSetting> for Recipient {
    fn from(setting: NotificationSetting) -> Self {
        Self {
            recipient_id: setting.user_id,
            notification_enabled: setting.is_enabled,
            delivery_endpoint: setting.endpoint,
            delivery_keys: setting.subscription,
        }
    }
}

/// Encryption keys of a browser push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Typed form of the browser `PushSubscription` JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
}

impl PushSubscription {
    /// Parse a stored subscription blob.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Human-readable notification payload ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Short title (e.g., "Medication reminder")
    pub title: String,
    /// Detailed body message
    pub body: String,
    /// String metadata for the service worker (messageId, userId, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

/// Outcome counters of one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Recipients that were enabled, had an endpoint and were not already
    /// sent to earlier in the run.
    pub attempted: u32,
    pub sent: u32,
    /// Suppressed by the cross-run cooldown.
    pub throttled: u32,
    /// Key parse or delivery failures.
    pub failed: u32,
    /// Disabled, endpoint-less, or duplicate-endpoint recipients.
    pub skipped: u32,
    pub elapsed_ms: u64,
}
