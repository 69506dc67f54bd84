//! Reminder text and payload composition.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use okusuri_common::types::NotificationPayload;

use crate::adherence::AdherenceStatus;

pub const NOTIFICATION_TITLE: &str = "Medication reminder";

/// Used when a recipient's history cannot be loaded.
pub const DEFAULT_MESSAGE: &str = "Time to take your medication. Don't forget!";

pub struct MessageComposer;

impl MessageComposer {
    pub fn compose(status: &AdherenceStatus) -> String {
        match *status {
            AdherenceStatus::RestPeriod { days_left } if days_left > 0 => format!(
                "You're in a rest period. Resume your medication in {} day{}.",
                days_left,
                if days_left == 1 { "" } else { "s" }
            ),
            AdherenceStatus::RestPeriod { .. } => {
                "Your rest period has ended. Please resume your medication today.".to_string()
            }
            AdherenceStatus::Active { streak, .. } if streak > 0 => {
                format!("{} (Day {} in a row)", DEFAULT_MESSAGE, streak)
            }
            AdherenceStatus::Active { .. } => DEFAULT_MESSAGE.to_string(),
        }
    }

    /// Wrap a message body into the payload handed to the push service.
    pub fn payload(
        recipient_id: &str,
        body: String,
        consecutive_days: u32,
        now: DateTime<Utc>,
    ) -> NotificationPayload {
        let mut data = BTreeMap::new();
        data.insert(
            "messageId".to_string(),
            format!("medication-{}", Uuid::new_v4()),
        );
        data.insert("timestamp".to_string(), now.timestamp().to_string());
        data.insert("userId".to_string(), recipient_id.to_string());
        data.insert("consecutiveDays".to_string(), consecutive_days.to_string());

        NotificationPayload {
            title: NOTIFICATION_TITLE.to_string(),
            body,
            data,
        }
    }
}
