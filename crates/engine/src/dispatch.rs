//! Reminder dispatch pipeline.
//!
//! One run walks the recipient directory once and, for each recipient:
//! 1. Skips disabled, endpoint-less, or already-sent-this-run endpoints
//! 2. Computes the adherence status and composes the reminder (via
//!    `AdherenceCalculator` + `MessageComposer`)
//! 3. Evaluates the cross-run cooldown (via `Throttle`)
//! 4. Parses the delivery keys and hands the payload to the `PushSender`
//!
//! Only a failure to list recipients aborts a run; every per-recipient
//! failure is logged, counted, and skipped.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use okusuri_common::error::AppError;
use okusuri_common::types::{
    LogEntry, NotificationPayload, PushSubscription, Recipient, RunSummary,
};

use crate::adherence::{AdherenceCalculator, AdherenceStatus};
use crate::clock::Clock;
use crate::message::{DEFAULT_MESSAGE, MessageComposer};
use crate::throttle::{Throttle, preview};

/// Enumerates the candidates of a run.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    async fn list_recipients(&self) -> Result<Vec<Recipient>, AppError>;
}

/// Loads one recipient's medication history.
#[async_trait]
pub trait LogHistorySource: Send + Sync {
    async fn log_history(&self, recipient_id: &str) -> Result<Vec<LogEntry>, AppError>;
}

/// Delivers one notification to one push subscription.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), AppError>;
}

/// Outcome of processing a single recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Sent,
    Throttled,
    Failed,
}

/// Central coordinator that orchestrates one reminder run.
pub struct DispatchCoordinator {
    directory: Arc<dyn RecipientDirectory>,
    history: Arc<dyn LogHistorySource>,
    sender: Arc<dyn PushSender>,
    throttle: Arc<dyn Throttle>,
    clock: Arc<dyn Clock>,
}

impl DispatchCoordinator {
    pub fn new(
        directory: Arc<dyn RecipientDirectory>,
        history: Arc<dyn LogHistorySource>,
        sender: Arc<dyn PushSender>,
        throttle: Arc<dyn Throttle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            history,
            sender,
            throttle,
            clock,
        }
    }

    /// Process the full recipient list once.
    pub async fn run(&self) -> Result<RunSummary, AppError> {
        let started = Instant::now();
        tracing::info!(at = %self.clock.now(), "Reminder run started");

        let recipients = self.directory.list_recipients().await?;
        tracing::info!(candidates = recipients.len(), "Loaded recipients");

        let mut summary = RunSummary::default();
        let mut sent_endpoints: HashSet<String> = HashSet::new();

        for recipient in &recipients {
            if !recipient.notification_enabled || recipient.delivery_endpoint.is_empty() {
                summary.skipped += 1;
                continue;
            }

            if sent_endpoints.contains(&recipient.delivery_endpoint) {
                tracing::debug!(
                    recipient_id = %recipient.recipient_id,
                    endpoint = %preview(&recipient.delivery_endpoint),
                    "Endpoint already notified in this run"
                );
                summary.skipped += 1;
                continue;
            }

            summary.attempted += 1;
            match self.process_recipient(recipient).await {
                Outcome::Sent => {
                    sent_endpoints.insert(recipient.delivery_endpoint.clone());
                    summary.sent += 1;
                }
                Outcome::Throttled => summary.throttled += 1,
                Outcome::Failed => summary.failed += 1,
            }
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            attempted = summary.attempted,
            sent = summary.sent,
            throttled = summary.throttled,
            failed = summary.failed,
            skipped = summary.skipped,
            elapsed_ms = summary.elapsed_ms,
            "Reminder run finished"
        );

        Ok(summary)
    }

    async fn process_recipient(&self, recipient: &Recipient) -> Outcome {
        let now = self.clock.now();

        let (message, streak) = match self.history.log_history(&recipient.recipient_id).await {
            Ok(history) => {
                let status = AdherenceCalculator::compute(&history, now.date_naive());
                (MessageComposer::compose(&status), status.current_streak())
            }
            Err(e) => {
                tracing::warn!(
                    recipient_id = %recipient.recipient_id,
                    error = %e,
                    "Failed to load medication history, sending default reminder"
                );
                (
                    DEFAULT_MESSAGE.to_string(),
                    AdherenceStatus::ZERO.current_streak(),
                )
            }
        };

        if !self
            .throttle
            .check_and_set(&recipient.delivery_endpoint, now)
            .await
        {
            return Outcome::Throttled;
        }

        let subscription = match PushSubscription::parse(&recipient.delivery_keys) {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::error!(
                    recipient_id = %recipient.recipient_id,
                    error = %e,
                    "Failed to parse push subscription"
                );
                return Outcome::Failed;
            }
        };

        let payload = MessageComposer::payload(&recipient.recipient_id, message, streak, now);

        match self.sender.send(&subscription, &payload).await {
            Ok(()) => {
                tracing::info!(
                    recipient_id = %recipient.recipient_id,
                    endpoint = %preview(&recipient.delivery_endpoint),
                    consecutive_days = streak,
                    "Reminder sent"
                );
                Outcome::Sent
            }
            Err(e) => {
                tracing::error!(
                    recipient_id = %recipient.recipient_id,
                    endpoint = %preview(&recipient.delivery_endpoint),
                    error = %e,
                    "Reminder delivery failed"
                );
                Outcome::Failed
            }
        }
    }
}
