//! Push delivery for reminder runs.
//!
//! `WebPushSender` signs each request with the service's VAPID key and
//! encrypts the JSON payload (aes128gcm) for the browser subscription.

use async_trait::async_trait;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushMessageBuilder,
};

use okusuri_common::config::AppConfig;
use okusuri_common::error::AppError;
use okusuri_common::types::{NotificationPayload, PushSubscription};
use okusuri_engine::dispatch::PushSender;

/// Web Push delivery client.
pub struct WebPushSender {
    client: IsahcWebPushClient,
    private_key_pem: String,
    subject: String,
    ttl_seconds: u32,
}

impl WebPushSender {
    /// Build a sender from configuration. Missing VAPID credentials are a
    /// configuration error: nothing could be delivered.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let private_key_pem = Self::validate_key(config.vapid_private_key_pem.as_deref())?;

        let client = IsahcWebPushClient::new()
            .map_err(|e| AppError::Config(format!("Failed to build push client: {}", e)))?;

        tracing::info!(
            subject = %config.vapid_subject,
            ttl_seconds = config.push_ttl_seconds,
            "Web Push sender ready"
        );

        Ok(Self {
            client,
            private_key_pem,
            subject: config.vapid_subject.clone(),
            ttl_seconds: config.push_ttl_seconds,
        })
    }

    fn validate_key(pem: Option<&str>) -> Result<String, AppError> {
        let pem = pem
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Config("VAPID_PRIVATE_KEY_PEM is not set".to_string()))?;

        if !pem.contains("PRIVATE KEY") {
            return Err(AppError::Config(
                "VAPID_PRIVATE_KEY_PEM must be a PEM-encoded private key".to_string(),
            ));
        }

        // Keys pasted into env files often carry literal "\n" sequences.
        Ok(pem.replace("\\n", "\n"))
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &NotificationPayload,
    ) -> Result<(), AppError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.as_str(),
            subscription.keys.p256dh.as_str(),
            subscription.keys.auth.as_str(),
        );

        let mut sig_builder = VapidSignatureBuilder::from_pem(self.private_key_pem.as_bytes(), &info)
            .map_err(|e| AppError::Config(format!("Invalid VAPID key: {}", e)))?;
        sig_builder.add_claim("sub", self.subject.as_str());
        let signature = sig_builder
            .build()
            .map_err(|e| AppError::Delivery(format!("Failed to sign push request: {}", e)))?;

        let body = serde_json::to_vec(payload)
            .map_err(|e| AppError::Internal(format!("Failed to encode payload: {}", e)))?;

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_ttl(self.ttl_seconds);
        builder.set_payload(ContentEncoding::Aes128Gcm, &body);
        builder.set_vapid_signature(signature);
        let message = builder
            .build()
            .map_err(|e| AppError::Delivery(format!("Failed to build push message: {}", e)))?;

        self.client
            .send(message)
            .await
            .map_err(|e| AppError::Delivery(format!("Push service rejected message: {}", e)))?;

        Ok(())
    }
}
