use async_trait::async_trait;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, URL_SAFE_NO_PAD, VapidSignatureBuilder,
    WebPushClient, WebPushError, WebPushMessageBuilder,
};

use crate::config::VapidConfig;

#[derive(Debug)]
pub enum PushError {
    /// The push service says the subscription no longer exists (404/410).
    Gone,
    InvalidSubscription(String),
    Failed(String),
}

impl std::fmt::Display for PushError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushError::Gone => write!(f, "subscription expired"),
            PushError::InvalidSubscription(msg) => write!(f, "invalid subscription: {msg}"),
            PushError::Failed(msg) => write!(f, "push failed: {msg}"),
        }
    }
}

impl std::error::Error for PushError {}

#[async_trait]
pub trait PushSender: Send + Sync {
    /// Deliver `payload` to one stored subscription.
    async fn send(&self, subscription: &str, payload: &str) -> Result<(), PushError>;
}

/// Web Push delivery signed with the server's VAPID key.
pub struct WebPushSender {
    client: IsahcWebPushClient,
    vapid: VapidConfig,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, PushError> {
        let client = IsahcWebPushClient::new().map_err(|e| PushError::Failed(e.to_string()))?;
        Ok(WebPushSender { client, vapid })
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(&self, subscription: &str, payload: &str) -> Result<(), PushError> {
        let info: SubscriptionInfo = serde_json::from_str(subscription)
            .map_err(|e| PushError::InvalidSubscription(e.to_string()))?;

        let mut sig_builder = VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            URL_SAFE_NO_PAD,
            &info,
        )
            .map_err(|e| PushError::Failed(e.to_string()))?;
        sig_builder.add_claim("sub", self.vapid.subject.as_str());
        let signature = sig_builder
            .build()
            .map_err(|e| PushError::Failed(e.to_string()))?;

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload.as_bytes());
        builder.set_vapid_signature(signature);
        let message = builder.build().map_err(|e| PushError::Failed(e.to_string()))?;

        self.client.send(message).await.map_err(delivery_error)
    }
}

/// The push service answers 404/410 for subscriptions that no longer exist.
fn delivery_error(e: WebPushError) -> PushError {
    match e {
        WebPushError::EndpointNotValid | WebPushError::EndpointNotFound => PushError::Gone,
        other => PushError::Failed(other.to_string()),
    }
}
