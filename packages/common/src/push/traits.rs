use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;

use super::message::{DeliveryStatus, PushMessage};

/// Delivers one notification to device tokens.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Deliver `message` to a single device token.
    async fn send(&self, token: &str, message: &PushMessage) -> DeliveryStatus;

    /// Maximum number of deliveries in flight during a batch.
    fn concurrency(&self) -> usize {
        16
    }

    /// Deliver `message` to every token, returning one status per token.
    async fn send_batch(
        &self,
        tokens: &[String],
        message: &PushMessage,
    ) -> HashMap<String, DeliveryStatus> {
        futures::stream::iter(tokens.iter().cloned())
            .map(|token| async move {
                let status = self.send(&token, message).await;
                (token, status)
            })
            .buffer_unordered(self.concurrency().max(1))
            .collect()
            .await
    }
}
