use crate::error::DeliveryError;
use async_trait::async_trait;

/// Destination for a formatted report.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Deliver `text`, returning the number of messages sent.
    async fn deliver(&self, text: &str) -> Result<usize, DeliveryError>;
}
