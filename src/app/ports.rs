use async_trait::async_trait;
use std::time::Duration;

/// Outbound side of the dispatcher: one JSON POST per call, no retries.
#[async_trait]
pub trait WebhookPort: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<HttpPostResult, String>;
}

#[derive(Clone, Debug)]
pub struct HttpPostResult {
    pub status: u16,
    pub body: String,
}
