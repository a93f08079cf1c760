use crate::app::ports::{HttpPostResult, WebhookPort};
use async_trait::async_trait;
use std::time::Duration;

pub struct ReqwestWebhook {
    client: reqwest::Client,
}

impl ReqwestWebhook {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for ReqwestWebhook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookPort for ReqwestWebhook {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<HttpPostResult, String> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        // The body is only used in failure messages; a broken body is not a transport failure
        let body = resp.text().await.unwrap_or_default();
        Ok(HttpPostResult { status, body })
    }
}
