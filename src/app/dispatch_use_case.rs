use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::app::ports::WebhookPort;
use crate::config::DispatchConfig;
use crate::error::{LeadError, Result};
use crate::metrics::DispatchMetrics;
use crate::payload::PayloadItem;

/// Outcome of a successful dispatch
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub run_id: Uuid,
    pub records_sent: usize,
    pub status: u16,
    pub dispatched_at: DateTime<Utc>,
}

/// Sends the full qualified set to the webhook as one JSON array.
///
/// Exactly one request is made per call. 200 and 201 count as success; any other
/// status, a timeout or a connection failure is returned to the caller as-is.
pub struct DispatchUseCase {
    webhook: Arc<dyn WebhookPort>,
    config: DispatchConfig,
}

impl DispatchUseCase {
    pub fn new(webhook: Arc<dyn WebhookPort>, config: DispatchConfig) -> Self {
        Self { webhook, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    fn validate(&self) -> Result<reqwest::Url> {
        let url = self.config.destination_url.trim();
        if url.is_empty() {
            return Err(LeadError::Config("webhook URL is not set".to_string()));
        }
        if self.config.timeout_seconds == 0 {
            return Err(LeadError::Config("timeout_seconds must be greater than zero".to_string()));
        }
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| LeadError::Config(format!("invalid webhook URL '{}': {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(LeadError::Config(format!("unsupported webhook URL scheme '{}'", other))),
        }
    }

    pub async fn dispatch(&self, items: &[PayloadItem]) -> Result<DispatchReport> {
        let url = self.validate()?;
        let run_id = Uuid::new_v4();
        let span = info_span!("dispatch", %run_id, records = items.len());

        async move {
            let body = serde_json::Value::Array(
                items.iter().cloned().map(serde_json::Value::Object).collect(),
            );
            let timeout = Duration::from_secs(self.config.timeout_seconds);

            info!(host = url.host_str().unwrap_or(""), "Sending qualified leads to webhook");
            let started = Instant::now();
            let result = self.webhook.post_json(url.as_str(), &body, timeout).await;
            let elapsed = started.elapsed().as_secs_f64();

            match result {
                Ok(resp) if resp.status == 200 || resp.status == 201 => {
                    DispatchMetrics::record_success(items.len(), elapsed);
                    info!(status = resp.status, "Webhook accepted payload");
                    Ok(DispatchReport {
                        run_id,
                        records_sent: items.len(),
                        status: resp.status,
                        dispatched_at: Utc::now(),
                    })
                }
                Ok(resp) => {
                    DispatchMetrics::record_failure("status", elapsed);
                    error!(status = resp.status, "Webhook rejected payload");
                    Err(LeadError::WebhookStatus { status: resp.status, body: resp.body })
                }
                Err(e) => {
                    DispatchMetrics::record_failure("transport", elapsed);
                    error!(error = %e, "Webhook request failed");
                    Err(LeadError::Transport(e))
                }
            }
        }
        .instrument(span)
        .await
    }
}
