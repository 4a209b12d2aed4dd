//! # Backfill client
//!
//! HTTP implementation of [`BackfillSink`]: one `POST` of the JSON batch to the
//! seller-hub backfill endpoint per call. Any 2xx status is acceptance; the
//! response body is only read to report a rejection. No retries.

use std::time::Duration;

use async_trait::async_trait;
use doc_backfill_core::contract::{BackfillRequest, BackfillSink, SubmitError};
use reqwest::header::CONTENT_TYPE;

/// Path of the backfill endpoint, relative to the configured base URL.
pub const BACKFILL_PATH: &str = "/seller-hub/internal/api/backfill_seller_document";

#[derive(Debug)]
pub struct BackfillClient {
    client: reqwest::Client,
    endpoint: String,
}

impl BackfillClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        // A redirect would resend the batch as a bodiless GET.
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build backfill HTTP client");
                e
            })?;
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), BACKFILL_PATH);
        tracing::info!(endpoint = %endpoint, timeout = ?timeout, "Initialized BackfillClient");
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BackfillSink for BackfillClient {
    async fn submit(&self, request: &BackfillRequest) -> Result<(), SubmitError> {
        let payload = serde_json::to_vec(request).map_err(|e| {
            tracing::error!(error = ?e, "Failed to marshal BackfillRequest");
            SubmitError::from(e)
        })?;

        tracing::debug!(
            endpoint = %self.endpoint,
            documents = request.documents.len(),
            "Posting backfill batch"
        );
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, endpoint = %self.endpoint, "Failed to make POST request");
                SubmitError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Backfill API call failed");
            return Err(SubmitError::Status {
                code: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            endpoint = %self.endpoint,
            documents = request.documents.len(),
            "Backfill API call successful"
        );
        Ok(())
    }
}
