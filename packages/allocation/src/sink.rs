//! HTTP client for the record sink.
//!
//! One POST per submission, awaited once. There is no retry or queue; a
//! failure goes back to the caller, who may resubmit.

use muni_budget_allocation_models::AllocationSubmission;
use muni_budget_server_models::{ApiError, ApiStoredAllocation};

use crate::SinkError;

/// Client for `POST <base>/budget-allocations`.
#[derive(Debug, Clone)]
pub struct RecordSinkClient {
    client: reqwest::Client,
    base_url: String,
}

impl RecordSinkClient {
    /// Creates a client for an API base such as `http://localhost:3001/api`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Network`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/budget-allocations", self.base_url)
    }

    /// Sends one submission.
    ///
    /// # Errors
    ///
    /// * [`SinkError::Network`] if the request cannot be sent or read
    /// * [`SinkError::Rejected`] if the sink answers with a non-2xx status
    /// * [`SinkError::Json`] if a success body cannot be parsed
    pub async fn submit(
        &self,
        submission: &AllocationSubmission,
    ) -> Result<ApiStoredAllocation, SinkError> {
        let url = self.endpoint();
        log::debug!(
            "Submitting allocation for {} to {url}",
            submission.municipality_id
        );

        let response = self.client.post(&url).json(submission).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiError>(&body).map_or_else(
                |_| String::from_utf8_lossy(&body).into_owned(),
                |e| e.message,
            );
            log::warn!("Record sink rejected submission ({status}): {message}");
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let stored: ApiStoredAllocation = serde_json::from_slice(&body)?;
        log::info!("Allocation stored with id {}", stored.id);
        Ok(stored)
    }
}
