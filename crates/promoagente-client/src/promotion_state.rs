//! Per-session promotion-state endpoints (`/api/promotion-state/{sid}`).

use reqwest::Url;
use serde_json::Value;

use crate::client::PromoClient;
use crate::error::ClientError;
use crate::types::SummaryResponse;

impl PromoClient {
    /// Fetches the backend's raw promotion state for a session.
    ///
    /// # Errors
    ///
    /// Transport, status and deserialization errors.
    pub async fn promotion_state(&self, session_id: &str) -> Result<Value, ClientError> {
        let url = self.state_url(session_id, None)?;
        self.send_json(self.client().get(url), "promotion-state")
            .await
    }

    /// Asks the backend to validate the session's promotion.
    ///
    /// # Errors
    ///
    /// Transport, status and deserialization errors.
    pub async fn validate_promotion(&self, session_id: &str) -> Result<Value, ClientError> {
        self.post_action(session_id, "validate").await
    }

    /// Asks the backend for a prose summary of the session's promotion.
    ///
    /// # Errors
    ///
    /// Transport, status and deserialization errors.
    pub async fn create_summary(&self, session_id: &str) -> Result<String, ClientError> {
        let url = self.state_url(session_id, Some("summary"))?;
        let response: SummaryResponse = self
            .send_json(self.client().post(url), "promotion-state/summary")
            .await?;
        Ok(response.summary)
    }

    /// Persists the session's promotion on the backend.
    ///
    /// # Errors
    ///
    /// Transport, status and deserialization errors.
    pub async fn save_promotion(&self, session_id: &str) -> Result<Value, ClientError> {
        self.post_action(session_id, "save").await
    }

    /// Asks the backend to e-mail the session's promotion.
    ///
    /// # Errors
    ///
    /// Transport, status and deserialization errors.
    pub async fn send_promotion_email(&self, session_id: &str) -> Result<Value, ClientError> {
        self.post_action(session_id, "send-email").await
    }

    /// Discards the session's promotion state on the backend.
    ///
    /// # Errors
    ///
    /// Transport, status and deserialization errors.
    pub async fn reset_promotion(&self, session_id: &str) -> Result<Value, ClientError> {
        let url = self.state_url(session_id, None)?;
        tracing::info!(session_id, "resetting promotion state");
        self.send_json(self.client().delete(url), "promotion-state/reset")
            .await
    }

    async fn post_action(&self, session_id: &str, action: &str) -> Result<Value, ClientError> {
        let url = self.state_url(session_id, Some(action))?;
        self.send_json(
            self.client().post(url),
            &format!("promotion-state/{action}"),
        )
        .await
    }

    /// `api/promotion-state/{session_id}[/{action}]`, with the session id
    /// percent-encoded as a single path segment.
    fn state_url(&self, session_id: &str, action: Option<&str>) -> Result<Url, ClientError> {
        let mut url = self.endpoint("api/promotion-state/")?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ClientError::InvalidBaseUrl {
                    base_url: self.base_url().to_string(),
                    reason: "URL cannot be used as a base".to_owned(),
                })?;
            segments.pop_if_empty().push(session_id);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }
}
