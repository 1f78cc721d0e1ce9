//! HTTP client for the `PromoAgente` backend.
//!
//! Wraps `reqwest` with typed requests and responses for the chat, confirm,
//! export, update, status and listing endpoints. Non-2xx responses surface as
//! [`ClientError::UnexpectedStatus`]; there is no automatic retry.

use std::time::Duration;

use promoagente_core::{PromotionPayload, PromotionRecord};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::export::{session_export_filename, ExportedSpreadsheet, EXPORT_ALL_FILENAME};
use crate::types::{
    ChatRequest, ChatResponse, ConfirmOutcome, ConfirmRequest, ConfirmResponse, ExportRequest,
    ExportResponse, PromotionsResponse, SystemStatus, UpdateRequest, UpdateResponse,
};

const DEFAULT_USER_AGENT: &str = "promoagente/0.1 (chat-client)";

/// Maximum number of body characters kept in an [`ClientError::UnexpectedStatus`].
const ERROR_BODY_CHARS: usize = 300;

/// Client for the `PromoAgente` REST API.
///
/// Use [`PromoClient::new`] with values from `AppConfig`, or
/// [`PromoClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct PromoClient {
    client: Client,
    base_url: Url,
}

impl PromoClient {
    /// Creates a client for `base_url` with the given timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` is not a valid URL.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `Url::join` appends instead of
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim().trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Creates a client with default timeout and user agent.
    ///
    /// # Errors
    ///
    /// Same as [`PromoClient::new`].
    pub fn with_base_url(base_url: &str) -> Result<Self, ClientError> {
        Self::new(base_url, 30, DEFAULT_USER_AGENT)
    }

    /// The normalised base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Sends one chat turn to the orchestrator.
    ///
    /// `session_id` is omitted from the body when `None`, letting the backend
    /// open a new session.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure or timeout.
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
    /// - [`ClientError::Deserialize`] if the reply does not match the expected shape.
    pub async fn send_message(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatResponse, ClientError> {
        let url = self.endpoint("api/orchestrator")?;
        let body = ChatRequest {
            message,
            session_id,
        };
        tracing::debug!(session_id = ?session_id, chars = message.chars().count(), "sending chat message");
        self.send_json(self.client.post(url).json(&body), "orchestrator")
            .await
    }

    /// Confirms the current draft, stamping every record with `session_id`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NothingSaved`] when the backend saved no promotion.
    /// - Transport, status and deserialization errors as for [`PromoClient::send_message`].
    pub async fn confirm(
        &self,
        payload: &PromotionPayload,
        session_id: Option<&str>,
    ) -> Result<ConfirmOutcome, ClientError> {
        let stamp = |record: &PromotionRecord| match session_id {
            Some(sid) => record.with_session(sid),
            None => record.clone(),
        };
        let body = match payload {
            PromotionPayload::Single(record) => ConfirmRequest::Single(stamp(record)),
            PromotionPayload::Multiple(records) => {
                ConfirmRequest::Multiple(records.iter().map(stamp).collect())
            }
        };

        let url = self.endpoint("api/confirm")?;
        let response: ConfirmResponse = self
            .send_json(self.client.post(url).json(&body), "confirm")
            .await?;
        let outcome = ConfirmOutcome::from(response);

        if outcome.total_saved == 0 {
            return Err(ClientError::NothingSaved {
                errors: outcome.total_errors,
            });
        }
        tracing::info!(
            saved = outcome.total_saved,
            errors = outcome.total_errors,
            "promotions confirmed"
        );
        Ok(outcome)
    }

    /// Exports the given session records as a spreadsheet.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Export`] when the backend reports failure.
    /// - [`ClientError::Decode`] when the payload is not valid base64.
    /// - Transport, status and deserialization errors.
    pub async fn export_session(
        &self,
        session_id: &str,
        promotions: &[PromotionRecord],
    ) -> Result<ExportedSpreadsheet, ClientError> {
        let url = self.endpoint("api/export")?;
        let body = ExportRequest {
            session_id,
            promotions,
        };
        let response: ExportResponse = self
            .send_json(self.client.post(url).json(&body), "export")
            .await?;
        ExportedSpreadsheet::from_response(response, &session_export_filename(session_id))
    }

    /// Exports every stored promotion as a spreadsheet.
    ///
    /// # Errors
    ///
    /// Same as [`PromoClient::export_session`].
    pub async fn export_all(&self) -> Result<ExportedSpreadsheet, ClientError> {
        let url = self.endpoint("api/export-all")?;
        let response: ExportResponse = self
            .send_json(self.client.post(url), "export-all")
            .await?;
        ExportedSpreadsheet::from_response(response, EXPORT_ALL_FILENAME)
    }

    /// Saves edits to a stored promotion.
    ///
    /// Returns the backend's updated record, or `updates` itself when the
    /// reply carries none.
    ///
    /// # Errors
    ///
    /// Transport, status and deserialization errors.
    pub async fn update_promotion(
        &self,
        promotion_id: &str,
        updates: &PromotionRecord,
    ) -> Result<PromotionRecord, ClientError> {
        let url = self.endpoint("api/update-promotion")?;
        let body = UpdateRequest {
            promotion_id,
            updates,
        };
        let response: UpdateResponse = self
            .send_json(self.client.put(url).json(&body), "update-promotion")
            .await?;
        Ok(response
            .promotion
            .as_ref()
            .and_then(PromotionRecord::from_wire)
            .unwrap_or_else(|| updates.clone()))
    }

    /// Fetches backend health flags.
    ///
    /// # Errors
    ///
    /// Transport, status and deserialization errors.
    pub async fn fetch_status(&self) -> Result<SystemStatus, ClientError> {
        let url = self.endpoint("api/status")?;
        self.send_json(self.client.get(url), "status").await
    }

    /// Lists stored promotions. Any failure degrades to an empty list.
    pub async fn fetch_promotions(&self) -> Vec<PromotionRecord> {
        let result: Result<PromotionsResponse, ClientError> = match self.endpoint("api/promotions")
        {
            Ok(url) => self.send_json(self.client.get(url), "promotions").await,
            Err(e) => Err(e),
        };
        match result {
            Ok(response) => response
                .promotions
                .iter()
                .filter_map(PromotionRecord::from_wire)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "could not list promotions; showing none");
                Vec::new()
            }
        }
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Resolves `path` (no leading slash) against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: format!("cannot join '{path}': {e}"),
            })
    }

    /// Sends the request, asserts a 2xx status and parses the body as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] on network failure,
    /// [`ClientError::UnexpectedStatus`] on a non-2xx status and
    /// [`ClientError::Deserialize`] if the body does not parse.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), %url, "backend returned an error status");
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                url,
                body: body.chars().take(ERROR_BODY_CHARS).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}
