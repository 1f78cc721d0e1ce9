//! Wire types for the agent backend.

use promoagente_core::{ConversationState, PromotionRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Reply from the chat (orchestrator) endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Phrases the backend uses when a promotion has been wrapped up.
const COMPLETION_PHRASES: [&str; 3] = [
    "Promoção validada e pronta",
    "Promoção enviada com sucesso",
    "Promoção salva no sistema",
];

impl ChatResponse {
    /// Narrows `state`/`status` into a typed [`ConversationState`].
    #[must_use]
    pub fn conversation_state(&self) -> ConversationState {
        ConversationState::from_wire(self.state.as_ref(), self.status.as_deref())
    }

    /// Whether this turn finished a promotion: status `ready` or one of the
    /// backend's completion phrases.
    #[must_use]
    pub fn marks_completion(&self) -> bool {
        self.status.as_deref() == Some("ready")
            || COMPLETION_PHRASES
                .iter()
                .any(|phrase| self.response.contains(phrase))
    }
}

/// Raw reply from the confirm endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmResponse {
    #[serde(default)]
    pub promotions: Option<Vec<Value>>,
    #[serde(default)]
    pub promotion: Option<Value>,
    #[serde(default)]
    pub total_saved: Option<usize>,
    #[serde(default)]
    pub total_errors: Option<usize>,
    #[serde(default)]
    pub errors: Vec<ConfirmFailure>,
}

/// One promotion the backend failed to save.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmFailure {
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

/// Result of a confirm call: what was saved and what failed.
///
/// Partial success keeps the saved records; failures are reported alongside.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    pub saved: Vec<PromotionRecord>,
    pub total_saved: usize,
    pub total_errors: usize,
    pub failed_titles: Vec<String>,
}

impl From<ConfirmResponse> for ConfirmOutcome {
    fn from(response: ConfirmResponse) -> Self {
        let saved: Vec<PromotionRecord> = response
            .promotions
            .or_else(|| response.promotion.map(|p| vec![p]))
            .unwrap_or_default()
            .iter()
            .filter_map(PromotionRecord::from_wire)
            .collect();

        let total_saved = match response.total_saved {
            Some(n) if n > 0 => n,
            _ => saved.len(),
        };
        let failed_titles = response
            .errors
            .iter()
            .map(|e| e.titulo.clone().unwrap_or_else(|| "(sem título)".to_owned()))
            .collect();

        Self {
            saved,
            total_saved,
            total_errors: response.total_errors.unwrap_or(0),
            failed_titles,
        }
    }
}

/// Either one record or several, as the confirm endpoint accepts both.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum ConfirmRequest {
    Single(PromotionRecord),
    Multiple(Vec<PromotionRecord>),
}

#[derive(Debug, Serialize)]
pub(crate) struct ExportRequest<'a> {
    pub session_id: &'a str,
    pub promotions: &'a [PromotionRecord],
}

/// Reply from both export endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub excel_base64: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub total_promocoes: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdateRequest<'a> {
    pub promotion_id: &'a str,
    pub updates: &'a PromotionRecord,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateResponse {
    #[serde(default)]
    pub promotion: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PromotionsResponse {
    #[serde(default)]
    pub promotions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SummaryResponse {
    #[serde(default)]
    pub summary: String,
}

/// Health flags for the backend's subsystems. Displayed only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SystemStatus {
    pub system_ready: bool,
    pub openai: bool,
    pub openai_version: Option<String>,
    pub openai_model: String,
    pub agno_framework: bool,
    pub agno_version: Option<String>,
    pub agno_status_error: Option<String>,
    pub orchestrator: bool,
    pub extractor: bool,
    pub validator: bool,
    pub summarizer: bool,
    pub memory_manager: bool,
    pub sqlite_db: bool,
    pub cosmos_db: bool,
    pub blob_storage: bool,
    pub messages_stored: u64,
    pub promotions_count: u64,
    pub python_version: String,
    pub environment: String,
}

impl SystemStatus {
    /// `(label, online)` pairs for every subsystem flag.
    #[must_use]
    pub fn components(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("OpenAI", self.openai),
            ("Agno", self.agno_framework),
            ("Orchestrator", self.orchestrator),
            ("Extractor", self.extractor),
            ("Validator", self.validator),
            ("Summarizer", self.summarizer),
            ("Memory", self.memory_manager),
            ("SQLite", self.sqlite_db),
            ("Cosmos DB", self.cosmos_db),
            ("Blob Storage", self.blob_storage),
        ]
    }
}
