//! Conversation state returned by the agent backend, narrowed on receipt.
//!
//! The backend sends an untyped `state` blob alongside each reply. It is
//! converted here, once, into a [`ConversationState`] keyed by the flow
//! status; nothing downstream inspects the raw JSON.

use serde_json::Value;

use crate::completeness::{aggregate_progress, all_complete, is_complete, AggregateProgress};
use crate::message::{ChatMessage, Role};
use crate::promotion::PromotionRecord;

/// Agent messages longer than this are collapsed once the draft is complete.
pub const COLLAPSE_THRESHOLD_CHARS: usize = 200;

/// Where the backend says the conversation is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FlowStatus {
    /// Collecting data; no preview.
    #[default]
    Draft,
    /// Collecting data; no preview.
    Gathering,
    /// Data validated; preview with confirm.
    Validated,
    /// Ready; preview with confirm and export.
    Ready,
    /// Any status this client does not know.
    Other(String),
}

impl FlowStatus {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "draft" => FlowStatus::Draft,
            "gathering" => FlowStatus::Gathering,
            "validated" => FlowStatus::Validated,
            "ready" => FlowStatus::Ready,
            _ => FlowStatus::Other(raw.to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            FlowStatus::Draft => "draft",
            FlowStatus::Gathering => "gathering",
            FlowStatus::Validated => "validated",
            FlowStatus::Ready => "ready",
            FlowStatus::Other(s) => s,
        }
    }

    /// Statuses in which a complete draft is previewed.
    #[must_use]
    pub fn shows_preview(&self) -> bool {
        matches!(self, FlowStatus::Validated | FlowStatus::Ready)
    }

    #[must_use]
    pub fn allows_export(&self) -> bool {
        *self == FlowStatus::Ready
    }
}

impl std::fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The draft(s) carried by the state.
#[derive(Debug, Clone, PartialEq)]
pub enum PromotionPayload {
    Single(PromotionRecord),
    Multiple(Vec<PromotionRecord>),
}

impl PromotionPayload {
    /// Extracts the payload from `state.data`.
    ///
    /// A non-empty `multiple_promotions` array or an array `data` yields
    /// [`PromotionPayload::Multiple`]; an object yields
    /// [`PromotionPayload::Single`]. Array entries that are not records are
    /// kept as empty records so they count as incomplete.
    #[must_use]
    pub fn from_data(data: &Value) -> Option<Self> {
        let multiple = data
            .get("multiple_promotions")
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
            .or_else(|| data.as_array().filter(|items| !items.is_empty()));

        if let Some(items) = multiple {
            let records = items
                .iter()
                .map(|item| PromotionRecord::from_wire(item).unwrap_or_default())
                .collect();
            return Some(PromotionPayload::Multiple(records));
        }
        PromotionRecord::from_wire(data).map(PromotionPayload::Single)
    }

    #[must_use]
    pub fn records(&self) -> &[PromotionRecord] {
        match self {
            PromotionPayload::Single(record) => std::slice::from_ref(record),
            PromotionPayload::Multiple(records) => records,
        }
    }

    #[must_use]
    pub fn is_multiple(&self) -> bool {
        matches!(self, PromotionPayload::Multiple(_))
    }

    /// Single: [`is_complete`]. Multiple: [`all_complete`].
    #[must_use]
    pub fn is_complete(&self) -> bool {
        match self {
            PromotionPayload::Single(record) => is_complete(record),
            PromotionPayload::Multiple(records) => all_complete(records),
        }
    }

    #[must_use]
    pub fn progress(&self) -> AggregateProgress {
        aggregate_progress(self.records())
    }

    /// Whether the backend has extracted anything worth showing yet.
    #[must_use]
    pub fn has_structured_data(&self) -> bool {
        match self {
            PromotionPayload::Multiple(records) => !records.is_empty(),
            PromotionPayload::Single(record) => [&record.titulo, &record.periodo_inicio]
                .into_iter()
                .flatten()
                .any(|v| !v.trim().is_empty()),
        }
    }
}

/// A spreadsheet the backend attached to the state for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetAttachment {
    pub base64: String,
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    pub status: FlowStatus,
    pub payload: Option<PromotionPayload>,
    pub attachment: Option<SpreadsheetAttachment>,
}

impl ConversationState {
    /// Narrows a chat response's `state` and `status`.
    ///
    /// The response-level `status` wins over `state.status`; with neither the
    /// flow is [`FlowStatus::Draft`].
    #[must_use]
    pub fn from_wire(state: Option<&Value>, response_status: Option<&str>) -> Self {
        let status = response_status
            .or_else(|| state.and_then(|s| s.get("status")).and_then(Value::as_str))
            .map(FlowStatus::parse)
            .unwrap_or_default();

        let data = state.and_then(|s| s.get("data")).filter(|d| !d.is_null());
        let attachment = data.and_then(|d| {
            let base64 = d.get("excel_base64").and_then(Value::as_str)?;
            let filename = d.get("excel_filename").and_then(Value::as_str)?;
            Some(SpreadsheetAttachment {
                base64: base64.to_owned(),
                filename: filename.to_owned(),
            })
        });
        let payload = data
            .map(strip_attachment)
            .as_ref()
            .and_then(PromotionPayload::from_data);

        Self {
            status,
            payload,
            attachment,
        }
    }

    /// Preview gate: data complete and status validated or ready.
    #[must_use]
    pub fn should_show_preview(&self) -> bool {
        self.status.shows_preview() && self.payload.as_ref().is_some_and(PromotionPayload::is_complete)
    }

    #[must_use]
    pub fn allows_export(&self) -> bool {
        self.should_show_preview() && self.status.allows_export()
    }

    /// Removes the spreadsheet so it is only ever handled once.
    pub fn take_attachment(&mut self) -> Option<SpreadsheetAttachment> {
        self.attachment.take()
    }

    /// Whether `message` should be collapsed in the transcript.
    ///
    /// Only long agent messages are collapsed, and only once the structured
    /// draft is complete; an incomplete draft needs the agent's instructions.
    #[must_use]
    pub fn collapses(&self, message: &ChatMessage) -> bool {
        if message.role != Role::Agent {
            return false;
        }
        let Some(payload) = &self.payload else {
            return false;
        };
        payload.has_structured_data()
            && payload.is_complete()
            && message.content.chars().count() > COLLAPSE_THRESHOLD_CHARS
    }
}

fn strip_attachment(data: &Value) -> Value {
    let mut data = data.clone();
    if let Value::Object(map) = &mut data {
        map.remove("excel_base64");
        map.remove("excel_filename");
    }
    data
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn full_data() -> Value {
        json!({
            "titulo": "Leve 3 pague 2",
            "mecanica": "desconto",
            "descricao": "d",
            "publico_alvo": "Varejo",
            "periodo_inicio": "2024-01-01",
            "periodo_fim": "2024-01-31",
            "condicoes": "c",
            "recompensas": "r"
        })
    }

    #[test]
    fn flow_status_parses_known_and_unknown() {
        assert_eq!(FlowStatus::parse("READY"), FlowStatus::Ready);
        assert_eq!(FlowStatus::parse("gathering"), FlowStatus::Gathering);
        assert_eq!(
            FlowStatus::parse("sent"),
            FlowStatus::Other("sent".to_owned())
        );
    }

    #[test]
    fn preview_requires_complete_data_and_status() {
        for (status, expected) in [
            ("draft", false),
            ("gathering", false),
            ("validated", true),
            ("ready", true),
            ("sent", false),
        ] {
            let state = ConversationState::from_wire(Some(&json!({ "data": full_data() })), Some(status));
            assert_eq!(state.should_show_preview(), expected, "status {status}");
        }
    }

    #[test]
    fn incomplete_data_never_previews() {
        let mut data = full_data();
        data["periodo_fim"] = json!("");
        for status in ["draft", "validated", "ready"] {
            let state = ConversationState::from_wire(Some(&json!({ "data": data })), Some(status));
            assert!(!state.should_show_preview(), "status {status}");
        }
    }

    #[test]
    fn status_falls_back_to_state_status() {
        let state = ConversationState::from_wire(
            Some(&json!({ "status": "validated", "data": full_data() })),
            None,
        );
        assert_eq!(state.status, FlowStatus::Validated);
        assert!(state.should_show_preview());
        assert!(!state.allows_export());
    }

    #[test]
    fn multiple_promotions_use_all_complete() {
        let mut partial = full_data();
        partial["recompensas"] = Value::Null;

        let state = ConversationState::from_wire(
            Some(&json!({ "data": { "multiple_promotions": [full_data(), partial] } })),
            Some("ready"),
        );
        let payload = state.payload.as_ref().expect("payload should narrow");
        assert!(payload.is_multiple());
        assert_eq!(payload.records().len(), 2);
        assert_eq!(payload.progress().completed_count, 1);
        assert!(!state.should_show_preview());

        let state = ConversationState::from_wire(
            Some(&json!({ "data": [full_data(), full_data()] })),
            Some("ready"),
        );
        assert!(state.should_show_preview());
        assert!(state.allows_export());
    }

    #[test]
    fn non_record_entries_count_as_incomplete() {
        let state = ConversationState::from_wire(
            Some(&json!({ "data": { "multiple_promotions": [full_data(), null, "texto"] } })),
            Some("ready"),
        );
        let payload = state.payload.as_ref().expect("payload should narrow");
        assert_eq!(payload.records().len(), 3);
        assert_eq!(payload.records()[1], PromotionRecord::default());

        let progress = payload.progress();
        assert_eq!(progress.total_count, 3);
        assert_eq!(progress.completed_count, 1);
        assert!(!state.should_show_preview());
    }

    #[test]
    fn out_of_range_amount_still_previews() {
        let mut data = full_data();
        data["ticket_minimo"] = json!(1e40);
        let state = ConversationState::from_wire(Some(&json!({ "data": data.clone() })), Some("ready"));
        assert!(matches!(state.payload, Some(PromotionPayload::Single(_))));
        assert!(state.should_show_preview());

        let state = ConversationState::from_wire(
            Some(&json!({ "data": { "multiple_promotions": [full_data(), data] } })),
            Some("ready"),
        );
        let payload = state.payload.as_ref().expect("payload should narrow");
        assert_eq!(payload.progress().completed_count, 2);
        assert!(state.should_show_preview());
    }

    #[test]
    fn empty_multiple_list_falls_back_to_single() {
        let mut data = full_data();
        data["multiple_promotions"] = json!([]);
        let state = ConversationState::from_wire(Some(&json!({ "data": data })), Some("ready"));
        assert!(matches!(state.payload, Some(PromotionPayload::Single(_))));
        assert!(state.should_show_preview());
    }

    #[test]
    fn missing_or_null_state_has_no_payload() {
        let state = ConversationState::from_wire(None, Some("ready"));
        assert!(state.payload.is_none());
        assert!(!state.should_show_preview());

        let state = ConversationState::from_wire(Some(&json!({ "data": null })), None);
        assert!(state.payload.is_none());
        assert_eq!(state.status, FlowStatus::Draft);
    }

    #[test]
    fn attachment_is_extracted_and_taken_once() {
        let mut data = full_data();
        data["excel_base64"] = json!("UEsDBA==");
        data["excel_filename"] = json!("promo.xlsx");
        let mut state = ConversationState::from_wire(Some(&json!({ "data": data })), Some("ready"));

        let record = &state.payload.as_ref().expect("payload").records()[0];
        assert!(!record.extra.contains_key("excel_base64"));

        let attachment = state.take_attachment().expect("attachment present");
        assert_eq!(attachment.filename, "promo.xlsx");
        assert!(state.take_attachment().is_none());
    }

    #[test]
    fn collapses_only_long_agent_messages_for_complete_drafts() {
        let long = "x".repeat(COLLAPSE_THRESHOLD_CHARS + 1);
        let complete = ConversationState::from_wire(Some(&json!({ "data": full_data() })), None);
        assert!(complete.collapses(&ChatMessage::agent(long.clone())));
        assert!(!complete.collapses(&ChatMessage::agent("curta")));
        assert!(!complete.collapses(&ChatMessage::user(long.clone())));

        let mut data = full_data();
        data["condicoes"] = json!(" ");
        let incomplete = ConversationState::from_wire(Some(&json!({ "data": data })), None);
        assert!(!incomplete.collapses(&ChatMessage::agent(long)));
    }
}
