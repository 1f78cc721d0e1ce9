//! Conversation controller for the interactive chat.
//!
//! Owns the transcript, the session identifier, the latest narrowed
//! [`ConversationState`] and the session history. Every action awaits one
//! backend call and applies its result before returning, so state changes
//! happen strictly in the order the user triggered them.

use std::path::PathBuf;

use anyhow::Context as _;
use promoagente_client::{
    ChatResponse, ClientError, ConfirmOutcome, ExportedSpreadsheet, PromoClient, SpreadsheetFile,
};
use promoagente_core::{
    missing_fields, new_session_id, update_errors, ChatMessage, ConversationState,
    PromotionPayload, PromotionRecord, SessionHistory, SessionStore,
};

/// Text sent to the agent to request a spreadsheet of the current draft.
pub(crate) const EXPORT_REQUEST: &str = "gerar excel";

/// The backend calls the controller needs. Implemented by [`PromoClient`];
/// tests substitute a scripted fake.
pub(crate) trait Backend {
    async fn send_message(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatResponse, ClientError>;

    async fn confirm(
        &self,
        payload: &PromotionPayload,
        session_id: Option<&str>,
    ) -> Result<ConfirmOutcome, ClientError>;

    async fn export_session(
        &self,
        session_id: &str,
        promotions: &[PromotionRecord],
    ) -> Result<ExportedSpreadsheet, ClientError>;

    async fn export_all(&self) -> Result<ExportedSpreadsheet, ClientError>;

    async fn update_promotion(
        &self,
        promotion_id: &str,
        updates: &PromotionRecord,
    ) -> Result<PromotionRecord, ClientError>;
}

impl Backend for PromoClient {
    async fn send_message(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatResponse, ClientError> {
        PromoClient::send_message(self, message, session_id).await
    }

    async fn confirm(
        &self,
        payload: &PromotionPayload,
        session_id: Option<&str>,
    ) -> Result<ConfirmOutcome, ClientError> {
        PromoClient::confirm(self, payload, session_id).await
    }

    async fn export_session(
        &self,
        session_id: &str,
        promotions: &[PromotionRecord],
    ) -> Result<ExportedSpreadsheet, ClientError> {
        PromoClient::export_session(self, session_id, promotions).await
    }

    async fn export_all(&self) -> Result<ExportedSpreadsheet, ClientError> {
        PromoClient::export_all(self).await
    }

    async fn update_promotion(
        &self,
        promotion_id: &str,
        updates: &PromotionRecord,
    ) -> Result<PromotionRecord, ClientError> {
        PromoClient::update_promotion(self, promotion_id, updates).await
    }
}

/// What a chat turn produced besides the transcript entries.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct TurnOutcome {
    /// The agent reported the promotion as finished.
    pub completed: bool,
    /// Where an attached spreadsheet was written, if the turn carried one.
    pub spreadsheet: Option<PathBuf>,
}

pub(crate) struct ChatController<B, S> {
    backend: B,
    store: S,
    export_dir: PathBuf,
    messages: Vec<ChatMessage>,
    session_id: Option<String>,
    state: ConversationState,
    history: SessionHistory,
}

impl<B: Backend, S: SessionStore> ChatController<B, S> {
    /// Resumes the stored session, if any, with an empty transcript.
    pub(crate) fn new(backend: B, store: S, export_dir: impl Into<PathBuf>) -> Self {
        let session_id = store.get();
        Self {
            backend,
            store,
            export_dir: export_dir.into(),
            messages: Vec::new(),
            session_id,
            state: ConversationState::default(),
            history: SessionHistory::default(),
        }
    }

    pub(crate) fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub(crate) fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub(crate) fn state(&self) -> &ConversationState {
        &self.state
    }

    pub(crate) fn history(&self) -> &SessionHistory {
        &self.history
    }

    /// Sends one user message. Blank input is ignored and returns `None`.
    ///
    /// Backend failures are reported as an agent message; the previous state
    /// is kept.
    pub(crate) async fn send(&mut self, input: &str) -> Option<TurnOutcome> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage::user(text));

        match self
            .backend
            .send_message(text, self.session_id.as_deref())
            .await
        {
            Ok(reply) => Some(self.apply_reply(&reply)),
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                self.messages.push(ChatMessage::agent(format!(
                    "❌ Erro ao comunicar com o agente: {e}"
                )));
                Some(TurnOutcome::default())
            }
        }
    }

    /// Asks the agent for a spreadsheet of the current draft.
    pub(crate) async fn export_current(&mut self) -> Option<TurnOutcome> {
        self.send(EXPORT_REQUEST).await
    }

    fn apply_reply(&mut self, reply: &ChatResponse) -> TurnOutcome {
        self.messages
            .push(ChatMessage::agent_at(&reply.response, &reply.timestamp));
        self.adopt_session(&reply.session_id);

        if reply.state.is_some() {
            self.state = reply.conversation_state();
        }

        let spreadsheet = self
            .state
            .take_attachment()
            .and_then(|attachment| self.write_attachment(&attachment.base64, &attachment.filename));

        let completed = reply.marks_completion();
        if completed {
            tracing::info!(session_id = ?self.session_id, "promotion completed");
        }
        TurnOutcome {
            completed,
            spreadsheet,
        }
    }

    /// Switches to a session id handed out by the backend. The session
    /// history belongs to the old session and is dropped.
    fn adopt_session(&mut self, session_id: &str) {
        if session_id.trim().is_empty() || self.session_id.as_deref() == Some(session_id) {
            return;
        }
        tracing::info!(
            previous = ?self.session_id,
            current = session_id,
            "backend assigned a new session"
        );
        self.session_id = Some(session_id.to_owned());
        self.history.clear();
        if let Err(e) = self.store.set(session_id) {
            tracing::warn!(error = %e, "could not persist session id");
        }
    }

    fn write_attachment(&mut self, base64: &str, filename: &str) -> Option<PathBuf> {
        let written = SpreadsheetFile::decode(base64, filename)
            .and_then(|file| file.write_into(&self.export_dir));
        match written {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(error = %e, filename, "could not save attached spreadsheet");
                self.messages.push(ChatMessage::agent(format!(
                    "❌ Erro ao salvar planilha: {e}"
                )));
                None
            }
        }
    }

    /// Confirms the previewed draft. Returns whether anything was saved.
    ///
    /// Saved records join the session history and the preview is cleared;
    /// on failure the state and history are left as they were.
    pub(crate) async fn confirm(&mut self) -> bool {
        if let Some(reason) = confirm_blocker(&self.state) {
            self.messages.push(ChatMessage::agent(reason));
            return false;
        }
        let Some(payload) = self.state.payload.as_ref() else {
            return false;
        };

        match self
            .backend
            .confirm(payload, self.session_id.as_deref())
            .await
        {
            Ok(outcome) => {
                self.messages
                    .push(ChatMessage::agent(confirm_summary(&outcome)));
                for record in outcome.saved {
                    self.history.push(record);
                }
                self.state = ConversationState::default();
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "confirm failed");
                let reason = match e {
                    ClientError::NothingSaved { .. } => {
                        "Nenhuma promoção foi salva com sucesso".to_owned()
                    }
                    other => other.to_string(),
                };
                self.messages.push(ChatMessage::agent(format!(
                    "❌ Erro ao confirmar promoção: {reason}"
                )));
                false
            }
        }
    }

    /// Exports the promotions confirmed in this session.
    ///
    /// # Errors
    ///
    /// Fails when the history is empty, the backend call fails, or the file
    /// cannot be written.
    pub(crate) async fn export_session(&self) -> anyhow::Result<PathBuf> {
        if self.history.is_empty() {
            anyhow::bail!("⚠️ Nenhuma promoção confirmada nesta sessão para exportar.");
        }
        let session_id = self.session_id.as_deref().unwrap_or_default();
        let exported = self
            .backend
            .export_session(session_id, self.history.records())
            .await
            .context("❌ Erro ao exportar sessão")?;
        Ok(exported.file.write_into(&self.export_dir)?)
    }

    /// Exports every promotion stored on the backend.
    ///
    /// # Errors
    ///
    /// Fails when the backend call fails or the file cannot be written.
    pub(crate) async fn export_all(&self) -> anyhow::Result<(PathBuf, Option<u64>)> {
        let exported = self
            .backend
            .export_all()
            .await
            .context("❌ Erro ao exportar")?;
        let path = exported.file.write_into(&self.export_dir)?;
        Ok((path, exported.total_promocoes))
    }

    /// Starts over: empty transcript, fresh session id, no draft, no history.
    ///
    /// # Errors
    ///
    /// Fails when the new session id cannot be persisted. Local state is
    /// reset regardless.
    pub(crate) fn new_promotion(&mut self) -> anyhow::Result<String> {
        let session_id = new_session_id();
        self.messages.clear();
        self.state = ConversationState::default();
        self.history.clear();
        self.session_id = Some(session_id.clone());
        self.store
            .set(&session_id)
            .context("could not persist new session id")?;
        tracing::info!(session_id = %session_id, "new promotion session");
        Ok(session_id)
    }

    /// Saves an edited history record.
    ///
    /// Start and end dates are required. The record returned by the backend
    /// replaces the history entry with the same id.
    ///
    /// # Errors
    ///
    /// Fails on validation errors, a record without id, or a backend failure;
    /// the history is unchanged in every case.
    pub(crate) async fn update_promotion(
        &mut self,
        edited: &PromotionRecord,
    ) -> anyhow::Result<&PromotionRecord> {
        let errors = update_errors(edited);
        if !errors.is_empty() {
            let listed: Vec<&str> = errors.values().copied().collect();
            anyhow::bail!("{}", listed.join("; "));
        }
        let Some(id) = edited.id.as_deref() else {
            anyhow::bail!("promoção sem identificador não pode ser atualizada");
        };
        if self.history.get(id).is_none() {
            anyhow::bail!("promoção {id} não está no histórico desta sessão");
        }

        let mut updated = self
            .backend
            .update_promotion(id, edited)
            .await
            .context("Erro ao salvar promoção")?;
        if updated.id.is_none() {
            updated.id = Some(id.to_owned());
        }
        let id = id.to_owned();
        self.history.replace(updated);
        tracing::info!(promotion_id = %id, "promotion updated");
        self.history
            .get(&id)
            .context("updated promotion missing from history")
    }
}

/// Why the current state cannot be confirmed yet, if anything stops it.
pub(crate) fn confirm_blocker(state: &ConversationState) -> Option<String> {
    let Some(payload) = state.payload.as_ref() else {
        return Some("⚠️ Nenhuma promoção em andamento para confirmar.".to_owned());
    };
    if !payload.is_complete() {
        return Some(match payload {
            PromotionPayload::Single(record) => format!(
                "⚠️ Campos obrigatórios pendentes: {}",
                missing_fields(record).join(", ")
            ),
            PromotionPayload::Multiple(_) => {
                let progress = payload.progress();
                format!(
                    "⚠️ {} de {} promoções completas; complete todas antes de confirmar.",
                    progress.completed_count, progress.total_count
                )
            }
        });
    }
    if !state.should_show_preview() {
        return Some(format!(
            "⚠️ Aguardando validação do agente (status: {}).",
            state.status
        ));
    }
    None
}

fn confirm_summary(outcome: &ConfirmOutcome) -> String {
    let mut lines = vec![format!(
        "✅ **{} promoção(ões) confirmada(s) e salva(s) com sucesso!**",
        outcome.total_saved
    )];
    if outcome.total_errors > 0 {
        let failures = format!("⚠️ {} falha(s)", outcome.total_errors);
        if outcome.failed_titles.is_empty() {
            lines.push(failures);
        } else {
            lines.push(format!("{failures}: {}", outcome.failed_titles.join(", ")));
        }
    }
    lines.join("\n\n")
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
