pub mod app_config;
pub mod completeness;
pub mod config;
pub mod display;
pub mod history;
pub mod message;
pub mod promotion;
pub mod session;
pub mod state;
pub mod validation;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use completeness::{
    aggregate_progress, all_complete, is_complete, missing_fields, progress, records_of,
    AggregateProgress, FieldSource, Progress, RequiredField,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use display::{
    classify, format_brl, format_pt_br, highlights, DisplayView, FieldDisplay, FieldStatus,
    Highlight,
};
pub use history::SessionHistory;
pub use message::{ChatMessage, Role};
pub use promotion::PromotionRecord;
pub use session::{new_session_id, FileSessionStore, MemorySessionStore, SessionStore};
pub use state::{ConversationState, FlowStatus, PromotionPayload, SpreadsheetAttachment};
pub use validation::update_errors;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("session store I/O error at {path}: {source}")]
    SessionStoreIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session id: {0}")]
    InvalidSessionId(String),
}
