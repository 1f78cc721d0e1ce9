pub mod client;
pub mod error;
pub mod export;
pub mod promotion_state;
pub mod types;

pub use client::PromoClient;
pub use error::ClientError;
pub use export::{ExportedSpreadsheet, SpreadsheetFile};
pub use types::{
    ChatResponse, ConfirmFailure, ConfirmOutcome, ConfirmResponse, ExportResponse, SystemStatus,
};
