use thiserror::Error;

/// Errors returned by the agent backend client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    /// Non-2xx response. `body` holds at most the first 300 characters.
    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The export endpoint answered but produced no spreadsheet.
    #[error("export failed: {0}")]
    Export(String),

    #[error("spreadsheet is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("could not write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Confirm reported zero saved promotions.
    #[error("no promotion was saved ({errors} error(s))")]
    NothingSaved { errors: usize },
}
