use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One entry of the chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, Utc::now())
    }

    #[must_use]
    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(Role::Agent, content, Utc::now())
    }

    /// Agent message stamped with the backend's timestamp.
    ///
    /// Timestamps that do not parse fall back to the current time.
    #[must_use]
    pub fn agent_at(content: impl Into<String>, timestamp: &str) -> Self {
        Self::new(Role::Agent, content, parse_timestamp(timestamp))
    }

    fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// Parses RFC 3339 or a naive ISO timestamp (treated as UTC).
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }
    tracing::debug!(timestamp = raw, "unparseable backend timestamp; using now");
    Utc::now()
}
