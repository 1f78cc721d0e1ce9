//! Persistence of the current session identifier.
//!
//! The controller never touches storage directly; it receives a
//! [`SessionStore`] so tests can substitute [`MemorySessionStore`].

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::CoreError;

/// Holds the one session identifier that survives restarts.
pub trait SessionStore {
    /// The stored identifier, if any.
    fn get(&self) -> Option<String>;

    /// Replaces the stored identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the identifier is blank or cannot be written.
    fn set(&mut self, session_id: &str) -> Result<(), CoreError>;

    /// Forgets the stored identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the backing storage cannot be updated.
    fn clear(&mut self) -> Result<(), CoreError>;
}

/// Generates a fresh session identifier.
#[must_use]
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn validate(session_id: &str) -> Result<&str, CoreError> {
    let trimmed = session_id.trim();
    if trimmed.is_empty() || trimmed.contains(['\n', '\r']) {
        return Err(CoreError::InvalidSessionId(session_id.to_owned()));
    }
    Ok(trimmed)
}

#[derive(Debug, Default, Clone)]
pub struct MemorySessionStore {
    session_id: Option<String>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn with_session(session_id: &str) -> Self {
        Self {
            session_id: Some(session_id.to_owned()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<String> {
        self.session_id.clone()
    }

    fn set(&mut self, session_id: &str) -> Result<(), CoreError> {
        self.session_id = Some(validate(session_id)?.to_owned());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CoreError> {
        self.session_id = None;
        Ok(())
    }
}

/// Stores the identifier as the only line of a text file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CoreError {
        CoreError::SessionStoreIo {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let id = content.trim();
                (!id.is_empty()).then(|| id.to_owned())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "could not read session file; starting without a session"
                );
                None
            }
        }
    }

    fn set(&mut self, session_id: &str) -> Result<(), CoreError> {
        let id = validate(session_id)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, format!("{id}\n")).map_err(|e| self.io_error(e))
    }

    fn clear(&mut self) -> Result<(), CoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
