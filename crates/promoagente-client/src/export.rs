//! Spreadsheet files delivered by the backend as base64.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::ClientError;
use crate::types::ExportResponse;

/// Default name for a full export.
pub const EXPORT_ALL_FILENAME: &str = "promocoes_completo.xlsx";

/// A decoded spreadsheet ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// An export result with the promotion count the backend reported.
#[derive(Debug, Clone)]
pub struct ExportedSpreadsheet {
    pub file: SpreadsheetFile,
    pub total_promocoes: Option<u64>,
}

impl SpreadsheetFile {
    /// Decodes a base64 payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if `encoded` is not valid base64.
    pub fn decode(encoded: &str, filename: &str) -> Result<Self, ClientError> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64.decode(compact)?;
        Ok(Self {
            filename: sanitize_filename(filename),
            bytes,
        })
    }

    /// Writes the file into `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the directory or file cannot be written.
    pub fn write_into(&self, dir: &Path) -> Result<PathBuf, ClientError> {
        let io_err = |path: &Path, source| ClientError::Io {
            path: path.display().to_string(),
            source,
        };
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.bytes).map_err(|e| io_err(&path, e))?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "spreadsheet written");
        Ok(path)
    }
}

impl ExportedSpreadsheet {
    /// Builds the result of an export call, naming the file `default_name`
    /// when the backend did not.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Export`] when the backend reports failure or
    /// sends no payload, [`ClientError::Decode`] on bad base64.
    pub(crate) fn from_response(
        response: ExportResponse,
        default_name: &str,
    ) -> Result<Self, ClientError> {
        let encoded = response
            .excel_base64
            .filter(|b| response.success && !b.trim().is_empty())
            .ok_or_else(|| {
                ClientError::Export(
                    response
                        .error
                        .unwrap_or_else(|| "backend returned no spreadsheet".to_owned()),
                )
            })?;
        let filename = response
            .filename
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| default_name.to_owned());

        Ok(Self {
            file: SpreadsheetFile::decode(&encoded, &filename)?,
            total_promocoes: response.total_promocoes,
        })
    }
}

/// Default name for a session export: `promocoes_sessao_<first 8 chars>.xlsx`.
#[must_use]
pub fn session_export_filename(session_id: &str) -> String {
    let prefix: String = session_id.chars().take(8).collect();
    format!("promocoes_sessao_{prefix}.xlsx")
}

/// Keeps only the final path component so a backend-supplied name cannot
/// escape the export directory.
fn sanitize_filename(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        EXPORT_ALL_FILENAME.to_owned()
    } else {
        name.to_owned()
    }
}
