//! Unified error types for clipcut
//!
//! Error strategy:
//! - Per-row errors (timestamp, download, decode, export): Recoverable, log and continue
//! - System errors (config, output directory, log file, spreadsheet): Fatal, abort batch
//!
//! All errors include actionable suggestions where possible.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for clipcut operations
#[derive(Debug, Error)]
pub enum ClipError {
    // =========================================================================
    // Recoverable errors - skip row, continue batch
    // =========================================================================
    #[error("Invalid start time '{value}': {reason}\n  Tip: Use MM:SS, e.g. 1:05 or 12:30")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Download failed for '{query}' after {attempts} attempt(s): {reason}\n  Tip: Check that yt-dlp is installed and the network is reachable")]
    DownloadFailed {
        query: String,
        attempts: u32,
        reason: String,
    },

    #[error("Failed to decode audio file '{path}': {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Failed to export clip '{path}': {reason}")]
    ExportError { path: PathBuf, reason: String },

    #[error("File not found: '{0}'")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Fatal errors - abort entire batch
    // =========================================================================
    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Cannot read spreadsheet '{path}': {reason}")]
    SpreadsheetError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Result type alias for clipcut operations
pub type Result<T> = std::result::Result<T, ClipError>;

/// Represents the outcome of processing a single spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Clip written to its final path
    Success { output: PathBuf },
    /// Nothing to do (incomplete row, clip already exists)
    Skipped { reason: String },
    /// Download or trim failed; the row produced no clip
    Failed { reason: String },
}

impl RowOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        RowOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        RowOutcome::Failed {
            reason: reason.into(),
        }
    }
}

impl ClipError {
    /// Returns true if this error is recoverable (should skip row, continue batch)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClipError::InvalidTimestamp { .. }
                | ClipError::DownloadFailed { .. }
                | ClipError::DecodeError { .. }
                | ClipError::ExportError { .. }
                | ClipError::FileNotFound(_)
        )
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ClipError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an export error for a clip destination
    pub fn export_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ClipError::ExportError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!("Directory does not exist: {}", path.parent().map(|p| p.display().to_string()).unwrap_or_default())
            }
            _ => err.to_string(),
        };
        ClipError::OutputError { path, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_errors_are_recoverable() {
        let err = ClipError::InvalidTimestamp {
            value: "ab:cd".to_string(),
            reason: "not a number".to_string(),
        };
        assert!(err.is_recoverable());
        assert!(ClipError::decode_error("/tmp/x.mp3", "bad header").is_recoverable());
        assert!(ClipError::FileNotFound(PathBuf::from("/tmp/missing.mp3")).is_recoverable());
    }

    #[test]
    fn test_config_error_is_fatal() {
        assert!(!ClipError::ConfigError("missing".to_string()).is_recoverable());
        let err = ClipError::output_error(
            "/root/out",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("Permission denied"));
    }

    #[test]
    fn test_download_error_mentions_attempts() {
        let err = ClipError::DownloadFailed {
            query: "Song".to_string(),
            attempts: 3,
            reason: "exit status 1".to_string(),
        };
        assert!(err.to_string().contains("3 attempt(s)"));
    }
}
