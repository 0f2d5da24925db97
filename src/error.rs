//! Error types shared by every stage of a report run.
//!
//! Every variant is fatal for the run; the only places that swallow failures
//! are HTML normalization and individual date candidates, and those never
//! produce an [`Error`] in the first place.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort a report run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration (raised before any network call)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// The folder path contained no non-empty segment.
    #[error("folder path is empty")]
    EmptyFolderPath,

    // ─────────────────────────────────────────────────────────────────────────
    // Credentials
    // ─────────────────────────────────────────────────────────────────────────
    /// No valid bearer token could be obtained, or the remote side rejected it.
    #[error("authentication failed: {message}")]
    Auth {
        /// What went wrong.
        message: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Remote mail API
    // ─────────────────────────────────────────────────────────────────────────
    /// A folder path segment had no match at its level.
    #[error("{}", folder_not_found_message(segment, parent.as_deref()))]
    FolderNotFound {
        /// The first unmatched segment.
        segment: String,
        /// Display name of the folder that was searched, if any.
        parent: Option<String>,
    },

    /// Non-retryable or retry-exhausted HTTP failure.
    #[error("remote request failed with status {status}: {body}")]
    Http {
        /// HTTP status code of the last response.
        status: u16,
        /// Response body of the last response.
        body: String,
    },

    /// The request never produced an HTTP response.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Target URL.
        url: String,
        /// Underlying transport error.
        message: String,
    },

    /// The response body was not the JSON shape we expect.
    #[error("unexpected response from {url}: {message}")]
    Decode {
        /// Source URL.
        url: String,
        /// Underlying decode error.
        message: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Output
    // ─────────────────────────────────────────────────────────────────────────
    /// The report could not be written to its destination.
    #[error(
        "cannot write report to '{}': {source}. It may be open in another program; close it and re-run.",
        path.display()
    )]
    OutputWrite {
        /// Destination path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

fn folder_not_found_message(segment: &str, parent: Option<&str>) -> String {
    match parent {
        Some(parent) => format!("subfolder '{segment}' not found under '{parent}'"),
        None => format!("top-level folder '{segment}' not found; check spelling"),
    }
}

impl Error {
    /// Shorthand for [`Error::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Auth`].
    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth {
            message: message.into(),
        }
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config { .. } | Error::EmptyFolderPath => ErrorCategory::Configuration,
            Error::Auth { .. } => ErrorCategory::Auth,
            Error::FolderNotFound { .. }
            | Error::Http { .. }
            | Error::Transport { .. }
            | Error::Decode { .. } => ErrorCategory::Remote,
            Error::OutputWrite { .. } => ErrorCategory::Output,
        }
    }
}

/// Error categories for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected at the boundary, before any network call.
    Configuration,
    /// Credential acquisition or token rejection.
    Auth,
    /// Mail API failures.
    Remote,
    /// Writing the report artifact.
    Output,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Auth => write!(f, "auth"),
            ErrorCategory::Remote => write!(f, "remote"),
            ErrorCategory::Output => write!(f, "output"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_not_found_names_segment() {
        let err = Error::FolderNotFound {
            segment: "Invoices".into(),
            parent: Some("Inbox".into()),
        };
        assert_eq!(
            err.to_string(),
            "subfolder 'Invoices' not found under 'Inbox'"
        );

        let err = Error::FolderNotFound {
            segment: "Inbx".into(),
            parent: None,
        };
        assert!(err.to_string().contains("'Inbx'"));
    }

    #[test]
    fn test_output_write_is_actionable() {
        let err = Error::OutputWrite {
            path: PathBuf::from("report.csv"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("report.csv"));
        assert!(msg.contains("close it and re-run"));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(Error::config("x").category(), ErrorCategory::Configuration);
        assert_eq!(Error::EmptyFolderPath.category(), ErrorCategory::Configuration);
        assert_eq!(Error::auth("x").category(), ErrorCategory::Auth);
        let err = Error::Http {
            status: 500,
            body: String::new(),
        };
        assert_eq!(err.category(), ErrorCategory::Remote);
    }
}
