//! Structured error handling and exit codes for the binary.

use serde::Serialize;

use crate::service::BrowseError;

/// Process exit codes.
///
/// - 0: Success
/// - 1: General error (unexpected failure)
/// - 2: Invalid request path (client-side mistake)
/// - 3: Not found (missing target or rejected traversal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The request completed normally.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// The request path was malformed.
    InvalidPath = 2,
    /// The target was not found (or not admissible).
    NotFound = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "HX000",
            Self::GeneralError => "HX001",
            Self::InvalidPath => "HX002",
            Self::NotFound => "HX003",
        }
    }

    /// Exit code for a service-level failure.
    #[must_use]
    pub fn for_browse_error(err: &BrowseError) -> Self {
        match err {
            BrowseError::InvalidInput => Self::InvalidPath,
            BrowseError::NotFound => Self::NotFound,
            BrowseError::List(_) | BrowseError::Hash(_) | BrowseError::Resolve(_) => {
                Self::GeneralError
            }
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "HX003")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a structured error from a message and an exit code.
    #[must_use]
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: message.into(),
        }
    }
}
