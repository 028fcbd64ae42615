// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the uabrowse binary.

use thiserror::Error;

use uabrowse_opcua::OpcUaError;

/// Result type alias for uabrowse-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Exit code for cancellation via Ctrl-C.
pub const EXIT_CANCELLED: i32 = 130;

/// Errors that can occur in the uabrowse binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Invalid settings or command-line arguments.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The server could not be reached or the session was not established.
    #[error("Connection failed")]
    Connection(#[source] OpcUaError),

    /// The browse finished with a failed result.
    #[error("Browse failed: {0}")]
    Browse(String),

    /// The export could not be written.
    #[error("Export failed")]
    Export(#[source] OpcUaError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// The user interrupted the command.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a browse error.
    pub fn browse(msg: impl Into<String>) -> Self {
        Self::Browse(msg.into())
    }

    /// Creates an I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled => EXIT_CANCELLED,
            Self::WithContext { source, .. } => source.exit_code(),
            _ => 1,
        }
    }

    /// Returns recovery hints carried by the underlying library error.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Connection(e) | Self::Export(e) => e.recovery_hints(),
            Self::WithContext { source, .. } => source.recovery_hints(),
            _ => Vec::new(),
        }
    }
}

impl From<OpcUaError> for BinError {
    fn from(err: OpcUaError) -> Self {
        match err {
            OpcUaError::Export(_) => Self::Export(err),
            OpcUaError::Configuration(_) | OpcUaError::Validation(_) => {
                Self::Configuration(err.to_string())
            }
            _ => Self::Connection(err),
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<anyhow::Error> for BinError {
    fn from(err: anyhow::Error) -> Self {
        Self::Configuration(format!("{:#}", err))
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with appropriate formatting.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    // Print cause chain
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }

    let hints = error.recovery_hints();
    if !hints.is_empty() {
        eprintln!("  Hints:");
        for hint in hints {
            eprintln!("    - {}", hint);
        }
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================
