// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for address-space browsing and export.
//!
//! Errors are grouped by the stage that raised them. Precondition failures
//! (bad node id, unknown namespace filter) are [`ValidationError`]s and never
//! touch the network; protocol reads fail with a [`SessionError`] carrying a
//! coarse [`SessionErrorKind`]; sinks fail with an [`ExportError`].
//!
//! # Error Categories
//!
//! ```text
//! OpcUaError
//! ├── Connection    - Endpoint discovery and session establishment
//! ├── Security      - Policy, mode and certificate problems
//! ├── Session       - Per-node protocol reads (NotFound, AccessDenied, ...)
//! ├── Validation    - Node-id syntax and namespace filter checks
//! ├── Export        - Result validation and file output
//! └── Configuration - Invalid client settings
//! ```
//!
//! # Examples
//!
//! ```
//! use uabrowse_opcua::error::{OpcUaError, ValidationError};
//!
//! let error = OpcUaError::validation(ValidationError::invalid_node_id("foo"));
//! assert!(error.to_string().contains("must contain '='"));
//! assert_eq!(error.category(), "validation");
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

// =============================================================================
// OpcUaError - Main Error Type
// =============================================================================

/// The main error type for browse and export operations.
#[derive(Debug, Error)]
pub enum OpcUaError {
    /// Connection-related errors.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Security configuration and handshake errors.
    #[error("{0}")]
    Security(#[from] SecurityError),

    /// Protocol read failures.
    #[error("{0}")]
    Session(#[from] SessionError),

    /// Precondition failures detected before any network call.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Export sink failures.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
}

impl OpcUaError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a connection error.
    #[inline]
    pub fn connection(error: ConnectionError) -> Self {
        Self::Connection(error)
    }

    /// Creates a security error.
    #[inline]
    pub fn security(error: SecurityError) -> Self {
        Self::Security(error)
    }

    /// Creates a session error.
    #[inline]
    pub fn session(error: SessionError) -> Self {
        Self::Session(error)
    }

    /// Creates a validation error.
    #[inline]
    pub fn validation(error: ValidationError) -> Self {
        Self::Validation(error)
    }

    /// Creates an export error.
    #[inline]
    pub fn export(error: ExportError) -> Self {
        Self::Export(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    // =========================================================================
    // Error Properties
    // =========================================================================

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(_) | Self::Security(_) => ErrorSeverity::Error,
            Self::Session(e) => e.severity(),
            Self::Validation(_) => ErrorSeverity::Warning,
            Self::Export(e) => e.severity(),
            Self::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Security(_) => "security",
            Self::Session(_) => "session",
            Self::Validation(_) => "validation",
            Self::Export(_) => "export",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Returns a unique error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Connection(e) => e.error_code(),
            Self::Security(e) => e.error_code(),
            Self::Session(e) => e.error_code(),
            Self::Validation(e) => e.error_code(),
            Self::Export(e) => e.error_code(),
            Self::Configuration(e) => e.error_code(),
        }
    }

    /// Returns recovery hints for this error.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Connection(e) => e.recovery_hints(),
            Self::Security(e) => e.recovery_hints(),
            Self::Session(e) => e.recovery_hints(),
            Self::Validation(e) => e.recovery_hints(),
            Self::Export(e) => e.recovery_hints(),
            Self::Configuration(e) => e.recovery_hints(),
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        let code = self.error_code();

        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                error_code = %code,
                category = self.category(),
                context = context,
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                error_code = %code,
                category = self.category(),
                context = context,
                "{self}"
            ),
            _ => tracing::debug!(
                error_code = %code,
                category = self.category(),
                context = context,
                "{self}"
            ),
        }
    }
}

// =============================================================================
// Status Code Hints
// =============================================================================

/// Operator hints keyed by protocol status name.
pub const STATUS_HINTS: &[(&str, &str)] = &[
    ("BadIdentityTokenRejected", "Check username/password and server user permissions"),
    ("BadUserAccessDenied", "User doesn't have permission to access this resource"),
    ("BadIdentityTokenInvalid", "Identity token is malformed or invalid"),
    ("BadCertificateUriInvalid", "Certificate Application URI doesn't match client configuration"),
    ("BadSecurityChecksFailed", "Server rejected the certificate - ensure it's in server's trust list"),
    ("BadCertificateInvalid", "Certificate is invalid, expired, or not trusted"),
    ("BadSecurityModeRejected", "Server doesn't support the requested security mode"),
    ("BadSessionIdInvalid", "Session expired or was closed by server"),
    ("BadSessionClosed", "Session was closed - reconnection required"),
    ("BadTimeout", "Connection timeout - check network connectivity and server status"),
    ("BadConnectionClosed", "Connection was closed unexpectedly"),
    ("BadTcpEndpointUrlInvalid", "Server URL format is invalid"),
    ("BadNodeIdUnknown", "Node does not exist in the server address space"),
    ("BadNodeIdInvalid", "Node ID format is invalid"),
    ("BadBrowseDirectionInvalid", "Browse direction is not supported"),
    ("BadUnexpectedError", "Server encountered an unexpected error - check server logs"),
    ("BadServerNotConnected", "Not connected to server"),
    ("BadServerHalted", "Server is halted or shutting down"),
    ("BadTooManyOperations", "Too many operations requested - reduce batch size"),
    ("BadNothingToDo", "No operations to perform"),
];

/// Returns the operator hint for a status name, if one is known.
pub fn status_hint(status_name: &str) -> Option<&'static str> {
    STATUS_HINTS
        .iter()
        .find(|(name, _)| *name == status_name)
        .map(|(_, hint)| *hint)
}

/// Formats a protocol failure as `"{description} | Hint: {hint}"`.
///
/// The hint suffix is omitted when the status is unknown.
pub fn describe_status(description: &str, status_name: Option<&str>) -> String {
    match status_name.and_then(status_hint) {
        Some(hint) => format!("{description} | Hint: {hint}"),
        None => description.to_string(),
    }
}

/// Returns the symbolic name for a protocol status code.
pub fn status_code_name(code: u32) -> &'static str {
    match code & 0xFFFF_0000 {
        0x0000_0000 => "Good",
        0x8001_0000 => "BadUnexpectedError",
        0x8002_0000 => "BadInternalError",
        0x8005_0000 => "BadCommunicationError",
        0x800A_0000 => "BadTimeout",
        0x800E_0000 => "BadServerHalted",
        0x800D_0000 => "BadServerNotConnected",
        0x800F_0000 => "BadNothingToDo",
        0x8010_0000 => "BadTooManyOperations",
        0x8013_0000 => "BadSecurityChecksFailed",
        0x8012_0000 => "BadCertificateInvalid",
        0x8017_0000 => "BadCertificateUriInvalid",
        0x801F_0000 => "BadUserAccessDenied",
        0x8020_0000 => "BadIdentityTokenInvalid",
        0x8021_0000 => "BadIdentityTokenRejected",
        0x8025_0000 => "BadSessionIdInvalid",
        0x8026_0000 => "BadSessionClosed",
        0x8033_0000 => "BadNodeIdInvalid",
        0x8034_0000 => "BadNodeIdUnknown",
        0x8035_0000 => "BadAttributeIdInvalid",
        0x803A_0000 => "BadNotReadable",
        0x804D_0000 => "BadBrowseDirectionInvalid",
        0x8054_0000 => "BadSecurityModeRejected",
        0x8083_0000 => "BadTcpEndpointUrlInvalid",
        0x80AE_0000 => "BadConnectionClosed",
        c if c & 0x8000_0000 != 0 => "Bad",
        _ => "Uncertain",
    }
}

// =============================================================================
// ConnectionError
// =============================================================================

fn rejected_message(message: &str, status: &Option<String>) -> String {
    describe_status(&format!("Connection failed: {message}"), status.as_deref())
}

/// Connection-related errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Endpoint discovery failed.
    #[error("Could not retrieve endpoints from '{endpoint}': {reason}")]
    EndpointNotFound {
        /// Target endpoint.
        endpoint: String,
        /// Reason reported by the transport.
        reason: String,
    },

    /// Server exposes no endpoint with the requested policy and mode.
    #[error("No endpoint on '{endpoint}' matches policy '{policy}' with mode '{mode}'")]
    NoSuitableEndpoint {
        /// Target endpoint.
        endpoint: String,
        /// Requested security policy.
        policy: String,
        /// Requested security mode.
        mode: String,
    },

    /// Session establishment was rejected.
    #[error("{}", rejected_message(.message, .status))]
    Rejected {
        /// Target endpoint.
        endpoint: String,
        /// Status name reported by the server, if any.
        status: Option<String>,
        /// Failure description.
        message: String,
    },

    /// The client could not be constructed from configuration.
    #[error("Failed to build client for '{endpoint}': {reason}")]
    ClientSetup {
        /// Target endpoint.
        endpoint: String,
        /// Reason.
        reason: String,
    },

    /// An operation was attempted without an open session.
    #[error("Not connected to OPC UA server")]
    NotConnected,
}

impl ConnectionError {
    /// Creates an endpoint discovery error.
    pub fn endpoint_not_found(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EndpointNotFound {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a no suitable endpoint error.
    pub fn no_suitable_endpoint(
        endpoint: impl Into<String>,
        policy: impl Into<String>,
        mode: impl Into<String>,
    ) -> Self {
        Self::NoSuitableEndpoint {
            endpoint: endpoint.into(),
            policy: policy.into(),
            mode: mode.into(),
        }
    }

    /// Creates a rejected connection error.
    pub fn rejected(
        endpoint: impl Into<String>,
        status: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a client setup error.
    pub fn client_setup(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ClientSetup {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::EndpointNotFound { .. } => ErrorCode::new(1, 1),
            Self::NoSuitableEndpoint { .. } => ErrorCode::new(1, 2),
            Self::Rejected { .. } => ErrorCode::new(1, 3),
            Self::ClientSetup { .. } => ErrorCode::new(1, 4),
            Self::NotConnected => ErrorCode::new(1, 5),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::EndpointNotFound { .. } => vec![
                "Verify the server URL and port",
                "Check that the server is running and reachable",
            ],
            Self::NoSuitableEndpoint { .. } => vec![
                "List the security policies the server offers",
                "Match --security and --mode to an offered endpoint",
            ],
            Self::Rejected { .. } => vec![
                "Check credentials and server user permissions",
                "Ensure the client certificate is trusted by the server",
            ],
            Self::ClientSetup { .. } => vec!["Check the PKI directory and application settings"],
            Self::NotConnected => vec!["Connect before browsing"],
        }
    }
}

// =============================================================================
// SecurityError
// =============================================================================

/// Security configuration errors.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Security policy is set but no mode was given.
    #[error("Security mode is required for policy '{policy}'. Use: Sign, SignAndEncrypt")]
    MissingMode {
        /// The configured policy.
        policy: String,
    },

    /// Certificate or key path missing for a secured policy.
    #[error(
        "Certificate (--cert) and private key (--key) are required for security policy '{policy}'"
    )]
    MissingCredentials {
        /// The configured policy.
        policy: String,
    },

    /// Certificate file does not exist.
    #[error("Certificate file not found: {}", .path.display())]
    CertificateNotFound {
        /// File path.
        path: PathBuf,
    },

    /// Private key file does not exist.
    #[error("Private key file not found: {}", .path.display())]
    PrivateKeyNotFound {
        /// File path.
        path: PathBuf,
    },
}

impl SecurityError {
    /// Creates a missing mode error.
    pub fn missing_mode(policy: impl Into<String>) -> Self {
        Self::MissingMode {
            policy: policy.into(),
        }
    }

    /// Creates a missing credentials error.
    pub fn missing_credentials(policy: impl Into<String>) -> Self {
        Self::MissingCredentials {
            policy: policy.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingMode { .. } => ErrorCode::new(3, 1),
            Self::MissingCredentials { .. } => ErrorCode::new(3, 2),
            Self::CertificateNotFound { .. } => ErrorCode::new(3, 3),
            Self::PrivateKeyNotFound { .. } => ErrorCode::new(3, 4),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::MissingMode { .. } => {
                vec!["Pass --mode Sign or --mode SignAndEncrypt with --security"]
            }
            Self::MissingCredentials { .. } => vec!["Pass both --cert and --key"],
            Self::CertificateNotFound { .. } | Self::PrivateKeyNotFound { .. } => {
                vec!["Check the file path", "Generate a client certificate first"]
            }
        }
    }
}

// =============================================================================
// SessionError
// =============================================================================

/// Coarse classification of a failed protocol read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    /// The node does not exist.
    NotFound,
    /// The user may not read the node or attribute.
    AccessDenied,
    /// The request timed out.
    Timeout,
    /// The node id or returned data is malformed.
    Malformed,
    /// Anything else.
    Unknown,
}

impl SessionErrorKind {
    /// Classifies a protocol status name.
    pub fn from_status_name(name: &str) -> Self {
        match name {
            "BadNodeIdUnknown" => Self::NotFound,
            "BadNodeIdInvalid" | "BadAttributeIdInvalid" => Self::Malformed,
            "BadUserAccessDenied" | "BadNotReadable" => Self::AccessDenied,
            "BadTimeout" => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    /// Returns the kind name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::AccessDenied => "AccessDenied",
            Self::Timeout => "Timeout",
            Self::Malformed => "Malformed",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed read against the connected session.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {detail}")]
pub struct SessionError {
    /// Failure classification.
    pub kind: SessionErrorKind,
    /// Node the read targeted, when known.
    pub node_id: Option<String>,
    /// Failure description.
    pub detail: String,
    /// Protocol status name, when the server reported one.
    pub status: Option<String>,
}

impl SessionError {
    /// Creates a session error of the given kind.
    pub fn new(kind: SessionErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            node_id: None,
            detail: detail.into(),
            status: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        Self::new(SessionErrorKind::NotFound, format!("Node '{node_id}' does not exist"))
            .with_node(node_id)
            .with_status("BadNodeIdUnknown")
    }

    /// Creates an access denied error.
    pub fn access_denied(node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        Self::new(SessionErrorKind::AccessDenied, format!("Access to '{node_id}' denied"))
            .with_node(node_id)
            .with_status("BadUserAccessDenied")
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::new(SessionErrorKind::Timeout, format!("Request timed out after {duration:?}"))
            .with_status("BadTimeout")
    }

    /// Creates a malformed error.
    pub fn malformed(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Malformed, reason).with_node(node_id)
    }

    /// Creates an error from a protocol status name.
    pub fn from_status(status_name: impl Into<String>, detail: impl Into<String>) -> Self {
        let status_name = status_name.into();
        Self::new(SessionErrorKind::from_status_name(&status_name), detail).with_status(status_name)
    }

    /// Attaches the node id.
    pub fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Attaches the protocol status name.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Returns the most specific reason available: the status name, else the kind.
    pub fn reason(&self) -> &str {
        self.status.as_deref().unwrap_or(self.kind.as_str())
    }

    /// Returns the severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self.kind {
            SessionErrorKind::NotFound | SessionErrorKind::AccessDenied => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self.kind {
            SessionErrorKind::NotFound => ErrorCode::new(2, 1),
            SessionErrorKind::AccessDenied => ErrorCode::new(2, 2),
            SessionErrorKind::Timeout => ErrorCode::new(2, 3),
            SessionErrorKind::Malformed => ErrorCode::new(2, 4),
            SessionErrorKind::Unknown => ErrorCode::new(2, 5),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        if let Some(hint) = self.status.as_deref().and_then(status_hint) {
            return vec![hint];
        }
        match self.kind {
            SessionErrorKind::NotFound => vec!["Browse a parent node to find valid ids"],
            SessionErrorKind::AccessDenied => vec!["Connect with a user that may read this node"],
            SessionErrorKind::Timeout => vec!["Check network connectivity and server load"],
            SessionErrorKind::Malformed => vec!["Check the node id syntax"],
            SessionErrorKind::Unknown => vec!["Check server logs"],
        }
    }
}

// =============================================================================
// ValidationError
// =============================================================================

/// The five accepted node-id forms, as shown to users.
pub const NODE_ID_FORMS: &str = "'i=<number>', 'ns=<index>;i=<number>', 'ns=<index>;s=<string>', \
'ns=<index>;g=<guid>', 'ns=<index>;b=<base64>'";

/// Precondition failures detected before traversal starts.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// The start node id matches none of the accepted forms.
    #[error(
        "Invalid Node ID format: '{node_id}'. Expected one of: {}{}",
        NODE_ID_FORMS,
        format_hint(.hint)
    )]
    InvalidNodeId {
        /// The rejected id.
        node_id: String,
        /// Targeted correction, when the mistake is recognisable.
        hint: Option<String>,
    },

    /// The namespace filter names an index the server does not expose.
    #[error("Namespace index {index} not found. Available namespaces: {}", format_indices(.available))]
    NamespaceNotFound {
        /// Requested index.
        index: u16,
        /// Indices present in the namespace table.
        available: Vec<u16>,
    },
}

fn format_hint(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!(". Hint: {h}"))
        .unwrap_or_default()
}

fn format_indices(indices: &[u16]) -> String {
    if indices.is_empty() {
        return "(none)".to_string();
    }
    indices
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    /// Creates an invalid node id error with a hint derived from common mistakes.
    pub fn invalid_node_id(node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        let hint = if !node_id.contains('=') {
            Some("Node ID must contain '='".to_string())
        } else if node_id.starts_with("s=") {
            Some(format!(
                "String identifiers need a namespace prefix, e.g. 'ns=2;{node_id}'"
            ))
        } else if node_id.starts_with("ns=") && !node_id.contains(';') {
            Some(
                "Namespace prefix is incomplete: need ';i=', ';s=', ';g=', or ';b=' after the index"
                    .to_string(),
            )
        } else {
            None
        };
        Self::InvalidNodeId { node_id, hint }
    }

    /// Creates a namespace not found error.
    pub fn namespace_not_found(index: u16, available: Vec<u16>) -> Self {
        Self::NamespaceNotFound { index, available }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidNodeId { .. } => ErrorCode::new(4, 1),
            Self::NamespaceNotFound { .. } => ErrorCode::new(4, 2),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidNodeId { .. } => vec!["Use i=84 to start from the root folder"],
            Self::NamespaceNotFound { .. } => {
                vec!["Run 'browse' to list the server's namespace table"]
            }
        }
    }
}

// =============================================================================
// ExportError
// =============================================================================

/// Export sink errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The result being exported reports a failed browse.
    #[error("Browse operation failed: {message}")]
    FailedResult {
        /// The browse error message.
        message: String,
    },

    /// The result being exported holds no nodes.
    #[error("No nodes to export - browse result is empty")]
    EmptyResult,

    /// Unknown format name.
    #[error("Unsupported export format '{format}'. Supported formats: {}", .supported.join(", "))]
    UnsupportedFormat {
        /// The requested format.
        format: String,
        /// Known format names.
        supported: Vec<&'static str>,
    },

    /// Output directory could not be created.
    #[error("Failed to create output directory {}: {source}", .path.display())]
    CreateDirectory {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Output file could not be written.
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The format encoder failed.
    #[error("{format} encoding failed: {message}")]
    Serialization {
        /// Format name.
        format: &'static str,
        /// Encoder message.
        message: String,
    },
}

impl ExportError {
    /// Creates a failed result error.
    pub fn failed_result(message: impl Into<String>) -> Self {
        Self::FailedResult {
            message: message.into(),
        }
    }

    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a serialization error.
    pub fn serialization(format: &'static str, message: impl Into<String>) -> Self {
        Self::Serialization {
            format,
            message: message.into(),
        }
    }

    /// Returns the severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::FailedResult { .. } | Self::EmptyResult => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::FailedResult { .. } => ErrorCode::new(5, 1),
            Self::EmptyResult => ErrorCode::new(5, 2),
            Self::UnsupportedFormat { .. } => ErrorCode::new(5, 3),
            Self::CreateDirectory { .. } => ErrorCode::new(5, 4),
            Self::Io { .. } => ErrorCode::new(5, 5),
            Self::Serialization { .. } => ErrorCode::new(5, 6),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::FailedResult { .. } => vec!["Fix the browse error before exporting"],
            Self::EmptyResult => vec![
                "Increase --depth",
                "Check the start node and namespace filters",
            ],
            Self::UnsupportedFormat { .. } => vec!["Use csv, json or xml"],
            Self::CreateDirectory { .. } | Self::Io { .. } => {
                vec!["Check write permissions and free disk space"]
            }
            Self::Serialization { .. } => vec!["Report this as a bug with the offending node"],
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Missing required field.
    #[error("Missing required configuration: {field}")]
    MissingField {
        /// The missing field.
        field: String,
    },

    /// Invalid endpoint URL.
    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint {
        /// The invalid URL.
        url: String,
        /// Reason.
        reason: String,
    },

    /// Invalid node ID.
    #[error("Invalid node ID '{node_id}': {reason}")]
    InvalidNodeId {
        /// The invalid node ID.
        node_id: String,
        /// Reason.
        reason: String,
    },

    /// Invalid timeout value.
    #[error("Invalid timeout: {duration:?} ({reason})")]
    InvalidTimeout {
        /// The invalid duration.
        duration: Duration,
        /// Reason.
        reason: String,
    },

    /// Invalid security mode name.
    #[error("Unknown security mode '{mode}'. Supported: Sign, SignAndEncrypt")]
    InvalidSecurityMode {
        /// The invalid mode.
        mode: String,
    },

    /// Invalid security policy name.
    #[error(
        "Unknown security policy '{policy}'. Supported: None, Basic256, Basic128Rsa15, \
Basic256Sha256, Aes128_Sha256_RsaOaep, Aes256_Sha256_RsaPss"
    )]
    InvalidSecurityPolicy {
        /// The invalid policy.
        policy: String,
    },
}

impl ConfigurationError {
    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid node ID error.
    pub fn invalid_node_id(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid timeout error.
    pub fn invalid_timeout(duration: Duration, reason: impl Into<String>) -> Self {
        Self::InvalidTimeout {
            duration,
            reason: reason.into(),
        }
    }

    /// Creates an invalid security mode error.
    pub fn invalid_security_mode(mode: impl Into<String>) -> Self {
        Self::InvalidSecurityMode { mode: mode.into() }
    }

    /// Creates an invalid security policy error.
    pub fn invalid_security_policy(policy: impl Into<String>) -> Self {
        Self::InvalidSecurityPolicy {
            policy: policy.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingField { .. } => ErrorCode::new(6, 1),
            Self::InvalidEndpoint { .. } => ErrorCode::new(6, 2),
            Self::InvalidNodeId { .. } => ErrorCode::new(6, 3),
            Self::InvalidTimeout { .. } => ErrorCode::new(6, 4),
            Self::InvalidSecurityMode { .. } => ErrorCode::new(6, 5),
            Self::InvalidSecurityPolicy { .. } => ErrorCode::new(6, 6),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::MissingField { .. } => vec!["Add the missing setting to the CLI or config file"],
            Self::InvalidEndpoint { .. } => vec!["Use the form opc.tcp://host:port"],
            Self::InvalidNodeId { .. } => vec!["Use i=, ns=N;i=, ns=N;s=, ns=N;g= or ns=N;b="],
            Self::InvalidTimeout { .. } => vec!["Use a positive duration such as '30s'"],
            Self::InvalidSecurityMode { .. } | Self::InvalidSecurityPolicy { .. } => {
                vec!["Run with --help to list accepted values"]
            }
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Structured error code.
///
/// Format: `UA-XXYY` where XX is the category and YY the specific error.
///
/// Categories:
/// - 1: Connection
/// - 2: Session
/// - 3: Security
/// - 4: Validation
/// - 5: Export
/// - 6: Configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category (1-6).
    pub category: u8,
    /// Specific error within category.
    pub code: u8,
}

impl ErrorCode {
    /// Creates a new error code.
    pub const fn new(category: u8, code: u8) -> Self {
        Self { category, code }
    }

    /// Returns the full error code as a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.category as u16) << 8) | (self.code as u16)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UA-{:02X}{:02X}", self.category, self.code)
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// A Result type with OpcUaError.
pub type OpcUaResult<T> = Result<T, OpcUaError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn test_invalid_node_id_missing_equals() {
        let err = ValidationError::invalid_node_id("foo");
        let msg = err.to_string();
        assert!(msg.contains("must contain '='"));
        assert!(msg.contains("ns=<index>;g=<guid>"));
    }

    #[test]
    fn test_invalid_node_id_bare_string() {
        let msg = ValidationError::invalid_node_id("s=Motor").to_string();
        assert!(msg.contains("ns=2;s=Motor"));
    }

    #[test]
    fn test_invalid_node_id_incomplete_namespace() {
        let msg = ValidationError::invalid_node_id("ns=2").to_string();
        assert!(msg.contains("need ';i=', ';s=', ';g=', or ';b='"));
    }

    #[test]
    fn test_invalid_node_id_without_hint() {
        match ValidationError::invalid_node_id("ns=;i=1") {
            ValidationError::InvalidNodeId { hint, .. } => assert!(hint.is_none()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_namespace_not_found_lists_available() {
        let msg = ValidationError::namespace_not_found(7, vec![0, 1, 2]).to_string();
        assert_eq!(msg, "Namespace index 7 not found. Available namespaces: 0, 1, 2");
    }

    // =========================================================================
    // Session
    // =========================================================================

    #[test]
    fn test_session_kind_from_status() {
        assert_eq!(
            SessionErrorKind::from_status_name("BadNodeIdUnknown"),
            SessionErrorKind::NotFound
        );
        assert_eq!(
            SessionErrorKind::from_status_name("BadUserAccessDenied"),
            SessionErrorKind::AccessDenied
        );
        assert_eq!(SessionErrorKind::from_status_name("BadTimeout"), SessionErrorKind::Timeout);
        assert_eq!(
            SessionErrorKind::from_status_name("BadNodeIdInvalid"),
            SessionErrorKind::Malformed
        );
        assert_eq!(SessionErrorKind::from_status_name("BadWhatever"), SessionErrorKind::Unknown);
    }

    #[test]
    fn test_session_error_reason_prefers_status() {
        let err = SessionError::not_found("ns=2;s=Missing");
        assert_eq!(err.reason(), "BadNodeIdUnknown");
        assert_eq!(err.node_id.as_deref(), Some("ns=2;s=Missing"));

        let err = SessionError::malformed("ns=2;b=!!", "invalid base64");
        assert_eq!(err.reason(), "Malformed");
    }

    #[test]
    fn test_session_error_hint_from_status() {
        let err = SessionError::access_denied("i=2253");
        assert_eq!(
            err.recovery_hints(),
            vec!["User doesn't have permission to access this resource"]
        );
    }

    // =========================================================================
    // Status hints
    // =========================================================================

    #[test]
    fn test_describe_status() {
        assert_eq!(
            describe_status("BadTimeout (0x800A0000)", Some("BadTimeout")),
            "BadTimeout (0x800A0000) | Hint: Connection timeout - check network connectivity and server status"
        );
        assert_eq!(describe_status("boom", Some("BadSomethingElse")), "boom");
        assert_eq!(describe_status("boom", None), "boom");
    }

    #[test]
    fn test_status_code_name() {
        assert_eq!(status_code_name(0), "Good");
        assert_eq!(status_code_name(0x8034_0000), "BadNodeIdUnknown");
        assert_eq!(status_code_name(0x801F_0000), "BadUserAccessDenied");
        assert_eq!(status_code_name(0x80FF_0000), "Bad");
    }

    #[test]
    fn test_rejected_connection_includes_hint() {
        let err = ConnectionError::rejected(
            "opc.tcp://localhost:4840",
            Some("BadIdentityTokenRejected".to_string()),
            "BadIdentityTokenRejected",
        );
        assert!(err
            .to_string()
            .ends_with("| Hint: Check username/password and server user permissions"));
    }

    // =========================================================================
    // Export
    // =========================================================================

    #[test]
    fn test_export_error_messages() {
        assert_eq!(
            ExportError::failed_result("boom").to_string(),
            "Browse operation failed: boom"
        );
        assert_eq!(
            ExportError::EmptyResult.to_string(),
            "No nodes to export - browse result is empty"
        );
        let err = ExportError::UnsupportedFormat {
            format: "yaml".to_string(),
            supported: vec!["csv", "json", "xml"],
        };
        assert_eq!(
            err.to_string(),
            "Unsupported export format 'yaml'. Supported formats: csv, json, xml"
        );
    }

    // =========================================================================
    // Codes and severity
    // =========================================================================

    #[test]
    fn test_error_code_display() {
        let code = ErrorCode::new(4, 1);
        assert_eq!(code.to_string(), "UA-0401");
        assert_eq!(code.as_u16(), 0x0401);
    }

    #[test]
    fn test_error_category_and_severity() {
        let err = OpcUaError::from(ExportError::EmptyResult);
        assert_eq!(err.category(), "export");
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.tracing_level(), Level::WARN);

        let err = OpcUaError::from(ConfigurationError::missing_field("endpoint"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(!err.recovery_hints().is_empty());
    }
}
