// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA address-space browsing and export.
//!
//! This crate walks a server's node hierarchy from a start node, collects
//! identity, type, value and optional extended attributes for each node, and
//! writes the result as CSV, JSON or XML.
//!
//! # Modules
//!
//! - [`session`]: the [`BrowseSession`] facade plus live and in-memory sessions
//! - [`browse`]: the depth-bounded traversal engine
//! - [`model`]: [`DiscoveredNode`], [`BrowseResult`], [`BrowseOptions`]
//! - [`export`]: CSV/JSON/XML sinks behind [`Exporter`]
//! - [`tree`]: console tree rendering
//!
//! # Error Handling
//!
//! ```text
//! OpcUaError
//! ├── Connection    - Endpoint discovery and session activation
//! ├── Security      - Security mode, credentials, certificate files
//! ├── Session       - Per-read protocol failures
//! ├── Validation    - Node id format, namespace filter
//! ├── Export        - Result validation and file output
//! └── Configuration - Invalid settings
//! ```
//!
//! # Example
//!
//! ```
//! use uabrowse_opcua::{browse, BrowseOptions, Exporter, MemorySession, OpcUaValue};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let session = MemorySession::builder()
//!     .object("i=85", "Objects", None)
//!     .variable("ns=1;s=Temp", "Temp", Some("i=85"), "i=11", OpcUaValue::Double(21.5))
//!     .namespace("urn:demo")
//!     .build();
//!
//! let result = browse(&session, "i=85", &BrowseOptions::default()).await;
//! assert!(result.success);
//! assert_eq!(result.total_nodes, 2);
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = Exporter::from_name("json", false)
//!     .unwrap()
//!     .export(&result, Some(&dir.path().join("out.json")))
//!     .unwrap();
//! assert!(path.exists());
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod browse;
pub mod error;
pub mod export;
pub mod model;
pub mod session;
pub mod tree;
pub mod types;

pub use browse::{Browser, browse, data_type_name, is_namespace_node, validate_node_id};

pub use error::{
    ConfigurationError, ConnectionError, ErrorCode, ErrorSeverity, ExportError, OpcUaError,
    OpcUaResult, SecurityError, SessionError, SessionErrorKind, ValidationError,
};

pub use export::{ExportFormat, ExportStrategy, Exporter};

pub use model::{BrowseOptions, BrowseResult, DiscoveredNode, ExtendedAttributes, NodeAttributes};

pub use session::{
    BrowseSession, MemorySession, MemorySessionBuilder, NodeRef, TypedValue, with_session,
    with_session_until,
};

#[cfg(feature = "real-transport")]
pub use session::OpcUaSession;

pub use tree::render_tree;

pub use types::{
    AttributeId, NodeClass, NodeId, NodeIdentifier, OpcUaConfig, OpcUaConfigBuilder,
    OpcUaDataType, OpcUaValue, SecurityMode, SecurityPolicy, UserTokenType,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
