// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session facade over a connected OPC UA server.
//!
//! The traversal engine only talks to a [`BrowseSession`], so it can run
//! against a live server ([`OpcUaSession`], feature `real-transport`) or the
//! in-memory [`MemorySession`] used by tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              browse / export                 │
//! └──────────────────────┬───────────────────────┘
//!                        │ with_session()
//! ┌──────────────────────▼───────────────────────┐
//! │          BrowseSession (trait)               │
//! │  resolve · node_class · names · children     │
//! │  data_type · value · read_attribute          │
//! └──────────┬───────────────────────┬───────────┘
//!            │                       │
//!   ┌────────▼────────┐     ┌────────▼────────┐
//!   │  OpcUaSession   │     │  MemorySession  │
//!   │  (opcua crate)  │     │   (in-memory)   │
//!   └─────────────────┘     └─────────────────┘
//! ```

pub mod memory;
#[cfg(feature = "real-transport")]
pub mod real;

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::{OpcUaResult, SessionError};
use crate::types::{AttributeId, NodeClass, NodeId, OpcUaDataType, OpcUaValue};

pub use memory::{FailPoint, MemorySession, MemorySessionBuilder};
#[cfg(feature = "real-transport")]
pub use real::OpcUaSession;

/// Result of a single protocol read.
pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// NodeRef
// =============================================================================

/// A handle to a node that the session has resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    /// The node's identifier.
    pub node_id: NodeId,
}

impl NodeRef {
    /// Creates a handle for a node ID.
    #[inline]
    pub fn new(node_id: NodeId) -> Self {
        Self { node_id }
    }

    /// Returns the node's textual id.
    pub fn id_string(&self) -> String {
        self.node_id.to_opc_string()
    }
}

impl From<NodeId> for NodeRef {
    fn from(node_id: NodeId) -> Self {
        Self::new(node_id)
    }
}

// =============================================================================
// TypedValue
// =============================================================================

/// A variable's value plus the built-in type the server encoded it with.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    /// The decoded value.
    pub value: OpcUaValue,

    /// Encoding type reported alongside the value, if any.
    pub type_hint: Option<OpcUaDataType>,
}

impl TypedValue {
    /// Wraps a value, taking the hint from its own variant.
    pub fn new(value: OpcUaValue) -> Self {
        let type_hint = value.data_type();
        Self { value, type_hint }
    }
}

// =============================================================================
// BrowseSession Trait
// =============================================================================

/// The read-only protocol operations the browser needs.
///
/// Every read is independent; implementations must not abort a traversal on
/// a single failure, they just report it and the caller decides.
#[async_trait]
pub trait BrowseSession: Send + Sync {
    /// Opens the connection and session.
    async fn connect(&mut self) -> OpcUaResult<()>;

    /// Closes the session.
    async fn disconnect(&mut self) -> OpcUaResult<()>;

    /// Returns the endpoint URL this session targets.
    fn endpoint(&self) -> &str;

    /// Returns the server's namespace URIs, index-ordered.
    async fn namespace_table(&self) -> SessionResult<Vec<String>>;

    /// Resolves a textual node id to a node that exists on the server.
    async fn resolve(&self, node_id: &str) -> SessionResult<NodeRef>;

    /// Reads the node class.
    async fn node_class(&self, node: &NodeRef) -> SessionResult<NodeClass>;

    /// Reads the browse name (name part only).
    async fn browse_name(&self, node: &NodeRef) -> SessionResult<String>;

    /// Reads the display name (text part only).
    async fn display_name(&self, node: &NodeRef) -> SessionResult<String>;

    /// Lists hierarchical forward children, in server order.
    async fn children(&self, node: &NodeRef) -> SessionResult<Vec<NodeRef>>;

    /// Reads the DataType attribute of a variable.
    async fn data_type(&self, node: &NodeRef) -> SessionResult<NodeId>;

    /// Reads the Value attribute of a variable.
    async fn value(&self, node: &NodeRef) -> SessionResult<TypedValue>;

    /// Reads any other attribute.
    async fn read_attribute(
        &self,
        node: &NodeRef,
        attribute: AttributeId,
    ) -> SessionResult<OpcUaValue>;
}

// =============================================================================
// Scoped Acquisition
// =============================================================================

/// A future borrowed from the session for the duration of a scoped body.
pub type ScopedFuture<'s, T> = Pin<Box<dyn Future<Output = OpcUaResult<T>> + Send + 's>>;

/// Connects, runs `body`, then disconnects whatever `body` returned.
///
/// A failed disconnect is logged and does not replace the body's result.
///
/// # Examples
///
/// ```
/// use uabrowse_opcua::session::{with_session, BrowseSession, MemorySession};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut session = MemorySession::builder().object("i=84", "Root", None).build();
/// let table = with_session(&mut session, |s| {
///     Box::pin(async move { Ok(s.namespace_table().await?) })
/// })
/// .await
/// .unwrap();
/// assert_eq!(table.len(), 1);
/// # });
/// ```
pub async fn with_session<S, T, F>(session: &mut S, body: F) -> OpcUaResult<T>
where
    S: BrowseSession + ?Sized,
    F: for<'s> FnOnce(&'s S) -> ScopedFuture<'s, T>,
{
    session.connect().await?;
    tracing::debug!(endpoint = session.endpoint(), "Session opened");

    let result = body(&*session).await;

    close(session).await;
    result
}

/// Like [`with_session`], but abandons the work once `cancel` resolves.
///
/// The session is disconnected on every path, including cancellation during
/// connect. Returns `Ok(None)` when cancelled.
///
/// # Examples
///
/// ```
/// use uabrowse_opcua::session::{with_session_until, BrowseSession, MemorySession};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let mut session = MemorySession::builder().object("i=84", "Root", None).build();
/// let outcome = with_session_until(&mut session, std::future::ready(()), |s| {
///     Box::pin(async move { Ok(s.namespace_table().await?) })
/// })
/// .await
/// .unwrap();
/// assert!(outcome.is_none());
/// assert!(!session.is_connected());
/// # });
/// ```
pub async fn with_session_until<S, T, F, C>(
    session: &mut S,
    cancel: C,
    body: F,
) -> OpcUaResult<Option<T>>
where
    S: BrowseSession + ?Sized,
    F: for<'s> FnOnce(&'s S) -> ScopedFuture<'s, T>,
    C: Future<Output = ()>,
{
    tokio::pin!(cancel);

    let connected = tokio::select! {
        biased;
        () = &mut cancel => false,
        result = session.connect() => {
            result?;
            true
        }
    };
    if !connected {
        tracing::warn!(endpoint = session.endpoint(), "Cancelled while connecting");
        close(session).await;
        return Ok(None);
    }
    tracing::debug!(endpoint = session.endpoint(), "Session opened");

    let result = tokio::select! {
        biased;
        () = &mut cancel => {
            tracing::warn!(endpoint = session.endpoint(), "Session work cancelled");
            Ok(None)
        }
        result = body(&*session) => result.map(Some),
    };

    close(session).await;
    result
}

async fn close<S: BrowseSession + ?Sized>(session: &mut S) {
    match session.disconnect().await {
        Ok(()) => tracing::debug!(endpoint = session.endpoint(), "Session closed"),
        Err(e) => tracing::warn!(endpoint = session.endpoint(), "Disconnect warning: {}", e),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExportError, OpcUaError};

    fn sample() -> MemorySession {
        MemorySession::builder()
            .object("i=84", "Root", None)
            .build()
    }

    #[tokio::test]
    async fn test_with_session_connects_and_disconnects() {
        let mut session = sample();
        let name = with_session(&mut session, |s| {
            Box::pin(async move {
                assert!(s.is_connected());
                let root = s.resolve("i=84").await?;
                Ok(s.browse_name(&root).await?)
            })
        })
        .await
        .unwrap();

        assert_eq!(name, "Root");
        assert!(!session.is_connected());
        assert_eq!(session.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_with_session_disconnects_after_body_error() {
        let mut session = sample();
        let result: OpcUaResult<()> = with_session(&mut session, |_| {
            Box::pin(async move { Err(OpcUaError::from(ExportError::EmptyResult)) })
        })
        .await;

        assert!(matches!(result, Err(OpcUaError::Export(ExportError::EmptyResult))));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_with_session_keeps_body_result_on_disconnect_failure() {
        let mut session = MemorySession::builder()
            .object("i=84", "Root", None)
            .fail_disconnect()
            .build();
        let value = with_session(&mut session, |_| Box::pin(async move { Ok(7) }))
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_with_session_connect_failure_skips_body() {
        let mut session = MemorySession::builder().fail_connect().build();
        let ran = std::sync::atomic::AtomicBool::new(false);
        let ran_ref = &ran;
        let result = with_session(&mut session, move |_| {
            ran_ref.store(true, std::sync::atomic::Ordering::SeqCst);
            Box::pin(async move { Ok(()) })
        })
        .await;
        assert!(matches!(result, Err(OpcUaError::Connection(_))));
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_before_connect_leaves_session_closed() {
        let mut session = sample();
        let outcome = with_session_until(&mut session, std::future::ready(()), |_| {
            Box::pin(async move { Ok(1) })
        })
        .await
        .unwrap();

        assert_eq!(outcome, None);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_cancel_during_body_disconnects() {
        let mut session = sample();
        let cancel = tokio::time::sleep(std::time::Duration::from_millis(10));
        let outcome: Option<()> = with_session_until(&mut session, cancel, |s| {
            Box::pin(async move {
                assert!(s.is_connected());
                std::future::pending::<()>().await;
                Ok(())
            })
        })
        .await
        .unwrap();

        assert_eq!(outcome, None);
        assert!(!session.is_connected());
        assert_eq!(session.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_uncancelled_body_returns_value() {
        let mut session = sample();
        let outcome = with_session_until(&mut session, std::future::pending(), |s| {
            Box::pin(async move { Ok(s.namespace_table().await?.len()) })
        })
        .await
        .unwrap();

        assert_eq!(outcome, Some(1));
        assert!(!session.is_connected());
    }

    #[test]
    fn test_typed_value_hint_from_variant() {
        let typed = TypedValue::new(OpcUaValue::Double(1.5));
        assert_eq!(typed.type_hint, Some(OpcUaDataType::Double));
        assert_eq!(TypedValue::new(OpcUaValue::Null).type_hint, None);
    }
}
