// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Recursive address-space traversal.
//!
//! [`Browser`] walks the hierarchy below a start node depth-first, in the
//! order the server lists children, and records one [`DiscoveredNode`] per
//! visited node.
//!
//! # Flow
//!
//! ```text
//! validate id ─► namespace table ─► validate filter ─► resolve start
//!                                                          │
//!        ┌─────────────────────────────────────────────────┘
//!        ▼
//!   DFS visit (stack) ─► post-pass filter ─► full paths
//! ```
//!
//! Precondition failures end the browse with `success = false`. Failures
//! while visiting a node only drop that node (and its subtree); they are
//! logged at debug level and the walk continues.
//!
//! The depth bound is the only guard against cyclic references; a server
//! that lists a node as its own descendant yields repeated entries up to
//! `max_depth`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::error::{SessionError, ValidationError};
use crate::model::{BrowseOptions, BrowseResult, DiscoveredNode, ExtendedAttributes, NodeAttributes};
use crate::session::{BrowseSession, NodeRef, TypedValue};
use crate::types::{AttributeId, NodeClass, NodeId, OpcUaDataType, OpcUaValue};

// =============================================================================
// Constants
// =============================================================================

/// Browse-name fragments that mark server/namespace metadata.
pub const NAMESPACE_KEYWORDS: [&str; 6] = [
    "Namespace",
    "NamespaceArray",
    "Server",
    "ServerArray",
    "ServerCapabilities",
    "ServerDiagnostics",
];

/// Standard-namespace numeric ids of server/namespace metadata nodes:
/// Server, Server_NamespaceArray, Server_ServerArray,
/// Server_ServerCapabilities, Server_ServerDiagnostics.
pub const NAMESPACE_NODE_IDS: [u32; 5] = [2253, 2255, 2254, 2268, 2274];

/// A progress line is logged each time this many nodes have been found.
pub const PROGRESS_INTERVAL: usize = 10;

static NODE_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^i=\d+$",
        r"^ns=\d+;i=\d+$",
        r"^ns=\d+;s=.+$",
        r"^ns=\d+;g=[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
        r"^ns=\d+;b=.+$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

// =============================================================================
// Helpers
// =============================================================================

/// Checks a textual node id against the five accepted forms.
///
/// # Examples
///
/// ```
/// use uabrowse_opcua::browse::validate_node_id;
///
/// assert!(validate_node_id("i=84").is_ok());
/// assert!(validate_node_id("ns=2;s=Boiler").is_ok());
/// assert!(validate_node_id("s=Boiler").is_err());
/// ```
pub fn validate_node_id(node_id: &str) -> Result<(), ValidationError> {
    if NODE_ID_PATTERNS.iter().any(|re| re.is_match(node_id)) {
        Ok(())
    } else {
        Err(ValidationError::invalid_node_id(node_id))
    }
}

/// Returns `true` if a node belongs to server/namespace metadata.
pub fn is_namespace_node(node_id: &NodeId, browse_name: &str) -> bool {
    if NAMESPACE_KEYWORDS.iter().any(|kw| browse_name.contains(kw)) {
        return true;
    }
    node_id.is_standard()
        && node_id
            .as_numeric()
            .is_some_and(|id| NAMESPACE_NODE_IDS.contains(&id))
}

/// Maps a DataType node id to a readable name.
///
/// Built-in types of the standard namespace use their names; anything else
/// keeps its id with `i=` replaced by `Type` (`i=999` → `Type999`).
pub fn data_type_name(data_type: &NodeId) -> String {
    if data_type.is_standard() {
        if let Some(ty) = data_type.as_numeric().and_then(OpcUaDataType::from_type_id) {
            return ty.name().to_string();
        }
    }
    data_type.to_opc_string().replace("i=", "Type")
}

// =============================================================================
// Browser
// =============================================================================

struct Pending {
    node: NodeRef,
    parent_id: Option<String>,
    depth: u32,
}

/// Depth-first address-space walker over a [`BrowseSession`].
pub struct Browser<'a, S: BrowseSession + ?Sized> {
    session: &'a S,
    options: BrowseOptions,
}

impl<'a, S: BrowseSession + ?Sized> Browser<'a, S> {
    /// Creates a browser over a connected session.
    pub fn new(session: &'a S, options: BrowseOptions) -> Self {
        Self { session, options }
    }

    /// Browses from `start_id`.
    ///
    /// Never returns an error: failures are reported through
    /// [`BrowseResult::success`] and [`BrowseResult::error_message`].
    pub async fn browse(&self, start_id: &str) -> BrowseResult {
        let mut result = BrowseResult::new();

        if let Err(e) = validate_node_id(start_id) {
            error!(node_id = start_id, "{}", e);
            result.fail(e.to_string());
            return result;
        }

        info!(
            node_id = start_id,
            max_depth = self.options.max_depth,
            "Starting browse"
        );

        result.namespaces = self.namespace_map().await;

        if let Some(index) = self.options.namespace_filter {
            if !result.namespaces.contains_key(&index) {
                let available = result.namespaces.keys().copied().collect();
                let e = ValidationError::namespace_not_found(index, available);
                error!("{}", e);
                result.fail(e.to_string());
                return result;
            }
        }

        let start = match self.session.resolve(start_id).await {
            Ok(node) => node,
            Err(e) => {
                let message = format!("Node '{}' not found or not accessible: {}", start_id, e.reason());
                error!(node_id = start_id, detail = %e.detail, "{}", message);
                result.fail(message);
                return result;
            }
        };

        self.walk(start, &mut result).await;

        if self.options.namespaces_only {
            result.retain_namespace_nodes();
            debug!(total_nodes = result.total_nodes, "Kept namespace nodes only");
        } else if let Some(index) = self.options.namespace_filter {
            result.retain_namespace(index);
            debug!(total_nodes = result.total_nodes, namespace = index, "Applied namespace filter");
        }

        if result.total_nodes > 0 {
            result.compute_full_paths();
            info!(
                total_nodes = result.total_nodes,
                max_depth_reached = result.max_depth_reached,
                "Browse completed"
            );
        } else {
            warn!(node_id = start_id, "No nodes found - the node has no children or access is restricted");
        }

        result
    }

    async fn namespace_map(&self) -> BTreeMap<u16, String> {
        match self.session.namespace_table().await {
            Ok(uris) => uris
                .into_iter()
                .enumerate()
                .filter_map(|(i, uri)| u16::try_from(i).ok().map(|i| (i, uri)))
                .collect(),
            Err(e) => {
                warn!("Could not retrieve namespaces: {}", e);
                BTreeMap::new()
            }
        }
    }

    async fn walk(&self, start: NodeRef, result: &mut BrowseResult) {
        if self.options.max_depth < 0 {
            return;
        }
        let max_depth = self.options.max_depth.unsigned_abs();

        let mut stack = vec![Pending {
            node: start,
            parent_id: None,
            depth: 0,
        }];

        while let Some(Pending {
            node,
            parent_id,
            depth,
        }) = stack.pop()
        {
            let discovered = match self.visit(&node, parent_id, depth).await {
                Ok(discovered) => discovered,
                Err(e) => {
                    debug!(node_id = %node.node_id, depth, "Error browsing node: {}", e);
                    continue;
                }
            };
            let node_id = discovered.node_id.clone();
            result.add_node(discovered);

            if result.total_nodes % PROGRESS_INTERVAL == 0 {
                info!(total_nodes = result.total_nodes, "Discovered {} nodes so far...", result.total_nodes);
            }

            if depth < max_depth {
                match self.session.children(&node).await {
                    Ok(children) => {
                        stack.extend(children.into_iter().rev().map(|child| Pending {
                            node: child,
                            parent_id: Some(node_id.clone()),
                            depth: depth + 1,
                        }));
                    }
                    Err(e) => debug!(node_id = %node_id, "Could not get children: {}", e),
                }
            }
        }
    }

    async fn visit(
        &self,
        node: &NodeRef,
        parent_id: Option<String>,
        depth: u32,
    ) -> Result<DiscoveredNode, SessionError> {
        let browse_name = self.session.browse_name(node).await?;
        let display_name = self.session.display_name(node).await?;
        let class = self.session.node_class(node).await?;

        let mut discovered = DiscoveredNode::new(node.id_string(), browse_name, display_name, class)
            .with_parent(parent_id, depth)
            .with_namespace(node.node_id.namespace_index);
        discovered.is_namespace_node = is_namespace_node(&node.node_id, &discovered.browse_name);

        if class == NodeClass::Variable {
            self.read_variable(node, &mut discovered).await;
        }

        if self.options.full_attributes {
            discovered.attributes = NodeAttributes::Extended(self.read_extended(node, class).await);
        }

        Ok(discovered)
    }

    async fn read_variable(&self, node: &NodeRef, discovered: &mut DiscoveredNode) {
        let data_type = match self.session.data_type(node).await {
            Ok(dt) => Some(dt),
            Err(e) => {
                debug!(node_id = %discovered.node_id, "Could not read data type: {}", e);
                None
            }
        };

        let typed: Option<TypedValue> = if data_type.is_some() || self.options.include_values {
            match self.session.value(node).await {
                Ok(typed) => Some(typed),
                Err(e) => {
                    debug!(node_id = %discovered.node_id, "Could not read value: {}", e);
                    None
                }
            }
        } else {
            None
        };

        if let Some(dt) = &data_type {
            let hinted = typed.as_ref().and_then(|t| t.type_hint);
            discovered.data_type = Some(match hinted {
                Some(ty) => ty.name().to_string(),
                None => data_type_name(dt),
            });
        }

        if self.options.include_values {
            discovered.value = typed.map(|t| t.value).filter(|v| !v.is_null());
        }
    }

    async fn read_extended(&self, node: &NodeRef, class: NodeClass) -> ExtendedAttributes {
        let mut ext = ExtendedAttributes {
            description: self
                .attribute(node, AttributeId::Description)
                .await
                .and_then(|v| v.as_text().map(str::to_string)),
            write_mask: self
                .attribute(node, AttributeId::WriteMask)
                .await
                .and_then(|v| v.as_u32()),
            user_write_mask: self
                .attribute(node, AttributeId::UserWriteMask)
                .await
                .and_then(|v| v.as_u32()),
            ..ExtendedAttributes::default()
        };

        match class {
            NodeClass::Variable => {
                ext.access_level = self
                    .attribute(node, AttributeId::AccessLevel)
                    .await
                    .and_then(|v| v.as_u8());
                ext.user_access_level = self
                    .attribute(node, AttributeId::UserAccessLevel)
                    .await
                    .and_then(|v| v.as_u8());
                ext.minimum_sampling_interval = self
                    .attribute(node, AttributeId::MinimumSamplingInterval)
                    .await
                    .and_then(|v| v.as_f64());
                ext.historizing = self
                    .attribute(node, AttributeId::Historizing)
                    .await
                    .and_then(|v| v.as_bool());
            }
            NodeClass::Object => {
                ext.event_notifier = self
                    .attribute(node, AttributeId::EventNotifier)
                    .await
                    .and_then(|v| v.as_u8());
            }
            NodeClass::Method => {
                ext.executable = self
                    .attribute(node, AttributeId::Executable)
                    .await
                    .and_then(|v| v.as_bool());
                ext.user_executable = self
                    .attribute(node, AttributeId::UserExecutable)
                    .await
                    .and_then(|v| v.as_bool());
            }
            _ => {}
        }

        ext
    }

    async fn attribute(&self, node: &NodeRef, attribute: AttributeId) -> Option<OpcUaValue> {
        match self.session.read_attribute(node, attribute).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(node_id = %node.node_id, attribute = %attribute, "Could not read attribute: {}", e);
                None
            }
        }
    }
}

/// Browses from `start_id` with the given options.
pub async fn browse<S: BrowseSession + ?Sized>(
    session: &S,
    start_id: &str,
    options: &BrowseOptions,
) -> BrowseResult {
    Browser::new(session, options.clone()).browse(start_id).await
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::memory::FailPoint;
    use crate::session::MemorySession;

    fn plant() -> MemorySession {
        MemorySession::builder()
            .namespace("urn:demo:plant")
            .namespace("urn:demo:vendor")
            .object("i=84", "Root", None)
            .object("i=85", "Objects", Some("i=84"))
            .object("i=2253", "Server", Some("i=85"))
            .variable(
                "i=2255",
                "NamespaceArray",
                Some("i=2253"),
                "i=12",
                OpcUaValue::Array(vec![OpcUaValue::String("http://opcfoundation.org/UA/".into())]),
            )
            .object("ns=1;s=Boiler", "Boiler", Some("i=85"))
            .variable(
                "ns=1;s=Boiler.Temp",
                "Temp",
                Some("ns=1;s=Boiler"),
                "i=11",
                OpcUaValue::Double(71.5),
            )
            .variable(
                "ns=1;s=Boiler.Mode",
                "Mode",
                Some("ns=1;s=Boiler"),
                "ns=2;i=3002",
                OpcUaValue::Null,
            )
            .method("ns=1;s=Boiler.Reset", "Reset", Some("ns=1;s=Boiler"))
            .build()
    }

    fn ids(result: &BrowseResult) -> Vec<&str> {
        result.nodes.iter().map(|n| n.node_id.as_str()).collect()
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn test_validate_node_id_accepts_all_forms() {
        for id in [
            "i=84",
            "ns=2;i=1001",
            "ns=2;s=Line 1/Motor",
            "ns=3;g=550e8400-e29b-41d4-a716-446655440000",
            "ns=4;b=SGVsbG8=",
        ] {
            assert!(validate_node_id(id).is_ok(), "{id}");
        }
    }

    #[test]
    fn test_validate_node_id_rejects() {
        for id in [
            "",
            "84",
            "invalid",
            "s=Motor",
            "ns=2",
            "ns=;i=1",
            "ns=2;x=1",
            "ns=2;g=not-a-guid",
            "i=abc",
        ] {
            assert!(validate_node_id(id).is_err(), "{id}");
        }
    }

    #[tokio::test]
    async fn test_id_without_equals_gets_hint() {
        let session = plant();
        let result = browse(&session, "foo", &BrowseOptions::default()).await;
        assert!(!result.success);
        let message = result.error_message.unwrap();
        assert!(message.starts_with("Invalid Node ID format: 'foo'"), "{message}");
        assert!(message.contains("must contain '='"), "{message}");
        assert!(result.nodes.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_start_id_fails_without_reads() {
        let session = plant();
        let result = browse(&session, "s=Boiler", &BrowseOptions::default()).await;
        assert!(!result.success);
        let message = result.error_message.unwrap();
        assert!(message.starts_with("Invalid Node ID format: 's=Boiler'"));
        assert!(message.contains("ns=2;s=Boiler"));
        assert!(result.nodes.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_namespace_filter_fails() {
        let session = plant();
        let options = BrowseOptions::default().with_namespace_filter(Some(9));
        let result = browse(&session, "i=84", &options).await;
        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Namespace index 9 not found. Available namespaces: 0, 1, 2")
        );
    }

    #[tokio::test]
    async fn test_missing_start_node_fails() {
        let session = plant();
        let result = browse(&session, "ns=1;s=Nope", &BrowseOptions::default()).await;
        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Node 'ns=1;s=Nope' not found or not accessible: BadNodeIdUnknown")
        );
    }

    #[tokio::test]
    async fn test_malformed_start_node_reports_kind() {
        let session = plant();
        let result = browse(&session, "ns=70000;i=1", &BrowseOptions::default()).await;
        assert!(!result.success);
        assert!(result.error_message.unwrap().ends_with(": Malformed"));
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    #[tokio::test]
    async fn test_preorder_in_session_order() {
        let session = plant();
        let result = browse(&session, "i=84", &BrowseOptions::default().with_max_depth(10)).await;
        assert!(result.success);
        assert_eq!(
            ids(&result),
            vec![
                "i=84",
                "i=85",
                "i=2253",
                "i=2255",
                "ns=1;s=Boiler",
                "ns=1;s=Boiler.Temp",
                "ns=1;s=Boiler.Mode",
                "ns=1;s=Boiler.Reset",
            ]
        );
        assert_eq!(result.total_nodes, 8);
        assert_eq!(result.max_depth_reached, 3);
        assert_eq!(result.namespaces.len(), 3);
    }

    #[tokio::test]
    async fn test_depth_bounds() {
        let session = plant();
        let result = browse(&session, "i=84", &BrowseOptions::default().with_max_depth(-1)).await;
        assert!(result.success);
        assert_eq!(result.total_nodes, 0);

        let result = browse(&session, "i=84", &BrowseOptions::default().with_max_depth(0)).await;
        assert_eq!(ids(&result), vec!["i=84"]);

        let result = browse(&session, "i=84", &BrowseOptions::default().with_max_depth(1)).await;
        assert_eq!(ids(&result), vec!["i=84", "i=85"]);
        assert_eq!(result.max_depth_reached, 1);
    }

    #[tokio::test]
    async fn test_parent_links_and_paths() {
        let session = plant();
        let result = browse(&session, "i=84", &BrowseOptions::default()).await;
        let temp = result
            .nodes
            .iter()
            .find(|n| n.node_id == "ns=1;s=Boiler.Temp")
            .unwrap();
        assert_eq!(temp.parent_id.as_deref(), Some("ns=1;s=Boiler"));
        assert_eq!(temp.depth, 3);
        assert_eq!(temp.namespace_index, 1);
        assert_eq!(temp.full_path.as_deref(), Some("Root/Objects/Boiler/Temp"));
    }

    #[tokio::test]
    async fn test_failed_node_dropped_with_subtree() {
        let session = MemorySession::builder()
            .object("i=84", "Root", None)
            .object("ns=0;s=A", "A", Some("i=84"))
            .object("ns=0;s=A.1", "A1", Some("ns=0;s=A"))
            .object("ns=0;s=B", "B", Some("i=84"))
            .fail("ns=0;s=A", FailPoint::DisplayName)
            .build();
        let result = browse(&session, "i=84", &BrowseOptions::default()).await;
        assert!(result.success);
        assert_eq!(ids(&result), vec!["i=84", "s=B"]);
    }

    #[tokio::test]
    async fn test_children_failure_keeps_node() {
        let session = MemorySession::builder()
            .object("i=84", "Root", None)
            .object("i=85", "Objects", Some("i=84"))
            .fail("i=84", FailPoint::Children)
            .build();
        let result = browse(&session, "i=84", &BrowseOptions::default()).await;
        assert_eq!(ids(&result), vec!["i=84"]);
    }

    #[tokio::test]
    async fn test_cycle_bounded_by_depth() {
        let session = MemorySession::builder()
            .object("i=84", "Root", None)
            .object("ns=1;i=1", "Loop", Some("i=84"))
            .link("ns=1;i=1", "ns=1;i=1")
            .build();
        let result = browse(&session, "i=84", &BrowseOptions::default().with_max_depth(3)).await;
        assert_eq!(result.total_nodes, 4);
        assert_eq!(result.max_depth_reached, 3);
    }

    // =========================================================================
    // Variables
    // =========================================================================

    #[tokio::test]
    async fn test_data_type_resolution() {
        let session = plant();
        let result = browse(&session, "i=84", &BrowseOptions::default()).await;
        let find = |id: &str| result.nodes.iter().find(|n| n.node_id == id).unwrap();

        assert_eq!(find("ns=1;s=Boiler.Temp").data_type.as_deref(), Some("Double"));
        assert_eq!(find("ns=1;s=Boiler.Mode").data_type.as_deref(), Some("ns=2;Type3002"));
        assert_eq!(find("ns=1;s=Boiler").data_type, None);
        assert_eq!(find("ns=1;s=Boiler.Temp").value, None);
    }

    #[tokio::test]
    async fn test_type_table_fallback_when_value_unreadable() {
        let session = MemorySession::builder()
            .variable("i=84", "Level", None, "i=10", OpcUaValue::Float(1.0))
            .variable("ns=1;i=5", "Odd", Some("i=84"), "i=999", OpcUaValue::Null)
            .fail("i=84", FailPoint::Value)
            .build();
        let result = browse(&session, "i=84", &BrowseOptions::default().with_values(true)).await;
        assert_eq!(result.nodes[0].data_type.as_deref(), Some("Float"));
        assert_eq!(result.nodes[0].value, None);
        assert_eq!(result.nodes[1].data_type.as_deref(), Some("Type999"));
    }

    #[tokio::test]
    async fn test_values_included_on_request() {
        let session = plant();
        let result = browse(&session, "ns=1;s=Boiler", &BrowseOptions::default().with_values(true)).await;
        assert_eq!(result.nodes[1].value, Some(OpcUaValue::Double(71.5)));
        assert_eq!(result.nodes[2].value, None);
        assert_eq!(result.nodes[0].full_path.as_deref(), Some("Boiler"));
    }

    #[tokio::test]
    async fn test_value_read_without_data_type() {
        let session = MemorySession::builder()
            .variable("i=84", "Speed", None, "i=11", OpcUaValue::Double(3.0))
            .fail("i=84", FailPoint::DataType)
            .build();
        let result = browse(&session, "i=84", &BrowseOptions::default().with_values(true)).await;
        assert_eq!(result.nodes[0].data_type, None);
        assert_eq!(result.nodes[0].value, Some(OpcUaValue::Double(3.0)));
    }

    // =========================================================================
    // Classification and filters
    // =========================================================================

    #[test]
    fn test_is_namespace_node() {
        assert!(is_namespace_node(&NodeId::numeric(0, 2253), "X"));
        assert!(is_namespace_node(&NodeId::numeric(0, 2274), "X"));
        assert!(is_namespace_node(&NodeId::string(3, "a"), "ServerStatus"));
        assert!(!is_namespace_node(&NodeId::numeric(1, 2253), "X"));
        assert!(!is_namespace_node(&NodeId::numeric(0, 85), "Objects"));
    }

    #[tokio::test]
    async fn test_namespaces_only_post_pass() {
        let session = plant();
        let options = BrowseOptions::default().with_namespaces_only(true);
        let result = browse(&session, "i=84", &options).await;
        assert_eq!(ids(&result), vec!["i=2253", "i=2255"]);
        assert_eq!(result.total_nodes, 2);
        assert_eq!(result.nodes[0].full_path.as_deref(), Some("Server"));
        assert_eq!(result.nodes[1].full_path.as_deref(), Some("Server/NamespaceArray"));
    }

    #[tokio::test]
    async fn test_namespace_filter_post_pass() {
        let session = plant();
        let options = BrowseOptions::default().with_namespace_filter(Some(1));
        let result = browse(&session, "i=84", &options).await;
        assert_eq!(result.total_nodes, 4);
        assert!(result.nodes.iter().all(|n| n.namespace_index == 1));
        assert_eq!(result.nodes[0].full_path.as_deref(), Some("Boiler"));
    }

    #[tokio::test]
    async fn test_filter_to_empty_is_success() {
        let session = plant();
        let options = BrowseOptions::default().with_namespace_filter(Some(2));
        let result = browse(&session, "i=84", &options).await;
        assert!(result.success);
        assert_eq!(result.total_nodes, 0);
    }

    #[tokio::test]
    async fn test_namespace_table_failure_tolerated() {
        let session = MemorySession::builder()
            .object("i=84", "Root", None)
            .fail_namespace_table()
            .build();
        let result = browse(&session, "i=84", &BrowseOptions::default()).await;
        assert!(result.success);
        assert!(result.namespaces.is_empty());
        assert_eq!(result.total_nodes, 1);
    }

    // =========================================================================
    // Extended attributes
    // =========================================================================

    #[tokio::test]
    async fn test_extended_reads_per_class() {
        let session = MemorySession::builder()
            .object("i=84", "Root", None)
            .attribute("i=84", AttributeId::Description, OpcUaValue::LocalizedText("root".into()))
            .attribute("i=84", AttributeId::EventNotifier, OpcUaValue::Byte(1))
            .attribute("i=84", AttributeId::AccessLevel, OpcUaValue::Byte(3))
            .variable("ns=1;i=1", "Temp", Some("i=84"), "i=11", OpcUaValue::Double(1.0))
            .attribute("ns=1;i=1", AttributeId::AccessLevel, OpcUaValue::Byte(3))
            .attribute("ns=1;i=1", AttributeId::MinimumSamplingInterval, OpcUaValue::Double(100.0))
            .attribute("ns=1;i=1", AttributeId::Historizing, OpcUaValue::Boolean(false))
            .method("ns=1;i=2", "Reset", Some("i=84"))
            .attribute("ns=1;i=2", AttributeId::Executable, OpcUaValue::Boolean(true))
            .build();
        let options = BrowseOptions::default().with_full_attributes(true);
        let result = browse(&session, "i=84", &options).await;

        let root = result.nodes[0].attributes.extended().unwrap();
        assert_eq!(root.description.as_deref(), Some("root"));
        assert_eq!(root.event_notifier, Some(1));
        assert_eq!(root.access_level, None);

        let temp = result.nodes[1].attributes.extended().unwrap();
        assert_eq!(temp.access_level, Some(3));
        assert_eq!(temp.minimum_sampling_interval, Some(100.0));
        assert_eq!(temp.historizing, Some(false));
        assert_eq!(temp.executable, None);

        let reset = result.nodes[2].attributes.extended().unwrap();
        assert_eq!(reset.executable, Some(true));
        assert_eq!(reset.user_executable, None);
        assert_eq!(reset.description, None);
    }

    #[tokio::test]
    async fn test_base_mode_skips_extended_reads() {
        let session = plant();
        let result = browse(&session, "i=84", &BrowseOptions::default()).await;
        assert_eq!(session.attribute_reads(), 0);
        assert!(result.nodes.iter().all(|n| n.attributes == NodeAttributes::Base));
    }

    #[test]
    fn test_data_type_name() {
        assert_eq!(data_type_name(&NodeId::numeric(0, 1)), "Boolean");
        assert_eq!(data_type_name(&NodeId::numeric(0, 21)), "LocalizedText");
        assert_eq!(data_type_name(&NodeId::numeric(0, 999)), "Type999");
        assert_eq!(data_type_name(&NodeId::numeric(2, 11)), "ns=2;Type11");
        assert_eq!(data_type_name(&NodeId::string(2, "Custom")), "ns=2;s=Custom");
    }
}
