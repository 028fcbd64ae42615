// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Browse and export integration tests.
//!
//! Most tests run against [`SyntheticSession`], a generated address space
//! with a fixed fan-out. The live-server test is ignored by default.
//!
//! # Environment Variables
//!
//! - `OPCUA_TEST_ENDPOINT`: OPC UA server endpoint (default: opc.tcp://localhost:4840)
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p uabrowse-opcua --test browse_integration
//!
//! # Against a live server
//! cargo test -p uabrowse-opcua --features real-transport --test browse_integration -- --ignored
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use uabrowse_opcua::export::{ExportFormat, export_fields};
use uabrowse_opcua::session::SessionResult;
use uabrowse_opcua::{
    AttributeId, BrowseOptions, BrowseSession, Exporter, NodeClass, NodeId, NodeRef, OpcUaResult,
    OpcUaValue, SessionError, TypedValue, browse, render_tree, with_session,
};

// =============================================================================
// Synthetic Session
// =============================================================================

const ROOT: &str = "ns=1;s=Root";

/// Deepest generated level; nodes here are Variables without children.
const LEAF_LEVEL: usize = 3;

/// Generated tree: `Root`, `Root.0`, `Root.0.1`, ... with `fanout` children
/// per Object. With `cycle` set, `Root.0` also lists `Root` as a child.
struct SyntheticSession {
    fanout: usize,
    cycle: bool,
    connected: bool,
    reads: AtomicUsize,
}

impl SyntheticSession {
    fn new(fanout: usize) -> Self {
        Self {
            fanout,
            cycle: false,
            connected: false,
            reads: AtomicUsize::new(0),
        }
    }

    fn with_cycle(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// Returns the path segments after `Root`, or `None` for unknown ids.
    fn segments(&self, id: &str) -> Option<Vec<usize>> {
        let rest = id.strip_prefix(ROOT)?;
        let mut segments = Vec::new();
        for part in rest.split('.').skip(1) {
            let index: usize = part.parse().ok()?;
            if index >= self.fanout {
                return None;
            }
            segments.push(index);
        }
        if rest.is_empty() || rest.starts_with('.') {
            (segments.len() <= LEAF_LEVEL).then_some(segments)
        } else {
            None
        }
    }

    fn level(&self, node: &NodeRef) -> SessionResult<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let id = node.id_string();
        self.segments(&id)
            .map(|s| s.len())
            .ok_or_else(|| SessionError::not_found(id))
    }
}

#[async_trait]
impl BrowseSession for SyntheticSession {
    async fn connect(&mut self) -> OpcUaResult<()> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> OpcUaResult<()> {
        self.connected = false;
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "opc.tcp://synthetic:4840"
    }

    async fn namespace_table(&self) -> SessionResult<Vec<String>> {
        Ok(vec![
            "http://opcfoundation.org/UA/".to_string(),
            "urn:synthetic".to_string(),
        ])
    }

    async fn resolve(&self, node_id: &str) -> SessionResult<NodeRef> {
        let node = NodeRef::new(NodeId::string(1, node_id.trim_start_matches("ns=1;s=")));
        self.level(&node)?;
        Ok(node)
    }

    async fn node_class(&self, node: &NodeRef) -> SessionResult<NodeClass> {
        Ok(if self.level(node)? == LEAF_LEVEL {
            NodeClass::Variable
        } else {
            NodeClass::Object
        })
    }

    async fn browse_name(&self, node: &NodeRef) -> SessionResult<String> {
        self.level(node)?;
        let id = node.id_string();
        Ok(id.rsplit(['.', '=']).next().unwrap_or_default().to_string())
    }

    async fn display_name(&self, node: &NodeRef) -> SessionResult<String> {
        self.level(node)?;
        Ok(format!("N{}", node.id_string().trim_start_matches(ROOT)))
    }

    async fn children(&self, node: &NodeRef) -> SessionResult<Vec<NodeRef>> {
        if self.level(node)? == LEAF_LEVEL {
            return Ok(Vec::new());
        }
        let id = node.id_string();
        let mut children: Vec<NodeRef> = (0..self.fanout)
            .map(|i| NodeRef::new(NodeId::string(1, format!("{}.{}", id.trim_start_matches("ns=1;s="), i))))
            .collect();
        if self.cycle && id == format!("{ROOT}.0") {
            children.push(NodeRef::new(NodeId::string(1, "Root")));
        }
        Ok(children)
    }

    async fn data_type(&self, node: &NodeRef) -> SessionResult<NodeId> {
        self.level(node)?;
        Ok(NodeId::numeric(0, 6))
    }

    async fn value(&self, node: &NodeRef) -> SessionResult<TypedValue> {
        let level = self.level(node)?;
        Ok(TypedValue::new(OpcUaValue::Int32(level as i32)))
    }

    async fn read_attribute(
        &self,
        node: &NodeRef,
        attribute: AttributeId,
    ) -> SessionResult<OpcUaValue> {
        self.level(node)?;
        match attribute {
            AttributeId::Description => Ok(OpcUaValue::LocalizedText("generated".to_string())),
            AttributeId::AccessLevel | AttributeId::UserAccessLevel => Ok(OpcUaValue::Byte(1)),
            AttributeId::WriteMask | AttributeId::UserWriteMask => Ok(OpcUaValue::UInt32(0)),
            AttributeId::EventNotifier => Ok(OpcUaValue::Byte(0)),
            _ => Err(SessionError::access_denied(node.id_string())),
        }
    }
}

// =============================================================================
// Traversal
// =============================================================================

#[tokio::test]
async fn test_depth_bound_and_preorder() {
    let session = SyntheticSession::new(3);
    let result = browse(&session, ROOT, &BrowseOptions::default().with_max_depth(2)).await;

    assert!(result.success);
    assert_eq!(result.total_nodes, 1 + 3 + 9);
    assert_eq!(result.max_depth_reached, 2);

    let ids: Vec<&str> = result.nodes.iter().take(6).map(|n| n.node_id.as_str()).collect();
    assert_eq!(
        ids,
        [
            "ns=1;s=Root",
            "ns=1;s=Root.0",
            "ns=1;s=Root.0.0",
            "ns=1;s=Root.0.1",
            "ns=1;s=Root.0.2",
            "ns=1;s=Root.1",
        ]
    );
    assert!(result.nodes.iter().all(|n| n.namespace_index == 1));
    assert_eq!(result.namespaces.get(&1).map(String::as_str), Some("urn:synthetic"));
}

#[tokio::test]
async fn test_leaf_variables_carry_type_and_value() {
    let session = SyntheticSession::new(2);
    let result = browse(&session, ROOT, &BrowseOptions::default().with_max_depth(5)).await;

    assert_eq!(result.total_nodes, 1 + 2 + 4 + 8);
    assert_eq!(result.max_depth_reached, 3);

    let leaf = result
        .nodes
        .iter()
        .find(|n| n.node_id == "ns=1;s=Root.1.0.1")
        .unwrap();
    assert_eq!(leaf.node_class, NodeClass::Variable);
    assert_eq!(leaf.data_type.as_deref(), Some("Int32"));
    assert_eq!(leaf.value, Some(OpcUaValue::Int32(3)));
    assert_eq!(leaf.parent_id.as_deref(), Some("ns=1;s=Root.1.0"));
    assert_eq!(leaf.full_path.as_deref(), Some("N/N.1/N.1.0/N.1.0.1"));
}

#[tokio::test]
async fn test_cycle_is_bounded_by_depth() {
    let session = SyntheticSession::new(1).with_cycle();
    let result = browse(&session, ROOT, &BrowseOptions::default().with_max_depth(3)).await;

    assert!(result.success);
    assert_eq!(result.max_depth_reached, 3);
    let root_visits = result.nodes.iter().filter(|n| n.node_id == ROOT).count();
    assert_eq!(root_visits, 2);
    let repeated = result.nodes.iter().find(|n| n.node_id == ROOT && n.depth == 2).unwrap();
    assert_eq!(repeated.parent_id.as_deref(), Some("ns=1;s=Root.0"));
}

#[tokio::test]
async fn test_unknown_start_node_fails() {
    let session = SyntheticSession::new(2);
    let result = browse(&session, "ns=1;s=Elsewhere", &BrowseOptions::default()).await;

    assert!(!result.success);
    assert!(result.nodes.is_empty());
    assert_eq!(
        result.error_message.as_deref(),
        Some("Node 'ns=1;s=Elsewhere' not found or not accessible: BadNodeIdUnknown")
    );
}

#[tokio::test]
async fn test_full_attributes_are_best_effort() {
    let session = SyntheticSession::new(1);
    let options = BrowseOptions::default().with_max_depth(3).with_full_attributes(true);
    let result = browse(&session, ROOT, &options).await;

    assert_eq!(result.total_nodes, 4);
    let leaf = result.nodes.last().unwrap();
    let ext = leaf.attributes.extended().unwrap();
    assert_eq!(ext.description.as_deref(), Some("generated"));
    assert_eq!(ext.access_level, Some(1));
    assert_eq!(ext.minimum_sampling_interval, None);
    assert_eq!(ext.historizing, None);

    let root = &result.nodes[0];
    assert_eq!(root.attributes.extended().unwrap().event_notifier, Some(0));
}

// =============================================================================
// Session scope + export
// =============================================================================

#[tokio::test]
async fn test_scoped_browse_then_export_all_formats() {
    let mut session = SyntheticSession::new(2);
    let options = BrowseOptions::default().with_max_depth(2);

    let result = with_session(&mut session, move |s| {
        Box::pin(async move { Ok(browse(s, ROOT, &options).await) })
    })
    .await
    .unwrap();
    assert!(!session.connected);
    assert!(session.reads.load(Ordering::SeqCst) > 0);

    let dir = tempfile::tempdir().unwrap();
    for format in ExportFormat::ALL {
        let target = dir.path().join(format!("synthetic.{}", format.extension()));
        let written = Exporter::new(format, false)
            .export(&result, Some(&target))
            .unwrap();
        assert!(written.is_absolute());
    }

    let csv = std::fs::read_to_string(dir.path().join("synthetic.csv")).unwrap();
    let header = csv.trim_start_matches('\u{feff}').lines().next().unwrap();
    let keys: Vec<&str> = export_fields(false).iter().map(|f| f.key).collect();
    assert_eq!(header, keys.join(","));
    assert_eq!(csv.lines().count(), 1 + result.total_nodes);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("synthetic.json")).unwrap())
            .unwrap();
    let first = json["nodes"][0].as_object().unwrap();
    assert_eq!(first.len(), keys.len());
    assert_eq!(json["metadata"]["total_nodes"], result.total_nodes);

    let xml = std::fs::read_to_string(dir.path().join("synthetic.xml")).unwrap();
    assert_eq!(xml.matches("<Node>").count(), result.total_nodes);
}

#[tokio::test]
async fn test_failed_browse_is_not_exported() {
    let session = SyntheticSession::new(1);
    let result = browse(&session, "not-an-id", &BrowseOptions::default()).await;
    assert!(!result.success);

    let tree = render_tree(&result);
    assert!(tree.contains("❌ Browse operation failed"));

    let dir = tempfile::tempdir().unwrap();
    let err = Exporter::new(ExportFormat::Json, false)
        .export(&result, Some(&dir.path().join("x.json")))
        .unwrap_err();
    assert!(err.to_string().starts_with("Browse operation failed: Invalid Node ID format"));
}

// =============================================================================
// Live server
// =============================================================================

#[cfg(feature = "real-transport")]
#[tokio::test]
#[ignore = "Requires OPC UA server"]
async fn test_live_server_objects_folder() {
    use uabrowse_opcua::{OpcUaConfig, OpcUaSession};

    let endpoint = std::env::var("OPCUA_TEST_ENDPOINT")
        .unwrap_or_else(|_| "opc.tcp://localhost:4840".to_string());
    let config = OpcUaConfig::builder().endpoint(endpoint).build().unwrap();
    let mut session = OpcUaSession::new(config);

    let result = with_session(&mut session, |s| {
        Box::pin(async move { Ok(browse(s, "i=85", &BrowseOptions::default().with_max_depth(1)).await) })
    })
    .await
    .unwrap();

    assert!(result.success, "{:?}", result.error_message);
    assert_eq!(result.nodes[0].node_id, "i=85");
    assert!(result.namespaces.contains_key(&0));
}
