// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory address space implementing [`BrowseSession`].
//!
//! Nodes are declared through [`MemorySessionBuilder`]; children are listed
//! in declaration order. Any read can be made to fail per node, which is how
//! the traversal's tolerance of partial failures is exercised.
//!
//! # Examples
//!
//! ```
//! use uabrowse_opcua::session::MemorySession;
//! use uabrowse_opcua::types::OpcUaValue;
//!
//! let session = MemorySession::builder()
//!     .namespace("urn:demo:plant")
//!     .object("i=84", "Root", None)
//!     .object("ns=1;s=Boiler", "Boiler", Some("i=84"))
//!     .variable("ns=1;s=Boiler.Temp", "Temp", Some("ns=1;s=Boiler"), "i=11", OpcUaValue::Double(71.5))
//!     .build();
//! assert_eq!(session.node_count(), 3);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{BrowseSession, NodeRef, SessionResult, TypedValue};
use crate::error::{ConnectionError, OpcUaResult, SessionError};
use crate::types::{AttributeId, NodeClass, NodeId, OpcUaValue};

const STANDARD_NAMESPACE: &str = "http://opcfoundation.org/UA/";

// =============================================================================
// FailPoint
// =============================================================================

/// A read that a node can be configured to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// `resolve` reports the node as inaccessible.
    Resolve,
    /// NodeClass read.
    NodeClass,
    /// BrowseName read.
    BrowseName,
    /// DisplayName read.
    DisplayName,
    /// Children listing.
    Children,
    /// DataType read.
    DataType,
    /// Value read.
    Value,
    /// Read of one other attribute.
    Attribute(AttributeId),
}

// =============================================================================
// MemoryNode
// =============================================================================

#[derive(Debug, Clone)]
struct MemoryNode {
    node_id: NodeId,
    class: NodeClass,
    browse_name: String,
    display_name: String,
    parent: Option<String>,
    data_type: Option<NodeId>,
    value: Option<OpcUaValue>,
    attributes: HashMap<AttributeId, OpcUaValue>,
    failures: HashSet<FailPoint>,
}

fn parse_id(id: &str) -> NodeId {
    id.parse().unwrap_or_else(|_| NodeId::string(0, id))
}

fn key_of(id: &str) -> String {
    parse_id(id).to_opc_string()
}

// =============================================================================
// MemorySession
// =============================================================================

/// An address space held in memory.
#[derive(Debug)]
pub struct MemorySession {
    endpoint: String,
    nodes: HashMap<String, MemoryNode>,
    children: HashMap<String, Vec<String>>,
    namespaces: Vec<String>,
    fail_namespace_table: bool,
    fail_connect: bool,
    fail_disconnect: bool,
    connected: bool,
    connect_count: usize,
    reads: AtomicUsize,
}

impl MemorySession {
    /// Creates a new builder.
    pub fn builder() -> MemorySessionBuilder {
        MemorySessionBuilder::default()
    }

    /// Returns the number of declared nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` between `connect` and `disconnect`.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Returns how many times `connect` succeeded.
    pub fn connect_count(&self) -> usize {
        self.connect_count
    }

    /// Returns how many `read_attribute` calls were served or failed.
    pub fn attribute_reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    fn lookup(&self, node: &NodeRef, point: FailPoint) -> SessionResult<&MemoryNode> {
        let id = node.id_string();
        let entry = self
            .nodes
            .get(&id)
            .ok_or_else(|| SessionError::not_found(&id))?;
        if entry.failures.contains(&point) {
            return Err(SessionError::access_denied(id));
        }
        Ok(entry)
    }
}

#[async_trait]
impl BrowseSession for MemorySession {
    async fn connect(&mut self) -> OpcUaResult<()> {
        if self.fail_connect {
            return Err(ConnectionError::rejected(
                &self.endpoint,
                Some("BadTimeout".to_string()),
                "BadTimeout",
            )
            .into());
        }
        self.connected = true;
        self.connect_count += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> OpcUaResult<()> {
        self.connected = false;
        if self.fail_disconnect {
            return Err(ConnectionError::NotConnected.into());
        }
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn namespace_table(&self) -> SessionResult<Vec<String>> {
        if self.fail_namespace_table {
            return Err(SessionError::from_status(
                "BadNotReadable",
                "NamespaceArray is not readable",
            ));
        }
        Ok(self.namespaces.clone())
    }

    async fn resolve(&self, node_id: &str) -> SessionResult<NodeRef> {
        let parsed: NodeId = node_id
            .parse()
            .map_err(|e: crate::error::OpcUaError| SessionError::malformed(node_id, e.to_string()))?;
        let node = NodeRef::new(parsed);
        self.lookup(&node, FailPoint::Resolve)?;
        Ok(node)
    }

    async fn node_class(&self, node: &NodeRef) -> SessionResult<NodeClass> {
        Ok(self.lookup(node, FailPoint::NodeClass)?.class)
    }

    async fn browse_name(&self, node: &NodeRef) -> SessionResult<String> {
        Ok(self.lookup(node, FailPoint::BrowseName)?.browse_name.clone())
    }

    async fn display_name(&self, node: &NodeRef) -> SessionResult<String> {
        Ok(self.lookup(node, FailPoint::DisplayName)?.display_name.clone())
    }

    async fn children(&self, node: &NodeRef) -> SessionResult<Vec<NodeRef>> {
        self.lookup(node, FailPoint::Children)?;
        let refs = self
            .children
            .get(&node.id_string())
            .map(|ids| {
                ids.iter()
                    .map(|id| match self.nodes.get(id) {
                        Some(child) => NodeRef::new(child.node_id.clone()),
                        None => NodeRef::new(parse_id(id)),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(refs)
    }

    async fn data_type(&self, node: &NodeRef) -> SessionResult<NodeId> {
        let entry = self.lookup(node, FailPoint::DataType)?;
        entry.data_type.clone().ok_or_else(|| {
            SessionError::from_status("BadAttributeIdInvalid", "Node has no DataType attribute")
                .with_node(node.id_string())
        })
    }

    async fn value(&self, node: &NodeRef) -> SessionResult<TypedValue> {
        let entry = self.lookup(node, FailPoint::Value)?;
        if entry.class != NodeClass::Variable {
            return Err(SessionError::from_status(
                "BadAttributeIdInvalid",
                "Node has no Value attribute",
            )
            .with_node(node.id_string()));
        }
        Ok(TypedValue::new(entry.value.clone().unwrap_or(OpcUaValue::Null)))
    }

    async fn read_attribute(
        &self,
        node: &NodeRef,
        attribute: AttributeId,
    ) -> SessionResult<OpcUaValue> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let entry = self.lookup(node, FailPoint::Attribute(attribute))?;
        entry.attributes.get(&attribute).cloned().ok_or_else(|| {
            SessionError::from_status(
                "BadAttributeIdInvalid",
                format!("Attribute {attribute} not available"),
            )
            .with_node(node.id_string())
        })
    }
}

// =============================================================================
// MemorySessionBuilder
// =============================================================================

/// Builder for [`MemorySession`].
#[derive(Debug)]
pub struct MemorySessionBuilder {
    endpoint: String,
    order: Vec<String>,
    nodes: HashMap<String, MemoryNode>,
    links: Vec<(String, String)>,
    namespaces: Vec<String>,
    fail_namespace_table: bool,
    fail_connect: bool,
    fail_disconnect: bool,
}

impl Default for MemorySessionBuilder {
    fn default() -> Self {
        Self {
            endpoint: "opc.tcp://memory:4840".to_string(),
            order: Vec::new(),
            nodes: HashMap::new(),
            links: Vec::new(),
            namespaces: vec![STANDARD_NAMESPACE.to_string()],
            fail_namespace_table: false,
            fail_connect: false,
            fail_disconnect: false,
        }
    }
}

impl MemorySessionBuilder {
    /// Sets the reported endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Appends a namespace URI; the first call gets index 1.
    pub fn namespace(mut self, uri: impl Into<String>) -> Self {
        self.namespaces.push(uri.into());
        self
    }

    /// Declares a node of any class. Display name defaults to the browse name.
    pub fn node(mut self, id: &str, class: NodeClass, name: &str, parent: Option<&str>) -> Self {
        let key = key_of(id);
        if !self.nodes.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.nodes.insert(
            key,
            MemoryNode {
                node_id: parse_id(id),
                class,
                browse_name: name.to_string(),
                display_name: name.to_string(),
                parent: parent.map(key_of),
                data_type: None,
                value: None,
                attributes: HashMap::new(),
                failures: HashSet::new(),
            },
        );
        self
    }

    /// Declares an Object node.
    pub fn object(self, id: &str, name: &str, parent: Option<&str>) -> Self {
        self.node(id, NodeClass::Object, name, parent)
    }

    /// Declares a Method node.
    pub fn method(self, id: &str, name: &str, parent: Option<&str>) -> Self {
        self.node(id, NodeClass::Method, name, parent)
    }

    /// Declares a Variable node with its DataType id and current value.
    pub fn variable(
        self,
        id: &str,
        name: &str,
        parent: Option<&str>,
        data_type: &str,
        value: OpcUaValue,
    ) -> Self {
        let data_type = parse_id(data_type);
        self.node(id, NodeClass::Variable, name, parent)
            .update(id, |n| {
                n.data_type = Some(data_type);
                n.value = Some(value);
            })
    }

    /// Overrides a node's display name.
    pub fn display_name(self, id: &str, text: &str) -> Self {
        let text = text.to_string();
        self.update(id, |n| n.display_name = text)
    }

    /// Sets an attribute served by `read_attribute`.
    pub fn attribute(self, id: &str, attribute: AttributeId, value: OpcUaValue) -> Self {
        self.update(id, |n| {
            n.attributes.insert(attribute, value);
        })
    }

    /// Makes one read of a node fail.
    pub fn fail(self, id: &str, point: FailPoint) -> Self {
        self.update(id, |n| {
            n.failures.insert(point);
        })
    }

    /// Adds an extra hierarchical reference, e.g. to build a cycle.
    pub fn link(mut self, parent: &str, child: &str) -> Self {
        self.links.push((key_of(parent), key_of(child)));
        self
    }

    /// Makes the namespace table unreadable.
    pub fn fail_namespace_table(mut self) -> Self {
        self.fail_namespace_table = true;
        self
    }

    /// Makes `connect` fail.
    pub fn fail_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// Makes `disconnect` fail.
    pub fn fail_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    fn update(mut self, id: &str, f: impl FnOnce(&mut MemoryNode)) -> Self {
        if let Some(node) = self.nodes.get_mut(&key_of(id)) {
            f(node);
        }
        self
    }

    /// Builds the session.
    pub fn build(self) -> MemorySession {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for key in &self.order {
            if let Some(parent) = self.nodes.get(key).and_then(|n| n.parent.clone()) {
                children.entry(parent).or_default().push(key.clone());
            }
        }
        for (parent, child) in self.links {
            children.entry(parent).or_default().push(child);
        }

        MemorySession {
            endpoint: self.endpoint,
            nodes: self.nodes,
            children,
            namespaces: self.namespaces,
            fail_namespace_table: self.fail_namespace_table,
            fail_connect: self.fail_connect,
            fail_disconnect: self.fail_disconnect,
            connected: false,
            connect_count: 0,
            reads: AtomicUsize::new(0),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
