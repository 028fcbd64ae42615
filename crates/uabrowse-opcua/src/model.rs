// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Browse result model.
//!
//! A browse produces a flat, preorder list of [`DiscoveredNode`]s inside a
//! [`BrowseResult`]. Parent links are kept as ids; hierarchy-dependent data
//! such as full paths is derived after the walk.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{NodeClass, OpcUaValue};

// =============================================================================
// ExtendedAttributes
// =============================================================================

/// Attributes read only in full-attribute mode.
///
/// Each field is independently optional: a failed or inapplicable read
/// leaves it unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedAttributes {
    /// Description text.
    pub description: Option<String>,
    /// AccessLevel bitmask (Variables).
    pub access_level: Option<u8>,
    /// UserAccessLevel bitmask (Variables).
    pub user_access_level: Option<u8>,
    /// WriteMask.
    pub write_mask: Option<u32>,
    /// UserWriteMask.
    pub user_write_mask: Option<u32>,
    /// EventNotifier bitmask (Objects).
    pub event_notifier: Option<u8>,
    /// Executable flag (Methods).
    pub executable: Option<bool>,
    /// UserExecutable flag (Methods).
    pub user_executable: Option<bool>,
    /// MinimumSamplingInterval in milliseconds (Variables).
    pub minimum_sampling_interval: Option<f64>,
    /// Historizing flag (Variables).
    pub historizing: Option<bool>,
}

/// Per-node attribute payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NodeAttributes {
    /// Identity, class, type and value only.
    #[default]
    Base,
    /// Base plus the full-attribute set.
    Extended(ExtendedAttributes),
}

impl NodeAttributes {
    /// Returns the extended set, if this node carries one.
    pub fn extended(&self) -> Option<&ExtendedAttributes> {
        match self {
            Self::Base => None,
            Self::Extended(ext) => Some(ext),
        }
    }
}

// =============================================================================
// DiscoveredNode
// =============================================================================

/// One node found during a browse.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredNode {
    /// Textual node id (e.g. `ns=2;s=Boiler.Temp`).
    pub node_id: String,
    /// Browse name, name part only.
    pub browse_name: String,
    /// Display name, text part only.
    pub display_name: String,
    /// Node class.
    pub node_class: NodeClass,
    /// Human-readable data type name (Variables only).
    pub data_type: Option<String>,
    /// Current value (Variables, when values were requested).
    pub value: Option<OpcUaValue>,
    /// Id of the node this one was discovered under.
    pub parent_id: Option<String>,
    /// Distance from the start node (start node is 0).
    pub depth: u32,
    /// Namespace index of the node id.
    pub namespace_index: u16,
    /// Whether the node belongs to server/namespace metadata.
    pub is_namespace_node: bool,
    /// When the node was read.
    pub timestamp: DateTime<Utc>,
    /// `/`-joined display path, filled after the walk.
    pub full_path: Option<String>,
    /// Base or extended attribute payload.
    pub attributes: NodeAttributes,
}

impl DiscoveredNode {
    /// Creates a node with the identity fields set and everything else empty.
    pub fn new(
        node_id: impl Into<String>,
        browse_name: impl Into<String>,
        display_name: impl Into<String>,
        node_class: NodeClass,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            browse_name: browse_name.into(),
            display_name: display_name.into(),
            node_class,
            data_type: None,
            value: None,
            parent_id: None,
            depth: 0,
            namespace_index: 0,
            is_namespace_node: false,
            timestamp: Utc::now(),
            full_path: None,
            attributes: NodeAttributes::Base,
        }
    }

    /// Sets the parent id and depth.
    pub fn with_parent(mut self, parent_id: Option<String>, depth: u32) -> Self {
        self.parent_id = parent_id;
        self.depth = depth;
        self
    }

    /// Sets the namespace index.
    pub fn with_namespace(mut self, namespace_index: u16) -> Self {
        self.namespace_index = namespace_index;
        self
    }

    /// The label used for this node in paths and trees.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.browse_name
        } else {
            &self.display_name
        }
    }
}

// =============================================================================
// BrowseResult
// =============================================================================

/// Outcome of one browse.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseResult {
    /// Discovered nodes in preorder.
    pub nodes: Vec<DiscoveredNode>,
    /// Number of nodes in `nodes`.
    pub total_nodes: usize,
    /// Deepest depth seen while adding nodes.
    pub max_depth_reached: u32,
    /// Server namespace table, index to URI.
    pub namespaces: BTreeMap<u16, String>,
    /// `false` when the browse could not run.
    pub success: bool,
    /// Why the browse failed.
    pub error_message: Option<String>,
}

impl Default for BrowseResult {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowseResult {
    /// Creates an empty, successful result.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            total_nodes: 0,
            max_depth_reached: 0,
            namespaces: BTreeMap::new(),
            success: true,
            error_message: None,
        }
    }

    /// Creates a failed result carrying an error message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Self::new()
        }
    }

    /// Marks this result failed, keeping whatever was collected.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.success = false;
        self.error_message = Some(message.into());
    }

    /// Appends a node, updating the count and deepest depth.
    pub fn add_node(&mut self, node: DiscoveredNode) {
        self.max_depth_reached = self.max_depth_reached.max(node.depth);
        self.nodes.push(node);
        self.total_nodes += 1;
    }

    /// Returns `true` when no nodes were collected.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes flagged as server/namespace metadata.
    pub fn namespace_nodes(&self) -> Vec<&DiscoveredNode> {
        self.nodes.iter().filter(|n| n.is_namespace_node).collect()
    }

    /// Nodes of one class.
    pub fn nodes_by_class(&self, class: NodeClass) -> Vec<&DiscoveredNode> {
        self.nodes.iter().filter(|n| n.node_class == class).collect()
    }

    /// Keeps only namespace-metadata nodes.
    pub fn retain_namespace_nodes(&mut self) {
        self.nodes.retain(|n| n.is_namespace_node);
        self.total_nodes = self.nodes.len();
    }

    /// Keeps only nodes of one namespace index.
    pub fn retain_namespace(&mut self, index: u16) {
        self.nodes.retain(|n| n.namespace_index == index);
        self.total_nodes = self.nodes.len();
    }

    /// Fills `full_path` for every node that lacks one.
    ///
    /// Walks parent links through the nodes still present. A node whose
    /// parent was filtered out starts its path at itself.
    pub fn compute_full_paths(&mut self) {
        let index: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.node_id.as_str(), i))
            .collect();

        let paths: Vec<Option<String>> = self
            .nodes
            .iter()
            .map(|node| {
                if node.full_path.is_some() {
                    return None;
                }
                let mut segments = vec![node.label()];
                let mut seen: HashSet<&str> = HashSet::from([node.node_id.as_str()]);
                let mut current = node;
                while let Some(&parent) = current
                    .parent_id
                    .as_deref()
                    .and_then(|id| index.get(id))
                {
                    let parent = &self.nodes[parent];
                    if !seen.insert(parent.node_id.as_str()) {
                        break;
                    }
                    segments.push(parent.label());
                    current = parent;
                }
                segments.reverse();
                Some(segments.join("/"))
            })
            .collect();

        for (node, path) in self.nodes.iter_mut().zip(paths) {
            if path.is_some() {
                node.full_path = path;
            }
        }
    }

    /// Node counts per class name, sorted by name.
    pub fn node_class_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.node_class.name()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of collected nodes in one namespace.
    pub fn namespace_node_count(&self, index: u16) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.namespace_index == index)
            .count()
    }
}

// =============================================================================
// BrowseOptions
// =============================================================================

/// Options controlling one browse.
///
/// # Examples
///
/// ```
/// use uabrowse_opcua::model::BrowseOptions;
///
/// let options = BrowseOptions::default().with_max_depth(5).with_values(true);
/// assert_eq!(options.max_depth, 5);
/// assert!(options.include_values);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseOptions {
    /// Deepest level visited; the start node is level 0, negative visits nothing.
    #[serde(default = "default_max_depth")]
    pub max_depth: i32,

    /// Read current values of Variables.
    #[serde(default)]
    pub include_values: bool,

    /// Read the extended attribute set.
    #[serde(default)]
    pub full_attributes: bool,

    /// Keep only server/namespace metadata nodes.
    #[serde(default)]
    pub namespaces_only: bool,

    /// Keep only nodes of this namespace index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_filter: Option<u16>,
}

fn default_max_depth() -> i32 {
    3
}

impl Default for BrowseOptions {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            include_values: false,
            full_attributes: false,
            namespaces_only: false,
            namespace_filter: None,
        }
    }
}

impl BrowseOptions {
    /// Sets the maximum depth.
    pub fn with_max_depth(mut self, max_depth: i32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables or disables value reads.
    pub fn with_values(mut self, include: bool) -> Self {
        self.include_values = include;
        self
    }

    /// Enables or disables extended attribute reads.
    pub fn with_full_attributes(mut self, full: bool) -> Self {
        self.full_attributes = full;
        self
    }

    /// Enables or disables the namespace-metadata filter.
    pub fn with_namespaces_only(mut self, only: bool) -> Self {
        self.namespaces_only = only;
        self
    }

    /// Sets the namespace index filter.
    pub fn with_namespace_filter(mut self, index: Option<u16>) -> Self {
        self.namespace_filter = index;
        self
    }
}

// =============================================================================
// Tests
// =============================================================================
