// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Human-readable tree rendering of a browse result.

use crate::model::{BrowseResult, DiscoveredNode};
use crate::types::NodeClass;

/// Nodes shown before the tree is truncated.
pub const MAX_DISPLAY_NODES: usize = 500;

const RULE_WIDTH: usize = 100;
const MAX_VALUE_CHARS: usize = 40;

fn class_icon(class_name: &str) -> &'static str {
    match class_name {
        "Object" => "📁",
        "Variable" => "📊",
        "Method" => "⚙️",
        "ObjectType" => "📦",
        "VariableType" => "📈",
        "DataType" => "🔢",
        "ReferenceType" => "🔗",
        "View" => "👁️",
        _ => "📄",
    }
}

/// Renders the summary, namespace list and indented node tree.
///
/// Failed and empty results render a short explanation instead of a tree.
pub fn render_tree(result: &BrowseResult) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut lines = vec![
        String::new(),
        heavy.clone(),
        "OPC UA ADDRESS SPACE TREE".to_string(),
        heavy.clone(),
    ];

    if !result.success {
        lines.push(String::new());
        lines.push("❌ Browse operation failed".to_string());
        lines.push(format!(
            "   Error: {}",
            result.error_message.as_deref().unwrap_or_default()
        ));
        lines.push(heavy);
        return finish(lines);
    }

    if result.total_nodes == 0 {
        lines.push(String::new());
        lines.push("⚠️  No nodes found".to_string());
        lines.push("   The specified node has no children or access is restricted.".to_string());
        lines.push(heavy);
        return finish(lines);
    }

    lines.push(String::new());
    lines.push("📊 SUMMARY:".to_string());
    lines.push(format!("   • Total Nodes: {}", result.total_nodes));
    lines.push(format!("   • Max Depth: {}", result.max_depth_reached));
    lines.push(format!("   • Namespaces: {}", result.namespaces.len()));

    lines.push(String::new());
    lines.push("📈 NODE TYPES:".to_string());
    for (class, count) in result.node_class_counts() {
        lines.push(format!("   {} {}: {}", class_icon(class), class, count));
    }

    if !result.namespaces.is_empty() {
        lines.push(String::new());
        lines.push("🌐 NAMESPACES:".to_string());
        for (index, uri) in &result.namespaces {
            lines.push(format!("   [{}] {}", index, uri));
            let count = result.namespace_node_count(*index);
            if count > 0 {
                lines.push(format!("       └─ {} nodes", count));
            }
        }
    }

    lines.push(String::new());
    lines.push("🌳 NODE TREE:".to_string());
    lines.push(light.clone());

    for node in result.nodes.iter().take(MAX_DISPLAY_NODES) {
        let indent = "│  ".repeat(node.depth as usize);
        lines.push(node_line(&indent, node));
        if node.depth == 0 {
            lines.push(format!("{}   💡 NodeId: {}", indent, node.node_id));
        }
    }

    if result.nodes.len() > MAX_DISPLAY_NODES {
        lines.push(String::new());
        lines.push(format!(
            "⚠️  Tree truncated: showing {} of {} nodes",
            MAX_DISPLAY_NODES, result.total_nodes
        ));
        lines.push("   Use 'export' command to see all nodes".to_string());
    }

    lines.push(light);
    lines.push(String::new());
    lines.push("✅ Browse completed successfully".to_string());
    lines.push(heavy);
    finish(lines)
}

fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push_str("\n\n");
    out
}

fn node_line(indent: &str, node: &DiscoveredNode) -> String {
    let connector = if node.depth > 0 { "└─ " } else { "" };
    let mut line = format!(
        "{}{}{} {}",
        indent,
        connector,
        class_icon(node.node_class.name()),
        node.display_name
    );

    let browse = &node.browse_name;
    if node.display_name != *browse
        && !browse.starts_with('[')
        && !(!browse.is_empty() && browse.chars().all(|c| c.is_ascii_digit()))
    {
        line.push_str(&format!(" ({})", browse));
    }

    if let Some(data_type) = &node.data_type {
        let part = data_type.rsplit(';').next().unwrap_or(data_type);
        line.push_str(&format!(" [{}]", part.replace("i=", "Type")));
    }

    if node.node_class == NodeClass::Variable {
        if let Some(value) = &node.value {
            line.push_str(&format!(" = {}", truncate_value(&value.to_string())));
        }
    }

    if node.namespace_index > 0 {
        line.push_str(&format!(" [ns={}]", node.namespace_index));
    }

    line
}

fn truncate_value(text: &str) -> String {
    if text.chars().count() > MAX_VALUE_CHARS {
        let head: String = text.chars().take(MAX_VALUE_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OpcUaValue;

    fn sample() -> BrowseResult {
        let mut result = BrowseResult::new();
        result.namespaces.insert(0, "http://opcfoundation.org/UA/".to_string());
        result.namespaces.insert(1, "urn:demo:plant".to_string());
        result.namespaces.insert(2, "urn:demo:empty".to_string());

        result.add_node(DiscoveredNode::new("i=85", "Objects", "Objects", NodeClass::Object));
        let mut temp = DiscoveredNode::new("ns=1;s=Temp", "TempSensor", "Temperature", NodeClass::Variable)
            .with_parent(Some("i=85".to_string()), 1)
            .with_namespace(1);
        temp.data_type = Some("Double".to_string());
        temp.value = Some(OpcUaValue::Double(71.5));
        result.add_node(temp);
        let mut raw = DiscoveredNode::new("ns=1;s=Raw", "Raw", "Raw", NodeClass::Variable)
            .with_parent(Some("ns=1;s=Temp".to_string()), 2)
            .with_namespace(1);
        raw.data_type = Some("ns=1;i=3002".to_string());
        raw.value = Some(OpcUaValue::String("x".repeat(60)));
        result.add_node(raw);
        result.add_node(
            DiscoveredNode::new("i=11492", "11492", "GetMonitoredItems", NodeClass::Method)
                .with_parent(Some("i=85".to_string()), 1),
        );
        result
    }

    // =========================================================================
    // Sections
    // =========================================================================

    #[test]
    fn test_failed_result() {
        let text = render_tree(&BrowseResult::failed("Node 'i=1' not found"));
        assert!(text.contains("OPC UA ADDRESS SPACE TREE"));
        assert!(text.contains("❌ Browse operation failed"));
        assert!(text.contains("   Error: Node 'i=1' not found"));
        assert!(!text.contains("NODE TREE"));
    }

    #[test]
    fn test_empty_result() {
        let text = render_tree(&BrowseResult::new());
        assert!(text.contains("⚠️  No nodes found"));
        assert!(!text.contains("SUMMARY"));
    }

    #[test]
    fn test_summary_and_namespaces() {
        let text = render_tree(&sample());
        assert!(text.contains("   • Total Nodes: 4"));
        assert!(text.contains("   • Max Depth: 2"));
        assert!(text.contains("   • Namespaces: 3"));
        assert!(text.contains("   ⚙️ Method: 1\n   📁 Object: 1\n   📊 Variable: 2"));
        assert!(text.contains("   [1] urn:demo:plant\n       └─ 2 nodes"));
        assert!(text.contains("   [2] urn:demo:empty\n\n🌳 NODE TREE:"));
        assert!(text.contains("✅ Browse completed successfully"));
    }

    // =========================================================================
    // Node lines
    // =========================================================================

    #[test]
    fn test_node_lines() {
        let text = render_tree(&sample());
        assert!(text.contains("📁 Objects\n   💡 NodeId: i=85"));
        assert!(text.contains("│  └─ 📊 Temperature (TempSensor) [Double] = 71.5 [ns=1]"));
        assert!(text.contains("│  └─ ⚙️ GetMonitoredItems\n"));

        let raw = format!(
            "│  │  └─ 📊 Raw [Type3002] = {}... [ns=1]",
            "x".repeat(37)
        );
        assert!(text.contains(&raw));
    }

    #[test]
    fn test_truncation_notice() {
        let mut result = BrowseResult::new();
        for i in 0..(MAX_DISPLAY_NODES + 5) {
            result.add_node(DiscoveredNode::new(
                format!("i={}", i),
                "N",
                "N",
                NodeClass::Object,
            ));
        }
        let text = render_tree(&result);
        assert!(text.contains("⚠️  Tree truncated: showing 500 of 505 nodes"));
        assert!(text.contains("   Use 'export' command to see all nodes"));
        assert_eq!(text.matches("💡 NodeId").count(), MAX_DISPLAY_NODES);
    }

    #[test]
    fn test_value_truncation_counts_chars() {
        assert_eq!(truncate_value("short"), "short");
        let long = "é".repeat(41);
        assert_eq!(truncate_value(&long), format!("{}...", "é".repeat(37)));
    }
}
