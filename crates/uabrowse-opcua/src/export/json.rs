// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! JSON sink.

use std::io::Write;

use chrono::Utc;
use serde::Serialize;

use super::{ExportFormat, ExportStrategy, NodeRecord};
use crate::error::{ExportError, OpcUaResult};
use crate::model::BrowseResult;

/// Writes a `{ metadata, namespaces, nodes }` document, indented by two spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl JsonExporter {
    /// Creates a JSON sink.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct Document<'a> {
    metadata: Metadata<'a>,
    namespaces: Vec<NamespaceEntry<'a>>,
    nodes: Vec<NodeRecord<'a>>,
}

#[derive(Serialize)]
struct Metadata<'a> {
    total_nodes: usize,
    max_depth_reached: u32,
    success: bool,
    error_message: Option<&'a str>,
    export_timestamp: String,
    full_export: bool,
}

#[derive(Serialize)]
struct NamespaceEntry<'a> {
    index: u16,
    uri: &'a str,
}

impl ExportStrategy for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Json
    }

    fn write_to(
        &self,
        result: &BrowseResult,
        full: bool,
        out: &mut dyn Write,
    ) -> OpcUaResult<()> {
        let document = Document {
            metadata: Metadata {
                total_nodes: result.total_nodes,
                max_depth_reached: result.max_depth_reached,
                success: result.success,
                error_message: result.error_message.as_deref(),
                export_timestamp: Utc::now().to_rfc3339(),
                full_export: full,
            },
            namespaces: result
                .namespaces
                .iter()
                .map(|(index, uri)| NamespaceEntry { index: *index, uri })
                .collect(),
            nodes: result
                .nodes
                .iter()
                .map(|node| NodeRecord { node, full })
                .collect(),
        };

        serde_json::to_writer_pretty(&mut *out, &document)
            .map_err(|e| ExportError::serialization("JSON", e.to_string()))?;
        out.write_all(b"\n")
            .map_err(|e| ExportError::serialization("JSON", e.to_string()))?;
        Ok(())
    }
}
