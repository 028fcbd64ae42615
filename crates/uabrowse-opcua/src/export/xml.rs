// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! XML sink.
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <OpcUaAddressSpace>
//!   <Metadata>…</Metadata>
//!   <Namespaces><Namespace><Index/><URI/></Namespace>…</Namespaces>
//!   <Nodes><Node>…</Node>…</Nodes>
//! </OpcUaAddressSpace>
//! ```

use std::borrow::Cow;
use std::io::Write;

use chrono::Utc;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{ExportFormat, ExportStrategy, export_fields, field_values};
use crate::error::{ExportError, OpcUaResult};
use crate::model::BrowseResult;

const PROGRESS_INTERVAL: usize = 100;

/// Writes an indented `OpcUaAddressSpace` document.
///
/// Unset optional fields produce no element.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlExporter;

impl XmlExporter {
    /// Creates an XML sink.
    pub fn new() -> Self {
        Self
    }
}

fn xml_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::serialization("XML", e.to_string())
}

/// Characters XML 1.0 permits in text content.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Drops characters a parser would reject. Escaping does not cover these.
fn xml_safe(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

struct XmlOut<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlOut<W> {
    fn event(&mut self, event: Event<'_>) -> OpcUaResult<()> {
        self.writer.write_event(event).map_err(xml_error)?;
        Ok(())
    }

    fn open(&mut self, name: &str) -> OpcUaResult<()> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn close(&mut self, name: &str) -> OpcUaResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn leaf(&mut self, name: &str, text: &str) -> OpcUaResult<()> {
        self.open(name)?;
        self.event(Event::Text(BytesText::new(&xml_safe(text))))?;
        self.close(name)
    }
}

impl ExportStrategy for XmlExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xml
    }

    fn write_to(
        &self,
        result: &BrowseResult,
        full: bool,
        out: &mut dyn Write,
    ) -> OpcUaResult<()> {
        let mut xml = XmlOut {
            writer: Writer::new_with_indent(&mut *out, b' ', 2),
        };

        xml.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        xml.open("OpcUaAddressSpace")?;

        xml.open("Metadata")?;
        xml.leaf("TotalNodes", &result.total_nodes.to_string())?;
        xml.leaf("MaxDepthReached", &result.max_depth_reached.to_string())?;
        xml.leaf("Success", &result.success.to_string())?;
        xml.leaf("FullExport", &full.to_string())?;
        xml.leaf("ExportTimestamp", &Utc::now().to_rfc3339())?;
        if let Some(message) = &result.error_message {
            xml.leaf("ErrorMessage", message)?;
        }
        xml.close("Metadata")?;

        xml.open("Namespaces")?;
        for (index, uri) in &result.namespaces {
            xml.open("Namespace")?;
            xml.leaf("Index", &index.to_string())?;
            xml.leaf("URI", uri)?;
            xml.close("Namespace")?;
        }
        xml.close("Namespaces")?;

        let fields = export_fields(full);
        xml.open("Nodes")?;
        for (i, node) in result.nodes.iter().enumerate() {
            xml.open("Node")?;
            for (field, value) in fields.iter().zip(field_values(node, full)) {
                if let Some(text) = value.render() {
                    xml.leaf(field.element, &text)?;
                }
            }
            xml.close("Node")?;

            if (i + 1) % PROGRESS_INTERVAL == 0 {
                tracing::debug!("Processed {}/{} nodes", i + 1, result.nodes.len());
            }
        }
        xml.close("Nodes")?;

        xml.close("OpcUaAddressSpace")?;
        out.write_all(b"\n").map_err(xml_error)?;
        Ok(())
    }
}
