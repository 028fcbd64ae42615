// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CSV sink.

use std::io::Write;

use ::csv::{QuoteStyle, WriterBuilder};

use super::{ExportFormat, ExportStrategy, export_fields, field_values};
use crate::error::{ExportError, OpcUaResult};
use crate::model::BrowseResult;

/// UTF-8 byte order mark, so spreadsheet tools pick the right encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes one header row plus one row per node.
///
/// Unset optional fields are empty cells. Quoting is applied only where a
/// cell contains a delimiter, quote, or line break.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl CsvExporter {
    /// Creates a CSV sink.
    pub fn new() -> Self {
        Self
    }
}

fn csv_error(e: ::csv::Error) -> ExportError {
    ExportError::serialization("CSV", e.to_string())
}

impl ExportStrategy for CsvExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn write_to(
        &self,
        result: &BrowseResult,
        full: bool,
        out: &mut dyn Write,
    ) -> OpcUaResult<()> {
        out.write_all(UTF8_BOM)
            .map_err(|e| ExportError::serialization("CSV", e.to_string()))?;

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .from_writer(out);

        writer
            .write_record(export_fields(full).iter().map(|f| f.key))
            .map_err(csv_error)?;

        for node in &result.nodes {
            let row = field_values(node, full)
                .iter()
                .map(|v| v.render().unwrap_or_default())
                .collect::<Vec<_>>();
            writer.write_record(&row).map_err(csv_error)?;
        }

        writer
            .flush()
            .map_err(|e| ExportError::serialization("CSV", e.to_string()))?;
        tracing::debug!(rows = result.nodes.len(), "CSV rows written");
        Ok(())
    }
}
