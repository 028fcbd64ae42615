// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Format-dispatching export facade.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::{CsvExporter, ExportFormat, ExportStrategy, JsonExporter, XmlExporter};
use crate::error::{ExportError, OpcUaResult};
use crate::model::BrowseResult;

/// Default directory for generated file names.
pub const DEFAULT_EXPORT_DIR: &str = "export";

/// Picks the sink for a format and writes browse results with it.
///
/// # Examples
///
/// ```
/// use uabrowse_opcua::export::{ExportFormat, Exporter};
///
/// let exporter = Exporter::from_name("JSON", false).unwrap();
/// assert_eq!(exporter.format(), ExportFormat::Json);
/// assert!(Exporter::from_name("yaml", false).is_err());
/// ```
pub struct Exporter {
    format: ExportFormat,
    full_export: bool,
    strategy: Box<dyn ExportStrategy>,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("format", &self.format)
            .field("full_export", &self.full_export)
            .finish()
    }
}

impl Exporter {
    /// Creates an exporter for a format.
    pub fn new(format: ExportFormat, full_export: bool) -> Self {
        let strategy: Box<dyn ExportStrategy> = match format {
            ExportFormat::Csv => Box::new(CsvExporter::new()),
            ExportFormat::Json => Box::new(JsonExporter::new()),
            ExportFormat::Xml => Box::new(XmlExporter::new()),
        };
        Self {
            format,
            full_export,
            strategy,
        }
    }

    /// Creates an exporter from a case-insensitive format name.
    pub fn from_name(name: &str, full_export: bool) -> OpcUaResult<Self> {
        Ok(Self::new(name.parse()?, full_export))
    }

    /// Names of all supported formats.
    pub fn supported_formats() -> Vec<&'static str> {
        ExportFormat::supported()
    }

    /// Returns the selected format.
    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Returns `true` when extended attributes are exported.
    pub fn full_export(&self) -> bool {
        self.full_export
    }

    /// Returns `export/opcua_export_<YYYYMMDD>_<HHMMSS>.<ext>` for `now`.
    pub fn default_output_path(&self, now: DateTime<Local>) -> PathBuf {
        Path::new(DEFAULT_EXPORT_DIR).join(format!(
            "opcua_export_{}.{}",
            now.format("%Y%m%d_%H%M%S"),
            self.strategy.extension()
        ))
    }

    /// Writes `result` to `output` (or a generated path) and returns the
    /// absolute path of the written file.
    ///
    /// Failed or empty results are rejected before any directory or file is
    /// created.
    pub fn export(&self, result: &BrowseResult, output: Option<&Path>) -> OpcUaResult<PathBuf> {
        let path = match output {
            Some(path) => path.to_path_buf(),
            None => self.default_output_path(Local::now()),
        };

        self.strategy.export(result, &path, self.full_export)?;

        let size = fs::metadata(&path)
            .map_err(|e| ExportError::io(&path, e))?
            .len();
        let absolute = std::path::absolute(&path).map_err(|e| ExportError::io(&path, e))?;

        tracing::info!(
            format = %self.strategy.format_name(),
            path = %absolute.display(),
            "Export completed"
        );
        tracing::debug!(bytes = size, "Export file size");
        Ok(absolute)
    }
}
