// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! File export of browse results.
//!
//! Three interchangeable sinks implement [`ExportStrategy`]:
//!
//! | Format | Sink            | Notes                                   |
//! |--------|-----------------|-----------------------------------------|
//! | CSV    | [`CsvExporter`] | UTF-8 with BOM, minimal quoting         |
//! | JSON   | [`JsonExporter`]| metadata + namespaces + nodes, 2-space  |
//! | XML    | [`XmlExporter`] | `OpcUaAddressSpace` root, 2-space       |
//!
//! All sinks share one per-node field order ([`BASE_FIELDS`] followed by
//! [`EXTENDED_FIELDS`] in full mode), so the CSV header and the JSON keys
//! are always identical.

mod csv;
mod exporter;
mod json;
mod xml;

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{ExportError, OpcUaError, OpcUaResult};
use crate::model::{BrowseResult, DiscoveredNode};

pub use self::csv::CsvExporter;
pub use self::exporter::Exporter;
pub use self::json::JsonExporter;
pub use self::xml::XmlExporter;

// =============================================================================
// ExportFormat
// =============================================================================

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    /// Comma-separated values.
    #[default]
    Csv,
    /// JSON document.
    Json,
    /// XML document.
    Xml,
}

impl ExportFormat {
    /// All formats, in the order they are listed to users.
    pub const ALL: [ExportFormat; 3] = [Self::Csv, Self::Json, Self::Xml];

    /// Returns the lowercase format name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }

    /// Returns the file extension, without the dot.
    pub const fn extension(&self) -> &'static str {
        self.name()
    }

    /// Detects a format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    /// Names of all supported formats.
    pub fn supported() -> Vec<&'static str> {
        Self::ALL.iter().map(ExportFormat::name).collect()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = OpcUaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            _ => Err(OpcUaError::export(ExportError::UnsupportedFormat {
                format: s.to_string(),
                supported: Self::supported(),
            })),
        }
    }
}

// =============================================================================
// Field catalogue
// =============================================================================

/// One exported per-node field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportField {
    /// Snake-case key used by CSV headers and JSON objects.
    pub key: &'static str,
    /// PascalCase element name used by XML.
    pub element: &'static str,
}

const fn field(key: &'static str, element: &'static str) -> ExportField {
    ExportField { key, element }
}

/// Fields exported for every node.
pub const BASE_FIELDS: [ExportField; 12] = [
    field("node_id", "NodeId"),
    field("browse_name", "BrowseName"),
    field("display_name", "DisplayName"),
    field("full_path", "FullPath"),
    field("node_class", "NodeClass"),
    field("data_type", "DataType"),
    field("value", "Value"),
    field("parent_id", "ParentId"),
    field("depth", "Depth"),
    field("namespace_index", "NamespaceIndex"),
    field("is_namespace_node", "IsNamespaceNode"),
    field("timestamp", "Timestamp"),
];

/// Fields appended in full-export mode.
pub const EXTENDED_FIELDS: [ExportField; 10] = [
    field("description", "Description"),
    field("access_level", "AccessLevel"),
    field("user_access_level", "UserAccessLevel"),
    field("write_mask", "WriteMask"),
    field("user_write_mask", "UserWriteMask"),
    field("event_notifier", "EventNotifier"),
    field("executable", "Executable"),
    field("user_executable", "UserExecutable"),
    field("minimum_sampling_interval", "MinimumSamplingInterval"),
    field("historizing", "Historizing"),
];

/// Returns the exported fields, in order.
pub fn export_fields(full: bool) -> Vec<ExportField> {
    let mut fields = BASE_FIELDS.to_vec();
    if full {
        fields.extend_from_slice(&EXTENDED_FIELDS);
    }
    fields
}

/// A single exported cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text.
    Text(String),
    /// Unsigned integer.
    Unsigned(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean, rendered as `true` / `false`.
    Bool(bool),
    /// Unset optional field.
    Missing,
}

impl FieldValue {
    fn text(value: Option<impl ToString>) -> Self {
        value.map_or(Self::Missing, |v| Self::Text(v.to_string()))
    }

    fn unsigned(value: Option<impl Into<u64>>) -> Self {
        value.map_or(Self::Missing, |v| Self::Unsigned(v.into()))
    }

    /// Renders the cell as text; `None` for an unset field.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Unsigned(n) => Some(n.to_string()),
            Self::Float(x) => Some(x.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Missing => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Unsigned(n) => serializer.serialize_u64(*n),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Missing => serializer.serialize_none(),
        }
    }
}

/// Returns a node's cells in [`export_fields`] order.
pub fn field_values(node: &DiscoveredNode, full: bool) -> Vec<FieldValue> {
    let mut values = vec![
        FieldValue::Text(node.node_id.clone()),
        FieldValue::Text(node.browse_name.clone()),
        FieldValue::Text(node.display_name.clone()),
        FieldValue::text(node.full_path.as_ref()),
        FieldValue::Text(node.node_class.name().to_string()),
        FieldValue::text(node.data_type.as_ref()),
        FieldValue::text(node.value.as_ref()),
        FieldValue::text(node.parent_id.as_ref()),
        FieldValue::Unsigned(u64::from(node.depth)),
        FieldValue::Unsigned(u64::from(node.namespace_index)),
        FieldValue::Bool(node.is_namespace_node),
        FieldValue::Text(node.timestamp.to_rfc3339()),
    ];

    if full {
        let ext = node.attributes.extended().cloned().unwrap_or_default();
        values.extend([
            FieldValue::text(ext.description),
            FieldValue::unsigned(ext.access_level),
            FieldValue::unsigned(ext.user_access_level),
            FieldValue::unsigned(ext.write_mask),
            FieldValue::unsigned(ext.user_write_mask),
            FieldValue::unsigned(ext.event_notifier),
            ext.executable.map_or(FieldValue::Missing, FieldValue::Bool),
            ext.user_executable.map_or(FieldValue::Missing, FieldValue::Bool),
            ext.minimum_sampling_interval
                .map_or(FieldValue::Missing, FieldValue::Float),
            ext.historizing.map_or(FieldValue::Missing, FieldValue::Bool),
        ]);
    }

    values
}

/// A node serialized as an ordered map of [`export_fields`] keys.
pub(crate) struct NodeRecord<'a> {
    pub node: &'a DiscoveredNode,
    pub full: bool,
}

impl Serialize for NodeRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = export_fields(self.full);
        let values = field_values(self.node, self.full);
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (field, value) in fields.iter().zip(&values) {
            map.serialize_entry(field.key, value)?;
        }
        map.end()
    }
}

// =============================================================================
// ExportStrategy
// =============================================================================

/// A file format sink for browse results.
pub trait ExportStrategy: Send + Sync {
    /// Returns the format handled by this sink.
    fn format(&self) -> ExportFormat;

    /// Returns the file extension, without the dot.
    fn extension(&self) -> &'static str {
        self.format().extension()
    }

    /// Returns the display name of the format, e.g. `CSV`.
    fn format_name(&self) -> String {
        self.format().name().to_uppercase()
    }

    /// Encodes a result into `out`.
    fn write_to(
        &self,
        result: &BrowseResult,
        full: bool,
        out: &mut dyn Write,
    ) -> OpcUaResult<()>;

    /// Rejects failed or empty results.
    fn validate(&self, result: &BrowseResult) -> OpcUaResult<()> {
        if !result.success {
            let e = ExportError::failed_result(result.error_message.clone().unwrap_or_default());
            tracing::error!("{}", e);
            return Err(e.into());
        }
        if result.nodes.is_empty() {
            tracing::error!("{}", ExportError::EmptyResult);
            return Err(ExportError::EmptyResult.into());
        }
        tracing::debug!(
            nodes = result.nodes.len(),
            max_depth = result.max_depth_reached,
            namespaces = result.namespaces.len(),
            "Validation passed"
        );
        Ok(())
    }

    /// Validates, then writes the result to `path`.
    ///
    /// The document is written to a sibling `.partial` file and renamed into
    /// place, so a failed write leaves no file behind.
    fn export(&self, result: &BrowseResult, path: &Path, full: bool) -> OpcUaResult<()> {
        self.validate(result)?;
        ensure_output_directory(path)?;

        tracing::info!(
            format = %self.format(),
            nodes = result.nodes.len(),
            path = %path.display(),
            "Exporting"
        );

        let partial = partial_path(path);
        let written = write_file(&partial, |out| self.write_to(result, full, out)).and_then(|()| {
            fs::rename(&partial, path).map_err(|e| ExportError::io(path, e).into())
        });

        if written.is_err() {
            if let Err(e) = fs::remove_file(&partial) {
                tracing::debug!(path = %partial.display(), "Partial file not removed: {}", e);
            }
        }
        written
    }
}

/// Returns the hidden sibling path a document is written to before rename.
pub fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

fn write_file(
    path: &Path,
    body: impl FnOnce(&mut dyn Write) -> OpcUaResult<()>,
) -> OpcUaResult<()> {
    let file = File::create(path).map_err(|e| ExportError::io(path, e))?;
    let mut out = BufWriter::new(file);
    body(&mut out)?;
    out.flush().map_err(|e| ExportError::io(path, e))?;
    Ok(())
}

/// Creates the parent directory of `path` if it is missing.
pub fn ensure_output_directory(path: &Path) -> OpcUaResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|source| ExportError::CreateDirectory {
                path: dir.to_path_buf(),
                source,
            })?;
            tracing::debug!(dir = %dir.display(), "Output directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Test fixtures
// =============================================================================


// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse_case_insensitive() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("Json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        let err = "yaml".parse::<ExportFormat>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported export format 'yaml'. Supported formats: csv, json, xml"
        );
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(&PathBuf::from("out/a.XML")), Some(ExportFormat::Xml));
        assert_eq!(ExportFormat::from_path(&PathBuf::from("out/a.txt")), None);
        assert_eq!(ExportFormat::from_path(&PathBuf::from("out/a")), None);
    }

    #[test]
    fn test_field_counts() {
        assert_eq!(export_fields(false).len(), 12);
        assert_eq!(export_fields(true).len(), 22);
        let result = fixtures::result(true);
        assert_eq!(field_values(&result.nodes[0], false).len(), 12);
        assert_eq!(field_values(&result.nodes[0], true).len(), 22);
    }

    #[test]
    fn test_field_values_render() {
        let result = fixtures::result(true);
        let values = field_values(&result.nodes[1], true);
        assert_eq!(values[6].render().as_deref(), Some("21.5"));
        assert_eq!(values[8].render().as_deref(), Some("1"));
        assert_eq!(values[10].render().as_deref(), Some("false"));
        assert_eq!(values[11].render().as_deref(), Some("2025-01-02T03:04:05+00:00"));
        assert_eq!(values[13], FieldValue::Unsigned(3));
        assert_eq!(values[15], FieldValue::Missing);
        assert_eq!(values[20], FieldValue::Float(250.0));
    }

    #[test]
    fn test_full_mode_on_base_node_is_all_missing() {
        let result = fixtures::result(false);
        let values = field_values(&result.nodes[0], true);
        assert!(values[12..].iter().all(|v| *v == FieldValue::Missing));
    }

    #[test]
    fn test_validate_rejects_failed_and_empty() {
        let sink = CsvExporter::new();
        let err = sink.validate(&BrowseResult::failed("boom")).unwrap_err();
        assert_eq!(err.to_string(), "Browse operation failed: boom");
        let err = sink.validate(&BrowseResult::new()).unwrap_err();
        assert_eq!(err.to_string(), "No nodes to export - browse result is empty");
    }

    #[test]
    fn test_export_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.csv");
        CsvExporter::new()
            .export(&fixtures::result(false), &path, false)
            .unwrap();
        assert!(path.exists());
    }

    struct BrokenSink;

    impl ExportStrategy for BrokenSink {
        fn format(&self) -> ExportFormat {
            ExportFormat::Csv
        }

        fn write_to(
            &self,
            _result: &BrowseResult,
            _full: bool,
            out: &mut dyn Write,
        ) -> OpcUaResult<()> {
            out.write_all(b"NodeId,BrowseName\n")
                .map_err(|e| ExportError::serialization("CSV", e.to_string()))?;
            Err(ExportError::serialization("CSV", "record rejected").into())
        }
    }

    #[test]
    fn test_write_error_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let err = BrokenSink
            .export(&fixtures::result(false), &path, false)
            .unwrap_err();

        assert!(matches!(err, OpcUaError::Export(ExportError::Serialization { .. })));
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_error_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "previous").unwrap();

        BrokenSink
            .export(&fixtures::result(false), &path, false)
            .unwrap_err();
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");

        CsvExporter::new()
            .export(&fixtures::result(false), &path, false)
            .unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("ns=2;s=Temp"));
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_partial_path_is_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("out/nodes.json")),
            PathBuf::from("out/.nodes.json.partial")
        );
    }

    #[test]
    fn test_export_failed_result_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never/out.json");
        let err = JsonExporter::new()
            .export(&BrowseResult::failed("boom"), &path, false)
            .unwrap_err();
        assert!(matches!(err, OpcUaError::Export(ExportError::FailedResult { .. })));
        assert!(!dir.path().join("never").exists());
    }
}
