// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `export` command.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{error, info, warn};

use uabrowse_opcua::{
    BrowseOptions, BrowseSession, ExportError, ExportFormat, Exporter, OpcUaError,
    with_session_until,
};

use super::{Target, log_banner, open_session, shutdown_signal};
use crate::cli::ExportArgs;
use crate::error::{BinError, BinResult};
use crate::settings::Settings;

/// What an export wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Absolute path of the written file.
    pub path: PathBuf,
    /// Number of nodes written.
    pub total_nodes: usize,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// Executes the `export` command.
pub async fn export(args: &ExportArgs, settings: &Settings) -> BinResult<()> {
    let target = Target::resolve(&args.connection, settings)?;
    let format = resolve_format(args.format, args.output.as_deref(), settings.export_format()?);
    let exporter = Exporter::new(format, args.full_export);

    let output = args.output.clone().or_else(|| {
        settings.export.output_dir.as_ref().map(|dir| {
            let generated = exporter.default_output_path(Local::now());
            match generated.file_name() {
                Some(name) => dir.join(name),
                None => dir.join(generated),
            }
        })
    });

    let mut rows = target.banner_rows();
    rows.push(("Export Format", format.name().to_uppercase()));
    rows.push((
        "Output File",
        output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Auto-generated".to_string()),
    ));
    rows.push(("Include Values", args.include_values.to_string()));
    rows.push(("Namespaces Only", args.namespaces_only.to_string()));
    if let Some(index) = args.namespace_filter {
        rows.push(("Namespace Filter", index.to_string()));
    }
    rows.push(("Full Export", args.full_export.to_string()));
    log_banner("EXPORT OPERATION PARAMETERS", &rows);

    let options = BrowseOptions::default()
        .with_max_depth(target.depth)
        .with_values(args.include_values)
        .with_full_attributes(args.full_export)
        .with_namespaces_only(args.namespaces_only)
        .with_namespace_filter(args.namespace_filter);

    let mut session = open_session(target.config.clone())?;
    let summary = export_with(
        &mut session,
        &target.node_id,
        options,
        exporter,
        output,
        shutdown_signal(),
    )
    .await
    .inspect_err(|e| {
        if !matches!(e, BinError::Cancelled) {
            error!("❌ Export operation failed");
        }
    })?;

    info!("✅ Export completed: {}", summary.path.display());
    info!("   Total nodes exported: {}", summary.total_nodes);
    info!("   File size: {:.2} KB", summary.size_bytes as f64 / 1024.0);
    Ok(())
}

/// Browses and exports inside one scoped session.
///
/// The session stays open until the file is written. A failed browse is
/// reported as [`ExportError::FailedResult`] and writes nothing. When
/// `cancel` resolves first the session is closed and
/// [`BinError::Cancelled`] is returned.
pub async fn export_with<S, C>(
    session: &mut S,
    node_id: &str,
    options: BrowseOptions,
    exporter: Exporter,
    output: Option<PathBuf>,
    cancel: C,
) -> BinResult<ExportSummary>
where
    S: BrowseSession,
    C: Future<Output = ()>,
{
    let node_id = node_id.to_string();

    let outcome = with_session_until(session, cancel, move |s| {
        Box::pin(async move {
            info!("Starting address space browse...");
            let result = uabrowse_opcua::browse(s, &node_id, &options).await;

            if !result.success {
                let message = result.error_message.unwrap_or_default();
                error!("❌ Browse failed: {}", message);
                return Err(OpcUaError::from(ExportError::failed_result(message)));
            }

            info!(
                "Exporting {} nodes to {}...",
                result.total_nodes,
                exporter.format().name().to_uppercase()
            );
            let path = exporter.export(&result, output.as_deref())?;
            let size_bytes = std::fs::metadata(&path)
                .map(|m| m.len())
                .map_err(|e| ExportError::io(path.clone(), e))?;

            Ok(ExportSummary {
                path,
                total_nodes: result.total_nodes,
                size_bytes,
            })
        })
    })
    .await
    .inspect_err(|e| e.log("export"))?;

    outcome.ok_or(BinError::Cancelled)
}

/// Picks the export format from the flag, the output extension and the default.
///
/// An explicit format always wins; a conflicting output extension only warns.
/// Without a flag a recognised output extension decides.
pub fn resolve_format(
    explicit: Option<ExportFormat>,
    output: Option<&Path>,
    default: ExportFormat,
) -> ExportFormat {
    let detected = output.and_then(ExportFormat::from_path);

    match (explicit, detected) {
        (Some(format), Some(ext)) if format != ext => {
            warn!(
                "Output file extension suggests {} but --format is {}; using {}",
                ext.name().to_uppercase(),
                format.name().to_uppercase(),
                format.name().to_uppercase()
            );
            format
        }
        (Some(format), _) => format,
        (None, Some(ext)) => {
            info!("Auto-detected format from file extension: {}", ext.name().to_uppercase());
            ext
        }
        (None, None) => default,
    }
}

// =============================================================================
// Tests
// =============================================================================
