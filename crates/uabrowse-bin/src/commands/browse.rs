// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `browse` command.

use std::future::Future;

use tracing::info;

use uabrowse_opcua::{BrowseOptions, BrowseResult, BrowseSession, render_tree, with_session_until};

use super::{Target, log_banner, open_session, shutdown_signal};
use crate::cli::BrowseArgs;
use crate::error::{BinError, BinResult};
use crate::settings::Settings;

/// Executes the `browse` command and prints the tree to stdout.
pub async fn browse(args: &BrowseArgs, settings: &Settings) -> BinResult<()> {
    let target = Target::resolve(&args.connection, settings)?;
    log_banner("BROWSE OPERATION PARAMETERS", &target.banner_rows());

    let mut session = open_session(target.config.clone())?;
    let options = BrowseOptions::default().with_max_depth(target.depth);
    let result = browse_with(&mut session, &target.node_id, options, shutdown_signal()).await?;

    print!("{}", render_tree(&result));

    if result.success {
        Ok(())
    } else {
        Err(BinError::browse(result.error_message.unwrap_or_default()))
    }
}

/// Browses inside a scoped session and returns the result.
///
/// A failed browse is returned as a result with `success == false`; only
/// connection failures surface as errors. When `cancel` resolves first the
/// session is closed and [`BinError::Cancelled`] is returned.
pub async fn browse_with<S, C>(
    session: &mut S,
    node_id: &str,
    options: BrowseOptions,
    cancel: C,
) -> BinResult<BrowseResult>
where
    S: BrowseSession,
    C: Future<Output = ()>,
{
    let node_id = node_id.to_string();

    let outcome = with_session_until(session, cancel, move |s| {
        Box::pin(async move {
            info!("Starting address space browse...");
            Ok(uabrowse_opcua::browse(s, &node_id, &options).await)
        })
    })
    .await
    .inspect_err(|e| e.log("browse"))?;

    outcome.ok_or(BinError::Cancelled)
}

// =============================================================================
// Tests
// =============================================================================
