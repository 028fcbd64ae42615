// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! uabrowse - OPC UA address-space browser
//!
//! Main binary entry point.

use tracing::warn;

use uabrowse_bin::{BinError, Cli, EXIT_CANCELLED, commands, init_logging, report_error_and_exit};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_logging(cli.effective_log_level(), cli.log_format);

    match commands::execute(&cli).await {
        Ok(()) => {}
        Err(BinError::Cancelled) => {
            warn!("Operation cancelled by user");
            std::process::exit(EXIT_CANCELLED);
        }
        Err(error) => report_error_and_exit(error),
    }
}
