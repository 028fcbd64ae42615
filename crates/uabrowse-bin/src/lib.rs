// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # uabrowse-bin
//!
//! CLI binary for the uabrowse OPC UA address-space browser.
//!
//! This crate provides the `uabrowse` entry point, including:
//!
//! - CLI argument parsing with clap
//! - Settings file loading with environment overrides
//! - Logging initialization
//! - The `browse` and `export` commands
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         main.rs                              │
//! │              (Entry Point, exit codes)                       │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                    ┌──────▼──────┐
//!                    │    cli.rs   │
//!                    │ (Argument   │
//!                    │  Parsing)   │
//!                    └──────┬──────┘
//!                           │
//!               ┌───────────┼───────────┐
//!               ▼           ▼           ▼
//!        ┌──────────┐ ┌──────────┐ ┌──────────┐
//!        │ commands │ │ settings │ │ logging  │
//!        └────┬─────┘ └──────────┘ └──────────┘
//!             │
//!      ┌──────▼────────┐
//!      │ uabrowse-opcua│
//!      │ (browse,      │
//!      │  export)      │
//!      └───────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Print the tree below the Root folder
//! uabrowse browse -s opc.tcp://localhost:4840
//!
//! # Export the Objects folder to JSON, five levels deep
//! uabrowse export -s opc.tcp://localhost:4840 -n i=85 -d 5 -o objects.json
//!
//! # Use a settings file
//! uabrowse -c uabrowse.yaml export --full-export
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod settings;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands, LogFormat};
pub use error::{BinError, BinResult, EXIT_CANCELLED, report_error, report_error_and_exit};
pub use logging::init_logging;
pub use settings::Settings;

/// Binary version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Binary name.
pub const NAME: &str = "uabrowse";
