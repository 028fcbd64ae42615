// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `browse`: walk the address space and print it as a tree
//! - `export`: walk the address space and write it to CSV, JSON or XML

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use uabrowse_opcua::{ExportFormat, OpcUaError, SecurityMode, SecurityPolicy};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// uabrowse - OPC UA address-space browser
///
/// Connects to an OPC UA server, walks the node hierarchy from a start node,
/// and prints it as a tree or exports it to a file.
#[derive(Parser, Debug)]
#[command(
    name = "uabrowse",
    author = "Sylvex <contact@sylvex.io>",
    version = uabrowse_opcua::VERSION,
    about = "OPC UA address-space browser and exporter",
    long_about = None,
    propagate_version = true,
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Settings file path (YAML, TOML or JSON)
    #[arg(short, long, env = "UABROWSE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "UABROWSE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "UABROWSE_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

const EXAMPLES: &str = "\
Examples:
  uabrowse browse -s opc.tcp://localhost:4840
  uabrowse browse -s opc.tcp://localhost:4840 -n i=85 -d 2
  uabrowse export -s opc.tcp://localhost:4840 -f json -o nodes.json --include-values
  uabrowse export -s opc.tcp://localhost:4840 --security Basic256Sha256 -m SignAndEncrypt \\
      --cert client.pem --key client.key -u operator -p secret";

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Browse the address space and display the tree structure
    Browse(BrowseArgs),

    /// Export the address space to a file
    Export(ExportArgs),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Connection, start node and security arguments shared by every command.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// OPC UA server endpoint URL (e.g. opc.tcp://localhost:4840)
    #[arg(short, long)]
    pub server_url: Option<String>,

    /// Starting node ID [default: i=84]
    #[arg(short, long)]
    pub node_id: Option<String>,

    /// Maximum browse depth [default: 3]
    #[arg(short, long, allow_negative_numbers = true)]
    pub depth: Option<i32>,

    /// Security policy [default: None]
    #[arg(long, value_parser = parse_policy, help_heading = "Security Options")]
    pub security: Option<SecurityPolicy>,

    /// Security mode, required when --security is not None: Sign, SignAndEncrypt
    #[arg(short, long, value_parser = parse_mode, help_heading = "Security Options")]
    pub mode: Option<SecurityMode>,

    /// Client certificate file (required for non-None security)
    #[arg(long, help_heading = "Security Options")]
    pub cert: Option<PathBuf>,

    /// Client private key file (required for non-None security)
    #[arg(long, help_heading = "Security Options")]
    pub key: Option<PathBuf>,

    /// Username for authentication
    #[arg(short, long, help_heading = "Authentication Options")]
    pub user: Option<String>,

    /// Password for authentication
    #[arg(
        short,
        long,
        env = "UABROWSE_PASSWORD",
        hide_env_values = true,
        help_heading = "Authentication Options"
    )]
    pub password: Option<String>,
}

/// Arguments for the `browse` command.
#[derive(Args, Debug, Default, Clone)]
pub struct BrowseArgs {
    /// Connection arguments
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Arguments for the `export` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ExportArgs {
    /// Connection arguments
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Export format: csv, json, xml [default: csv, or the --output extension]
    #[arg(short, long, value_parser = parse_format)]
    pub format: Option<ExportFormat>,

    /// Output file path [default: export/opcua_export_<timestamp>.<format>]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export only namespace-related nodes
    #[arg(long)]
    pub namespaces_only: bool,

    /// Include current values for Variable nodes
    #[arg(long)]
    pub include_values: bool,

    /// Export only nodes of this namespace index
    #[arg(long)]
    pub namespace_filter: Option<u16>,

    /// Read and export the extended attribute set
    #[arg(long)]
    pub full_export: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

fn parse_policy(s: &str) -> Result<SecurityPolicy, String> {
    s.parse().map_err(|e: OpcUaError| e.to_string())
}

fn parse_mode(s: &str) -> Result<SecurityMode, String> {
    s.parse().map_err(|e: OpcUaError| e.to_string())
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    s.parse().map_err(|e: OpcUaError| e.to_string())
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check if verbose logging is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Get the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_defaults() {
        let cli = Cli::parse_from(["uabrowse", "browse", "-s", "opc.tcp://localhost:4840"]);
        let Commands::Browse(args) = cli.command else {
            panic!("Expected Browse command");
        };
        assert_eq!(args.connection.server_url.as_deref(), Some("opc.tcp://localhost:4840"));
        assert_eq!(args.connection.node_id, None);
        assert_eq!(args.connection.depth, None);
        assert_eq!(args.connection.security, None);
    }

    #[test]
    fn test_negative_depth() {
        let cli = Cli::parse_from(["uabrowse", "browse", "-d", "-1"]);
        let Commands::Browse(args) = cli.command else {
            panic!("Expected Browse command");
        };
        assert_eq!(args.connection.depth, Some(-1));
    }

    #[test]
    fn test_security_flags() {
        let cli = Cli::parse_from([
            "uabrowse",
            "browse",
            "--security",
            "Aes128_Sha256_RsaOaep",
            "-m",
            "SignAndEncrypt",
            "--cert",
            "client.pem",
            "--key",
            "client.key",
            "-u",
            "operator",
            "-p",
            "secret",
        ]);
        let Commands::Browse(args) = cli.command else {
            panic!("Expected Browse command");
        };
        let conn = args.connection;
        assert_eq!(conn.security, Some(SecurityPolicy::Aes128Sha256RsaOaep));
        assert_eq!(conn.mode, Some(SecurityMode::SignAndEncrypt));
        assert_eq!(conn.cert, Some(PathBuf::from("client.pem")));
        assert_eq!(conn.user.as_deref(), Some("operator"));
        assert_eq!(conn.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = Cli::try_parse_from(["uabrowse", "browse", "--security", "Rot13"]).unwrap_err();
        assert!(err.to_string().contains("Unknown security policy 'Rot13'"));
    }

    #[test]
    fn test_export_command() {
        let cli = Cli::parse_from([
            "uabrowse",
            "export",
            "-s",
            "opc.tcp://plc:4840",
            "-f",
            "JSON",
            "-o",
            "out/nodes.json",
            "--include-values",
            "--namespace-filter",
            "2",
            "--full-export",
        ]);
        let Commands::Export(args) = cli.command else {
            panic!("Expected Export command");
        };
        assert_eq!(args.format, Some(ExportFormat::Json));
        assert_eq!(args.output, Some(PathBuf::from("out/nodes.json")));
        assert!(args.include_values);
        assert!(!args.namespaces_only);
        assert_eq!(args.namespace_filter, Some(2));
        assert!(args.full_export);
    }

    #[test]
    fn test_unsupported_format_rejected() {
        assert!(Cli::try_parse_from(["uabrowse", "export", "-f", "yaml"]).is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["uabrowse"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["uabrowse", "browse", "-q", "-c", "site.toml"]);
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("site.toml")));
        assert_eq!(cli.effective_log_level(), "warn");
    }

    #[test]
    fn test_verbose_mode() {
        let cli = Cli::parse_from(["uabrowse", "-v", "browse"]);
        assert!(cli.is_verbose());
        assert_eq!(cli.effective_log_level(), "debug");
    }

    #[test]
    fn test_log_format() {
        let cli = Cli::parse_from(["uabrowse", "--log-format", "json", "browse"]);
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
