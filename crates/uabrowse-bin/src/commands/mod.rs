// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `browse`: print the address space as a tree
//! - `export`: write the address space to a file
//!
//! Both commands resolve their connection from flags layered over the
//! settings file, log a parameter banner, and run inside a scoped session.

mod browse;
mod export;

pub use browse::{browse, browse_with};
pub use export::{ExportSummary, export, export_with, resolve_format};

use tracing::{info, warn};

use uabrowse_opcua::{OpcUaConfig, SecurityMode, SecurityPolicy};

use crate::cli::{Cli, Commands, ConnectionArgs};
use crate::error::{BinError, BinResult};
use crate::settings::Settings;

/// Default OPC UA TCP port, shown when the URL names none.
const DEFAULT_PORT: u16 = 4840;

const BANNER_WIDTH: usize = 80;

/// Executes the appropriate command based on CLI arguments.
pub async fn execute(cli: &Cli) -> BinResult<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Browse(args) => browse::browse(args, &settings).await,
        Commands::Export(args) => export::export(args, &settings).await,
    }
}

/// Resolves on Ctrl-C.
///
/// Never resolves when the handler cannot be installed, so the command runs
/// to completion instead of cancelling itself.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Ctrl-C handler unavailable: {}", e);
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// Connection Target
// =============================================================================

/// Connection, start node and depth after flags are merged with settings.
#[derive(Debug, Clone)]
pub struct Target {
    /// Validated client configuration.
    pub config: OpcUaConfig,
    /// Start node id, not yet validated.
    pub node_id: String,
    /// Maximum browse depth.
    pub depth: i32,
}

impl Target {
    /// Merges command-line flags over settings. Flags win.
    pub fn resolve(args: &ConnectionArgs, settings: &Settings) -> BinResult<Self> {
        let conn = &settings.connection;

        let endpoint = args
            .server_url
            .clone()
            .or_else(|| conn.server_url.clone())
            .ok_or_else(|| {
                BinError::config(
                    "Server URL is required: pass --server-url or set connection.server_url",
                )
            })?;

        let policy = match (args.security, conn.security_policy.as_deref()) {
            (Some(policy), _) => policy,
            (None, Some(name)) => name.parse().map_err(invalid_setting)?,
            (None, None) => SecurityPolicy::None,
        };
        let mode = match (args.mode, conn.security_mode.as_deref()) {
            (Some(mode), _) => Some(mode),
            (None, Some(name)) => Some(name.parse::<SecurityMode>().map_err(invalid_setting)?),
            (None, None) => None,
        };

        let mut builder = OpcUaConfig::builder()
            .endpoint(endpoint)
            .security_policy(policy);
        if let Some(mode) = mode {
            builder = builder.security_mode(mode);
        }
        if let Some(cert) = args.cert.as_ref().or(conn.certificate.as_ref()) {
            builder = builder.certificate_path(cert.to_string_lossy());
        }
        if let Some(key) = args.key.as_ref().or(conn.private_key.as_ref()) {
            builder = builder.private_key_path(key.to_string_lossy());
        }
        if let Some(user) = args.user.as_ref().or(conn.username.as_ref()) {
            let password = args
                .password
                .as_ref()
                .or(conn.password.as_ref())
                .cloned()
                .unwrap_or_default();
            builder = builder.username(user.clone(), password);
        }
        if let Some(name) = &conn.application_name {
            builder = builder.application_name(name.clone());
        }
        if let Some(uri) = &conn.application_uri {
            builder = builder.application_uri(uri.clone());
        }
        if let Some(dir) = &conn.pki_dir {
            builder = builder.pki_dir(dir.clone());
        }
        if let Some(trust) = conn.trust_server_certificates {
            builder = builder.trust_server_certificates(trust);
        }
        if let Some(timeout) = conn.session_timeout()? {
            builder = builder.session_timeout(timeout);
        }
        if let Some(timeout) = conn.request_timeout()? {
            builder = builder.request_timeout(timeout);
        }

        let config = builder.build().map_err(invalid_setting)?;

        Ok(Self {
            config,
            node_id: args
                .node_id
                .clone()
                .unwrap_or_else(|| settings.browse.node_id.clone()),
            depth: args.depth.unwrap_or(settings.browse.depth),
        })
    }

    /// Banner rows shared by both commands.
    fn banner_rows(&self) -> Vec<(&'static str, String)> {
        let config = &self.config;
        let mut rows = vec![
            (
                "Server URL",
                format!("{} ({})", config.endpoint, host_port(&config.endpoint)),
            ),
            ("Start Node", self.node_id.clone()),
            ("Max Depth", self.depth.to_string()),
            ("Security Policy", config.security_policy.name().to_string()),
        ];

        if config.uses_security() {
            rows.push(("Security Mode", config.effective_security_mode().to_string()));
            rows.push((
                "Certificate",
                config.certificate_path.clone().unwrap_or_default(),
            ));
            rows.push((
                "Private Key",
                config.private_key_path.clone().unwrap_or_default(),
            ));
        }

        if let Some((username, password)) = config.user_token.credentials() {
            rows.push(("Username", username.to_string()));
            rows.push(("Password", mask_password(password)));
        }

        rows
    }
}

fn invalid_setting(err: uabrowse_opcua::OpcUaError) -> BinError {
    BinError::config(err.to_string())
}

// =============================================================================
// Session Construction
// =============================================================================

#[cfg(feature = "real-transport")]
fn open_session(config: OpcUaConfig) -> BinResult<uabrowse_opcua::OpcUaSession> {
    Ok(uabrowse_opcua::OpcUaSession::new(config))
}

#[cfg(not(feature = "real-transport"))]
fn open_session(_config: OpcUaConfig) -> BinResult<uabrowse_opcua::MemorySession> {
    Err(BinError::config(
        "This build has no OPC UA transport; rebuild with the 'real-transport' feature",
    ))
}

// =============================================================================
// Parameter Banner
// =============================================================================

fn log_banner(title: &str, rows: &[(&str, String)]) {
    let rule = "=".repeat(BANNER_WIDTH);
    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 2;

    info!("{}", rule);
    info!("{}", title);
    info!("{}", rule);
    for (label, value) in rows {
        info!("{:<width$}{}", format!("{}:", label), value, width = label_width);
    }
    info!("{}", rule);
}

/// Returns `host:port` for an endpoint URL, defaulting the port to 4840.
pub(crate) fn host_port(endpoint: &str) -> String {
    let rest = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    let authority = rest.split('/').next().unwrap_or(rest);

    let has_port = match authority.rsplit_once(':') {
        Some((_, port)) => !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()),
        None => false,
    };
    if has_port {
        authority.to_string()
    } else {
        format!("{}:{}", authority, DEFAULT_PORT)
    }
}

pub(crate) fn mask_password(password: &str) -> String {
    if password.is_empty() {
        "Not set".to_string()
    } else {
        "*".repeat(password.chars().count())
    }
}

// =============================================================================
// Tests
// =============================================================================
