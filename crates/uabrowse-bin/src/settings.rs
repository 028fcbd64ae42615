// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Settings file loading.
//!
//! The optional settings file supplies defaults for every command-line flag.
//! Format is chosen from the file extension (YAML, TOML or JSON), and
//! `UABROWSE_<SECTION>__<KEY>` environment variables override file values:
//!
//! ```text
//! UABROWSE_CONNECTION__SERVER_URL=opc.tcp://plc:4840
//! UABROWSE_BROWSE__DEPTH=5
//! UABROWSE_EXPORT__FORMAT=json
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::debug;

use uabrowse_opcua::ExportFormat;

use crate::error::{BinError, BinResult};

/// Environment variable prefix for settings overrides.
pub const ENV_PREFIX: &str = "UABROWSE";

// =============================================================================
// Settings
// =============================================================================

/// Settings loaded from the settings file and environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Connection defaults.
    pub connection: ConnectionSettings,
    /// Browse defaults.
    pub browse: BrowseSettings,
    /// Export defaults.
    pub export: ExportSettings,
}

/// Connection defaults. Every field is overridden by the matching flag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Server endpoint URL.
    pub server_url: Option<String>,
    /// Security policy name.
    pub security_policy: Option<String>,
    /// Security mode name.
    pub security_mode: Option<String>,
    /// Client certificate path.
    pub certificate: Option<PathBuf>,
    /// Client private key path.
    pub private_key: Option<PathBuf>,
    /// Username for authentication.
    pub username: Option<String>,
    /// Password for authentication.
    pub password: Option<String>,
    /// Application name presented to the server.
    pub application_name: Option<String>,
    /// Application URI; must match the client certificate.
    pub application_uri: Option<String>,
    /// PKI directory for server certificates.
    pub pki_dir: Option<String>,
    /// Trust server certificates without a trust-list entry.
    pub trust_server_certificates: Option<bool>,
    /// Session timeout, e.g. "60s".
    pub session_timeout: Option<String>,
    /// Per-request timeout, e.g. "10s".
    pub request_timeout: Option<String>,
}

/// Browse defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowseSettings {
    /// Start node id.
    pub node_id: String,
    /// Maximum browse depth.
    pub depth: i32,
}

impl Default for BrowseSettings {
    fn default() -> Self {
        Self {
            node_id: "i=84".to_string(),
            depth: 3,
        }
    }
}

/// Export defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Default export format name.
    pub format: String,
    /// Directory for generated file names. `None` uses `export/`.
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::default().name().to_string(),
            output_dir: None,
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl Settings {
    /// Loads settings from an optional file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> BinResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(BinError::config(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            debug!(path = %path.display(), "Loading settings file");
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(Config::try_deserialize)
            .with_context(|| match path {
                Some(path) => format!("Failed to load settings from {}", path.display()),
                None => "Failed to load settings from environment".to_string(),
            })?;

        Ok(settings)
    }

    /// Parses settings from a string in the given format.
    pub fn load_from_str(content: &str, format: FileFormat) -> BinResult<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(content, format))
            .build()
            .and_then(Config::try_deserialize)
            .context("Failed to parse settings")?;
        Ok(settings)
    }

    /// Returns the configured default export format.
    pub fn export_format(&self) -> BinResult<ExportFormat> {
        self.export
            .format
            .parse()
            .map_err(|e: uabrowse_opcua::OpcUaError| BinError::config(e.to_string()))
    }
}

impl ConnectionSettings {
    /// Parses the configured session timeout.
    pub fn session_timeout(&self) -> BinResult<Option<Duration>> {
        parse_duration("connection.session_timeout", self.session_timeout.as_deref())
    }

    /// Parses the configured request timeout.
    pub fn request_timeout(&self) -> BinResult<Option<Duration>> {
        parse_duration("connection.request_timeout", self.request_timeout.as_deref())
    }
}

fn parse_duration(key: &str, value: Option<&str>) -> BinResult<Option<Duration>> {
    value
        .map(|raw| {
            humantime::parse_duration(raw)
                .map_err(|e| BinError::config(format!("Invalid duration for {}: '{}' ({})", key, raw, e)))
        })
        .transpose()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.browse.node_id, "i=84");
        assert_eq!(settings.browse.depth, 3);
        assert_eq!(settings.export_format().unwrap(), ExportFormat::Csv);
        assert!(settings.connection.server_url.is_none());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
connection:
  server_url: opc.tcp://plc:4840
  security_policy: Basic256Sha256
  security_mode: SignAndEncrypt
  request_timeout: 5s
browse:
  depth: 6
export:
  format: xml
  output_dir: out
"#;
        let settings = Settings::load_from_str(yaml, FileFormat::Yaml).unwrap();
        assert_eq!(
            settings.connection.server_url.as_deref(),
            Some("opc.tcp://plc:4840")
        );
        assert_eq!(settings.connection.security_mode.as_deref(), Some("SignAndEncrypt"));
        assert_eq!(
            settings.connection.request_timeout().unwrap(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(settings.browse.node_id, "i=84");
        assert_eq!(settings.browse.depth, 6);
        assert_eq!(settings.export_format().unwrap(), ExportFormat::Xml);
        assert_eq!(settings.export.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_invalid_duration() {
        let toml = "[connection]\nsession_timeout = \"soon\"\n";
        let settings = Settings::load_from_str(toml, FileFormat::Toml).unwrap();
        let err = settings.connection.session_timeout().unwrap_err();
        assert!(err.to_string().contains("connection.session_timeout"));
    }

    #[test]
    fn test_invalid_export_format() {
        let settings = Settings::load_from_str(r#"{"export": {"format": "yaml"}}"#, FileFormat::Json).unwrap();
        assert!(matches!(settings.export_format(), Err(BinError::Configuration(_))));
    }

    #[test]
    fn test_load_file_by_extension() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[browse]\nnode_id = \"i=85\"").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.browse.node_id, "i=85");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Some(Path::new("/nonexistent/uabrowse.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Settings file not found"));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "browse: [unclosed").unwrap();

        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, BinError::Configuration(_)));
        assert!(err.to_string().contains("Failed to load settings"));
    }
}
