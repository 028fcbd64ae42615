// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Live server session using the `opcua` crate.
//!
//! The `opcua` 0.12 client API is blocking and drives its own runtime, so
//! every service call runs on the blocking pool and is bounded by the
//! configured request timeout.
//!
//! # Example
//!
//! ```rust,ignore
//! use uabrowse_opcua::session::{with_session, OpcUaSession};
//! use uabrowse_opcua::types::OpcUaConfig;
//!
//! let config = OpcUaConfig::builder()
//!     .endpoint("opc.tcp://localhost:4840")
//!     .build()?;
//!
//! let mut session = OpcUaSession::new(config);
//! let result = with_session(&mut session, |s| {
//!     Box::pin(async move { Ok(browse(s, "i=85", &BrowseOptions::default()).await) })
//! })
//! .await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, trace};

use opcua::client::prelude::*;
use opcua::sync::RwLock as OpcUaRwLock;

use super::{BrowseSession, NodeRef, SessionResult, TypedValue};
use crate::error::{
    ConnectionError, OpcUaError, OpcUaResult, SessionError, describe_status, status_code_name,
};
use crate::types::{
    AttributeId, NodeClass, NodeId, NodeIdentifier, OpcUaConfig, OpcUaDataType, OpcUaValue,
    SecurityMode, SecurityPolicy, UserTokenType,
};

type SharedSession = Arc<OpcUaRwLock<Session>>;

// =============================================================================
// OpcUaSession
// =============================================================================

/// A [`BrowseSession`] backed by a live OPC UA server.
pub struct OpcUaSession {
    config: OpcUaConfig,
    session: Option<SharedSession>,
}

impl OpcUaSession {
    /// Creates a disconnected session for a configuration.
    pub fn new(config: OpcUaConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OpcUaConfig {
        &self.config
    }

    /// Returns `true` while a server session is open.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Runs a blocking service call against the open session.
    async fn call<T, F>(&self, node_id: &str, op: F) -> SessionResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Session) -> SessionResult<T> + Send + 'static,
    {
        let session = self.session.clone().ok_or_else(|| {
            SessionError::from_status("BadServerNotConnected", "Not connected to server")
                .with_node(node_id)
        })?;

        let task = tokio::task::spawn_blocking(move || {
            let guard = session.read();
            op(&guard)
        });

        match tokio::time::timeout(self.config.request_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(SessionError::from_status(
                "BadUnexpectedError",
                format!("Service task failed: {join}"),
            )
            .with_node(node_id)),
            Err(_) => Err(SessionError::timeout(self.config.request_timeout).with_node(node_id)),
        }
    }

    /// Reads one attribute and returns the raw variant.
    async fn read_variant(&self, node: &NodeRef, attribute: AttributeId) -> SessionResult<Variant> {
        let id = node.id_string();
        let read_value_id = ReadValueId {
            node_id: to_opcua_node_id(&node.node_id),
            attribute_id: attribute.value(),
            index_range: UAString::null(),
            data_encoding: QualifiedName::null(),
        };

        trace!(node_id = %id, attribute = %attribute, "Reading attribute");

        let owned = id.clone();
        self.call(&id, move |session| {
            let values = session
                .read(&[read_value_id], TimestampsToReturn::Neither, 0.0)
                .map_err(|code| status_error(code, &owned, &format!("Read {attribute}")))?;

            let data_value = values.into_iter().next().ok_or_else(|| {
                SessionError::from_status("BadUnexpectedError", "Empty read response")
                    .with_node(owned.clone())
            })?;

            if let Some(status) = data_value.status {
                if status.is_bad() {
                    return Err(status_error(status, &owned, &format!("Read {attribute}")));
                }
            }

            Ok(data_value.value.unwrap_or(Variant::Empty))
        })
        .await
    }
}

impl std::fmt::Debug for OpcUaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpcUaSession")
            .field("endpoint", &self.config.endpoint)
            .field("connected", &self.is_connected())
            .finish()
    }
}

// =============================================================================
// BrowseSession
// =============================================================================

#[async_trait]
impl BrowseSession for OpcUaSession {
    async fn connect(&mut self) -> OpcUaResult<()> {
        self.config.validate()?;
        self.config.validate_files()?;

        info!(
            endpoint = %self.config.endpoint,
            policy = self.config.security_policy.name(),
            mode = self.config.effective_security_mode().name(),
            "Connecting to OPC UA server"
        );

        let config = self.config.clone();
        let endpoint = config.endpoint.clone();
        let session = tokio::task::spawn_blocking(move || open_session(&config))
            .await
            .map_err(|e| ConnectionError::client_setup(&endpoint, e.to_string()))??;

        self.session = Some(session);
        info!(endpoint = %self.config.endpoint, "Connected to OPC UA server");
        Ok(())
    }

    async fn disconnect(&mut self) -> OpcUaResult<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        info!(endpoint = %self.config.endpoint, "Disconnecting from OPC UA server");
        tokio::task::spawn_blocking(move || session.read().disconnect())
            .await
            .map_err(|e| ConnectionError::client_setup(&self.config.endpoint, e.to_string()))?;
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn namespace_table(&self) -> SessionResult<Vec<String>> {
        let node = NodeRef::new(NodeId::numeric(0, NodeId::NAMESPACE_ARRAY));
        match from_variant(&self.read_variant(&node, AttributeId::Value).await?) {
            OpcUaValue::Array(items) => Ok(items.iter().map(ToString::to_string).collect()),
            OpcUaValue::String(uri) => Ok(vec![uri]),
            other => Err(SessionError::malformed(
                node.id_string(),
                format!("NamespaceArray is not a string array: {other}"),
            )),
        }
    }

    async fn resolve(&self, node_id: &str) -> SessionResult<NodeRef> {
        let parsed: NodeId = node_id
            .parse()
            .map_err(|e: OpcUaError| SessionError::malformed(node_id, e.to_string()))?;
        let node = NodeRef::new(parsed);

        // The NodeClass read doubles as the existence check.
        self.node_class(&node).await?;
        Ok(node)
    }

    async fn node_class(&self, node: &NodeRef) -> SessionResult<NodeClass> {
        let variant = self.read_variant(node, AttributeId::NodeClass).await?;
        let raw = match variant {
            Variant::Int32(v) => u32::try_from(v).ok(),
            Variant::UInt32(v) => Some(v),
            _ => None,
        };
        raw.and_then(NodeClass::from_value).ok_or_else(|| {
            SessionError::malformed(node.id_string(), format!("Unexpected NodeClass value {variant:?}"))
        })
    }

    async fn browse_name(&self, node: &NodeRef) -> SessionResult<String> {
        match self.read_variant(node, AttributeId::BrowseName).await? {
            Variant::QualifiedName(name) => Ok(name.name.as_ref().to_string()),
            other => Ok(from_variant(&other).to_string()),
        }
    }

    async fn display_name(&self, node: &NodeRef) -> SessionResult<String> {
        match self.read_variant(node, AttributeId::DisplayName).await? {
            Variant::LocalizedText(text) => Ok(text.text.as_ref().to_string()),
            other => Ok(from_variant(&other).to_string()),
        }
    }

    async fn children(&self, node: &NodeRef) -> SessionResult<Vec<NodeRef>> {
        let id = node.id_string();
        let description = BrowseDescription {
            node_id: to_opcua_node_id(&node.node_id),
            browse_direction: BrowseDirection::Forward,
            reference_type_id: ReferenceTypeId::HierarchicalReferences.into(),
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: BrowseDescriptionResultMask::all().bits(),
        };

        trace!(node_id = %id, "Browsing children");

        let owned = id.clone();
        self.call(&id, move |session| {
            let mut children = Vec::new();
            let mut results = session
                .browse(&[description])
                .map_err(|code| status_error(code, &owned, "Browse"))?;

            loop {
                let Some(result) = results.and_then(|r| r.into_iter().next()) else {
                    break;
                };
                if result.status_code.is_bad() {
                    return Err(status_error(result.status_code, &owned, "Browse"));
                }

                children.extend(
                    result
                        .references
                        .unwrap_or_default()
                        .iter()
                        .map(|r| NodeRef::new(from_opcua_node_id(&r.node_id.node_id))),
                );

                if result.continuation_point.is_null() {
                    break;
                }
                results = session
                    .browse_next(false, &[result.continuation_point])
                    .map_err(|code| status_error(code, &owned, "BrowseNext"))?;
            }

            Ok(children)
        })
        .await
    }

    async fn data_type(&self, node: &NodeRef) -> SessionResult<NodeId> {
        match self.read_variant(node, AttributeId::DataType).await? {
            Variant::NodeId(id) => Ok(from_opcua_node_id(&id)),
            other => Err(SessionError::malformed(
                node.id_string(),
                format!("DataType attribute is not a NodeId: {other:?}"),
            )),
        }
    }

    async fn value(&self, node: &NodeRef) -> SessionResult<TypedValue> {
        let variant = self.read_variant(node, AttributeId::Value).await?;
        Ok(TypedValue {
            value: from_variant(&variant),
            type_hint: variant_type(&variant),
        })
    }

    async fn read_attribute(
        &self,
        node: &NodeRef,
        attribute: AttributeId,
    ) -> SessionResult<OpcUaValue> {
        Ok(from_variant(&self.read_variant(node, attribute).await?))
    }
}

// =============================================================================
// Connection setup
// =============================================================================

fn open_session(config: &OpcUaConfig) -> OpcUaResult<SharedSession> {
    let mut client = build_client(config)?;
    let url = config.endpoint.as_str();

    let endpoints = client.get_server_endpoints_from_url(url).map_err(|code| {
        ConnectionError::endpoint_not_found(
            url,
            describe_status(&code.to_string(), Some(status_code_name(code.bits()))),
        )
    })?;
    debug!(count = endpoints.len(), "Server endpoints discovered");

    let policy = to_opcua_policy(config.security_policy);
    let mode = to_message_security_mode(config.effective_security_mode());

    let endpoint = endpoints
        .iter()
        .find(|e| e.security_policy_uri.as_ref() == policy.to_uri() && e.security_mode == mode)
        .cloned()
        .ok_or_else(|| {
            ConnectionError::no_suitable_endpoint(
                url,
                config.security_policy.name(),
                config.effective_security_mode().name(),
            )
        })?;

    debug!(
        security_policy = %endpoint.security_policy_uri,
        security_mode = ?endpoint.security_mode,
        "Found matching endpoint"
    );

    client
        .connect_to_endpoint(endpoint, identity_token(&config.user_token))
        .map_err(|code| {
            let status = status_code_name(code.bits());
            OpcUaError::from(ConnectionError::rejected(
                url,
                Some(status.to_string()),
                describe_status(&code.to_string(), Some(status)),
            ))
        })
}

fn build_client(config: &OpcUaConfig) -> OpcUaResult<Client> {
    let mut builder = ClientBuilder::new()
        .application_name(config.application_name.as_str())
        .application_uri(config.effective_application_uri())
        .product_uri(config.effective_application_uri())
        .pki_dir(PathBuf::from(&config.pki_dir))
        .trust_server_certs(config.trust_server_certificates)
        .session_retry_limit(0)
        .session_timeout(u32::try_from(config.session_timeout.as_millis()).unwrap_or(u32::MAX));

    if config.uses_security() {
        if let (Some(cert), Some(key)) = (&config.certificate_path, &config.private_key_path) {
            builder = builder
                .certificate_path(PathBuf::from(cert))
                .private_key_path(PathBuf::from(key));
        }
    }

    builder.client().ok_or_else(|| {
        ConnectionError::client_setup(&config.endpoint, "Failed to build OPC UA client").into()
    })
}

fn identity_token(token: &UserTokenType) -> IdentityToken {
    match token {
        UserTokenType::Anonymous => IdentityToken::Anonymous,
        UserTokenType::UserName { username, password } => {
            IdentityToken::UserName(username.clone(), password.clone())
        }
        UserTokenType::Certificate {
            certificate_path,
            private_key_path,
        } => IdentityToken::X509(
            PathBuf::from(certificate_path),
            PathBuf::from(private_key_path),
        ),
    }
}

fn to_opcua_policy(policy: SecurityPolicy) -> opcua::client::prelude::SecurityPolicy {
    use opcua::client::prelude::SecurityPolicy as Ua;
    match policy {
        SecurityPolicy::None => Ua::None,
        SecurityPolicy::Basic128Rsa15 => Ua::Basic128Rsa15,
        SecurityPolicy::Basic256 => Ua::Basic256,
        SecurityPolicy::Basic256Sha256 => Ua::Basic256Sha256,
        SecurityPolicy::Aes128Sha256RsaOaep => Ua::Aes128Sha256RsaOaep,
        SecurityPolicy::Aes256Sha256RsaPss => Ua::Aes256Sha256RsaPss,
    }
}

fn to_message_security_mode(mode: SecurityMode) -> MessageSecurityMode {
    match mode {
        SecurityMode::None => MessageSecurityMode::None,
        SecurityMode::Sign => MessageSecurityMode::Sign,
        SecurityMode::SignAndEncrypt => MessageSecurityMode::SignAndEncrypt,
    }
}

// =============================================================================
// Conversions
// =============================================================================

fn status_error(code: StatusCode, node_id: &str, action: &str) -> SessionError {
    let status = status_code_name(code.bits());
    SessionError::from_status(status, describe_status(&format!("{action} failed: {code}"), Some(status)))
        .with_node(node_id)
}

fn to_opcua_node_id(node_id: &NodeId) -> opcua::types::NodeId {
    let ns = node_id.namespace_index;
    match &node_id.identifier {
        NodeIdentifier::Numeric(v) => opcua::types::NodeId::new(ns, *v),
        NodeIdentifier::String(v) => opcua::types::NodeId::new(ns, v.clone()),
        NodeIdentifier::Guid(v) => opcua::types::NodeId::new(ns, Guid::from(*v)),
        NodeIdentifier::Opaque(v) => opcua::types::NodeId::new(ns, ByteString::from(v.as_slice())),
    }
}

fn from_opcua_node_id(node_id: &opcua::types::NodeId) -> NodeId {
    let ns = node_id.namespace;
    match &node_id.identifier {
        Identifier::Numeric(v) => NodeId::numeric(ns, *v),
        Identifier::String(v) => NodeId::string(ns, v.as_ref()),
        Identifier::Guid(v) => NodeId::guid(ns, uuid::Uuid::from_bytes(*v.as_bytes())),
        Identifier::ByteString(v) => NodeId::opaque(ns, v.value.clone().unwrap_or_default()),
    }
}

fn from_variant(variant: &Variant) -> OpcUaValue {
    match variant {
        Variant::Empty => OpcUaValue::Null,
        Variant::Boolean(v) => OpcUaValue::Boolean(*v),
        Variant::SByte(v) => OpcUaValue::SByte(*v),
        Variant::Byte(v) => OpcUaValue::Byte(*v),
        Variant::Int16(v) => OpcUaValue::Int16(*v),
        Variant::UInt16(v) => OpcUaValue::UInt16(*v),
        Variant::Int32(v) => OpcUaValue::Int32(*v),
        Variant::UInt32(v) => OpcUaValue::UInt32(*v),
        Variant::Int64(v) => OpcUaValue::Int64(*v),
        Variant::UInt64(v) => OpcUaValue::UInt64(*v),
        Variant::Float(v) => OpcUaValue::Float(*v),
        Variant::Double(v) => OpcUaValue::Double(*v),
        Variant::String(v) => OpcUaValue::String(v.as_ref().to_string()),
        Variant::XmlElement(v) => OpcUaValue::String(v.as_ref().to_string()),
        Variant::DateTime(v) => OpcUaValue::DateTime(
            chrono::DateTime::from_timestamp(
                v.as_chrono().timestamp(),
                v.as_chrono().timestamp_subsec_nanos(),
            )
            .unwrap_or_default(),
        ),
        Variant::Guid(v) => OpcUaValue::Guid(uuid::Uuid::from_bytes(*v.as_bytes())),
        Variant::ByteString(v) => OpcUaValue::ByteString(v.value.clone().unwrap_or_default()),
        Variant::StatusCode(v) => OpcUaValue::String(status_code_name(v.bits()).to_string()),
        Variant::QualifiedName(v) => OpcUaValue::String(v.name.as_ref().to_string()),
        Variant::LocalizedText(v) => OpcUaValue::LocalizedText(v.text.as_ref().to_string()),
        Variant::NodeId(v) => OpcUaValue::NodeId(from_opcua_node_id(v)),
        Variant::ExpandedNodeId(v) => OpcUaValue::NodeId(from_opcua_node_id(&v.node_id)),
        Variant::Variant(inner) => from_variant(inner),
        Variant::Array(arr) => OpcUaValue::Array(arr.values.iter().map(from_variant).collect()),
        other => OpcUaValue::String(format!("{other:?}")),
    }
}

/// Built-in type the server encoded `variant` with.
///
/// Arrays report their first element's type; structures and empty values
/// carry no hint.
fn variant_type(variant: &Variant) -> Option<OpcUaDataType> {
    let ty = match variant {
        Variant::Boolean(_) => OpcUaDataType::Boolean,
        Variant::SByte(_) => OpcUaDataType::SByte,
        Variant::Byte(_) => OpcUaDataType::Byte,
        Variant::Int16(_) => OpcUaDataType::Int16,
        Variant::UInt16(_) => OpcUaDataType::UInt16,
        Variant::Int32(_) => OpcUaDataType::Int32,
        Variant::UInt32(_) => OpcUaDataType::UInt32,
        Variant::Int64(_) => OpcUaDataType::Int64,
        Variant::UInt64(_) => OpcUaDataType::UInt64,
        Variant::Float(_) => OpcUaDataType::Float,
        Variant::Double(_) => OpcUaDataType::Double,
        Variant::String(_) => OpcUaDataType::String,
        Variant::DateTime(_) => OpcUaDataType::DateTime,
        Variant::Guid(_) => OpcUaDataType::Guid,
        Variant::ByteString(_) => OpcUaDataType::ByteString,
        Variant::XmlElement(_) => OpcUaDataType::XmlElement,
        Variant::NodeId(_) => OpcUaDataType::NodeId,
        Variant::ExpandedNodeId(_) => OpcUaDataType::ExpandedNodeId,
        Variant::StatusCode(_) => OpcUaDataType::StatusCode,
        Variant::QualifiedName(_) => OpcUaDataType::QualifiedName,
        Variant::LocalizedText(_) => OpcUaDataType::LocalizedText,
        Variant::Variant(inner) => return variant_type(inner),
        Variant::Array(arr) => return arr.values.first().and_then(variant_type),
        _ => return None,
    };
    Some(ty)
}
