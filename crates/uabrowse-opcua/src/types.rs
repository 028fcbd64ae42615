// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA protocol types used by the browser.
//!
//! - **NodeId**: The four node identifier forms with parsing and formatting
//! - **NodeClass / AttributeId**: Protocol enumerations for reads
//! - **OpcUaDataType / OpcUaValue**: Built-in data types and decoded values
//! - **SecurityMode / SecurityPolicy / UserTokenType**: Session security
//! - **OpcUaConfig**: Client connection configuration with builder
//!
//! # Examples
//!
//! ```
//! use uabrowse_opcua::types::{NodeId, OpcUaConfig};
//!
//! let node_id: NodeId = "ns=2;s=Line1.Motor".parse().unwrap();
//! assert_eq!(node_id.namespace_index, 2);
//!
//! let config = OpcUaConfig::builder()
//!     .endpoint("opc.tcp://localhost:4840")
//!     .build()
//!     .unwrap();
//! assert!(!config.uses_security());
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigurationError, OpcUaError, SecurityError};

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA Node Identifier.
///
/// A namespace index plus a numeric, string, GUID or opaque identifier.
///
/// # Examples
///
/// ```
/// use uabrowse_opcua::types::NodeId;
///
/// let numeric = NodeId::numeric(0, 85);
/// assert_eq!(numeric.to_opc_string(), "i=85");
///
/// let string = NodeId::string(2, "Boiler.Temperature");
/// assert_eq!(string.to_opc_string(), "ns=2;s=Boiler.Temperature");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// The Root folder (`i=84`), the default browse start point.
    pub const ROOT_FOLDER: u32 = 84;

    /// The Objects folder (`i=85`).
    pub const OBJECTS_FOLDER: u32 = 85;

    /// The Server object (`i=2253`).
    pub const SERVER: u32 = 2253;

    /// The Server NamespaceArray variable (`i=2255`).
    pub const NAMESPACE_ARRAY: u32 = 2255;

    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a numeric node ID.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node ID.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Returns the Root folder node ID.
    pub fn root_folder() -> Self {
        Self::numeric(0, Self::ROOT_FOLDER)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the numeric identifier, if this is a numeric node.
    pub fn as_numeric(&self) -> Option<u32> {
        match self.identifier {
            NodeIdentifier::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` for nodes of the standard namespace.
    #[inline]
    pub const fn is_standard(&self) -> bool {
        self.namespace_index == 0
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Converts to the OPC UA string format.
    ///
    /// Format: `ns=<namespace>;{i|s|g|b}=<identifier>`, with the namespace
    /// prefix omitted for namespace 0.
    pub fn to_opc_string(&self) -> String {
        let id_str = match &self.identifier {
            NodeIdentifier::Numeric(v) => format!("i={v}"),
            NodeIdentifier::String(v) => format!("s={v}"),
            NodeIdentifier::Guid(v) => format!("g={v}"),
            NodeIdentifier::Opaque(v) => format!("b={}", BASE64.encode(v)),
        };

        if self.namespace_index == 0 {
            id_str
        } else {
            format!("ns={};{}", self.namespace_index, id_str)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = OpcUaError;

    /// Parses a NodeId from OPC UA string format.
    ///
    /// Supported formats:
    /// - `i=84` (numeric, namespace 0)
    /// - `ns=2;i=1001` (numeric)
    /// - `ns=2;s=MyNode` (string)
    /// - `ns=2;g=550e8400-e29b-41d4-a716-446655440000` (GUID)
    /// - `ns=2;b=SGVsbG8=` (opaque, base64 encoded)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: String| {
            OpcUaError::configuration(ConfigurationError::invalid_node_id(s, reason))
        };

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns_str, id) = rest
                    .split_once(';')
                    .ok_or_else(|| invalid("Missing identifier after namespace".to_string()))?;
                let ns: u16 = ns_str
                    .parse()
                    .map_err(|_| invalid(format!("Invalid namespace index '{ns_str}'")))?;
                (ns, id)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            let value: u32 = id
                .parse()
                .map_err(|_| invalid("Invalid numeric identifier".to_string()))?;
            NodeIdentifier::Numeric(value)
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            let uuid = Uuid::parse_str(id).map_err(|e| invalid(format!("Invalid GUID: {e}")))?;
            NodeIdentifier::Guid(uuid)
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            let bytes = BASE64
                .decode(id)
                .map_err(|e| invalid(format!("Invalid base64: {e}")))?;
            NodeIdentifier::Opaque(bytes)
        } else {
            return Err(invalid(
                "Unknown identifier type. Expected i=, s=, g=, or b=".to_string(),
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// OPC UA node identifier forms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),

    /// String identifier.
    String(String),

    /// GUID identifier.
    Guid(Uuid),

    /// Opaque (byte string) identifier.
    Opaque(Vec<u8>),
}

// =============================================================================
// NodeClass
// =============================================================================

/// OPC UA node class.
///
/// Discriminants are the protocol's bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeClass {
    /// Object.
    Object = 1,
    /// Variable.
    Variable = 2,
    /// Method.
    Method = 4,
    /// ObjectType.
    ObjectType = 8,
    /// VariableType.
    VariableType = 16,
    /// ReferenceType.
    ReferenceType = 32,
    /// DataType.
    DataType = 64,
    /// View.
    View = 128,
}

impl NodeClass {
    /// Creates from the protocol value.
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Object),
            2 => Some(Self::Variable),
            4 => Some(Self::Method),
            8 => Some(Self::ObjectType),
            16 => Some(Self::VariableType),
            32 => Some(Self::ReferenceType),
            64 => Some(Self::DataType),
            128 => Some(Self::View),
            _ => None,
        }
    }

    /// Returns the protocol value.
    #[inline]
    pub const fn value(&self) -> u32 {
        *self as u32
    }

    /// Returns the class name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Variable => "Variable",
            Self::Method => "Method",
            Self::ObjectType => "ObjectType",
            Self::VariableType => "VariableType",
            Self::ReferenceType => "ReferenceType",
            Self::DataType => "DataType",
            Self::View => "View",
        }
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// AttributeId
// =============================================================================

/// OPC UA attribute identifiers read by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeId {
    /// NodeClass.
    NodeClass = 2,
    /// BrowseName.
    BrowseName = 3,
    /// DisplayName.
    DisplayName = 4,
    /// Description.
    Description = 5,
    /// WriteMask.
    WriteMask = 6,
    /// UserWriteMask.
    UserWriteMask = 7,
    /// EventNotifier.
    EventNotifier = 12,
    /// Value.
    Value = 13,
    /// DataType.
    DataType = 14,
    /// AccessLevel.
    AccessLevel = 17,
    /// UserAccessLevel.
    UserAccessLevel = 18,
    /// MinimumSamplingInterval.
    MinimumSamplingInterval = 19,
    /// Historizing.
    Historizing = 20,
    /// Executable.
    Executable = 21,
    /// UserExecutable.
    UserExecutable = 22,
}

impl AttributeId {
    /// Returns the protocol value.
    #[inline]
    pub const fn value(&self) -> u32 {
        *self as u32
    }

    /// Returns the attribute name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NodeClass => "NodeClass",
            Self::BrowseName => "BrowseName",
            Self::DisplayName => "DisplayName",
            Self::Description => "Description",
            Self::WriteMask => "WriteMask",
            Self::UserWriteMask => "UserWriteMask",
            Self::EventNotifier => "EventNotifier",
            Self::Value => "Value",
            Self::DataType => "DataType",
            Self::AccessLevel => "AccessLevel",
            Self::UserAccessLevel => "UserAccessLevel",
            Self::MinimumSamplingInterval => "MinimumSamplingInterval",
            Self::Historizing => "Historizing",
            Self::Executable => "Executable",
            Self::UserExecutable => "UserExecutable",
        }
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// OpcUaDataType
// =============================================================================

/// OPC UA built-in data types.
///
/// Discriminants are the standard-namespace type ids `i=1..=21`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpcUaDataType {
    /// Boolean value.
    Boolean = 1,
    /// Signed 8-bit integer.
    SByte = 2,
    /// Unsigned 8-bit integer.
    Byte = 3,
    /// Signed 16-bit integer.
    Int16 = 4,
    /// Unsigned 16-bit integer.
    UInt16 = 5,
    /// Signed 32-bit integer.
    Int32 = 6,
    /// Unsigned 32-bit integer.
    UInt32 = 7,
    /// Signed 64-bit integer.
    Int64 = 8,
    /// Unsigned 64-bit integer.
    UInt64 = 9,
    /// 32-bit IEEE 754 float.
    Float = 10,
    /// 64-bit IEEE 754 double.
    Double = 11,
    /// UTF-8 string.
    String = 12,
    /// Date and time.
    DateTime = 13,
    /// GUID.
    Guid = 14,
    /// Raw byte string.
    ByteString = 15,
    /// XML element.
    XmlElement = 16,
    /// Node ID.
    NodeId = 17,
    /// Expanded node ID.
    ExpandedNodeId = 18,
    /// Status code.
    StatusCode = 19,
    /// Qualified name.
    QualifiedName = 20,
    /// Localized text.
    LocalizedText = 21,
}

impl OpcUaDataType {
    /// Returns the OPC UA type ID.
    #[inline]
    pub const fn type_id(&self) -> u32 {
        *self as u32
    }

    /// Looks up a built-in type by its standard-namespace id.
    pub fn from_type_id(id: u32) -> Option<Self> {
        let ty = match id {
            1 => Self::Boolean,
            2 => Self::SByte,
            3 => Self::Byte,
            4 => Self::Int16,
            5 => Self::UInt16,
            6 => Self::Int32,
            7 => Self::UInt32,
            8 => Self::Int64,
            9 => Self::UInt64,
            10 => Self::Float,
            11 => Self::Double,
            12 => Self::String,
            13 => Self::DateTime,
            14 => Self::Guid,
            15 => Self::ByteString,
            16 => Self::XmlElement,
            17 => Self::NodeId,
            18 => Self::ExpandedNodeId,
            19 => Self::StatusCode,
            20 => Self::QualifiedName,
            21 => Self::LocalizedText,
            _ => return None,
        };
        Some(ty)
    }

    /// Returns the display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::SByte => "SByte",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Guid => "Guid",
            Self::ByteString => "ByteString",
            Self::XmlElement => "XmlElement",
            Self::NodeId => "NodeId",
            Self::ExpandedNodeId => "ExpandedNodeId",
            Self::StatusCode => "StatusCode",
            Self::QualifiedName => "QualifiedName",
            Self::LocalizedText => "LocalizedText",
        }
    }
}

impl fmt::Display for OpcUaDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// OpcUaValue
// =============================================================================

/// A decoded attribute or variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum OpcUaValue {
    /// Boolean value.
    Boolean(bool),
    /// Signed byte.
    SByte(i8),
    /// Unsigned byte.
    Byte(u8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 16-bit unsigned integer.
    UInt16(u16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 32-bit unsigned integer.
    UInt32(u32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit unsigned integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit double.
    Double(f64),
    /// String value.
    String(String),
    /// Date/time value.
    DateTime(chrono::DateTime<chrono::Utc>),
    /// GUID value.
    Guid(Uuid),
    /// Byte string.
    ByteString(Vec<u8>),
    /// Node ID value.
    NodeId(NodeId),
    /// Localized text (text part only).
    LocalizedText(String),
    /// Array of values.
    Array(Vec<OpcUaValue>),
    /// Null value.
    Null,
}

impl OpcUaValue {
    /// Returns the built-in data type of this value.
    ///
    /// Arrays report their first element's type; null reports `None`.
    pub fn data_type(&self) -> Option<OpcUaDataType> {
        let ty = match self {
            Self::Boolean(_) => OpcUaDataType::Boolean,
            Self::SByte(_) => OpcUaDataType::SByte,
            Self::Byte(_) => OpcUaDataType::Byte,
            Self::Int16(_) => OpcUaDataType::Int16,
            Self::UInt16(_) => OpcUaDataType::UInt16,
            Self::Int32(_) => OpcUaDataType::Int32,
            Self::UInt32(_) => OpcUaDataType::UInt32,
            Self::Int64(_) => OpcUaDataType::Int64,
            Self::UInt64(_) => OpcUaDataType::UInt64,
            Self::Float(_) => OpcUaDataType::Float,
            Self::Double(_) => OpcUaDataType::Double,
            Self::String(_) => OpcUaDataType::String,
            Self::DateTime(_) => OpcUaDataType::DateTime,
            Self::Guid(_) => OpcUaDataType::Guid,
            Self::ByteString(_) => OpcUaDataType::ByteString,
            Self::NodeId(_) => OpcUaDataType::NodeId,
            Self::LocalizedText(_) => OpcUaDataType::LocalizedText,
            Self::Array(items) => return items.first().and_then(Self::data_type),
            Self::Null => return None,
        };
        Some(ty)
    }

    /// Returns `true` if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to get the value as a u32.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Byte(v) => Some(u32::from(*v)),
            Self::UInt16(v) => Some(u32::from(*v)),
            Self::UInt32(v) => Some(*v),
            Self::Int32(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Attempts to get the value as a u8.
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Self::Byte(v) => Some(*v),
            other => other.as_u32().and_then(|v| u8::try_from(v).ok()),
        }
    }

    /// Attempts to get the value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            Self::Int32(v) => Some(f64::from(*v)),
            Self::UInt32(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// Attempts to get the value as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(v) | Self::LocalizedText(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to get the value as a node ID.
    pub fn as_node_id(&self) -> Option<&NodeId> {
        match self {
            Self::NodeId(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for OpcUaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::SByte(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) | Self::LocalizedText(v) => f.write_str(v),
            Self::DateTime(v) => f.write_str(&v.to_rfc3339()),
            Self::Guid(v) => write!(f, "{v}"),
            Self::ByteString(v) => f.write_str(&BASE64.encode(v)),
            Self::NodeId(v) => write!(f, "{v}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Null => f.write_str("null"),
        }
    }
}

// =============================================================================
// SecurityMode
// =============================================================================

/// OPC UA message security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SecurityMode {
    /// No security.
    #[default]
    None,

    /// Messages are signed but not encrypted.
    Sign,

    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

impl SecurityMode {
    /// Returns the display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Sign => "Sign",
            Self::SignAndEncrypt => "SignAndEncrypt",
        }
    }

    /// Returns `true` if this mode provides no security.
    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SecurityMode {
    type Err = OpcUaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "none" => Ok(Self::None),
            "sign" => Ok(Self::Sign),
            "signandencrypt" => Ok(Self::SignAndEncrypt),
            _ => Err(OpcUaError::configuration(
                ConfigurationError::invalid_security_mode(s),
            )),
        }
    }
}

// =============================================================================
// SecurityPolicy
// =============================================================================

/// OPC UA security policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SecurityPolicy {
    /// No security policy.
    #[default]
    None,

    /// Basic128Rsa15 (deprecated).
    Basic128Rsa15,

    /// Basic256 (deprecated).
    Basic256,

    /// Basic256Sha256.
    Basic256Sha256,

    /// Aes128_Sha256_RsaOaep.
    Aes128Sha256RsaOaep,

    /// Aes256_Sha256_RsaPss.
    Aes256Sha256RsaPss,
}

impl SecurityPolicy {
    /// Every policy accepted on the command line.
    pub const ALL: [SecurityPolicy; 6] = [
        Self::None,
        Self::Basic256,
        Self::Basic128Rsa15,
        Self::Basic256Sha256,
        Self::Aes128Sha256RsaOaep,
        Self::Aes256Sha256RsaPss,
    ];

    /// Returns the OPC UA policy URI.
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::None => "http://opcfoundation.org/UA/SecurityPolicy#None",
            Self::Basic128Rsa15 => "http://opcfoundation.org/UA/SecurityPolicy#Basic128Rsa15",
            Self::Basic256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256",
            Self::Basic256Sha256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256",
            Self::Aes128Sha256RsaOaep => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep"
            }
            Self::Aes256Sha256RsaPss => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss"
            }
        }
    }

    /// Returns the name as written on the command line.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Basic128Rsa15 => "Basic128Rsa15",
            Self::Basic256 => "Basic256",
            Self::Basic256Sha256 => "Basic256Sha256",
            Self::Aes128Sha256RsaOaep => "Aes128_Sha256_RsaOaep",
            Self::Aes256Sha256RsaPss => "Aes256_Sha256_RsaPss",
        }
    }

    /// Returns `true` if certificates are required for this policy.
    #[inline]
    pub const fn requires_certificates(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SecurityPolicy {
    type Err = OpcUaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "none" => Ok(Self::None),
            "basic128rsa15" => Ok(Self::Basic128Rsa15),
            "basic256" => Ok(Self::Basic256),
            "basic256sha256" => Ok(Self::Basic256Sha256),
            "aes128sha256rsaoaep" => Ok(Self::Aes128Sha256RsaOaep),
            "aes256sha256rsapss" => Ok(Self::Aes256Sha256RsaPss),
            _ => Err(OpcUaError::configuration(
                ConfigurationError::invalid_security_policy(s),
            )),
        }
    }
}

// =============================================================================
// UserTokenType
// =============================================================================

/// How the client authenticates to the server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserTokenType {
    /// Anonymous authentication.
    #[default]
    Anonymous,

    /// Username and password authentication.
    UserName {
        /// The username.
        username: String,
        /// The password.
        password: String,
    },

    /// X.509 certificate authentication.
    Certificate {
        /// Path to the certificate file.
        certificate_path: String,
        /// Path to the private key file.
        private_key_path: String,
    },
}

impl UserTokenType {
    /// Returns `true` if this is anonymous authentication.
    #[inline]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Returns `(username, password)` for username authentication.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match self {
            Self::UserName { username, password } => Some((username, password)),
            _ => None,
        }
    }
}

impl fmt::Debug for UserTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::UserName { username, .. } => f
                .debug_struct("UserName")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::Certificate {
                certificate_path, ..
            } => f
                .debug_struct("Certificate")
                .field("certificate_path", certificate_path)
                .finish(),
        }
    }
}

impl fmt::Display for UserTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::UserName { username, .. } => write!(f, "UserName({username})"),
            Self::Certificate {
                certificate_path, ..
            } => write!(f, "Certificate({certificate_path})"),
        }
    }
}

// =============================================================================
// OpcUaConfig
// =============================================================================

/// OPC UA client configuration.
///
/// # Examples
///
/// ```
/// use uabrowse_opcua::types::{OpcUaConfig, SecurityMode, SecurityPolicy};
///
/// let config = OpcUaConfig::builder()
///     .endpoint("opc.tcp://plc:4840")
///     .security_policy(SecurityPolicy::Basic256Sha256)
///     .security_mode(SecurityMode::SignAndEncrypt)
///     .certificate_path("certs/client_cert.pem")
///     .private_key_path("certs/client_key.pem")
///     .build()
///     .unwrap();
/// assert!(config.uses_security());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpcUaConfig {
    /// Server endpoint URL (e.g., "opc.tcp://localhost:4840").
    pub endpoint: String,

    /// Security mode. Ignored when the policy is `None`.
    #[serde(default)]
    pub security_mode: SecurityMode,

    /// Security policy.
    #[serde(default)]
    pub security_policy: SecurityPolicy,

    /// User authentication token.
    #[serde(default)]
    pub user_token: UserTokenType,

    /// Application name presented to the server.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Application URI; must match the client certificate when one is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_uri: Option<String>,

    /// Session timeout.
    #[serde(default = "default_session_timeout")]
    #[serde(with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Request timeout for operations.
    #[serde(default = "default_request_timeout")]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Path to client certificate file (PEM or DER).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_path: Option<String>,

    /// Path to client private key file (PEM).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,

    /// PKI directory for trusted and rejected server certificates.
    #[serde(default = "default_pki_dir")]
    pub pki_dir: String,

    /// Trust server certificates without a prior trust-list entry.
    #[serde(default = "default_trust_server_certificates")]
    pub trust_server_certificates: bool,
}

fn default_application_name() -> String {
    "OPC UA Browser".to_string()
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_pki_dir() -> String {
    "pki".to_string()
}

fn default_trust_server_certificates() -> bool {
    true
}

impl OpcUaConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> OpcUaConfigBuilder {
        OpcUaConfigBuilder::default()
    }

    /// Creates a simple configuration with just the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Validates this configuration without touching the filesystem.
    pub fn validate(&self) -> Result<(), OpcUaError> {
        if self.endpoint.is_empty() {
            return Err(OpcUaError::configuration(ConfigurationError::missing_field(
                "endpoint",
            )));
        }

        if !self.endpoint.starts_with("opc.tcp://") {
            return Err(OpcUaError::configuration(ConfigurationError::invalid_endpoint(
                &self.endpoint,
                "Endpoint must start with opc.tcp://",
            )));
        }

        if self.security_policy.requires_certificates() {
            if self.security_mode.is_none() {
                return Err(OpcUaError::security(SecurityError::missing_mode(
                    self.security_policy.name(),
                )));
            }
            if self.certificate_path.is_none() || self.private_key_path.is_none() {
                return Err(OpcUaError::security(SecurityError::missing_credentials(
                    self.security_policy.name(),
                )));
            }
        }

        if self.session_timeout.is_zero() {
            return Err(OpcUaError::configuration(ConfigurationError::invalid_timeout(
                self.session_timeout,
                "Session timeout must be greater than 0",
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(OpcUaError::configuration(ConfigurationError::invalid_timeout(
                self.request_timeout,
                "Request timeout must be greater than 0",
            )));
        }

        Ok(())
    }

    /// Checks that the configured certificate and key files exist.
    pub fn validate_files(&self) -> Result<(), OpcUaError> {
        if !self.uses_security() {
            return Ok(());
        }
        if let Some(cert) = &self.certificate_path {
            if !Path::new(cert).exists() {
                return Err(OpcUaError::security(SecurityError::CertificateNotFound {
                    path: cert.into(),
                }));
            }
        }
        if let Some(key) = &self.private_key_path {
            if !Path::new(key).exists() {
                return Err(OpcUaError::security(SecurityError::PrivateKeyNotFound {
                    path: key.into(),
                }));
            }
        }
        Ok(())
    }

    /// Returns the effective application URI.
    pub fn effective_application_uri(&self) -> String {
        self.application_uri.clone().unwrap_or_else(|| {
            format!("urn:uabrowse:{}", self.application_name.replace(' ', ""))
        })
    }

    /// Returns the security mode actually requested from the server.
    pub fn effective_security_mode(&self) -> SecurityMode {
        if self.security_policy.requires_certificates() {
            self.security_mode
        } else {
            SecurityMode::None
        }
    }

    /// Returns `true` if this configuration uses security.
    #[inline]
    pub fn uses_security(&self) -> bool {
        self.security_policy.requires_certificates()
    }
}

impl Default for OpcUaConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            security_mode: SecurityMode::default(),
            security_policy: SecurityPolicy::default(),
            user_token: UserTokenType::default(),
            application_name: default_application_name(),
            application_uri: None,
            session_timeout: default_session_timeout(),
            request_timeout: default_request_timeout(),
            certificate_path: None,
            private_key_path: None,
            pki_dir: default_pki_dir(),
            trust_server_certificates: default_trust_server_certificates(),
        }
    }
}

// =============================================================================
// OpcUaConfigBuilder
// =============================================================================

/// Builder for [`OpcUaConfig`].
#[derive(Debug, Default)]
pub struct OpcUaConfigBuilder {
    config: OpcUaConfig,
}

impl OpcUaConfigBuilder {
    /// Sets the endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Sets the security mode.
    pub fn security_mode(mut self, mode: SecurityMode) -> Self {
        self.config.security_mode = mode;
        self
    }

    /// Sets the security policy.
    pub fn security_policy(mut self, policy: SecurityPolicy) -> Self {
        self.config.security_policy = policy;
        self
    }

    /// Uses username/password authentication.
    pub fn username(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.user_token = UserTokenType::UserName {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Uses anonymous authentication.
    pub fn anonymous(mut self) -> Self {
        self.config.user_token = UserTokenType::Anonymous;
        self
    }

    /// Sets the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.config.application_name = name.into();
        self
    }

    /// Sets the application URI.
    pub fn application_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.application_uri = Some(uri.into());
        self
    }

    /// Sets the session timeout.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.config.session_timeout = timeout;
        self
    }

    /// Sets the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sets the client certificate path.
    pub fn certificate_path(mut self, path: impl Into<String>) -> Self {
        self.config.certificate_path = Some(path.into());
        self
    }

    /// Sets the client private key path.
    pub fn private_key_path(mut self, path: impl Into<String>) -> Self {
        self.config.private_key_path = Some(path.into());
        self
    }

    /// Sets the PKI directory.
    pub fn pki_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.pki_dir = dir.into();
        self
    }

    /// Sets whether unknown server certificates are trusted.
    pub fn trust_server_certificates(mut self, trust: bool) -> Self {
        self.config.trust_server_certificates = trust;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<OpcUaConfig, OpcUaError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// humantime_serde helper
// =============================================================================

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime::format_duration(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
