//! Typed model of the signed device certificate status list.

use std::borrow::Cow;

use base64::Engine;
use serde::{Serialize, Serializer};

use crate::index::RecordIndex;

/// A string field exactly as it appeared on the wire.
///
/// Producers are not required to emit valid UTF-8, so the raw bytes are kept
/// and only rendered lossily when displayed or projected. Equality is plain
/// byte equality: no case folding, no trimming.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Text(Vec<u8>);

impl Text {
    /// Wrap raw field bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// UTF-8 view, with invalid sequences replaced by U+FFFD.
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// True for the empty (unset) string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

impl AsRef<[u8]> for Text {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Text {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Text {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_str_lossy())
    }
}

/// An opaque bytes field, projected as standard padded base64.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    /// Wrap raw field bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// True for the empty (unset) value.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(&self.0))
    }
}

/// Revocation state of a device certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// The certificate is in good standing (default).
    #[default]
    Valid,
    /// The certificate has been revoked.
    Revoked,
    /// A value this build does not know, kept as received.
    Unrecognized(i32),
}

impl Status {
    /// Map a wire value to a status.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::Valid,
            1 => Self::Revoked,
            other => Self::Unrecognized(other),
        }
    }

    /// The wire value.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Valid => 0,
            Self::Revoked => 1,
            Self::Unrecognized(other) => other,
        }
    }

    /// Schema name of a known value.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::Valid => Some("VALID"),
            Self::Revoked => Some("REVOKED"),
            Self::Unrecognized(_) => None,
        }
    }

    /// True for the zero value, which the projection omits.
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn is_default(&self) -> bool {
        self.as_i32() == 0
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_i32(self.as_i32()),
        }
    }
}

/// Widevine security level a device was provisioned at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SecurityLevel {
    /// Not specified (default).
    #[default]
    Unspecified,
    /// Hardware-backed (L1).
    Level1,
    /// Hardware-assisted (L2).
    Level2,
    /// Software only (L3).
    Level3,
    /// A value this build does not know, kept as received.
    Unrecognized(i32),
}

impl SecurityLevel {
    /// Map a wire value to a security level.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::Unspecified,
            1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            other => Self::Unrecognized(other),
        }
    }

    /// The wire value.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::Level1 => 1,
            Self::Level2 => 2,
            Self::Level3 => 3,
            Self::Unrecognized(other) => other,
        }
    }

    /// Schema name of a known value.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::Unspecified => Some("LEVEL_UNSPECIFIED"),
            Self::Level1 => Some("LEVEL_1"),
            Self::Level2 => Some("LEVEL_2"),
            Self::Level3 => Some("LEVEL_3"),
            Self::Unrecognized(_) => None,
        }
    }

    /// True for the zero value, which the projection omits.
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn is_default(&self) -> bool {
        self.as_i32() == 0
    }
}

impl Serialize for SecurityLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(name),
            None => serializer.serialize_i32(self.as_i32()),
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Device details attached to a certificate status entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedDeviceInfo {
    /// Widevine system id; 0 means unset.
    #[serde(skip_serializing_if = "is_zero")]
    pub system_id: u32,
    /// System-on-chip name.
    #[serde(skip_serializing_if = "Text::is_empty")]
    pub soc: Text,
    /// Manufacturer name, compared byte for byte.
    #[serde(skip_serializing_if = "Text::is_empty")]
    pub manufacturer: Text,
    /// Model name.
    #[serde(skip_serializing_if = "Text::is_empty")]
    pub model: Text,
    /// Device category (e.g. "TV", "Phone").
    #[serde(skip_serializing_if = "Text::is_empty")]
    pub device_type: Text,
    /// Model year.
    #[serde(skip_serializing_if = "is_zero")]
    pub model_year: u32,
    /// Provisioned security level.
    #[serde(skip_serializing_if = "SecurityLevel::is_default")]
    pub security_level: SecurityLevel,
    /// Whether this is a test device.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub test_device: bool,
}

/// Status entry for one device certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCertificateStatus {
    /// Certificate serial number.
    #[serde(skip_serializing_if = "Bytes::is_empty")]
    pub serial_number: Bytes,
    /// Revocation state.
    #[serde(skip_serializing_if = "Status::is_default")]
    pub status: Status,
    /// Device details, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<ProvisionedDeviceInfo>,
}

static UNSET_TEXT: Text = Text(Vec::new());

impl DeviceCertificateStatus {
    /// The device's system id, 0 when no device info is attached.
    pub fn system_id(&self) -> u32 {
        self.device_info.as_ref().map_or(0, |info| info.system_id)
    }

    /// The device's manufacturer, empty when no device info is attached.
    pub fn manufacturer(&self) -> &Text {
        self.device_info
            .as_ref()
            .map_or(&UNSET_TEXT, |info| &info.manufacturer)
    }
}

/// The status list payload: a creation time and the entries in stream order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCertificateStatusList {
    /// Unix time the list was generated.
    #[serde(skip_serializing_if = "is_zero")]
    pub creation_time_seconds: u32,
    /// Entries in the order they were encountered on the wire.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub certificate_status: Vec<DeviceCertificateStatus>,
}

/// Top-level ledger: the status list plus its (unverified) signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedDeviceCertificateStatusList {
    /// The signed payload, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_status_list: Option<DeviceCertificateStatusList>,
    /// Signature over the payload, carried as opaque bytes.
    #[serde(skip_serializing_if = "Bytes::is_empty")]
    pub signature: Bytes,
}

impl SignedDeviceCertificateStatusList {
    /// All status entries in stream order (empty when the list is absent).
    pub fn records(&self) -> &[DeviceCertificateStatus] {
        self.certificate_status_list
            .as_ref()
            .map(|list| list.certificate_status.as_slice())
            .unwrap_or_default()
    }

    /// Query structures over [`records`](Self::records), built on first use.
    pub fn index(&self) -> RecordIndex<'_> {
        RecordIndex::new(self.records())
    }
}
