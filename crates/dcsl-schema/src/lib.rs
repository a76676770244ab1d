//! Device certificate status list (DCSL) ledger.
//!
//! Decodes the signed binary ledger into a typed, immutable tree, answers
//! lookups over its entries and renders results as JSON or CSV rows.
//!
//! # Example
//!
//! ```
//! use dcsl_schema::{
//!     DeviceCertificateStatus, DeviceCertificateStatusList, Message, ProvisionedDeviceInfo,
//!     SignedDeviceCertificateStatusList, Text,
//! };
//!
//! let envelope = SignedDeviceCertificateStatusList {
//!     certificate_status_list: Some(DeviceCertificateStatusList {
//!         certificate_status: vec![DeviceCertificateStatus {
//!             device_info: Some(ProvisionedDeviceInfo {
//!                 system_id: 4445,
//!                 manufacturer: Text::from("Acme"),
//!                 ..ProvisionedDeviceInfo::default()
//!             }),
//!             ..DeviceCertificateStatus::default()
//!         }],
//!         ..DeviceCertificateStatusList::default()
//!     }),
//!     ..SignedDeviceCertificateStatusList::default()
//! };
//!
//! let decoded = dcsl_schema::decode(&envelope.encode_to_vec()).unwrap();
//! let index = decoded.index();
//! assert!(index.find_by_system_id(4445).is_some());
//! assert_eq!(index.aggregate_by_manufacturer()[0].to_string(), "Acme, 1");
//! ```

pub mod index;
pub mod message;
pub mod projection;
pub mod types;
pub mod wire;

// Re-exports
pub use index::{ManufacturerCount, RecordIndex, UNSET_SYSTEM_ID};
pub use message::Message;
pub use projection::{to_csv_row, to_json};
pub use types::*;
pub use wire::{DecodeError, Field, Reader, WireType, WireValue, Writer};

/// Decode a complete signed ledger from `bytes`.
///
/// # Errors
///
/// Returns a [`DecodeError`] carrying the failing byte offset if the input is
/// malformed or truncated. No partial ledger is ever returned.
pub fn decode(bytes: &[u8]) -> Result<SignedDeviceCertificateStatusList, DecodeError> {
    SignedDeviceCertificateStatusList::decode(bytes)
}
