//! Text renderings of decoded values.
//!
//! JSON follows the canonical protobuf mapping: camelCase keys in field
//! order, default-valued fields and unset messages omitted, bytes as base64,
//! enums by name.

use std::fmt::Display;

use serde::Serialize;

/// Render a message (whole envelope or single entry) as indented JSON.
///
/// # Errors
///
/// Returns a `serde_json` error if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(message: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(message)
}

/// Render one aggregate row as `"{manufacturer}, {count}"`.
///
/// The manufacturer is written verbatim; a name containing a comma is not
/// quoted.
pub fn to_csv_row(manufacturer: impl Display, count: usize) -> String {
    format!("{manufacturer}, {count}")
}
