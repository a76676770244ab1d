//! Binary decoding and encoding of the ledger messages.
//!
//! Field numbers follow the producer's schema exactly. Anything the schema
//! does not name, or a named field arriving with a different wire type, is
//! skipped so newer ledgers still decode.

use crate::types::{
    Bytes, DeviceCertificateStatus, DeviceCertificateStatusList, ProvisionedDeviceInfo,
    SecurityLevel, SignedDeviceCertificateStatusList, Status, Text,
};
use crate::wire::{DecodeError, Field, Reader, WireValue, Writer};

/// A protobuf message with a fixed field layout.
pub trait Message: Default {
    /// Apply one field read from the wire to `self`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if an embedded message inside the field is malformed.
    fn merge_field(&mut self, field: Field<'_>) -> Result<(), DecodeError>;

    /// Append every non-default field to `writer`, in field-number order.
    fn encode_fields(&self, writer: &mut Writer);

    /// Read fields until `reader` is exhausted, merging each into `self`.
    ///
    /// # Errors
    ///
    /// Returns the first [`DecodeError`] encountered.
    fn merge(&mut self, mut reader: Reader<'_>) -> Result<(), DecodeError> {
        while let Some(field) = reader.next_field()? {
            self.merge_field(field)?;
        }
        Ok(())
    }

    /// Decode a complete message from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] on malformed or truncated input; no partial
    /// message is returned.
    fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut message = Self::default();
        message.merge(Reader::new(bytes))?;
        Ok(message)
    }

    /// Encode the message to a fresh buffer.
    fn encode_to_vec(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.encode_fields(&mut writer);
        writer.into_bytes()
    }
}

impl Writer {
    /// Write an embedded message as a length-delimited field.
    pub fn message_field<M: Message>(&mut self, number: u32, message: &M) {
        self.bytes_field(number, &message.encode_to_vec());
    }
}

/// Merge an embedded message, creating it on first occurrence.
fn merge_embedded<M: Message>(
    slot: &mut Option<M>,
    value: &WireValue<'_>,
) -> Result<(), DecodeError> {
    if let Some(reader) = value.as_reader() {
        slot.get_or_insert_with(M::default).merge(reader)?;
    }
    Ok(())
}

fn enum_wire_value(value: i32) -> u64 {
    i64::from(value) as u64
}

impl ProvisionedDeviceInfo {
    const SYSTEM_ID: u32 = 1;
    const SOC: u32 = 2;
    const MANUFACTURER: u32 = 3;
    const MODEL: u32 = 4;
    const DEVICE_TYPE: u32 = 5;
    const MODEL_YEAR: u32 = 6;
    const SECURITY_LEVEL: u32 = 7;
    const TEST_DEVICE: u32 = 8;
}

impl Message for ProvisionedDeviceInfo {
    fn merge_field(&mut self, field: Field<'_>) -> Result<(), DecodeError> {
        match (field.number, field.value) {
            (Self::SYSTEM_ID, WireValue::Varint(v)) => self.system_id = v as u32,
            (Self::SOC, WireValue::Bytes { data, .. }) => self.soc = Text::from(data),
            (Self::MANUFACTURER, WireValue::Bytes { data, .. }) => {
                self.manufacturer = Text::from(data);
            }
            (Self::MODEL, WireValue::Bytes { data, .. }) => self.model = Text::from(data),
            (Self::DEVICE_TYPE, WireValue::Bytes { data, .. }) => {
                self.device_type = Text::from(data);
            }
            (Self::MODEL_YEAR, WireValue::Varint(v)) => self.model_year = v as u32,
            (Self::SECURITY_LEVEL, WireValue::Varint(v)) => {
                self.security_level = SecurityLevel::from_i32(v as i32);
            }
            (Self::TEST_DEVICE, WireValue::Varint(v)) => self.test_device = v != 0,
            _ => {}
        }
        Ok(())
    }

    fn encode_fields(&self, writer: &mut Writer) {
        if self.system_id != 0 {
            writer.varint_field(Self::SYSTEM_ID, u64::from(self.system_id));
        }
        for (number, text) in [
            (Self::SOC, &self.soc),
            (Self::MANUFACTURER, &self.manufacturer),
            (Self::MODEL, &self.model),
            (Self::DEVICE_TYPE, &self.device_type),
        ] {
            if !text.is_empty() {
                writer.bytes_field(number, text.as_bytes());
            }
        }
        if self.model_year != 0 {
            writer.varint_field(Self::MODEL_YEAR, u64::from(self.model_year));
        }
        if !self.security_level.is_default() {
            writer.varint_field(
                Self::SECURITY_LEVEL,
                enum_wire_value(self.security_level.as_i32()),
            );
        }
        if self.test_device {
            writer.varint_field(Self::TEST_DEVICE, 1);
        }
    }
}

impl DeviceCertificateStatus {
    const SERIAL_NUMBER: u32 = 1;
    const STATUS: u32 = 2;
    const DEVICE_INFO: u32 = 4;
}

impl Message for DeviceCertificateStatus {
    fn merge_field(&mut self, field: Field<'_>) -> Result<(), DecodeError> {
        match (field.number, field.value) {
            (Self::SERIAL_NUMBER, WireValue::Bytes { data, .. }) => {
                self.serial_number = Bytes::from(data);
            }
            (Self::STATUS, WireValue::Varint(v)) => self.status = Status::from_i32(v as i32),
            (Self::DEVICE_INFO, value @ WireValue::Bytes { .. }) => {
                merge_embedded(&mut self.device_info, &value)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn encode_fields(&self, writer: &mut Writer) {
        if !self.serial_number.is_empty() {
            writer.bytes_field(Self::SERIAL_NUMBER, self.serial_number.as_bytes());
        }
        if !self.status.is_default() {
            writer.varint_field(Self::STATUS, enum_wire_value(self.status.as_i32()));
        }
        if let Some(info) = &self.device_info {
            writer.message_field(Self::DEVICE_INFO, info);
        }
    }
}

impl DeviceCertificateStatusList {
    const CREATION_TIME_SECONDS: u32 = 1;
    const CERTIFICATE_STATUS: u32 = 2;
}

impl Message for DeviceCertificateStatusList {
    fn merge_field(&mut self, field: Field<'_>) -> Result<(), DecodeError> {
        match (field.number, field.value) {
            (Self::CREATION_TIME_SECONDS, WireValue::Varint(v)) => {
                self.creation_time_seconds = v as u32;
            }
            (Self::CERTIFICATE_STATUS, WireValue::Bytes { data, offset }) => {
                // Each occurrence is a new entry, appended in stream order.
                let mut entry = DeviceCertificateStatus::default();
                entry.merge(Reader::with_base(data, offset))?;
                self.certificate_status.push(entry);
            }
            _ => {}
        }
        Ok(())
    }

    fn encode_fields(&self, writer: &mut Writer) {
        if self.creation_time_seconds != 0 {
            writer.varint_field(
                Self::CREATION_TIME_SECONDS,
                u64::from(self.creation_time_seconds),
            );
        }
        for entry in &self.certificate_status {
            writer.message_field(Self::CERTIFICATE_STATUS, entry);
        }
    }
}

impl SignedDeviceCertificateStatusList {
    const CERTIFICATE_STATUS_LIST: u32 = 1;
    const SIGNATURE: u32 = 2;
}

impl Message for SignedDeviceCertificateStatusList {
    fn merge_field(&mut self, field: Field<'_>) -> Result<(), DecodeError> {
        match (field.number, field.value) {
            (Self::CERTIFICATE_STATUS_LIST, value @ WireValue::Bytes { .. }) => {
                merge_embedded(&mut self.certificate_status_list, &value)?;
            }
            (Self::SIGNATURE, WireValue::Bytes { data, .. }) => self.signature = Bytes::from(data),
            _ => {}
        }
        Ok(())
    }

    fn encode_fields(&self, writer: &mut Writer) {
        if let Some(list) = &self.certificate_status_list {
            writer.message_field(Self::CERTIFICATE_STATUS_LIST, list);
        }
        if !self.signature.is_empty() {
            writer.bytes_field(Self::SIGNATURE, self.signature.as_bytes());
        }
    }
}
