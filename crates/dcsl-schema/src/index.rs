//! Query structures over decoded certificate status entries.
//!
//! Both lookups are built on first use, so a caller that only needs one
//! query shape never pays for the other.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::projection::to_csv_row;
use crate::types::{DeviceCertificateStatus, Text};

/// The wire convention for "no system id".
pub const UNSET_SYSTEM_ID: u32 = 0;

/// Number of entries sharing one manufacturer name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturerCount<'a> {
    /// Manufacturer name, exactly as decoded.
    pub manufacturer: &'a Text,
    /// Entries carrying that name.
    pub devices: usize,
}

impl std::fmt::Display for ManufacturerCount<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&to_csv_row(self.manufacturer, self.devices))
    }
}

/// Lookups over a borrowed, immutable sequence of entries.
#[derive(Debug)]
pub struct RecordIndex<'a> {
    records: &'a [DeviceCertificateStatus],
    /// System id -> position of its first entry.
    by_system_id: OnceCell<HashMap<u32, usize>>,
    manufacturers: OnceCell<Vec<ManufacturerCount<'a>>>,
}

impl<'a> RecordIndex<'a> {
    /// Index `records`; nothing is computed until a query runs.
    pub fn new(records: &'a [DeviceCertificateStatus]) -> Self {
        Self {
            records,
            by_system_id: OnceCell::new(),
            manufacturers: OnceCell::new(),
        }
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First entry, in stream order, whose device carries `system_id`.
    ///
    /// System ids are not unique in the ledger; the first match wins.
    /// [`UNSET_SYSTEM_ID`] never matches, since it marks entries without one.
    pub fn find_by_system_id(&self, system_id: u32) -> Option<&'a DeviceCertificateStatus> {
        if system_id == UNSET_SYSTEM_ID {
            return None;
        }
        let records = self.records;
        let by_system_id = self.by_system_id.get_or_init(|| {
            let mut positions = HashMap::new();
            for (position, record) in records.iter().enumerate() {
                let id = record.system_id();
                if id != UNSET_SYSTEM_ID {
                    positions.entry(id).or_insert(position);
                }
            }
            positions
        });
        by_system_id
            .get(&system_id)
            .map(|&position| &records[position])
    }

    /// Entry counts per non-empty manufacturer, in first-seen order.
    ///
    /// Entries with an empty manufacturer are left out entirely.
    pub fn aggregate_by_manufacturer(&self) -> &[ManufacturerCount<'a>] {
        let records = self.records;
        self.manufacturers.get_or_init(|| {
            let mut rows: Vec<ManufacturerCount<'a>> = Vec::new();
            let mut slots: HashMap<&'a [u8], usize> = HashMap::new();
            for record in records {
                let manufacturer = record.manufacturer();
                if manufacturer.is_empty() {
                    continue;
                }
                match slots.entry(manufacturer.as_bytes()) {
                    Entry::Occupied(slot) => rows[*slot.get()].devices += 1,
                    Entry::Vacant(slot) => {
                        slot.insert(rows.len());
                        rows.push(ManufacturerCount {
                            manufacturer,
                            devices: 1,
                        });
                    }
                }
            }
            rows
        })
    }
}
