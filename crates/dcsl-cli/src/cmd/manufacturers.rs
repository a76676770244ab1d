//! Manufacturer listing command

use std::io::Write;

use anyhow::Result;
use dcsl_schema::SignedDeviceCertificateStatusList;
use tracing::debug;

/// Print one `manufacturer, count` line per manufacturer, in first-seen order
pub fn list_manufacturers(
    envelope: &SignedDeviceCertificateStatusList,
    out: &mut impl Write,
) -> Result<()> {
    let index = envelope.index();
    for row in index.aggregate_by_manufacturer() {
        debug!(
            "Manufacturer: {}, Device Count: {}",
            row.manufacturer, row.devices
        );
        writeln!(out, "{row}")?;
    }
    Ok(())
}
