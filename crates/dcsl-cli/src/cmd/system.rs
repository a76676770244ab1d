//! System id lookup command

use std::io::Write;

use anyhow::{Context, Result};
use dcsl_schema::{SignedDeviceCertificateStatusList, to_json};
use tracing::{debug, error};

use super::Outcome;

/// Print the first entry whose device carries `system_id`
pub fn system_id(
    envelope: &SignedDeviceCertificateStatusList,
    system_id: u32,
    out: &mut impl Write,
) -> Result<Outcome> {
    let index = envelope.index();
    let Some(record) = index.find_by_system_id(system_id) else {
        let message = format!("Can't find device certificate entry with system ID {system_id}");
        error!("{message}");
        writeln!(out, "{message}")?;
        return Ok(Outcome::NotFound);
    };

    let json = to_json(record).context("Failed to render entry as JSON")?;
    debug!("System ID {system_id} found: {json}");
    writeln!(out, "{json}")?;
    Ok(Outcome::Success)
}
