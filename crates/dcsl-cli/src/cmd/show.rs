//! Show command

use std::io::Write;

use anyhow::{Context, Result};
use dcsl_schema::{SignedDeviceCertificateStatusList, to_json};
use tracing::debug;

/// Print the whole decoded envelope as JSON
pub fn show(envelope: &SignedDeviceCertificateStatusList, out: &mut impl Write) -> Result<()> {
    let json = to_json(envelope).context("Failed to render ledger as JSON")?;
    debug!("Full JSON output: {json}");
    writeln!(out, "{json}")?;
    Ok(())
}
