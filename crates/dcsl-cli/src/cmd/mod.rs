//! Query commands over a decoded ledger.

pub mod manufacturers;
pub mod show;
pub mod system;

use std::io::Write;

use anyhow::Result;
use dcsl_schema::{SignedDeviceCertificateStatusList, UNSET_SYSTEM_ID};

use crate::Cli;

/// Which query to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Print the whole envelope as JSON.
    Show,
    /// Print the first entry carrying this system id.
    SystemId(u32),
    /// Print `manufacturer, count` rows.
    ListManufacturers,
}

impl Mode {
    /// Pick the mode from parsed arguments.
    ///
    /// A system id of 0 counts as "not given": 0 is the ledger's own marker
    /// for an unset id, so `--system-id 0` falls through to the next mode.
    pub fn from_cli(cli: &Cli) -> Self {
        match cli.system_id {
            Some(id) if id != UNSET_SYSTEM_ID => Self::SystemId(id),
            _ if cli.list_manufacturers => Self::ListManufacturers,
            _ => Self::Show,
        }
    }
}

/// Result of a command that completed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The system id lookup matched nothing.
    NotFound,
}

/// Run `mode` against `envelope`, writing results to `out`.
pub fn run(
    envelope: &SignedDeviceCertificateStatusList,
    mode: Mode,
    out: &mut impl Write,
) -> Result<Outcome> {
    match mode {
        Mode::Show => show::show(envelope, out).map(|()| Outcome::Success),
        Mode::SystemId(id) => system::system_id(envelope, id, out),
        Mode::ListManufacturers => {
            manufacturers::list_manufacturers(envelope, out).map(|()| Outcome::Success)
        }
    }
}
