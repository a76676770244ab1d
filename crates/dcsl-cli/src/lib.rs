//! dcsl - Widevine device certificate status list inspector
//!
//! Reads the signed device certificate status list (DCSL) and answers two
//! questions about it: which entry belongs to a system id, and how many
//! entries each manufacturer has.
//!
//! # Input
//!
//! ```text
//! <cache-dir>/YYYYMMDD-dcsl.bin   # today's cached list, used first
//! --fetch                         # otherwise fetch from the API and cache it
//! stdin                           # otherwise read the raw list from stdin
//! ```

#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

pub mod cmd;
pub mod fetch;
pub mod paths;
pub mod source;

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dcsl")]
#[command(author, version, about = "Inspect the Widevine device certificate status list")]
pub struct Cli {
    /// Fetch a fresh list when today's cached copy is missing
    #[arg(short, long)]
    pub fetch: bool,

    /// Report on a specific system ID
    #[arg(short, long)]
    pub system_id: Option<u32>,

    /// List all manufacturers as CSV
    #[arg(short = 'm', long)]
    pub list_manufacturers: bool,

    /// Directory holding the daily cached list
    #[arg(long, env = "DCSL_CACHE_DIR", default_value = ".")]
    pub cache_dir: PathBuf,

    /// List endpoint
    #[arg(long, env = "DCSL_URL", default_value = fetch::DEFAULT_LIST_URL)]
    pub url: String,

    /// API key sent as the `key` query parameter
    #[arg(long, env = "DCSL_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,
}
