//! Input acquisition.
//!
//! Precedence: today's cached file, then a network fetch (when requested,
//! cached on success), then standard input. The whole input is read before
//! decoding starts.

use std::io::Read;
use std::path::{Path, PathBuf};

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::fetch::{self, FetchError};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write cache file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read standard input: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Where the ledger bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
    Stdin,
}

/// Ledger bytes plus their origin.
#[derive(Debug)]
pub struct Input {
    pub bytes: Vec<u8>,
    pub origin: Origin,
}

/// Network settings used when `--fetch` is given.
#[derive(Debug, Clone, Copy)]
pub struct FetchSettings<'a> {
    pub client: &'a Client,
    pub url: &'a str,
    pub api_key: &'a str,
}

/// Read the ledger from the first available source.
pub async fn acquire(
    cache_file: &Path,
    fetch: Option<FetchSettings<'_>>,
    mut stdin: impl Read,
) -> Result<Input, SourceError> {
    if cache_file.exists() {
        debug!("Reading data from {}", cache_file.display());
        let bytes = std::fs::read(cache_file).map_err(|source| SourceError::Read {
            path: cache_file.to_path_buf(),
            source,
        })?;
        return Ok(Input {
            bytes,
            origin: Origin::Cache,
        });
    }

    if let Some(settings) = fetch {
        debug!("Fetching fresh DCSL data");
        let bytes =
            fetch::fetch_signed_list(settings.client, settings.url, settings.api_key).await?;
        std::fs::write(cache_file, &bytes).map_err(|source| SourceError::Write {
            path: cache_file.to_path_buf(),
            source,
        })?;
        debug!("Cached {} bytes at {}", bytes.len(), cache_file.display());
        return Ok(Input {
            bytes,
            origin: Origin::Network,
        });
    }

    debug!("Reading data from stdin");
    let mut bytes = Vec::new();
    stdin.read_to_end(&mut bytes).map_err(SourceError::Stdin)?;
    Ok(Input {
        bytes,
        origin: Origin::Stdin,
    })
}
