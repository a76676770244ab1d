//! Location of the daily ledger cache.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

/// Suffix shared by every cached ledger file.
pub const CACHE_SUFFIX: &str = "-dcsl.bin";

/// Cache file name for `date`: `YYYYMMDD-dcsl.bin`.
pub fn daily_file_name(date: NaiveDate) -> String {
    format!("{}{CACHE_SUFFIX}", date.format("%Y%m%d"))
}

/// Today's (local date) cache file inside `cache_dir`.
pub fn todays_cache_file(cache_dir: &Path) -> PathBuf {
    cache_dir.join(daily_file_name(Local::now().date_naive()))
}
