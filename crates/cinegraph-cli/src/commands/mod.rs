//! CLI command implementations.

pub mod ask;
pub mod build_index;
pub mod init;
pub mod search;
pub mod stats;

use anyhow::Result;
use cinegraph::Config;
use std::path::Path;

/// An explicit config file, or discovery from the current directory.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
