//! Storage module for downloaded images
//!
//! This module handles everything the crawl writes to disk:
//! - The host-named download root and its `.gitignore` marker
//! - Destination paths for images
//! - Idempotent writes (existing files are skipped unless forced)

mod materializer;

pub use materializer::{display_name, FileMaterializer};

use std::path::{Path, PathBuf};

/// Name of the marker file written into the download root
pub const MARKER_FILE: &str = ".gitignore";

/// Contents of the marker file: keeps the downloaded tree out of version control
pub const MARKER_CONTENT: &str = "# Automatically created by honey-dl\n*";

/// Creates `<output_dir>/<root_name>` and (re)writes its marker file
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the download root
/// * `Err(io::Error)` - The directory or marker could not be written
pub async fn prepare_domain_root(output_dir: &Path, root_name: &str) -> std::io::Result<PathBuf> {
    let root = output_dir.join(root_name);
    tokio::fs::create_dir_all(&root).await?;
    tokio::fs::write(root.join(MARKER_FILE), MARKER_CONTENT).await?;
    tracing::debug!(root = %root.display(), "Prepared download root");
    Ok(root)
}
