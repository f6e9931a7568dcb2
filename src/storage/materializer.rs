//! Writes downloaded images to their place under the download root

use crate::state::DownloadOutcome;
use crate::ItemError;
use std::path::{Path, PathBuf};
use url::Url;

/// Writes downloaded images under the domain root, at most once per path
///
/// Destination paths are a pure function of the root, the image URL, the
/// optional date and the `create_folders` flag. Writes go straight to the
/// destination; there is no temp-file-and-rename step, so a write cut short
/// leaves a partial file that later runs treat as present unless forced.
#[derive(Debug, Clone)]
pub struct FileMaterializer {
    root: PathBuf,
    create_folders: bool,
    force: bool,
}

impl FileMaterializer {
    pub fn new(root: impl Into<PathBuf>, create_folders: bool, force: bool) -> Self {
        Self {
            root: root.into(),
            create_folders,
            force,
        }
    }

    /// Computes where the image at `url` is stored
    ///
    /// # Path Rules
    ///
    /// - Filename is the last segment of the URL path
    /// - With a date, the filename becomes `(YYYY-MM-DD) <filename>`
    /// - With `create_folders`, the file sits in a folder named after the URL
    ///   path's parent directory; otherwise directly under the root
    ///
    /// # Examples
    ///
    /// ```
    /// use honey_dl::storage::FileMaterializer;
    /// use std::path::Path;
    /// use url::Url;
    ///
    /// let materializer = FileMaterializer::new("example.com", true, false);
    /// let url = Url::parse("https://cdn.example.com/albums/cats/tom.jpg").unwrap();
    /// let path = materializer.destination(&url, Some("2024-03-01")).unwrap();
    /// assert_eq!(path, Path::new("example.com/cats/(2024-03-01) tom.jpg"));
    /// ```
    pub fn destination(&self, url: &Url, date: Option<&str>) -> Result<PathBuf, ItemError> {
        let filename = display_name(url, date)?;

        let mut path = self.root.clone();
        if self.create_folders {
            if let Some(folder) = parent_folder(url) {
                path.push(folder);
            }
        }
        path.push(filename);
        Ok(path)
    }

    /// Stores `bytes` for the image at `url`
    ///
    /// Returns `Skipped` without touching the file when it already exists and
    /// the crawl is not forced. Missing directories are created first.
    pub async fn materialize(&self, url: &Url, date: Option<&str>, bytes: &[u8]) -> DownloadOutcome {
        let path = match self.destination(url, date) {
            Ok(path) => path,
            Err(error) => {
                return DownloadOutcome::Failed {
                    url: url.to_string(),
                    error,
                }
            }
        };

        match self.write(&path, bytes).await {
            Ok(true) => DownloadOutcome::Downloaded { path },
            Ok(false) => DownloadOutcome::Skipped { path },
            Err(source) => DownloadOutcome::Failed {
                url: url.to_string(),
                error: ItemError::Write { path, source },
            },
        }
    }

    /// Writes the file unless it exists and `force` is off; returns whether it wrote
    async fn write(&self, path: &Path, bytes: &[u8]) -> std::io::Result<bool> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let exists = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);

        if exists && !self.force {
            return Ok(false);
        }

        tokio::fs::write(path, bytes).await?;
        Ok(true)
    }
}

/// Filename the image at `url` is saved as, including the date prefix
pub fn display_name(url: &Url, date: Option<&str>) -> Result<String, ItemError> {
    let filename = url
        .path()
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .ok_or_else(|| ItemError::NoFilename {
            url: url.to_string(),
        })?;

    Ok(match date {
        Some(date) => format!("({}) {}", date, filename),
        None => filename.to_string(),
    })
}

/// Name of the directory containing the file in the URL path, if there is one
fn parent_folder(url: &Url) -> Option<&str> {
    let mut segments = url.path().rsplit('/');
    segments.next()?;
    segments
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}
