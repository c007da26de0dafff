use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::TryOnError;

/// Where an input image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An `http://` or `https://` URL to fetch.
    Remote(String),
    /// A filesystem path, passed through as-is.
    Local(PathBuf),
}

impl ImageSource {
    pub fn parse(reference: &str) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            ImageSource::Remote(reference.to_string())
        } else {
            ImageSource::Local(PathBuf::from(reference))
        }
    }
}

/// Turn an image reference into a local path.
///
/// URLs are downloaded to `dest`, overwriting whatever is there, and `dest`
/// is returned. Anything else is returned unchanged without touching the
/// network or checking that the file exists.
///
/// # Errors
///
/// Returns an error if the download fails or answers with a non-success
/// status. Nothing is written to `dest` in that case.
pub async fn resolve_image(
    http: &Client,
    reference: &str,
    dest: &Path,
    timeout: Duration,
) -> Result<PathBuf, TryOnError> {
    let url = match ImageSource::parse(reference) {
        ImageSource::Local(path) => return Ok(path),
        ImageSource::Remote(url) => url,
    };

    let resp = http
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| TryOnError::Download {
            url: url.clone(),
            source: e,
        })?;

    if !resp.status().is_success() {
        return Err(TryOnError::DownloadStatus {
            url,
            status: resp.status().as_u16(),
        });
    }

    let bytes = resp.bytes().await.map_err(|e| TryOnError::Download {
        url: url.clone(),
        source: e,
    })?;

    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| TryOnError::Io {
            context: format!("Cannot write {}", dest.display()),
            source: e,
        })?;
    debug!(url = %url, dest = %dest.display(), bytes = bytes.len(), "downloaded image");

    Ok(dest.to_path_buf())
}
