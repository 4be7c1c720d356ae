#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Download helpers for the collision dataset and model artifacts.
//!
//! Remote files are streamed to `<dest>.download` and renamed into place
//! once complete, so a half-written file is never mistaken for a cached
//! copy. Every request carries a bounded timeout and nothing is retried.
//! Cached files ending in `.gz` are decompressed by [`decompress_if_gz`].

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt as _;
use tokio::io::AsyncWriteExt as _;

/// Default per-request timeout for downloads.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors from download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request error (connection failure, timeout, broken stream).
    #[error("HTTP error fetching {url}: {source}")]
    Http {
        /// Request URL.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// I/O error writing to disk.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Returns the temporary path a download is streamed to before the rename.
#[must_use]
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".download");
    PathBuf::from(name)
}

/// Downloads a file from a URL to a local path.
///
/// Uses streaming to avoid loading the entire file into memory. Returns
/// the number of bytes written.
///
/// # Errors
///
/// Returns an error if the HTTP request fails or times out, the response
/// is not successful, or the local file cannot be written.
pub async fn download_file(url: &str, dest: &Path, timeout: Duration) -> Result<u64, DownloadError> {
    log::info!("Downloading {url}");
    log::info!("  -> {}", dest.display());

    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }

    let client = reqwest::Client::builder()
        .user_agent("wildlife-risk/0.1")
        .timeout(timeout)
        .build()
        .map_err(|e| http_error(url, e))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| http_error(url, e))?;

    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let tmp = partial_path(dest);
    match write_and_rename(response, url, &tmp, dest).await {
        Ok(downloaded) => {
            #[allow(clippy::cast_precision_loss)]
            let kb = downloaded as f64 / 1024.0;
            log::info!("  download complete: {kb:.1} KB");
            Ok(downloaded)
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                log::warn!("Failed to remove {}: {cleanup}", tmp.display());
            }
            Err(e)
        }
    }
}

/// Streams the response body into `tmp` and renames it to `dest`.
///
/// The file handle is closed before returning, so the caller can remove
/// `tmp` on any error.
async fn write_and_rename(
    response: reqwest::Response,
    url: &str,
    tmp: &Path,
    dest: &Path,
) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(tmp)
        .await
        .map_err(|e| io_error(tmp, e))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| http_error(url, e))?;
        file.write_all(&chunk).await.map_err(|e| io_error(tmp, e))?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| io_error(tmp, e))?;
    drop(file);

    tokio::fs::rename(tmp, dest)
        .await
        .map_err(|e| io_error(dest, e))?;

    Ok(downloaded)
}

/// Ensures `dest` exists locally, downloading it from `url` when absent.
///
/// Returns `true` if a download happened and `false` when the cached copy
/// was reused.
///
/// # Errors
///
/// Returns [`DownloadError`] if the download is needed and fails.
pub async fn ensure_cached(url: &str, dest: &Path, timeout: Duration) -> Result<bool, DownloadError> {
    if tokio::fs::try_exists(dest).await.unwrap_or(false) {
        log::debug!("Using cached {}", dest.display());
        return Ok(false);
    }
    download_file(url, dest, timeout).await?;
    Ok(true)
}

/// Decompresses `raw` when `path` ends in `.gz`; other files are returned
/// unchanged.
///
/// # Errors
///
/// Returns an I/O error if the gzip stream is corrupt or truncated.
pub fn decompress_if_gz(path: &Path, raw: Vec<u8>) -> std::io::Result<Vec<u8>> {
    if path.extension().is_none_or(|ext| ext != "gz") {
        return Ok(raw);
    }
    let mut decompressed = Vec::new();
    flate2::read::GzDecoder::new(raw.as_slice()).read_to_end(&mut decompressed)?;
    log::debug!("Decompressed {} to {} bytes", path.display(), decompressed.len());
    Ok(decompressed)
}

fn http_error(url: &str, source: reqwest::Error) -> DownloadError {
    DownloadError::Http {
        url: url.to_string(),
        source,
    }
}

fn io_error(path: &Path, source: std::io::Error) -> DownloadError {
    DownloadError::Io {
        path: path.display().to_string(),
        source,
    }
}
