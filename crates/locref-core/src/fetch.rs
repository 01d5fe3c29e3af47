// crates/locref-core/src/fetch.rs
//! # Dataset Fetch
//!
//! Retrieval of the upstream JSON files behind the [`DatasetSource`]
//! trait. Two sources ship with the crate:
//!
//! * [`HttpSource`] - the published dataset on GitHub (feature `fetch`),
//! * [`DirSource`] - a local directory, plain or gzipped files.
//!
//! Fetch failures are reported, never panicked on; the import pipeline
//! treats them as "zero records for this level" and carries on.

use std::path::PathBuf;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::FetchError;
use crate::raw::DatasetFile;

/// Where the dataset JSON files are published.
pub const DATA_BASE_URL: &str =
    "https://raw.githubusercontent.com/dr5hn/countries-states-cities-database/master/json";

/// Upstream requests get five minutes before timing out. The cities file
/// is tens of megabytes on a good day.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Anything that can produce the raw bytes of one dataset file.
pub trait DatasetSource {
    fn fetch_bytes(&self, file: DatasetFile) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `file` and decodes it as a JSON array of `T`.
pub fn fetch_records<T: DeserializeOwned>(
    source: &dyn DatasetSource,
    file: DatasetFile,
) -> Result<Vec<T>, FetchError> {
    let bytes = source.fetch_bytes(file)?;
    serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode {
        file: file.file_name(),
        source: e,
    })
}

// -----------------------------------------------------------------------------
// HTTP SOURCE
// -----------------------------------------------------------------------------

#[cfg(feature = "fetch")]
static HTTP_CLIENT: once_cell::sync::OnceCell<reqwest::blocking::Client> =
    once_cell::sync::OnceCell::new();

#[cfg(feature = "fetch")]
fn shared_client(file: DatasetFile) -> Result<&'static reqwest::blocking::Client, FetchError> {
    HTTP_CLIENT
        .get_or_try_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
        })
        .map_err(|e| FetchError::Http {
            file: file.file_name(),
            source: e,
        })
}

/// Downloads dataset files over HTTPS. One shared blocking client, with
/// [`FETCH_TIMEOUT`] applied per request.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
}

#[cfg(feature = "fetch")]
impl HttpSource {
    /// Source pointed at [`DATA_BASE_URL`].
    pub fn new() -> Self {
        Self::with_base_url(DATA_BASE_URL)
    }

    /// Source pointed at a mirror or a test server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        HttpSource {
            base_url: base_url.into(),
        }
    }
}

#[cfg(feature = "fetch")]
impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "fetch")]
impl DatasetSource for HttpSource {
    fn fetch_bytes(&self, file: DatasetFile) -> Result<Vec<u8>, FetchError> {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            file.file_name()
        );
        debug!(%url, "downloading dataset file");

        let response = shared_client(file)?
            .get(&url)
            .send()
            .map_err(|e| FetchError::Http {
                file: file.file_name(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                file: file.file_name(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|e| FetchError::Http {
            file: file.file_name(),
            source: e,
        })?;
        Ok(body.to_vec())
    }
}

// -----------------------------------------------------------------------------
// DIRECTORY SOURCE
// -----------------------------------------------------------------------------

/// Reads dataset files from a local directory.
///
/// `<name>.json` is tried first; with the `compact` feature a
/// `<name>.json.gz` sibling is accepted as fallback.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirSource { dir: dir.into() }
    }
}

impl DatasetSource for DirSource {
    fn fetch_bytes(&self, file: DatasetFile) -> Result<Vec<u8>, FetchError> {
        let path = self.dir.join(file.file_name());
        if path.is_file() {
            debug!(path = %path.display(), "reading dataset file");
            return std::fs::read(&path).map_err(|e| FetchError::Io {
                file: file.file_name(),
                source: e,
            });
        }

        #[cfg(feature = "compact")]
        {
            use std::io::Read;

            let gz_path = self.dir.join(format!("{}.gz", file.file_name()));
            if gz_path.is_file() {
                debug!(path = %gz_path.display(), "reading gzipped dataset file");
                let opened = std::fs::File::open(&gz_path).map_err(|e| FetchError::Io {
                    file: file.file_name(),
                    source: e,
                })?;
                let mut decoder = flate2::read::GzDecoder::new(std::io::BufReader::new(opened));
                let mut buf = Vec::new();
                decoder.read_to_end(&mut buf).map_err(|e| FetchError::Io {
                    file: file.file_name(),
                    source: e,
                })?;
                return Ok(buf);
            }
        }

        Err(FetchError::Io {
            file: file.file_name(),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no {} under {}", file.file_name(), self.dir.display()),
            ),
        })
    }
}
