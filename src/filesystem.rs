//! Provider reading documents from the local filesystem.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use url::Url;

use crate::cache::Cache;
use crate::error::ProviderError;
use crate::locator::{file_path_under, has_scheme};
use crate::provider::{unsupported, Provider};

const NAME: &str = "filesystem";

/// Serves `file` locators from below a root directory.
///
/// Only the locator's path is used: `file:///schemas/a.json` with root
/// `/srv/docs` reads `/srv/docs/schemas/a.json`. Once a document is read
/// it is cached for the lifetime of the provider, unless [`reset`] is
/// called.
///
/// [`reset`]: Provider::reset
#[derive(Debug)]
pub struct FilesystemProvider {
    root: PathBuf,
    cache: Cache,
}

impl FilesystemProvider {
    /// Create a provider serving files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Cache::new(),
        }
    }

    /// Directory `file` locators are served from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bytes read so far, keyed by cleaned path.
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// The file a locator maps to, after cleaning.
    pub fn path_for(&self, locator: &Url) -> PathBuf {
        file_path_under(&self.root, locator)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, ProviderError> {
        let metadata = std::fs::metadata(path).map_err(|source| {
            if source.kind() == IoErrorKind::NotFound {
                ProviderError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ProviderError::ReadError {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        if metadata.is_dir() {
            return Err(ProviderError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        std::fs::read(path).map_err(|source| ProviderError::ReadError {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Provider for FilesystemProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn get_bytes(&self, locator: &Url) -> Result<Vec<u8>, ProviderError> {
        if !has_scheme(locator, "file") {
            trace!(provider = NAME, %locator, "scheme not served");
            return Err(unsupported(NAME, locator));
        }

        let path = self.path_for(locator);
        let key = path.to_string_lossy().into_owned();
        if let Some(bytes) = self.cache.get(&key) {
            debug!(provider = NAME, path = %path.display(), "cache hit");
            return Ok(bytes);
        }

        debug!(provider = NAME, path = %path.display(), "reading file");
        let bytes = self.read(&path)?;
        self.cache.set(key, bytes.clone());
        Ok(bytes)
    }

    fn reset(&self) {
        debug!(provider = NAME, entries = self.cache.len(), "resetting cache");
        self.cache.reset();
    }
}
