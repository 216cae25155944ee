//! Provider fetching documents over HTTP(S).
//!
//! Requires the `remote` feature (enabled by default).

use std::time::Duration;

use tracing::{debug, trace};
use url::Url;

use crate::cache::Cache;
use crate::error::ProviderError;
use crate::locator::{has_scheme, split_fragment};
use crate::provider::{unsupported, Provider};
use crate::types::DEFAULT_HTTP_TIMEOUT;

const NAME: &str = "http";

/// Serves `http` and `https` locators with blocking GET requests.
///
/// Responses outside the 2xx range are failures, never parsed. Once a
/// document is fetched it is cached for the lifetime of the provider,
/// unless [`reset`] is called.
///
/// [`reset`]: Provider::reset
#[derive(Debug)]
pub struct HttpProvider {
    client: reqwest::blocking::Client,
    cache: Cache,
}

impl HttpProvider {
    /// Create a provider with the default 5 second timeout.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ClientBuild` if the HTTP client cannot be
    /// initialized (e.g. no TLS backend).
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a provider whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ClientBuild` if the HTTP client cannot be
    /// initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ProviderError::ClientBuild { source })?;
        Ok(Self::with_client(client))
    }

    /// Use a caller-configured client (proxies, headers, TLS settings).
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            cache: Cache::new(),
        }
    }

    /// Response bodies fetched so far, keyed by URL without fragment.
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    fn fetch(&self, document: &Url) -> Result<Vec<u8>, ProviderError> {
        let url = document.to_string();
        let response = self
            .client
            .get(document.clone())
            .send()
            .map_err(|source| ProviderError::NetworkError {
                url: url.clone(),
                source,
            })?;

        // Check for HTTP errors before reading the body
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .map_err(|source| ProviderError::NetworkError { url, source })?;
        Ok(body.to_vec())
    }
}

impl Provider for HttpProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn get_bytes(&self, locator: &Url) -> Result<Vec<u8>, ProviderError> {
        if !has_scheme(locator, "http") && !has_scheme(locator, "https") {
            trace!(provider = NAME, %locator, "scheme not served");
            return Err(unsupported(NAME, locator));
        }

        let (document, _) = split_fragment(locator);
        let key = document.to_string();
        if let Some(bytes) = self.cache.get(&key) {
            debug!(provider = NAME, url = %key, "cache hit");
            return Ok(bytes);
        }

        debug!(provider = NAME, url = %key, "fetching");
        let bytes = self.fetch(&document)?;
        self.cache.set(key, bytes.clone());
        Ok(bytes)
    }

    fn reset(&self) {
        debug!(provider = NAME, entries = self.cache.len(), "resetting cache");
        self.cache.reset();
    }
}
