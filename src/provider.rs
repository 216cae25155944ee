//! Document providers.
//!
//! A provider turns a locator into raw bytes or a parsed document for the
//! schemes it serves. The resolver asks its providers in registration
//! order; a provider declines a locator it cannot serve by returning
//! [`ProviderError::UnsupportedScheme`], which sends the resolver on to
//! the next one.

use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::error::ProviderError;

/// Backend able to fetch documents for some set of URL schemes.
pub trait Provider: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Fetch the raw bytes of the document at `locator`.
    ///
    /// The locator's fragment, if any, is ignored.
    fn get_bytes(&self, locator: &Url) -> Result<Vec<u8>, ProviderError>;

    /// Fetch and parse the document at `locator`.
    fn get(&self, locator: &Url) -> Result<Value, ProviderError> {
        let bytes = self.get_bytes(locator)?;
        parse_document(locator, &bytes)
    }

    /// Forget everything cached so far; later fetches hit the backing store.
    fn reset(&self);
}

impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get_bytes(&self, locator: &Url) -> Result<Vec<u8>, ProviderError> {
        (**self).get_bytes(locator)
    }

    fn get(&self, locator: &Url) -> Result<Value, ProviderError> {
        (**self).get(locator)
    }

    fn reset(&self) {
        (**self).reset()
    }
}

/// Parse fetched bytes as a JSON document.
///
/// # Errors
///
/// Returns `ProviderError::InvalidJson` wrapping the syntax error.
pub fn parse_document(locator: &Url, bytes: &[u8]) -> Result<Value, ProviderError> {
    serde_json::from_slice(bytes).map_err(|source| ProviderError::InvalidJson {
        locator: locator.to_string(),
        source,
    })
}

/// Error for a locator whose scheme `provider` does not serve.
pub(crate) fn unsupported(provider: &str, locator: &Url) -> ProviderError {
    ProviderError::UnsupportedScheme {
        provider: provider.to_string(),
        scheme: locator.scheme().to_string(),
    }
}
