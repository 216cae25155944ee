//! Provider serving documents registered in memory.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{ProviderError, ResolveError};
use crate::locator::{parse_locator, split_fragment};
use crate::provider::Provider;

const NAME: &str = "memory";

/// Serves already-parsed documents keyed by locator, for any scheme.
///
/// Handy for pinning well-known remote documents, or for documents built
/// at runtime that other documents reference.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document` under `locator`. Any fragment is dropped.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidLocator` if `locator` is not an
    /// absolute URL.
    pub fn insert(&self, locator: &str, document: Value) -> Result<(), ResolveError> {
        let (key, _) = split_fragment(&parse_locator(locator)?);
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), document);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidLocator` if `locator` is not an
    /// absolute URL.
    pub fn with_document(self, locator: &str, document: Value) -> Result<Self, ResolveError> {
        self.insert(locator, document)?;
        Ok(self)
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registered document.
    pub fn clear(&self) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn lookup(&self, locator: &Url) -> Result<Value, ProviderError> {
        let (key, _) = split_fragment(locator);
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| ProviderError::UnknownDocument {
                locator: key.to_string(),
            })
    }
}

impl Provider for MemoryProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn get_bytes(&self, locator: &Url) -> Result<Vec<u8>, ProviderError> {
        let document = self.lookup(locator)?;
        serde_json::to_vec(&document).map_err(|source| ProviderError::InvalidJson {
            locator: locator.to_string(),
            source,
        })
    }

    fn get(&self, locator: &Url) -> Result<Value, ProviderError> {
        debug!(provider = NAME, %locator, "lookup");
        self.lookup(locator)
    }

    /// Registered documents are configuration, not cached fetches, so they
    /// survive a reset.
    fn reset(&self) {}
}
