//! Reference resolution - replaces `$ref` markers with the content they point at.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, debug_span, trace};
use url::Url;

use crate::error::{ProviderError, ResolveError};
use crate::locator::{parse_locator, resolve_reference, split_fragment};
use crate::pointer::navigate_pointer;
use crate::provider::Provider;
use crate::types::{as_reference, DEFAULT_MAX_RECURSIONS};

#[cfg(feature = "remote")]
use crate::{filesystem::FilesystemProvider, http::HttpProvider};

/// Expands JSON References using an ordered chain of providers.
///
/// Providers are consulted in registration order; the first one that
/// serves the locator's scheme and fetches successfully wins. The resolver
/// itself caches nothing, all caching happens inside the providers, so
/// [`reset`](Self::reset) is the way to see changed documents.
///
/// Nested expansion is bounded by `max_recursions` (default 20). A
/// reference cycle therefore ends in `ResolveError::MaxRecursionExceeded`
/// instead of looping.
pub struct Resolver {
    providers: Vec<Arc<dyn Provider>>,
    max_recursions: usize,
}

/// The document a marker was found in: references resolve against its
/// locator, and same-document fragments navigate its root.
struct Scope<'a> {
    locator: &'a Url,
    root: &'a Value,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("providers", &self.provider_names())
            .field("max_recursions", &self.max_recursions)
            .finish()
    }
}

impl Resolver {
    /// Create a resolver with no providers and the default recursion ceiling.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            max_recursions: DEFAULT_MAX_RECURSIONS,
        }
    }

    /// Filesystem provider rooted at `root`, then HTTP with the default
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ClientBuild` if the HTTP client cannot be built.
    #[cfg(feature = "remote")]
    pub fn with_default_providers(
        root: impl Into<std::path::PathBuf>,
    ) -> Result<Self, ProviderError> {
        Ok(Self::new()
            .with_provider(FilesystemProvider::new(root))
            .with_provider(HttpProvider::new()?))
    }

    /// Append a provider to the chain.
    ///
    /// Pass an `Arc` to keep a handle on the provider (for example to
    /// inspect its cache).
    pub fn with_provider(mut self, provider: impl Provider + 'static) -> Self {
        self.add_provider(provider);
        self
    }

    /// Append a provider to the chain.
    pub fn add_provider(&mut self, provider: impl Provider + 'static) {
        self.providers.push(Arc::new(provider));
    }

    /// Set the recursion ceiling.
    pub fn max_recursions(mut self, max: usize) -> Self {
        self.max_recursions = max;
        self
    }

    /// Current recursion ceiling.
    pub fn recursion_limit(&self) -> usize {
        self.max_recursions
    }

    /// Names of the registered providers, in lookup order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Reset every provider's cache.
    pub fn reset(&self) {
        for provider in &self.providers {
            provider.reset();
        }
    }

    /// Expand every reference in `document`.
    ///
    /// `base` is the locator the document lives at; relative references
    /// resolve against it and fragment-only references (`#/definitions/x`)
    /// navigate `document` itself.
    ///
    /// # Errors
    ///
    /// Any failure aborts the whole call; no partially expanded document is
    /// returned.
    pub fn resolve(&self, document: &Value, base: &str) -> Result<Value, ResolveError> {
        let (base, _) = split_fragment(&parse_locator(base)?);
        let _span = debug_span!("resolve", base = %base).entered();

        let scope = Scope {
            locator: &base,
            root: document,
        };
        let mut resolved = document.clone();
        self.expand_value(&mut resolved, &scope, "", 0)?;
        Ok(resolved)
    }

    /// Fetch the document at `locator` through the provider chain and
    /// expand every reference in it.
    ///
    /// If `locator` has a fragment, only the selected part is returned.
    /// Fetching the root document counts as the first level of recursion.
    ///
    /// # Errors
    ///
    /// Any failure aborts the whole call.
    pub fn resolve_locator(&self, locator: &str) -> Result<Value, ResolveError> {
        let target = parse_locator(locator)?;
        let _span = debug_span!("resolve", locator = %target).entered();
        self.expand_target(&target, None, "", 0)
    }

    /// Fetch the document at `locator` and select its fragment, without
    /// expanding references.
    ///
    /// # Errors
    ///
    /// Returns `NoProviderResolved` if no provider serves the locator, or
    /// `PointerNotFound` if the fragment does not exist.
    pub fn fetch(&self, locator: &str) -> Result<Value, ResolveError> {
        let target = parse_locator(locator)?;
        let (document_locator, fragment) = split_fragment(&target);
        let document = self.fetch_document(&document_locator, "", 0)?;
        let selected = select(&document, &target, fragment.as_deref(), "", 0)?;
        Ok(selected.clone())
    }

    /// Raw bytes of the document at `locator` from the first provider that
    /// serves it. The fragment is ignored.
    ///
    /// # Errors
    ///
    /// Returns `NoProviderResolved` if no provider serves the locator.
    pub fn fetch_bytes(&self, locator: &str) -> Result<Vec<u8>, ResolveError> {
        let (document_locator, _) = split_fragment(&parse_locator(locator)?);
        self.first_success(&document_locator, "", 0, |provider, url| {
            provider.get_bytes(url)
        })
    }

    // --- Internal implementation ---

    fn expand_value(
        &self,
        value: &mut Value,
        scope: &Scope<'_>,
        path: &str,
        depth: usize,
    ) -> Result<(), ResolveError> {
        if let Some(reference) = as_reference(value).map(str::to_string) {
            let target = resolve_reference(scope.locator, &reference)?;
            *value = self.expand_target(&target, Some(scope), path, depth)?;
            return Ok(());
        }

        match value {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    let child_path = format!("{}/{}", path, escape_segment(key));
                    self.expand_value(child, scope, &child_path, depth)?;
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    let item_path = format!("{}/{}", path, i);
                    self.expand_value(item, scope, &item_path, depth)?;
                }
            }
            // Primitives pass through unchanged
            _ => {}
        }
        Ok(())
    }

    /// Fetch `target`, select its fragment and expand what it contains.
    ///
    /// With a `scope`, a target inside the scope's own document is taken
    /// from the scope's root instead of being fetched again.
    fn expand_target(
        &self,
        target: &Url,
        scope: Option<&Scope<'_>>,
        path: &str,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        let depth = depth + 1;
        if depth > self.max_recursions {
            return Err(ResolveError::MaxRecursionExceeded {
                max: self.max_recursions,
                locator: target.to_string(),
                path: path.to_string(),
            });
        }
        debug!(locator = %target, depth, path, "expanding reference");

        let (document_locator, fragment) = split_fragment(target);
        if let Some(scope) = scope.filter(|s| *s.locator == document_locator) {
            let selected = select(scope.root, target, fragment.as_deref(), path, depth)?;
            let mut expanded = selected.clone();
            self.expand_value(&mut expanded, scope, path, depth)?;
            return Ok(expanded);
        }

        let document = self.fetch_document(&document_locator, path, depth)?;
        let selected = select(&document, target, fragment.as_deref(), path, depth)?;
        let mut expanded = selected.clone();
        let inner = Scope {
            locator: &document_locator,
            root: &document,
        };
        self.expand_value(&mut expanded, &inner, path, depth)?;
        Ok(expanded)
    }

    fn fetch_document(
        &self,
        locator: &Url,
        path: &str,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        self.first_success(locator, path, depth, |provider, url| provider.get(url))
    }

    /// Try each provider in order and return the first success.
    fn first_success<T>(
        &self,
        locator: &Url,
        path: &str,
        depth: usize,
        fetch: impl Fn(&dyn Provider, &Url) -> Result<T, ProviderError>,
    ) -> Result<T, ResolveError> {
        let mut attempts = Vec::new();
        for provider in &self.providers {
            match fetch(provider.as_ref(), locator) {
                Ok(found) => {
                    debug!(provider = provider.name(), %locator, "fetched");
                    return Ok(found);
                }
                Err(err) if err.is_unsupported_scheme() => {
                    trace!(provider = provider.name(), %locator, "skipping provider");
                    attempts.push(err);
                }
                Err(err) => {
                    debug!(provider = provider.name(), %locator, error = %err, "provider failed");
                    attempts.push(err);
                }
            }
        }

        Err(ResolveError::NoProviderResolved {
            locator: locator.to_string(),
            path: path.to_string(),
            depth,
            attempts,
        })
    }
}

fn select<'a>(
    document: &'a Value,
    target: &Url,
    fragment: Option<&str>,
    path: &str,
    depth: usize,
) -> Result<&'a Value, ResolveError> {
    let Some(fragment) = fragment else {
        return Ok(document);
    };
    navigate_pointer(document, fragment).map_err(|source| ResolveError::PointerNotFound {
        locator: target.to_string(),
        path: path.to_string(),
        depth,
        source,
    })
}

/// Escape a member name for use in a JSON Pointer path (~ = ~0, / = ~1).
fn escape_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
