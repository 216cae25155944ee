//! JSON Reference resolver
//!
//! Expands `$ref` pointers embedded in JSON documents by fetching the
//! referenced documents from pluggable providers (local files, HTTP,
//! in-memory) and substituting them in place, recursively.
//!
//! # Example
//!
//! ```
//! use jsref::{MemoryProvider, Resolver};
//! use serde_json::json;
//!
//! let defs = MemoryProvider::new()
//!     .with_document(
//!         "https://example.com/defs.json",
//!         json!({ "definitions": { "id": { "type": "string" } } }),
//!     )
//!     .unwrap();
//!
//! let resolver = Resolver::new().with_provider(defs);
//!
//! let document = json!({
//!     "properties": {
//!         "id": { "$ref": "defs.json#/definitions/id" }
//!     }
//! });
//!
//! let resolved = resolver
//!     .resolve(&document, "https://example.com/root.json")
//!     .unwrap();
//! assert_eq!(resolved["properties"]["id"], json!({ "type": "string" }));
//! ```
//!
//! # Resolution Rules
//!
//! | Reference | Resolved against | Source |
//! |-----------|------------------|--------|
//! | `"#/a/b"` | current document | the document already in hand |
//! | `"other.json#/a"` | current document's locator | provider chain |
//! | `"https://host/x.json"` | (absolute) | provider chain |
//!
//! Expansion nests at most `max_recursions` levels (default 20); deeper
//! nesting, including any reference cycle, fails with
//! [`ResolveError::MaxRecursionExceeded`].

mod cache;
mod error;
mod filesystem;
#[cfg(feature = "remote")]
mod http;
mod locator;
mod memory;
mod pointer;
mod provider;
mod resolver;
mod types;

pub use cache::Cache;
pub use error::{ErrorKind, PointerError, ProviderError, ResolveError};
pub use filesystem::FilesystemProvider;
pub use locator::{clean_path, parse_locator, resolve_reference, split_fragment};
pub use memory::MemoryProvider;
pub use pointer::navigate_pointer;
pub use provider::{parse_document, Provider};
pub use resolver::Resolver;
pub use types::{as_reference, DEFAULT_HTTP_TIMEOUT, DEFAULT_MAX_RECURSIONS, REF_KEY};

#[cfg(feature = "remote")]
pub use http::HttpProvider;

pub use url::Url;
