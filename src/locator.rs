//! Locator handling: parsing, relative resolution and normalization.
//!
//! Locators are absolute URLs. A reference string found in a document is
//! resolved against the locator of the document that contains it, the same
//! way a browser resolves a link against the page it appears on.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::ResolveError;

/// Parse an absolute locator.
///
/// # Errors
///
/// Returns `ResolveError::InvalidLocator` if `locator` is not an absolute URL.
pub fn parse_locator(locator: &str) -> Result<Url, ResolveError> {
    Url::parse(locator).map_err(|source| ResolveError::InvalidLocator {
        locator: locator.to_string(),
        source,
    })
}

/// Resolve a reference string against the locator of the current document.
///
/// Absolute references replace the base entirely; relative ones follow
/// RFC 3986 resolution (`"b.json"` against `file:///dir/a.json` gives
/// `file:///dir/b.json`, `"#/x"` keeps the base document).
///
/// # Errors
///
/// Returns `ResolveError::InvalidLocator` if the joined result is not a URL.
pub fn resolve_reference(base: &Url, reference: &str) -> Result<Url, ResolveError> {
    base.join(reference)
        .map_err(|source| ResolveError::InvalidLocator {
            locator: reference.to_string(),
            source,
        })
}

/// Split a locator into the document locator and its fragment.
///
/// An empty fragment (`doc.json#`) addresses the whole document and is
/// returned as `None`. The fragment is returned still percent-encoded.
pub fn split_fragment(locator: &Url) -> (Url, Option<String>) {
    let fragment = locator
        .fragment()
        .filter(|f| !f.is_empty())
        .map(str::to_string);
    let mut document = locator.clone();
    document.set_fragment(None);
    (document, fragment)
}

/// True for schemes matching `scheme` regardless of case.
pub fn has_scheme(locator: &Url, scheme: &str) -> bool {
    locator.scheme().eq_ignore_ascii_case(scheme)
}

/// Lexically clean a path: drop `.` segments and fold `..` into their
/// parent. A `..` with nothing left to fold stays at the top instead of
/// climbing further, so `clean_path("/a/../../b")` is `/b`.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(p) => cleaned.push(p.as_os_str()),
            Component::RootDir => cleaned.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    cleaned.pop();
                    depth -= 1;
                }
            }
            Component::Normal(part) => {
                cleaned.push(part);
                depth += 1;
            }
        }
    }
    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }
    cleaned
}

/// Decode `%XX` escapes. Malformed escapes are kept verbatim and invalid
/// UTF-8 is replaced.
pub(crate) fn percent_decode(input: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(input.as_bytes())).into_owned()
}

/// Map a `file` locator to a path below `root`.
///
/// Only the locator's path is used; host, query and fragment are ignored.
/// Percent-encoded characters are decoded before joining.
pub fn file_path_under(root: &Path, locator: &Url) -> PathBuf {
    let decoded = locator
        .to_file_path()
        .unwrap_or_else(|_| PathBuf::from(percent_decode(locator.path())));

    let mut relative = PathBuf::new();
    for component in decoded.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {}
            other => relative.push(other.as_os_str()),
        }
    }

    let root = clean_path(root);
    let relative = clean_path(&relative);
    if relative == Path::new(".") {
        return root;
    }
    root.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn parse_locator_rejects_relative() {
        let result = parse_locator("schemas/a.json");
        assert!(matches!(result, Err(ResolveError::InvalidLocator { .. })));
    }

    #[test]
    fn resolve_relative_sibling() {
        let base = url("file:///schemas/root.json");
        let target = resolve_reference(&base, "types/buyer.json").unwrap();
        assert_eq!(target.as_str(), "file:///schemas/types/buyer.json");
    }

    #[test]
    fn resolve_parent_directory() {
        let base = url("https://example.com/a/b/c.json");
        let target = resolve_reference(&base, "../d.json#/x").unwrap();
        assert_eq!(target.as_str(), "https://example.com/a/d.json#/x");
    }

    #[test]
    fn resolve_absolute_replaces_base() {
        let base = url("file:///schemas/root.json");
        let target = resolve_reference(&base, "https://example.com/x.json").unwrap();
        assert_eq!(target.as_str(), "https://example.com/x.json");
    }

    #[test]
    fn resolve_fragment_only_keeps_document() {
        let base = url("file:///schemas/root.json");
        let target = resolve_reference(&base, "#/definitions/a").unwrap();
        assert_eq!(target.as_str(), "file:///schemas/root.json#/definitions/a");
    }

    #[test]
    fn split_fragment_present() {
        let (doc, fragment) = split_fragment(&url("file:///a.json#/b/0"));
        assert_eq!(doc.as_str(), "file:///a.json");
        assert_eq!(fragment.as_deref(), Some("/b/0"));
    }

    #[test]
    fn split_fragment_empty_is_none() {
        let (doc, fragment) = split_fragment(&url("file:///a.json#"));
        assert_eq!(doc.as_str(), "file:///a.json");
        assert_eq!(fragment, None);
    }

    #[test]
    fn has_scheme_ignores_case() {
        assert!(has_scheme(&url("HTTP://example.com/"), "http"));
        assert!(!has_scheme(&url("ftp://example.com/"), "http"));
    }

    #[test]
    fn clean_path_folds_segments() {
        assert_eq!(clean_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean_path(Path::new("/a/../../b")), PathBuf::from("/b"));
        assert_eq!(clean_path(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn file_path_under_root() {
        let path = file_path_under(Path::new("/srv/docs"), &url("file:///schemas/a.json"));
        assert_eq!(path, PathBuf::from("/srv/docs/schemas/a.json"));
    }

    #[test]
    fn file_path_under_decodes_percent() {
        let path = file_path_under(Path::new("/srv"), &url("file:///my%20docs/a.json"));
        assert_eq!(path, PathBuf::from("/srv/my docs/a.json"));
    }

    #[test]
    fn file_path_under_decodes_percent_with_host() {
        let path = file_path_under(Path::new("/srv"), &url("file://h/my%20docs/a.json"));
        assert_eq!(path, PathBuf::from("/srv/my docs/a.json"));
    }

    #[test]
    fn file_path_under_stays_below_root() {
        // URL parsing already folds dot segments; the join must not undo that.
        let path = file_path_under(Path::new("/srv/docs"), &url("file:///../../etc/passwd"));
        assert_eq!(path, PathBuf::from("/srv/docs/etc/passwd"));
    }
}
