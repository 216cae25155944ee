//! Error types for reference resolution.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Coarse classification shared by provider and resolver errors.
///
/// Lets callers branch on the failure class without matching variants or
/// parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A provider does not serve the locator's scheme.
    UnsupportedScheme,
    /// Reading the backing store failed.
    FetchFailed,
    /// Fetched bytes are not valid JSON.
    ParseFailed,
    /// A fragment segment does not exist in the target document.
    PointerNotFound,
    /// No registered provider serves the locator's scheme.
    NoProviderResolved,
    /// Reference expansion nested deeper than allowed.
    MaxRecursionExceeded,
    /// A reference string is not a usable URL.
    InvalidLocator,
}

/// Errors raised by a single provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} provider does not handle scheme '{scheme}'")]
    UnsupportedScheme { provider: String, scheme: String },

    // Filesystem
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("target is not a file: {path}")]
    NotAFile { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // HTTP
    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    // In-memory
    #[error("no document registered for {locator}")]
    UnknownDocument { locator: String },

    #[error("invalid JSON in {locator}: {source}")]
    InvalidJson {
        locator: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProviderError {
    /// Returns the failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedScheme { .. } => ErrorKind::UnsupportedScheme,
            Self::InvalidJson { .. } => ErrorKind::ParseFailed,
            _ => ErrorKind::FetchFailed,
        }
    }

    /// True when the provider declined the locator's scheme.
    pub fn is_unsupported_scheme(&self) -> bool {
        matches!(self, Self::UnsupportedScheme { .. })
    }
}

/// A JSON Pointer segment that could not be followed.
#[derive(Debug, Clone, Error)]
#[error("segment '{segment}' of '{pointer}' {reason}")]
pub struct PointerError {
    /// Full pointer being navigated (without the leading `#`).
    pub pointer: String,
    /// Decoded segment that failed.
    pub segment: String,
    /// What went wrong with the segment.
    pub reason: String,
}

/// Errors during reference resolution.
///
/// Any of these aborts the whole call; no partially expanded document is
/// returned.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid locator '{locator}': {source}")]
    InvalidLocator {
        locator: String,
        #[source]
        source: url::ParseError,
    },

    #[error(
        "no provider could resolve {locator} (at '{path}', depth {depth}){}",
        describe_attempts(attempts)
    )]
    NoProviderResolved {
        locator: String,
        path: String,
        depth: usize,
        attempts: Vec<ProviderError>,
    },

    #[error("pointer not found in {locator} (at '{path}', depth {depth}): {source}")]
    PointerNotFound {
        locator: String,
        path: String,
        depth: usize,
        #[source]
        source: PointerError,
    },

    #[error("reached max number of recursions ({max}) expanding {locator} at '{path}'")]
    MaxRecursionExceeded {
        max: usize,
        locator: String,
        path: String,
    },
}

fn describe_attempts(attempts: &[ProviderError]) -> String {
    if attempts.is_empty() {
        return ": no providers registered".to_string();
    }
    let reasons: Vec<String> = attempts.iter().map(|e| e.to_string()).collect();
    format!(": {}", reasons.join("; "))
}

impl ResolveError {
    /// Returns the failure class of this error.
    ///
    /// For `NoProviderResolved` the class comes from the attempts: a parse
    /// failure wins over a fetch failure, and `NoProviderResolved` remains
    /// only when every provider declined the scheme.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLocator { .. } => ErrorKind::InvalidLocator,
            Self::NoProviderResolved { attempts, .. } => attempts_kind(attempts),
            Self::PointerNotFound { .. } => ErrorKind::PointerNotFound,
            Self::MaxRecursionExceeded { .. } => ErrorKind::MaxRecursionExceeded,
        }
    }

    /// True when resolution stopped at the recursion ceiling, which usually
    /// means a reference cycle.
    pub fn is_max_recursion(&self) -> bool {
        matches!(self, Self::MaxRecursionExceeded { .. })
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::FetchFailed | ErrorKind::NoProviderResolved => 3,
            _ => 2,
        }
    }
}

fn attempts_kind(attempts: &[ProviderError]) -> ErrorKind {
    let kinds = || attempts.iter().map(ProviderError::kind);
    if kinds().any(|k| k == ErrorKind::ParseFailed) {
        ErrorKind::ParseFailed
    } else if kinds().any(|k| k == ErrorKind::FetchFailed) {
        ErrorKind::FetchFailed
    } else {
        ErrorKind::NoProviderResolved
    }
}
