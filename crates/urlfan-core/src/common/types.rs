//! # Batch Type and Engine Constants
//!
//! This module defines the [`Batch`] accepted by the fan-out coordinator and
//! the default limits shared by the engine and the server binary.
//!
//! ## Constants
//!
//! - [`DEFAULT_MAX_CLIENTS`] - Admission gate capacity
//! - [`MAX_BATCH_SIZE`] - Upper bound on identifiers per batch
//! - [`DEFAULT_NUM_WORKERS`] - Worker pool size per batch
//! - [`DEFAULT_FETCH_TIMEOUT`] - Per-fetch timeout
//! - [`DEFAULT_REQUEST_TIMEOUT`] - End-to-end request timeout enforced by the
//!   transport layer

use crate::{Error, Result};
use core::time::Duration;
use std::collections::HashSet;
use url::Url;

/// Number of batches that may be processed concurrently.
pub const DEFAULT_MAX_CLIENTS: usize = 100;

/// Maximum number of identifiers accepted in one batch.
pub const MAX_BATCH_SIZE: usize = 20;

/// Number of workers a single batch fans out to.
pub const DEFAULT_NUM_WORKERS: usize = 4;

/// Timeout applied to each individual fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout applied to a whole request by the transport layer.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Mapping returned by a successful fan-out.
pub type FetchedContent = std::collections::HashMap<String, String>;

/// A validated, non-empty set of URLs fetched together as a unit.
///
/// Construction enforces `1 <= len <= MAX_BATCH_SIZE` and that every entry
/// parses as an absolute URL with both a scheme and a host. Repeated entries
/// are collapsed to their first occurrence, so each identifier is fetched once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    urls: Vec<String>,
}

impl Batch {
    /// Validates `urls` and builds a batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the list is empty, longer than
    /// [`MAX_BATCH_SIZE`], or contains an entry that is not a valid URL.
    pub fn new(urls: Vec<String>) -> Result<Self> {
        if urls.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "Request is empty".to_string(),
            });
        }

        if urls.len() > MAX_BATCH_SIZE {
            return Err(Error::InvalidRequest {
                reason: format!(
                    "The number of URLs is too large. The length of urls should not exceed {MAX_BATCH_SIZE}"
                ),
            });
        }

        if let Some(bad) = urls.iter().find(|raw| !is_valid_url(raw)) {
            return Err(Error::InvalidRequest {
                reason: format!("Got invalid url: {bad}"),
            });
        }

        let mut seen = HashSet::with_capacity(urls.len());
        let urls = urls
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect();

        Ok(Self { urls })
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Never `true` for a batch built through [`Batch::new`].
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for Batch {
    type Error = Error;

    fn try_from(urls: Vec<String>) -> Result<Self> {
        Self::new(urls)
    }
}

impl IntoIterator for Batch {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.into_iter()
    }
}

fn is_valid_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| !url.scheme().is_empty() && url.has_host())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(count: usize) -> Vec<String> {
        (1..=count)
            .map(|i| format!("https://jsonplaceholder.typicode.com/posts/{i}"))
            .collect()
    }

    #[test]
    fn accepts_up_to_max_batch_size() {
        let batch = Batch::new(urls(MAX_BATCH_SIZE)).unwrap();
        assert_eq!(batch.len(), MAX_BATCH_SIZE);
        assert!(!batch.is_empty());
    }

    #[test]
    fn rejects_oversized_batch() {
        let err = Batch::new(urls(MAX_BATCH_SIZE + 1)).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidRequest {
                reason: "The number of URLs is too large. The length of urls should not exceed 20"
                    .to_string()
            }
        );
    }

    #[test]
    fn rejects_empty_batch() {
        let err = Batch::new(Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Request is empty");
    }

    #[test]
    fn rejects_url_without_scheme_or_host() {
        for bad in ["invlid_url", "/relative/path", "mailto:someone@example.com"] {
            let err = Batch::new(vec!["https://a.test/1".to_string(), bad.to_string()])
                .unwrap_err();
            assert_eq!(err.to_string(), format!("Got invalid url: {bad}"));
        }
    }

    #[test]
    fn collapses_duplicates_keeping_order() {
        let batch = Batch::new(vec![
            "https://a.test/2".to_string(),
            "https://a.test/1".to_string(),
            "https://a.test/2".to_string(),
        ])
        .unwrap();
        let collected: Vec<_> = batch.iter().collect();
        assert_eq!(collected, ["https://a.test/2", "https://a.test/1"]);
    }
}
