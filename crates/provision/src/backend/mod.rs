//! HTTP transport for release lookups and downloads.
//!
//! This module provides the [`Backend`] trait and its implementations. The
//! production implementation is [`github::GitHubBackend`], which talks to
//! GitHub release URLs.
//!
//! # Testing
//!
//! Use [`MockBackend`] for testing without network access:
//!
//! ```
//! use provision::backend::{Backend, MockBackend};
//!
//! let mut mock = MockBackend::new();
//! mock.add_redirect(
//!     "https://example.com/releases/latest",
//!     "https://example.com/releases/tag/v3.4.0",
//! );
//!
//! let probe = mock.probe("https://example.com/releases/latest").unwrap();
//! assert!(probe.is_found());
//! assert_eq!(mock.requests().len(), 1);
//! ```

pub mod github;

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// HTTP status GitHub answers with when a release URL redirects.
pub const FOUND: u16 = 302;

/// Response of a GET issued with redirect-following disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProbe {
    /// HTTP status code.
    pub status: u16,
    /// `Location` header, if present.
    pub location: Option<String>,
}

impl HttpProbe {
    /// Create a probe result.
    #[must_use]
    pub fn new(status: u16, location: Option<String>) -> Self {
        Self { status, location }
    }

    /// Whether the response is a `302 Found` redirect.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.status == FOUND
    }
}

/// Transport used by the pipeline.
///
/// This abstraction keeps URL construction and policy decisions free of
/// network access and enables testing.
pub trait Backend: Send + Sync {
    /// Issue a GET without following redirects.
    ///
    /// Any HTTP status is returned as a value; only transport failures are
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns `Error::DownloadFailed` if the request cannot be sent.
    fn probe(&self, url: &str) -> Result<HttpProbe>;

    /// Download `url`, following redirects, into `dest`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `Error::DownloadFailed` for non-2xx responses and for
    /// network or body read failures.
    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64>;
}

/// Mock backend for testing without network access.
///
/// Stores probe responses and asset bytes in memory and records every URL
/// it was asked for. Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    probes: Arc<Mutex<HashMap<String, HttpProbe>>>,
    assets: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer probes of `url` with a 302 to `location`.
    pub fn add_redirect(&mut self, url: impl Into<String>, location: impl Into<String>) {
        self.set_probe(url, HttpProbe::new(FOUND, Some(location.into())));
    }

    /// Answer probes of `url` with an arbitrary response.
    pub fn set_probe(&mut self, url: impl Into<String>, probe: HttpProbe) {
        let mut probes = self.probes.lock().unwrap();
        probes.insert(url.into(), probe);
    }

    /// Serve `data` for downloads of `url`.
    pub fn add_asset(&mut self, url: impl Into<String>, data: Vec<u8>) {
        let mut assets = self.assets.lock().unwrap();
        assets.insert(url.into(), data);
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, url: &str) {
        self.requests.lock().unwrap().push(url.to_string());
    }
}

impl Backend for MockBackend {
    fn probe(&self, url: &str) -> Result<HttpProbe> {
        self.record(url);
        let probes = self.probes.lock().unwrap();
        Ok(probes
            .get(url)
            .cloned()
            .unwrap_or_else(|| HttpProbe::new(404, None)))
    }

    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        self.record(url);
        let assets = self.assets.lock().unwrap();
        let data = assets
            .get(url)
            .ok_or_else(|| Error::download(url, "HTTP 404"))?;

        dest.write_all(data).map_err(|e| Error::download(url, e))?;
        Ok(data.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_backend_unknown_probe_is_not_found() {
        let mock = MockBackend::new();
        let probe = mock.probe("https://example.com/missing").unwrap();
        assert_eq!(probe.status, 404);
        assert!(probe.location.is_none());
        assert!(!probe.is_found());
    }

    #[test]
    fn test_mock_backend_redirect() {
        let mut mock = MockBackend::new();
        mock.add_redirect("https://example.com/latest", "https://example.com/tag/v1.0.0");

        let probe = mock.probe("https://example.com/latest").unwrap();
        assert!(probe.is_found());
        assert_eq!(probe.location.as_deref(), Some("https://example.com/tag/v1.0.0"));
    }

    #[test]
    fn test_mock_backend_download_asset() {
        let mut mock = MockBackend::new();
        mock.add_asset("https://example.com/cli.zip", vec![0x50, 0x4b, 0x03, 0x04]);

        let mut buffer = Vec::new();
        let written = mock.download("https://example.com/cli.zip", &mut buffer).unwrap();
        assert_eq!(written, 4);
        assert_eq!(buffer, vec![0x50, 0x4b, 0x03, 0x04]);
    }

    #[test]
    fn test_mock_backend_download_missing_asset() {
        let mock = MockBackend::new();
        let mut buffer = Vec::new();
        let err = mock.download("https://example.com/nope.zip", &mut buffer).unwrap_err();
        assert!(matches!(err, Error::DownloadFailed { ref url, .. } if url == "https://example.com/nope.zip"));
    }

    #[test]
    fn test_mock_backend_records_requests() {
        let mock = MockBackend::new();
        let _ = mock.probe("https://example.com/a");
        let _ = mock.download("https://example.com/b", &mut Vec::new());

        assert_eq!(
            mock.requests(),
            vec!["https://example.com/a".to_string(), "https://example.com/b".to_string()]
        );
    }

    #[test]
    fn test_mock_backend_clones_share_state() {
        let mock = MockBackend::new();
        let clone = mock.clone();
        let _ = clone.probe("https://example.com/a");
        assert_eq!(mock.requests().len(), 1);
    }
}
