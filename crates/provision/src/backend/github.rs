//! GitHub releases backend.
//!
//! This module provides the [`GitHubBackend`] implementation, which fetches
//! release URLs directly rather than going through the Releases API: the
//! `releases/latest` and `releases/download` URLs redirect to the tag and
//! to the object store respectively, so no API token or pagination is
//! involved.

use crate::backend::{Backend, HttpProbe};
use crate::error::{Error, Result};
use std::io::{self, Write};
use ureq::Agent;

/// Maximum download size (200 MB is far above any published CLI archive).
const MAX_BODY_SIZE: u64 = 200 * 1024 * 1024;

const USER_AGENT: &str = concat!("project-env-action/", env!("CARGO_PKG_VERSION"));

/// GitHub releases backend.
///
/// # Example
///
/// ```no_run
/// use provision::backend::github::GitHubBackend;
/// use provision::backend::Backend;
///
/// let backend = GitHubBackend::new();
/// let probe = backend
///     .probe("https://github.com/Project-Env/project-env-cli/releases/latest")
///     .unwrap();
/// println!("latest release lives at {:?}", probe.location);
/// ```
pub struct GitHubBackend {
    /// Agent for downloads, follows redirects.
    agent: Agent,
    /// Agent for probes, returns redirects and error statuses as values.
    probe_agent: Agent,
}

impl GitHubBackend {
    /// Create a new GitHub backend.
    #[must_use]
    pub fn new() -> Self {
        let probe_agent: Agent = Agent::config_builder()
            .max_redirects(0)
            .max_redirects_will_error(false)
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent: Agent::new_with_defaults(),
            probe_agent,
        }
    }
}

impl Default for GitHubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for GitHubBackend {
    fn probe(&self, url: &str) -> Result<HttpProbe> {
        log::debug!("probing {url}");

        let response = self
            .probe_agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| Error::download(url, e))?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        log::debug!("probe of {url} answered {status}");
        Ok(HttpProbe::new(status, location))
    }

    fn download(&self, url: &str, dest: &mut dyn Write) -> Result<u64> {
        log::debug!("downloading {url}");

        let mut response = self
            .agent
            .get(url)
            .header("Accept", "application/octet-stream")
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(code) => Error::download(url, format!("HTTP {code}")),
                other => Error::download(url, other),
            })?;

        let mut reader = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .reader();

        io::copy(&mut reader, dest).map_err(|e| Error::download(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_impl() {
        let _backend = GitHubBackend::default();
    }

    #[test]
    fn test_user_agent_names_action() {
        assert!(USER_AGENT.starts_with("project-env-action/"));
    }
}
