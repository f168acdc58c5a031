//! Release lookup: which CLI version and which archive to fetch.
//!
//! The latest version is discovered from GitHub's `releases/latest` redirect
//! instead of the Releases API. Archive URLs follow the fixed naming scheme
//! `cli-<version>-<os>-<arch>.<ext>` under `releases/download/v<version>`.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{CpuArch, Os, Platform};
use regex::Regex;
use std::sync::LazyLock;

/// Release page of the Project-Env CLI.
pub const DEFAULT_RELEASES_BASE: &str = "https://github.com/Project-Env/project-env-cli/releases";

static VERSION_FROM_TAG_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+/v(.+)$").expect("static regex is valid"));

/// Release locations of the Project-Env CLI.
///
/// # Example
///
/// ```
/// use provision::release::Releases;
/// use provision::{CpuArch, Os, Platform};
///
/// let releases = Releases::default();
/// let platform = Platform::new(Os::Linux, CpuArch::Amd64);
/// assert_eq!(
///     releases.archive_url("3.4.0", &platform),
///     "https://github.com/Project-Env/project-env-cli/releases/download/v3.4.0/cli-3.4.0-linux-amd64.tar.gz"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Releases {
    base: String,
}

impl Releases {
    /// Use a custom releases base URL (mirrors, tests).
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL that redirects to the latest release tag.
    #[must_use]
    pub fn latest_url(&self) -> String {
        format!("{}/latest", self.base)
    }

    /// Directory URL holding the archives of `version`.
    #[must_use]
    pub fn download_base_url(&self, version: &str) -> String {
        format!("{}/download/v{}", self.base, version)
    }

    /// Full archive URL of `version` for `platform`.
    #[must_use]
    pub fn archive_url(&self, version: &str, platform: &Platform) -> String {
        format!(
            "{}/{}",
            self.download_base_url(version),
            archive_filename(version, platform)
        )
    }

    /// Resolve the latest published version.
    ///
    /// Issues a GET on [`Releases::latest_url`] without following redirects
    /// and reads the version from the `Location` header.
    ///
    /// # Errors
    ///
    /// Returns `Error::VersionResolutionFailed` unless the response is a
    /// 302 whose target ends in `/v<version>`.
    pub fn resolve_latest_version(&self, backend: &dyn Backend) -> Result<String> {
        let url = self.latest_url();
        let probe = backend.probe(&url)?;

        if !probe.is_found() {
            return Err(Error::version_resolution(format!(
                "expected a redirect from {url}, got HTTP {}",
                probe.status
            )));
        }

        let location = probe
            .location
            .ok_or_else(|| Error::version_resolution(format!("{url} redirected without a Location header")))?;

        version_from_location(&location).ok_or_else(|| {
            Error::version_resolution(format!("no version in redirect target {location}"))
        })
    }

    /// Resolve the archive URL of `version` for `platform`.
    ///
    /// Applies [`rosetta_fallback`] for Apple Silicon hosts; every other
    /// platform maps straight to [`Releases::archive_url`] without any
    /// network access.
    pub fn resolve_archive_url(
        &self,
        backend: &dyn Backend,
        version: &str,
        platform: &Platform,
    ) -> Result<String> {
        let target = rosetta_fallback(self, backend, version, *platform)?;
        Ok(self.archive_url(version, &target))
    }
}

impl Default for Releases {
    fn default() -> Self {
        Self::new(DEFAULT_RELEASES_BASE)
    }
}

/// Archive filename of `version` for `platform`.
#[must_use]
pub fn archive_filename(version: &str, platform: &Platform) -> String {
    format!(
        "cli-{}-{}-{}.{}",
        version,
        platform.os.name(),
        platform.arch.name(),
        platform.archive_extension()
    )
}

/// Extract the version from a release tag URL ending in `/v<version>`.
#[must_use]
pub fn version_from_location(location: &str) -> Option<String> {
    VERSION_FROM_TAG_URL
        .captures(location)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Fall back to the x64 build on macOS ARM when no native build exists.
///
/// Older releases only ship `macos-amd64`, which Rosetta runs fine. For
/// macOS/aarch64 the native archive URL is probed (GitHub answers 302 for
/// existing release assets); anything else selects the amd64 archive.
/// Every other platform is returned unchanged without probing.
pub fn rosetta_fallback(
    releases: &Releases,
    backend: &dyn Backend,
    version: &str,
    platform: Platform,
) -> Result<Platform> {
    if platform.os != Os::Macos || platform.arch != CpuArch::Aarch64 {
        return Ok(platform);
    }

    let native_url = releases.archive_url(version, &platform);
    if backend.probe(&native_url)?.is_found() {
        return Ok(platform);
    }

    log::info!("no native macOS aarch64 build of CLI {version}, using the amd64 build");
    Ok(platform.with_arch(CpuArch::Amd64))
}
