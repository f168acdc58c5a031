//! # provision
//!
//! Fetch, run and apply the Project-Env CLI inside a CI runner.
//!
//! This crate provides functionality for:
//! - Platform detection for the correct release archive
//! - Resolving the latest CLI version from GitHub's release redirect
//! - Downloading and unpacking the archive into a per-run workspace
//! - Running the CLI and applying its tool infos to the runner environment
//!
//! ## Example
//!
//! ```no_run
//! use provision::apply::RecordingEnvironment;
//! use provision::{Client, RunOptions};
//!
//! let client = Client::new();
//! let mut env = RecordingEnvironment::new();
//!
//! let summary = client
//!     .run(&RunOptions::new().cli_version("3.4.0"), &mut env)
//!     .expect("provisioning failed");
//!
//! println!("{summary}");
//! ```
//!
//! ## Supported Platforms
//!
//! | OS      | Arch            | Archive                          |
//! |---------|-----------------|----------------------------------|
//! | Linux   | x86_64          | cli-VERSION-linux-amd64.tar.gz   |
//! | macOS   | x86_64, aarch64 | cli-VERSION-macos-ARCH.tar.gz    |
//! | Windows | x86_64          | cli-VERSION-windows-amd64.zip    |
//!
//! On Apple Silicon the amd64 archive is used when a release has no native
//! build (see [`release::rosetta_fallback`]).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod apply;
pub mod archive;
pub mod backend;
pub mod error;
pub mod exec;
pub mod platform;
pub mod release;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use types::{
    AllToolInfos, CpuArch, Os, Platform, ResolvedArtifact, RunOptions, RunSummary, ToolInfo,
};

use apply::Environment;
use archive::Workspace;
use backend::Backend;
use backend::github::GitHubBackend;
use release::Releases;
use std::path::PathBuf;

/// High-level client running the whole provisioning pipeline.
///
/// # Example
///
/// ```no_run
/// use provision::Client;
///
/// let client = Client::new();
/// let version = client.resolve_latest_version().unwrap();
/// println!("latest Project-Env CLI: {version}");
/// ```
pub struct Client {
    backend: Box<dyn Backend>,
    releases: Releases,
    temp_root: Option<PathBuf>,
}

impl Client {
    /// Create a new Client with the default GitHub backend.
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(Box::new(GitHubBackend::new()))
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            releases: Releases::default(),
            temp_root: None,
        }
    }

    /// Use different release locations.
    #[must_use]
    pub fn releases(mut self, releases: Releases) -> Self {
        self.releases = releases;
        self
    }

    /// Create per-run workspaces under `root` instead of the system temp dir.
    #[must_use]
    pub fn temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Provision the CLI for the current host and apply its output to `env`.
    pub fn run(&self, options: &RunOptions, env: &mut dyn Environment) -> Result<RunSummary> {
        self.run_on_host(std::env::consts::OS, std::env::consts::ARCH, options, env)
    }

    /// Same as [`Client::run`] for explicitly reported host facts.
    ///
    /// The platform is checked before anything touches the network.
    pub fn run_on_host(
        &self,
        os: &str,
        arch: &str,
        options: &RunOptions,
        env: &mut dyn Environment,
    ) -> Result<RunSummary> {
        let platform = platform::identify(os, arch)?;
        self.run_on(platform, options, env)
    }

    /// Run the pipeline for a known platform.
    ///
    /// Stages run strictly in order: version, archive URL, download and
    /// extraction, CLI execution, environment application. The tool infos
    /// are parsed completely before the first change reaches `env`.
    pub fn run_on(
        &self,
        platform: Platform,
        options: &RunOptions,
        env: &mut dyn Environment,
    ) -> Result<RunSummary> {
        let version = match &options.cli_version {
            Some(version) => version.clone(),
            None => self.resolve_latest_version()?,
        };
        log::info!("using Project-Env CLI {version} for {platform}");

        let url = self
            .releases
            .resolve_archive_url(self.backend.as_ref(), &version, &platform)?;

        let workspace = self.workspace()?;
        let artifact = workspace.artifact(&url);
        let executable = archive::fetch(self.backend.as_ref(), &artifact, &platform)?;

        let infos = exec::execute_cli(&executable, &options.cli_args())?;
        log::debug!(
            "resulting tool infos: {}",
            serde_json::to_string(&infos).unwrap_or_default()
        );

        let applied = apply::apply_tool_infos(&infos, env)?;

        Ok(RunSummary {
            version,
            url,
            paths_added: applied.paths,
            variables_exported: applied.variables,
        })
    }

    // =========================================================================
    // Release Information
    // =========================================================================

    /// Resolve the latest published CLI version.
    pub fn resolve_latest_version(&self) -> Result<String> {
        self.releases.resolve_latest_version(self.backend.as_ref())
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn workspace(&self) -> Result<Workspace> {
        match &self.temp_root {
            Some(root) => Workspace::create(root),
            None => Workspace::new(),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
