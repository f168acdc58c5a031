//! Core types for provisioning.
//!
//! This module contains the platform description used to pick a release
//! archive, the tool info documents emitted by the Project-Env CLI, and the
//! options and results of a provisioning run.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Default config file handed to the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "project-env.toml";

/// Operating systems the Project-Env CLI is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// macOS.
    Macos,
    /// Linux.
    Linux,
    /// Windows.
    Windows,
}

impl Os {
    /// Name used in release archive filenames.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Macos => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Extension of the release archive, without the leading dot.
    #[must_use]
    pub fn archive_extension(&self) -> &'static str {
        match self {
            Self::Macos | Self::Linux => "tar.gz",
            Self::Windows => "zip",
        }
    }

    /// Suffix of executables on this OS.
    #[must_use]
    pub fn executable_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Macos | Self::Linux => "",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// CPU architectures the Project-Env CLI is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuArch {
    /// 64-bit x86.
    Amd64,
    /// 64-bit ARM.
    Aarch64,
}

impl CpuArch {
    /// Name used in release archive filenames.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Aarch64 => "aarch64",
        }
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Target platform for the CLI download.
///
/// # Example
///
/// ```
/// use provision::{CpuArch, Os, Platform};
///
/// let platform = Platform::new(Os::Macos, CpuArch::Aarch64);
/// assert_eq!(platform.to_string(), "macos-aarch64");
/// assert_eq!(platform.archive_extension(), "tar.gz");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: CpuArch,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub fn new(os: Os, arch: CpuArch) -> Self {
        Self { os, arch }
    }

    /// Extension of the release archive for this platform.
    #[must_use]
    pub fn archive_extension(&self) -> &'static str {
        self.os.archive_extension()
    }

    /// Suffix of executables on this platform.
    #[must_use]
    pub fn executable_suffix(&self) -> &'static str {
        self.os.executable_suffix()
    }

    /// Same OS with a different architecture.
    #[must_use]
    pub fn with_arch(self, arch: CpuArch) -> Self {
        Self { arch, ..self }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// One declaration emitted by the CLI for one managed tool instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    /// Variables to export, name to value.
    #[serde(default, deserialize_with = "null_as_default")]
    pub environment_variables: BTreeMap<String, String>,
    /// Directories to add to the search path, in order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path_elements: Vec<String>,
}

impl ToolInfo {
    /// Whether this declaration has no effect on the environment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.environment_variables.is_empty() && self.path_elements.is_empty()
    }
}

/// All declarations emitted by one CLI run, keyed by tool name.
///
/// A `null` declaration list is read as an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllToolInfos(BTreeMap<String, Vec<ToolInfo>>);

impl AllToolInfos {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a declaration for `tool`.
    pub fn push(&mut self, tool: impl Into<String>, info: ToolInfo) {
        self.0.entry(tool.into()).or_default().push(info);
    }

    /// Declarations of a single tool.
    #[must_use]
    pub fn get(&self, tool: &str) -> Option<&[ToolInfo]> {
        self.0.get(tool).map(Vec::as_slice)
    }

    /// Iterate over tools and their declarations, sorted by tool name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ToolInfo])> {
        self.0.iter().map(|(name, infos)| (name.as_str(), infos.as_slice()))
    }

    /// Number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document names no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for AllToolInfos {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<Vec<ToolInfo>>>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .map(|(name, infos)| (name, infos.unwrap_or_default()))
                .collect(),
        ))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Where one run fetches and unpacks the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// Download URL of the archive.
    pub url: String,
    /// Local path the archive is downloaded to.
    pub archive_path: PathBuf,
    /// Directory the archive is extracted into.
    pub extract_dir: PathBuf,
}

/// Options for a provisioning run.
///
/// # Example
///
/// ```
/// use provision::RunOptions;
///
/// let options = RunOptions::new()
///     .config_file("ci/project-env.toml")
///     .cli_version("3.4.0")
///     .debug(true);
///
/// assert_eq!(options.cli_version.as_deref(), Some("3.4.0"));
/// assert!(options.debug);
/// ```
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Config file handed to the CLI.
    pub config_file: String,
    /// CLI version to use (None = latest).
    pub cli_version: Option<String>,
    /// Whether to pass `--debug` to the CLI.
    pub debug: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_file: DEFAULT_CONFIG_FILE.to_string(),
            cli_version: None,
            debug: false,
        }
    }
}

impl RunOptions {
    /// Create new run options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the config file handed to the CLI.
    #[must_use]
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file = path.into();
        self
    }

    /// Pin the CLI version, e.g. "3.4.0" (without the leading `v`).
    #[must_use]
    pub fn cli_version(mut self, version: impl Into<String>) -> Self {
        self.cli_version = Some(version.into());
        self
    }

    /// Set whether the CLI runs in debug mode.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Arguments passed to the CLI executable.
    #[must_use]
    pub fn cli_args(&self) -> Vec<String> {
        let mut args = vec!["--config-file".to_string(), self.config_file.clone()];
        if self.debug {
            args.push("--debug".to_string());
        }
        args
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// CLI version that was used.
    pub version: String,
    /// Archive URL that was downloaded.
    pub url: String,
    /// Number of path elements applied.
    pub paths_added: usize,
    /// Number of variables exported.
    pub variables_exported: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Project-Env CLI {} applied {} path element(s) and {} variable(s)",
            self.version, self.paths_added, self.variables_exported
        )
    }
}
