//! Error types for provisioning operations.
//!
//! Every stage of the pipeline reports failures through [`Error`]. None of
//! them are retried; the category only decides how the failure is explained
//! to the user.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad categories of provisioning errors.
///
/// Used to attach a short description and actionable advice to the failure
/// message reported to the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors.
    Network,
    /// Platform not supported.
    Platform,
    /// Executable missing from the downloaded archive.
    NotFound,
    /// The external CLI failed or produced unusable output.
    Tool,
    /// Decompression or file format error.
    Format,
    /// Filesystem or host surface errors.
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Platform => "Unsupported platform",
            Self::NotFound => "Executable not found",
            Self::Tool => "Project-Env CLI failure",
            Self::Format => "Invalid file format",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check that the requested cli-version exists and the runner can reach github.com",
            Self::Platform => "The Project-Env CLI is published for Linux x64, macOS x64/arm64 and Windows x64 only",
            Self::NotFound => "The release archive layout changed, pin an older cli-version",
            Self::Tool => "Re-run with cli-debug set to 'true' to see the CLI diagnostics",
            Self::Format => "The downloaded archive may be corrupted, try again",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while provisioning the Project-Env CLI.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host operating system has no published CLI build.
    #[error("unsupported OS {platform}")]
    UnsupportedPlatform {
        /// Raw platform string reported by the host.
        platform: String,
    },

    /// The host CPU architecture has no published CLI build for this OS.
    #[error("unsupported CPU arch {arch} on {os}")]
    UnsupportedArchitecture {
        /// Canonical OS name.
        os: String,
        /// Raw architecture string reported by the host.
        arch: String,
    },

    /// The latest release could not be determined.
    #[error("failed to resolve latest Project-Env CLI version: {reason}")]
    VersionResolutionFailed {
        /// Why resolution failed.
        reason: String,
    },

    /// Downloading (or probing) a URL failed.
    #[error("download of {url} failed: {message}")]
    DownloadFailed {
        /// URL being fetched.
        url: String,
        /// Error message.
        message: String,
    },

    /// The archive could not be unpacked.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// The executable is missing after extraction.
    #[error("could not find Project-Env CLI at {}", path.display())]
    ExecutableNotFound {
        /// Expected location of the executable.
        path: PathBuf,
    },

    /// The CLI exited unsuccessfully.
    #[error("Project-Env CLI failed with {status}{}", format_diagnostics(stderr))]
    ToolExecutionFailed {
        /// Exit status description (code or signal).
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The CLI output is not a valid tool info document.
    #[error("Project-Env CLI produced invalid output: {0}")]
    ToolOutputInvalid(String),

    /// IO error during file operations.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The host surface rejected a path or variable.
    #[error("failed to update runner environment: {0}")]
    HostSurface(String),
}

fn format_diagnostics(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{trimmed}")
    }
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a download error for `url`.
    pub fn download(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a version resolution error.
    pub fn version_resolution(reason: impl Into<String>) -> Self {
        Self::VersionResolutionFailed {
            reason: reason.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnsupportedPlatform { .. } | Error::UnsupportedArchitecture { .. } => {
                ErrorCategory::Platform
            }
            Error::VersionResolutionFailed { .. } | Error::DownloadFailed { .. } => {
                ErrorCategory::Network
            }
            Error::ExtractionFailed(_) => ErrorCategory::Format,
            Error::ExecutableNotFound { .. } => ErrorCategory::NotFound,
            Error::ToolExecutionFailed { .. } | Error::ToolOutputInvalid(_) => {
                ErrorCategory::Tool
            }
            Error::Io { .. } | Error::HostSurface(_) => ErrorCategory::Other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ToolOutputInvalid(err.to_string())
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Self::ExtractionFailed(err.to_string())
    }
}
