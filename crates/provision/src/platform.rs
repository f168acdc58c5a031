//! Platform detection for the CLI download.
//!
//! Maps the host's reported OS and CPU architecture onto the names used in
//! Project-Env CLI release archives. Both the Node-style names (`darwin`,
//! `win32`, `x64`, `arm64`) and Rust's `std::env::consts` names are accepted.
//!
//! # Example
//!
//! ```
//! use provision::platform;
//!
//! let platform = platform::identify("linux", "x64").unwrap();
//! assert_eq!(platform.to_string(), "linux-amd64");
//! ```

use crate::error::{Error, Result};
use crate::types::{CpuArch, Os, Platform};

/// Detect the current platform.
///
/// # Supported Platforms
///
/// | OS      | Arch    | Archive suffix          |
/// |---------|---------|-------------------------|
/// | macOS   | x86_64  | macos-amd64.tar.gz      |
/// | macOS   | ARM64   | macos-aarch64.tar.gz    |
/// | Linux   | x86_64  | linux-amd64.tar.gz      |
/// | Windows | x86_64  | windows-amd64.zip       |
///
/// # Errors
///
/// Returns `Error::UnsupportedPlatform` or `Error::UnsupportedArchitecture`
/// if the current host has no published CLI build.
pub fn detect() -> Result<Platform> {
    identify(std::env::consts::OS, std::env::consts::ARCH)
}

/// Identify the platform from raw host facts.
pub fn identify(os: &str, arch: &str) -> Result<Platform> {
    let os = parse_os(os)?;
    let arch = match (os, arch) {
        (_, "x64" | "x86_64") => CpuArch::Amd64,
        (Os::Macos, "arm64" | "aarch64") => CpuArch::Aarch64,
        _ => {
            return Err(Error::UnsupportedArchitecture {
                os: os.name().to_string(),
                arch: arch.to_string(),
            });
        }
    };

    Ok(Platform::new(os, arch))
}

fn parse_os(os: &str) -> Result<Os> {
    match os {
        "darwin" | "macos" => Ok(Os::Macos),
        "linux" => Ok(Os::Linux),
        "win32" | "windows" => Ok(Os::Windows),
        _ => Err(Error::UnsupportedPlatform {
            platform: os.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_supported_pairs() {
        let cases = [
            ("darwin", "x64", Os::Macos, CpuArch::Amd64),
            ("darwin", "arm64", Os::Macos, CpuArch::Aarch64),
            ("linux", "x64", Os::Linux, CpuArch::Amd64),
            ("win32", "x64", Os::Windows, CpuArch::Amd64),
            ("macos", "x86_64", Os::Macos, CpuArch::Amd64),
            ("macos", "aarch64", Os::Macos, CpuArch::Aarch64),
            ("linux", "x86_64", Os::Linux, CpuArch::Amd64),
            ("windows", "x86_64", Os::Windows, CpuArch::Amd64),
        ];

        for (os, arch, expected_os, expected_arch) in cases {
            let platform = identify(os, arch).unwrap();
            assert_eq!(platform, Platform::new(expected_os, expected_arch), "{os}/{arch}");
        }
    }

    #[test]
    fn test_identify_unsupported_os() {
        let err = identify("freebsd", "x64").unwrap_err();
        match err {
            Error::UnsupportedPlatform { platform } => assert_eq!(platform, "freebsd"),
            other => panic!("Expected UnsupportedPlatform, got {other:?}"),
        }
    }

    #[test]
    fn test_identify_arm64_only_on_macos() {
        for os in ["linux", "win32"] {
            let err = identify(os, "arm64").unwrap_err();
            assert!(
                matches!(err, Error::UnsupportedArchitecture { ref arch, .. } if arch == "arm64"),
                "{os}: {err:?}"
            );
        }
    }

    #[test]
    fn test_identify_unknown_arch() {
        let err = identify("darwin", "ia32").unwrap_err();
        assert!(matches!(err, Error::UnsupportedArchitecture { .. }));
    }

    #[test]
    fn test_os_checked_before_arch() {
        let err = identify("aix", "ppc64").unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { .. }));
    }

    #[test]
    fn test_detect_matches_host() {
        let result = detect();
        #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
        assert_eq!(result.as_ref().ok(), Some(&Platform::new(Os::Linux, CpuArch::Amd64)));
        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        assert_eq!(result.as_ref().ok(), Some(&Platform::new(Os::Macos, CpuArch::Aarch64)));
        #[cfg(all(target_os = "linux", target_arch = "aarch64"))]
        assert!(result.is_err());
        let _ = result;
    }
}
