//! Downloading and unpacking the CLI archive.
//!
//! Everything lands in a [`Workspace`], a temporary directory owned by one
//! run and removed when it is dropped, whichever stage failed.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{Platform, ResolvedArtifact};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Base name of the CLI executable inside the archive.
pub const EXECUTABLE_NAME: &str = "project-env-cli";

const TEMP_PREFIX: &str = "project-env-";

/// Archive formats the CLI is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// `.zip` (Windows).
    Zip,
    /// `.tar.gz` (everything else).
    TarGz,
}

impl ArchiveFormat {
    /// Pick the format from the archive URL.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        if url.ends_with("zip") {
            Self::Zip
        } else {
            Self::TarGz
        }
    }
}

/// Per-run scratch directory.
///
/// Holds the downloaded archive and the extracted files. Removal happens on
/// drop; a failure to remove is logged and otherwise ignored.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
}

impl Workspace {
    /// Create a workspace in the system temp directory.
    pub fn new() -> Result<Self> {
        Self::create(&std::env::temp_dir())
    }

    /// Create a workspace under `root`.
    pub fn create(root: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir_in(root)
            .map_err(|e| Error::io(root, e))?;

        log::debug!("created workspace {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    /// Root of the workspace.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map_or_else(|| Path::new(""), TempDir::path)
    }

    /// Local paths for downloading and extracting `url`.
    #[must_use]
    pub fn artifact(&self, url: &str) -> ResolvedArtifact {
        let filename = url.rsplit('/').next().filter(|name| !name.is_empty()).unwrap_or("cli-archive");
        ResolvedArtifact {
            url: url.to_string(),
            archive_path: self.path().join(filename),
            extract_dir: self.path().join("cli"),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => log::debug!("removed workspace {}", path.display()),
                Err(e) => log::warn!("failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

/// Download the archive, extract it and locate the executable.
///
/// Returns the path of the CLI executable inside `artifact.extract_dir`.
pub fn fetch(
    backend: &dyn Backend,
    artifact: &ResolvedArtifact,
    platform: &Platform,
) -> Result<PathBuf> {
    download(backend, &artifact.url, &artifact.archive_path)?;
    extract(
        &artifact.archive_path,
        &artifact.extract_dir,
        ArchiveFormat::from_url(&artifact.url),
    )?;
    locate_executable(&artifact.extract_dir, platform)
}

/// Download `url` into a new file at `dest`.
pub fn download(backend: &dyn Backend, url: &str, dest: &Path) -> Result<u64> {
    let file = File::create(dest).map_err(|e| Error::io(dest, e))?;
    let mut writer = BufWriter::new(file);

    let bytes = backend.download(url, &mut writer)?;
    writer.flush().map_err(|e| Error::io(dest, e))?;

    log::info!("downloaded {url} ({bytes} bytes)");
    Ok(bytes)
}

/// Extract `archive` into `dest`.
pub fn extract(archive: &Path, dest: &Path, format: ArchiveFormat) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;
    let file = File::open(archive).map_err(|e| Error::io(archive, e))?;

    match format {
        ArchiveFormat::Zip => {
            let mut zip = zip::ZipArchive::new(BufReader::new(file))?;
            zip.extract(dest)?;
        }
        ArchiveFormat::TarGz => {
            let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
            tar.unpack(dest).map_err(|e| {
                Error::ExtractionFailed(format!("{}: {}", archive.display(), e))
            })?;
        }
    }

    log::debug!("extracted {} into {}", archive.display(), dest.display());
    Ok(())
}

/// Path of the CLI executable inside `dir`, which must exist.
pub fn locate_executable(dir: &Path, platform: &Platform) -> Result<PathBuf> {
    let executable = dir.join(format!("{EXECUTABLE_NAME}{}", platform.executable_suffix()));
    if !executable.is_file() {
        return Err(Error::ExecutableNotFound { path: executable });
    }
    Ok(executable)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::types::{CpuArch, Os};
    use std::io::Write;

    /// Build a `.tar.gz` holding `entries` (path, contents, mode).
    pub(crate) fn tar_gz(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        {
            let mut builder = tar::Builder::new(&mut encoder);
            for (path, data, mode) in entries {
                let mut header = tar::Header::new_gnu();
                header.set_size(data.len() as u64);
                header.set_mode(*mode);
                header.set_cksum();
                builder.append_data(&mut header, path, *data).unwrap();
            }
            builder.finish().unwrap();
        }
        encoder.finish().unwrap()
    }

    fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buffer));
            let options = zip::write::SimpleFileOptions::default();
            for (path, data) in entries {
                zip.start_file(*path, options).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer
    }

    fn linux() -> Platform {
        Platform::new(Os::Linux, CpuArch::Amd64)
    }

    #[test]
    fn test_archive_format_from_url() {
        assert_eq!(
            ArchiveFormat::from_url("https://x/cli-3.4.0-windows-amd64.zip"),
            ArchiveFormat::Zip
        );
        assert_eq!(
            ArchiveFormat::from_url("https://x/cli-3.4.0-linux-amd64.tar.gz"),
            ArchiveFormat::TarGz
        );
    }

    #[test]
    fn test_workspace_artifact_paths() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::create(root.path()).unwrap();

        let artifact = workspace.artifact("https://x/download/v1/cli-1-linux-amd64.tar.gz");
        assert_eq!(artifact.archive_path, workspace.path().join("cli-1-linux-amd64.tar.gz"));
        assert_eq!(artifact.extract_dir, workspace.path().join("cli"));
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = TempDir::new().unwrap();
        let path = {
            let workspace = Workspace::create(root.path()).unwrap();
            fs::write(workspace.path().join("file"), b"data").unwrap();
            workspace.path().to_path_buf()
        };

        assert!(!path.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_workspace_create_in_missing_root() {
        let root = TempDir::new().unwrap();
        let err = Workspace::create(&root.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_fetch_tar_gz() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::create(root.path()).unwrap();
        let url = "https://x/cli-1.0.0-linux-amd64.tar.gz";

        let mut backend = MockBackend::new();
        backend.add_asset(url, tar_gz(&[("project-env-cli", b"#!/bin/sh\n", 0o755)]));

        let artifact = workspace.artifact(url);
        let executable = fetch(&backend, &artifact, &linux()).unwrap();
        assert_eq!(executable, artifact.extract_dir.join("project-env-cli"));
        assert_eq!(fs::read(&executable).unwrap(), b"#!/bin/sh\n");
    }

    #[test]
    fn test_fetch_zip_windows() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::create(root.path()).unwrap();
        let url = "https://x/cli-1.0.0-windows-amd64.zip";

        let mut backend = MockBackend::new();
        backend.add_asset(url, zip_archive(&[("project-env-cli.exe", b"MZ")]));

        let platform = Platform::new(Os::Windows, CpuArch::Amd64);
        let executable = fetch(&backend, &workspace.artifact(url), &platform).unwrap();
        assert!(executable.ends_with("project-env-cli.exe"));
    }

    #[test]
    fn test_fetch_download_failed() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::create(root.path()).unwrap();
        let url = "https://x/cli-0.0.0-linux-amd64.tar.gz";

        let err = fetch(&MockBackend::new(), &workspace.artifact(url), &linux()).unwrap_err();
        assert!(matches!(err, Error::DownloadFailed { url: ref u, .. } if u == url));
    }

    #[test]
    fn test_fetch_unexpected_layout() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::create(root.path()).unwrap();
        let url = "https://x/cli-1.0.0-linux-amd64.tar.gz";

        let mut backend = MockBackend::new();
        backend.add_asset(url, tar_gz(&[("bin/project-env-cli", b"nested", 0o755)]));

        let artifact = workspace.artifact(url);
        let err = fetch(&backend, &artifact, &linux()).unwrap_err();
        match err {
            Error::ExecutableNotFound { path } => {
                assert_eq!(path, artifact.extract_dir.join("project-env-cli"));
            }
            other => panic!("Expected ExecutableNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_corrupt_tar_gz() {
        let root = TempDir::new().unwrap();
        let archive = root.path().join("broken.tar.gz");
        fs::write(&archive, b"not gzip at all").unwrap();

        let err = extract(&archive, &root.path().join("out"), ArchiveFormat::TarGz).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[test]
    fn test_extract_corrupt_zip() {
        let root = TempDir::new().unwrap();
        let archive = root.path().join("broken.zip");
        fs::write(&archive, b"PK but not really").unwrap();

        let err = extract(&archive, &root.path().join("out"), ArchiveFormat::Zip).unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
    }

    #[test]
    fn test_locate_executable_missing() {
        let root = TempDir::new().unwrap();
        let err = locate_executable(root.path(), &linux()).unwrap_err();
        assert!(err.to_string().contains("project-env-cli"));
    }
}
