//! GitHub Actions runner surface.
//!
//! Path and variable changes are written to the files the runner names in
//! `GITHUB_PATH` and `GITHUB_ENV`, so later steps of the job see them. When
//! those are unset the older workflow commands are printed instead.

use provision::apply::Environment;
use provision::{Error, Result};
use std::env;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Whether the process runs inside a GitHub Actions job.
pub fn in_actions() -> bool {
    env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Host surface backed by the GitHub Actions runner.
#[derive(Debug)]
pub struct ActionsRunner {
    path_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
    update_process: bool,
}

impl ActionsRunner {
    /// Runner using the command files of the current job.
    pub fn from_env() -> Self {
        Self {
            path_file: file_from_env("GITHUB_PATH"),
            env_file: file_from_env("GITHUB_ENV"),
            update_process: true,
        }
    }

    /// Runner writing to explicit command files, leaving this process alone.
    #[cfg(test)]
    fn with_files(path_file: Option<PathBuf>, env_file: Option<PathBuf>) -> Self {
        Self {
            path_file,
            env_file,
            update_process: false,
        }
    }

    /// Report the run as failed.
    pub fn set_failed(message: &str) {
        println!("{}", workflow_command("error", message));
    }

    fn prepend_process_path(path: &str) -> Result<()> {
        let current = env::var_os("PATH").unwrap_or_default();
        let entries = std::iter::once(PathBuf::from(path)).chain(env::split_paths(&current));
        let joined: OsString = env::join_paths(entries)
            .map_err(|e| Error::HostSurface(format!("cannot add {path} to PATH: {e}")))?;

        set_process_var("PATH", &joined);
        Ok(())
    }
}

impl Environment for ActionsRunner {
    fn add_path(&mut self, path: &str) -> Result<()> {
        match &self.path_file {
            Some(file) => append(file, &format!("{path}\n"))?,
            None => println!("{}", workflow_command("add-path", path)),
        }

        if self.update_process {
            Self::prepend_process_path(path)?;
        }
        log::debug!("added {path} to PATH");
        Ok(())
    }

    fn export_variable(&mut self, name: &str, value: &str) -> Result<()> {
        match &self.env_file {
            Some(file) => append(file, &env_file_entry(name, value, &delimiter())?)?,
            None => println!(
                "::set-env name={}::{}",
                escape_property(name),
                escape_data(value)
            ),
        }

        if self.update_process {
            set_process_var(name, value);
        }
        log::debug!("exported {name}");
        Ok(())
    }
}

fn file_from_env(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn append(file: &Path, content: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .map_err(|e| Error::io(file, e))?;
    f.write_all(content.as_bytes())
        .map_err(|e| Error::io(file, e))
}

#[allow(unsafe_code)]
fn set_process_var(name: &str, value: impl AsRef<std::ffi::OsStr>) {
    // SAFETY: called from the main thread after the CLI process and its
    // reader threads have finished; nothing else reads the environment.
    unsafe { env::set_var(name, value) };
}

fn delimiter() -> String {
    format!("ghadelimiter_{}", uuid::Uuid::new_v4())
}

/// `NAME<<DELIM` heredoc entry for the `GITHUB_ENV` file.
fn env_file_entry(name: &str, value: &str, delimiter: &str) -> Result<String> {
    if name.contains(delimiter) || value.contains(delimiter) {
        return Err(Error::HostSurface(format!(
            "unexpected input: name or value of {name} contains the delimiter {delimiter}"
        )));
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

/// One workflow command line, `::command::data`.
pub fn workflow_command(command: &str, data: &str) -> String {
    format!("::{command}::{}", escape_data(data))
}

/// Log line for `level` in workflow command syntax.
///
/// Info records stay plain; the runner hides `::debug::` lines unless step
/// debugging is enabled.
pub fn workflow_log_line(level: log::Level, message: &str) -> String {
    match level {
        log::Level::Error => workflow_command("error", message),
        log::Level::Warn => workflow_command("warning", message),
        log::Level::Info => message.to_string(),
        log::Level::Debug | log::Level::Trace => workflow_command("debug", message),
    }
}

fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(property: &str) -> String {
    escape_data(property).replace(':', "%3A").replace(',', "%2C")
}
