//! Applying tool infos to the runner environment.
//!
//! The runner is reached through the [`Environment`] trait so the
//! application order can be tested with [`RecordingEnvironment`].

use crate::error::Result;
use crate::types::AllToolInfos;

/// Host surface that persists path and variable changes for later steps.
pub trait Environment {
    /// Add `path` to the executable search path.
    fn add_path(&mut self, path: &str) -> Result<()>;

    /// Export variable `name` with `value`.
    fn export_variable(&mut self, name: &str, value: &str) -> Result<()>;
}

/// One call made against an [`Environment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentCall {
    /// `add_path(path)`.
    AddPath(String),
    /// `export_variable(name, value)`.
    ExportVariable(String, String),
}

/// Environment that only records the calls made against it.
///
/// # Example
///
/// ```
/// use provision::apply::{Environment, EnvironmentCall, RecordingEnvironment};
///
/// let mut env = RecordingEnvironment::new();
/// env.add_path("/opt/jdk/bin").unwrap();
/// assert_eq!(env.calls(), &[EnvironmentCall::AddPath("/opt/jdk/bin".to_string())]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingEnvironment {
    calls: Vec<EnvironmentCall>,
}

impl RecordingEnvironment {
    /// Create an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> &[EnvironmentCall] {
        &self.calls
    }
}

impl Environment for RecordingEnvironment {
    fn add_path(&mut self, path: &str) -> Result<()> {
        self.calls.push(EnvironmentCall::AddPath(path.to_string()));
        Ok(())
    }

    fn export_variable(&mut self, name: &str, value: &str) -> Result<()> {
        self.calls
            .push(EnvironmentCall::ExportVariable(name.to_string(), value.to_string()));
        Ok(())
    }
}

/// Counts of what [`apply_tool_infos`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    /// Path elements added.
    pub paths: usize,
    /// Variables exported.
    pub variables: usize,
}

/// Apply every declaration of every tool to `env`.
///
/// Tools are visited in name order. Within a declaration all path elements
/// are added in their listed order, then all variables are exported.
pub fn apply_tool_infos(infos: &AllToolInfos, env: &mut dyn Environment) -> Result<Applied> {
    let mut applied = Applied::default();

    for (tool, declarations) in infos.iter() {
        for declaration in declarations {
            log::debug!(
                "applying {tool}: {} path element(s), {} variable(s)",
                declaration.path_elements.len(),
                declaration.environment_variables.len()
            );

            for path in &declaration.path_elements {
                env.add_path(path)?;
                applied.paths += 1;
            }

            for (name, value) in &declaration.environment_variables {
                env.export_variable(name, value)?;
                applied.variables += 1;
            }
        }
    }

    Ok(applied)
}
