use clap::Parser;
use provision::RunOptions;

/// Action inputs arrive as `INPUT_<NAME>` variables; unset inputs are
/// passed as empty strings.
#[derive(Parser, Debug)]
#[command(name = "project-env-action")]
#[command(version)]
#[command(about = "Set up the tools declared in a Project-Env config", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Project-Env config file handed to the CLI
    #[arg(long, env = "INPUT_CONFIG-FILE", value_name = "PATH")]
    pub config_file: Option<String>,

    /// CLI version to use (latest release when unset)
    #[arg(long, env = "INPUT_CLI-VERSION", value_name = "VERSION")]
    pub cli_version: Option<String>,

    /// Run the CLI with --debug
    #[arg(
        long,
        env = "INPUT_CLI-DEBUG",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub cli_debug: Option<String>,
}

impl Cli {
    /// Options for the provisioning run.
    pub fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::new().debug(is_true(self.cli_debug.as_deref()));

        if let Some(config_file) = non_empty(self.config_file.as_deref()) {
            options = options.config_file(config_file);
        }
        if let Some(version) = non_empty(self.cli_version.as_deref()) {
            options = options.cli_version(version);
        }

        options
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Only the exact value `true` enables a flag input; anything else is off.
fn is_true(value: Option<&str>) -> bool {
    non_empty(value) == Some("true")
}
