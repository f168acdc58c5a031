mod cli;
mod runner;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use provision::apply::Environment;
use provision::{Client, RunOptions};
use runner::ActionsRunner;
use std::io::Write;
use std::process::ExitCode;

/// Windows runners do not have PowerShell 7 on PATH.
const WINDOWS_POWERSHELL_DIR: &str = "C:/Program Files/PowerShell/7";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.run_options();

    init_logging(&cli, options.debug);

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ActionsRunner::set_failed(&failure_message(&e));
            if let Some(err) = e.downcast_ref::<provision::Error>() {
                log::info!("{}: {}", err.category(), err.category().advice());
            }
            ExitCode::FAILURE
        }
    }
}

/// Library errors already carry their cause in the message.
fn failure_message(err: &anyhow::Error) -> String {
    err.to_string()
}

fn init_logging(cli: &Cli, cli_debug: bool) {
    let in_actions = runner::in_actions();

    // Initialize logging based on verbosity
    let mut log_level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    // The runner decides whether ::debug:: lines are shown.
    if in_actions || cli_debug {
        log_level = log_level.max(log::LevelFilter::Debug);
    }

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None);

    if in_actions {
        builder
            .target(env_logger::Target::Stdout)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    runner::workflow_log_line(record.level(), &record.args().to_string())
                )
            });
    }

    builder.init();
}

fn run(options: &RunOptions) -> Result<()> {
    let mut runner = ActionsRunner::from_env();
    prepare_host(&mut runner, std::env::consts::OS)?;

    let summary = Client::new().run(options, &mut runner)?;
    log::info!("{summary}");
    Ok(())
}

/// Runner fix-ups needed before the CLI can run on `os`.
fn prepare_host(env: &mut dyn Environment, os: &str) -> provision::Result<()> {
    if os == "windows" {
        env.add_path(WINDOWS_POWERSHELL_DIR)?;
    }
    Ok(())
}
