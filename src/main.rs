//! Binary entry point for the remex CLI.

use std::io::{self, Write};
use std::process;

use camino::Utf8PathBuf;
use clap::Parser;

use remex::{
    CliOverrides, ConfigStore, ProcessCommandRunner, RunError, RunOrchestrator, RunRequest,
    TerminalPrompter, plan,
};

#[derive(Debug, Parser)]
#[command(
    name = "remex",
    about = "Mirror a local project to a remote host and run a script or module there",
    arg_required_else_help = true
)]
struct Cli {
    /// Local source file to run on the remote host.
    #[arg(
        value_name = "SOURCE_FILE",
        required_unless_present = "module",
        conflicts_with = "module"
    )]
    source_file: Option<Utf8PathBuf>,
    /// Run a module with the interpreter's -m flag instead of a file.
    #[arg(short = 'm', long, value_name = "MODULE")]
    module: Option<String>,
    /// Host to execute on; defaults to a prompt or the last-used host.
    #[arg(short = 'r', long, value_name = "HOST")]
    remote_host: Option<String>,
    /// Test selector appended to the remote script path.
    #[arg(short = 't', long, value_name = "SELECTOR")]
    test: Option<String>,
    /// Command line arguments to execute the target with.
    #[arg(short = 'a', long, value_name = "ARGS", allow_hyphen_values = true)]
    args: Option<String>,
    /// Interpreter used to run the target remotely.
    #[arg(short = 'i', long, value_name = "NAME")]
    interpreter: Option<String>,
    /// Edit the stored command line arguments interactively.
    #[arg(short = 'e', long)]
    edit_args: bool,
    /// Select the remote host interactively.
    #[arg(short = 'p', long)]
    prompt: bool,
    /// Verbose transfer output.
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32, RunError> {
    let target = plan(cli.source_file, cli.module, cli.test.clone())?;
    let overrides = CliOverrides {
        verbose: cli.verbose,
        prompt: cli.prompt,
        args: cli.args,
        interpreter: cli.interpreter,
        edit_args: cli.edit_args,
        test: cli.test,
    };
    let request = RunRequest {
        target,
        remote_host: cli.remote_host,
        overrides,
    };

    let orchestrator =
        RunOrchestrator::new(ConfigStore::new(), ProcessCommandRunner, TerminalPrompter);
    orchestrator.execute(&request)
}

fn report_error(err: &RunError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &RunError) {
    writeln!(target, "{err}").ok();
}
