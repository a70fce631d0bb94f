//! ace-install binary
//!
//! Thin wrapper around the ace_installer library: parses arguments, wires a
//! terminal notifier and reports the outcome through the exit code.

mod cli;

use ace_installer::{install_resolved, InstallError};
use cli::{Cli, ConsoleNotifier};
use std::io::IsTerminal;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse_args();
    cli::logging::init(args.verbose);

    println!("Ace editor installer");

    let interactive = !args.no_interaction && std::io::stdin().is_terminal();
    let request = match args
        .options()
        .and_then(|options| options.with_notifier(ConsoleNotifier::new(interactive)).resolve())
    {
        Ok(request) => request,
        Err(e) => return report(&e),
    };

    let version = request.version.clone();
    let install_dir = request.install_dir();

    match install_resolved(request).await {
        Ok(true) => {
            println!("Ace {} installed in {}", version, install_dir.display());
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("Installation skipped, existing files left untouched");
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn report(error: &InstallError) -> ExitCode {
    eprintln!("error: {}", error);
    eprintln!("  fix: {}", error.fix_suggestion());
    ExitCode::FAILURE
}
