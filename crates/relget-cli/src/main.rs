use relget_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Initialize logging as early as possible; falls back to stderr.
    let target = logging::init();
    tracing::debug!("logging to {:?}", target);

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("relget error: {:#}", err);
        std::process::exit(1);
    }
}
