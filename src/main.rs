use std::process::ExitCode;

use clap::Parser;
use filmstock::{cli, logger};

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();

    // Session log (overwrites the previous session's log)
    logger::init(args.verbose);

    cli::run(args)
}
