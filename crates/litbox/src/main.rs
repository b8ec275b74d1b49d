mod cli;
mod config;
mod inspect;
mod paths;
mod run;
mod simulate;

use std::io;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Simulate(args)) => simulate::simulate(&args, &mut io::stdout().lock()),
        Some(Command::Inspect(args)) => inspect::inspect(&args.path, &mut io::stdout().lock()),
        None => run::run(cli.run),
    }
}
