//! `contextgit`: trace source files back to the requirements they implement.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
