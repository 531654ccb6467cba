//! `donorlink`: an interactive front end for matching donors with shelter
//! needs.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
