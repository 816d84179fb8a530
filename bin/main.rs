use anyhow::Error as Anyhow;
use clap::Parser;

mod applet;
mod cli;
mod remote;
mod terminal;

fn main() -> Result<(), Anyhow> {
    cli::Cli::parse().execute()
}
