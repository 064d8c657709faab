//! docsmith CLI — documentation sanitization and indexing tool.
//!
//! Builds navigation and search artifacts from markdown corpora and
//! exports a single concatenated LLMS pack for machine consumption.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
