use std::io::{self, Write};

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

/// Control panel for a running conduit.
#[derive(Parser, Debug)]
#[command(name = "conduitcli")]
#[command(about = "Control panel for the Conduit supervisor (conduit)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the given string to the console
    Test {
        /// String to print
        #[arg(value_name = "STRING")]
        input: String,
    },
}

fn execute<W: Write>(command: &Command, out: &mut W) -> Result<()> {
    match command {
        Command::Test { input } => writeln!(out, "{}", input)?,
    }
    out.flush()?;
    Ok(())
}

fn fatal(err: impl std::fmt::Display) -> ! {
    eprintln!("[conduitcli] {}", err);
    std::process::exit(1);
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => fatal(e),
    };

    if let Err(e) = execute(&cli.command, &mut io::stdout().lock()) {
        fatal(e);
    }
}
