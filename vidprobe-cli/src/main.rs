// vidprobe-cli/src/main.rs
//
// Entry point: parses arguments, initializes logging, dispatches to the
// subcommand handlers and maps failures to a nonzero exit code.

use clap::Parser;
use log::{error, LevelFilter};
use vidprobe_cli::{run_fetch_tools, run_probe, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = match &cli.command {
        Commands::Probe(args) => run_probe(args),
        Commands::FetchTools(args) => run_fetch_tools(args),
    };

    if let Err(err) = result {
        error!("{err:#}");
        std::process::exit(1);
    }
}
