mod cli;
mod commands;
mod error;
mod prompt;

use crate::cli::{Cli, Commands};
use crate::error::{ErrorKind, Result};
use crate::prompt::Asker;
use clap::Parser;
use exn::ResultExt;
use sipkit_config::Config;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let asker = Asker::new(cli.yes);
    match cli.command {
        Commands::Collate(args) => commands::collate::run(args, &config, &asker),
        Commands::Loader(args) => commands::collate::loader(args, &config, &asker),
        Commands::Sip(args) => commands::sip::run(args, &config, &asker),
        Commands::Inventory(args) => commands::inventory::run(args, &asker),
        Commands::Unbag(args) => commands::unbag::unbag(args, &asker),
        Commands::Untar(args) => commands::unbag::untar(args, &asker),
        Commands::RenameTars(args) => commands::legacy::rename_tars(args, &asker),
        Commands::SplitSides(args) => commands::legacy::split_sides(args, &asker),
        Commands::Etd(args) => commands::etd::run(args, &asker),
        Commands::Upload(args) => commands::upload::run(args, &config, &asker),
    }
}
