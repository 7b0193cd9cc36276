//! Uji Emisi - admin client for vehicle emissions testing
//!
//! Registers vehicles, records test results and browses the fleet through the
//! backend's REST API.

mod cli;
mod commands;
mod output;

use clap::Parser;
use cli::Cli;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn setup_tracing(cli: &Cli) {
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(&cli);

    match commands::execute(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
