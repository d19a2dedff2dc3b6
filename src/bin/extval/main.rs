//! Extval CLI - shader compilation with optional external validation

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("extval=debug")
    } else {
        EnvFilter::new("extval=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .with_target(false)
        .without_time()
        .init();

    let color = !cli.no_color;

    match cli.command {
        Commands::Status(args) => commands::status::execute(args, color),
        Commands::Compile(args) => commands::compile::execute(args, color),
        Commands::Validate(args) => commands::validate::execute(args, color),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
