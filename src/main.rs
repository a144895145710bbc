mod cleaner;
mod cli;
mod db;
mod error;
mod fmt;
mod frame;
mod locator;
mod logging;
mod models;
mod normalize;
mod ods;
mod pipeline;
mod salary;
mod settings;
mod sheet;
mod staging;
mod table;
mod watcher;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init();

    let result = match cli.command {
        Commands::Init {
            desktop_dir,
            staging_dir,
            extract_dir,
            db_path,
        } => cli::init::run(desktop_dir, staging_dir, extract_dir, db_path),
        Commands::Stage => cli::stage::run(),
        Commands::Convert => cli::convert::run(),
        Commands::Load => cli::load::run(),
        Commands::Salaries { file } => cli::salaries::run(file.as_deref()),
        Commands::Run => cli::run::run(),
        Commands::Watch => cli::watch::run(),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
