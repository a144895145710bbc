use colored::Colorize;

use crate::cli::convert::print_extracted;
use crate::cli::load::print_summary;
use crate::error::Result;
use crate::pipeline;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let summary = pipeline::run(&settings)?;
    println!("{} staged", format!("{} file(s)", summary.staged).green());
    print_extracted(&summary.extracted);
    print_summary(summary.loaded.as_ref());
    Ok(())
}
