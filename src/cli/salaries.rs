use std::path::PathBuf;

use colored::Colorize;

use crate::error::Result;
use crate::pipeline::load_salaries;
use crate::settings::{load_settings, shellexpand_path};

pub fn run(file: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let file = file.map(|f| PathBuf::from(shellexpand_path(f)));
    let rows = load_salaries(&settings, file.as_deref())?;
    println!("{} loaded into salaires", format!("{rows} rows").green().bold());
    Ok(())
}
