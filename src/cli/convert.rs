use colored::Colorize;

use crate::error::Result;
use crate::pipeline::{convert, Extracted};
use crate::settings::load_settings;

pub(crate) fn print_extracted(extracted: &[Extracted]) {
    if extracted.is_empty() {
        println!("{}", "No workbook to convert.".yellow());
        return;
    }
    for e in extracted {
        let name = e.source.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        println!("{:>6} rows  {} -> {}", e.rows, name, e.csv.display());
    }
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let extracted = convert(&settings)?;
    print_extracted(&extracted);
    Ok(())
}
