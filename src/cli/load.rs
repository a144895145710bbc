use colored::Colorize;

use crate::error::Result;
use crate::pipeline::{load, LoadSummary};
use crate::settings::load_settings;

pub(crate) fn print_summary(summary: Option<&LoadSummary>) {
    let Some(s) = summary else {
        println!("{}", "No extract to load.".yellow());
        return;
    };
    println!(
        "{} loaded from {} file(s) into comptes",
        format!("{} rows", s.rows_loaded).green().bold(),
        s.files
    );
    if s.sentinel_rows > 0 {
        println!("{} placeholder row(s) skipped", s.sentinel_rows);
    }
    if s.out_of_bound > 0 {
        println!("{}", format!("{} date(s) past their file year", s.out_of_bound).yellow());
    }
    for w in &s.warnings {
        println!(
            "{} row {}, {}: {:?}",
            "unmapped value".yellow(),
            w.row,
            w.column,
            w.value
        );
    }
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let summary = load(&settings)?;
    print_summary(summary.as_ref());
    Ok(())
}
